use core::fmt::{self, Write};

use log::{Level, Record};
use spin::{Mutex, Once};

use crate::{error::Error, rtos::Rtos, sync::CriticalSection};

pub struct BoardLogger {
    output: Mutex<Option<&'static mut (dyn Write + Send)>>,
    rtos: Once<&'static dyn Rtos>,
}

static LOGGER: BoardLogger = BoardLogger {
    output: Mutex::new(None),
    rtos: Once::new(),
};

const TARGET_BLACKLIST_TRACE: &[&str] = &["mmio", "interrupts", "disks"];

impl log::Log for BoardLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if metadata.level() == Level::Trace
            && TARGET_BLACKLIST_TRACE
                .iter()
                .any(|s| *s == metadata.target())
        {
            return false;
        }
        metadata.level() <= log::STATIC_MAX_LEVEL
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // an interrupt handler logging on this hart must not find the lock taken
        let _section = self.rtos.get().map(|rtos| CriticalSection::enter(*rtos));
        let mut output = self.output.lock();
        if let Some(output) = output.as_deref_mut() {
            let _ = write_record(output, record, cfg!(feature = "logger_color"));
        }
    }

    fn flush(&self) {}
}

fn write_record(output: &mut dyn Write, record: &Record, color: bool) -> fmt::Result {
    let level = record.level();
    if color {
        output.write_str(match level {
            Level::Error => "\x1B[91m", // red and bold
            Level::Warn => "\x1B[93m",  // yellow and bold
            Level::Info => "\x1B[97m",  // white
            Level::Debug => "\x1B[37m",
            Level::Trace => "\x1B[37m",
        })?;
    }

    if level != Level::Info {
        write!(output, "[{}] ", level)?;
    }

    let target = record.target();
    // driver crates are named after their device
    if let Some(module) = record
        .file()
        .filter(|path| path.starts_with("modules/"))
        .and_then(|_| record.module_path())
        .and_then(|path| path.split("::").next())
    {
        write!(output, "{}: ", module)?;
    } else if !target.contains("::") && level != Level::Info {
        write!(output, "{}: ", target)?;
    }

    writeln!(output, "{}", record.args())?;
    if color {
        output.write_str("\x1B[0m")?; // reset mode and color
    }
    Ok(())
}

/// Install the logger. Records are written under a critical section of `rtos`.
pub fn init(rtos: &'static dyn Rtos) -> Result<(), Error> {
    LOGGER.rtos.call_once(|| rtos);
    log::set_logger(&LOGGER).map_err(|_| Error::CustomStr("A logger is already installed"))?;
    log::set_max_level(log::STATIC_MAX_LEVEL);
    Ok(())
}

pub fn set_output(output: &'static mut (dyn Write + Send)) {
    *LOGGER.output.lock() = Some(output);
}
