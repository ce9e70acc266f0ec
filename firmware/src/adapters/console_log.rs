//! Console logger for host builds.
//!
//! On target the firmware's own logger backs the `log` facade; on the
//! host this one writes `LEVEL target - message` lines to stderr.

use std::io::Write;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Install as the global logger.  Fails if one is already set.
    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.level);
        Ok(())
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{:<5} {} - {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
