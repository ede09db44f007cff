//! Colored stderr logger for the binaries.
//!
//! The library only talks to the `log` facade; call [`init`] once from `main`.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

static LOGGER: StaticLogger = StaticLogger;

pub struct StaticLogger;

impl Log for StaticLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mark = match record.level() {
            Level::Debug => "{DEBUG}".bright_black(),
            Level::Trace => "{TRACE}".bright_black(),
            Level::Info => "{INFO}".cyan(),
            Level::Warn => "{WARN}".yellow(),
            Level::Error => "{ERROR}".red(),
        }
        .bold();
        eprintln!(
            "{mark:<10}{:>30} {:>4} {}",
            record.module_path().unwrap_or(""),
            record.line().unwrap_or(0),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Install the logger. Later calls only adjust the level.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    static INITIALIZED: AtomicBool = AtomicBool::new(false);
    if INITIALIZED.fetch_or(true, Ordering::SeqCst) {
        log::set_max_level(level);
        return Ok(());
    }
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// Parse a level name as given on the command line (`warn`, `debug`, ...).
pub fn parse_level(name: &str) -> LevelFilter {
    name.parse().unwrap_or(LevelFilter::Warn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("INFO"), LevelFilter::Info);
        assert_eq!(parse_level("loud"), LevelFilter::Warn);
    }

    #[test]
    fn test_init_works_with_anyhow_context() {
        use anyhow::Context;

        fn is_std_error<E: std::error::Error + Send + Sync + 'static>() {}
        is_std_error::<SetLoggerError>();

        init(LevelFilter::Info).context("installing logger").unwrap();
        init(LevelFilter::Debug).context("installing logger").unwrap();
        assert_eq!(log::max_level(), LevelFilter::Debug);
    }
}
