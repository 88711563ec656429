//! Stderr logger for the command-line runner

use std::io::Write;
use std::str::FromStr;
use log::{LevelFilter, Log, Metadata, Record};
use crate::error::PlatformError;

pub const LOG_ENV: &str = "PGG_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "[{:<5} {}] {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`).
pub fn parse_level(raw: &str) -> Result<LevelFilter, PlatformError> {
    LevelFilter::from_str(raw.trim())
        .map_err(|_| PlatformError::Config(format!("{}={:?}: unknown log level", LOG_ENV, raw)))
}

/// Level from `PGG_LOG`, `info` when unset
pub fn level_from_env() -> Result<LevelFilter, PlatformError> {
    match std::env::var(LOG_ENV) {
        Ok(raw) => parse_level(&raw),
        Err(_) => Ok(LevelFilter::Info),
    }
}

/// Install the stderr logger. Only the first call in a process takes effect.
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN ").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::Off);
        assert!(parse_level("loud").is_err());
    }
}
