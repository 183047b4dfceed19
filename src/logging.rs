use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

use crate::app_config::RunMode;

// @module: Log backend and per-run log context

/// Log context handed to the controller and workers at construction.
///
/// Every record emitted through it carries the run mode as its target, so the
/// dispatcher never reads a process-wide logger handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    target: String,
}

impl LogContext {
    /// Context for a run in `mode`
    pub fn for_mode(mode: RunMode) -> Self {
        Self::named(mode.as_str())
    }

    /// Context with an arbitrary target name
    pub fn named(target: &str) -> Self {
        Self {
            target: format!("mangadispatch::{}", target),
        }
    }

    /// Target attached to every record
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn error(&self, message: &str) {
        log::error!(target: &self.target, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        log::warn!(target: &self.target, "{}", message);
    }

    pub fn info(&self, message: &str) {
        log::info!(target: &self.target, "{}", message);
    }

    pub fn debug(&self, message: &str) {
        log::debug!(target: &self.target, "{}", message);
    }

    /// Whether debug records would be written
    pub fn debug_enabled(&self) -> bool {
        log::log_enabled!(target: &self.target, Level::Debug)
    }
}

// @struct: Custom logger implementation
pub struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Records are filtered by log::max_level, which can be raised later
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    // @returns: Target without the crate prefix
    fn short_target(target: &str) -> &str {
        target.strip_prefix("mangadispatch::").unwrap_or(target)
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} [{}] {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                Self::short_target(record.target()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
