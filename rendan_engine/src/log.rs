//! Internal logging system for the Rendan engine
//!
//! This module provides:
//! - Customizable logger via the Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - A bridge into the `log` facade for applications using `env_logger` and friends
//! - Macros that log and build an [`Error`](crate::rendan::Error) in one step

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to route engine logs elsewhere (file, network, test capture).
///
/// # Example
///
/// ```no_run
/// use rendan_engine::rendan::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The log entry to process
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source component (e.g., "rendan::Renderer", "rendan::vulkan::Swapchain")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-frame chatter (command recording, acquire results)
    Trace,

    /// Development information
    Debug,

    /// Object creation, swapchain recreation
    Info,

    /// Recoverable problems (format fallback, suboptimal swapchain)
    Warn,

    /// Failures, logged with file:line
    Error,
}

impl LogSeverity {
    /// Matching level of the `log` facade
    pub fn to_log_level(self) -> log::Level {
        match self {
            LogSeverity::Trace => log::Level::Trace,
            LogSeverity::Debug => log::Level::Debug,
            LogSeverity::Info => log::Level::Info,
            LogSeverity::Warn => log::Level::Warn,
            LogSeverity::Error => log::Level::Error,
        }
    }
}

/// Default logger implementation using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity_str = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };

        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                severity_str,
                source,
                entry.message,
                file,
                line
            );
        } else {
            println!(
                "[{}] [{}] [{}] {}",
                timestamp,
                severity_str,
                source,
                entry.message
            );
        }
    }
}

/// Logger forwarding engine entries into the `log` facade
///
/// The entry source becomes the log target, so `RUST_LOG=rendan::vulkan=debug`
/// style filters work with `env_logger`.
pub struct LogCrateLogger;

impl Logger for LogCrateLogger {
    fn log(&self, entry: &LogEntry) {
        let level = entry.severity.to_log_level();
        if !log::log_enabled!(target: entry.source.as_str(), level) {
            return;
        }
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => log::logger().log(
                &log::Record::builder()
                    .args(format_args!("{}", entry.message))
                    .level(level)
                    .target(&entry.source)
                    .file(Some(file))
                    .line(Some(line))
                    .build(),
            ),
            _ => log::logger().log(
                &log::Record::builder()
                    .args(format_args!("{}", entry.message))
                    .level(level)
                    .target(&entry.source)
                    .build(),
            ),
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (very verbose, per-frame)
///
/// # Example
///
/// ```no_run
/// # use rendan_engine::engine_trace;
/// engine_trace!("rendan::Renderer", "Acquired image {}", 2);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::rendan::Engine::log(
            $crate::rendan::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (development information)
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::rendan::Engine::log(
            $crate::rendan::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
///
/// # Example
///
/// ```no_run
/// # use rendan_engine::engine_info;
/// engine_info!("rendan::vulkan", "Logical device created");
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::rendan::Engine::log(
            $crate::rendan::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::rendan::Engine::log(
            $crate::rendan::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```no_run
/// # use rendan_engine::engine_error;
/// engine_error!("rendan::vulkan", "Failed to create render pass: {}", "ERROR_OUT_OF_HOST_MEMORY");
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::rendan::Engine::log_detailed(
            $crate::rendan::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log at ERROR level and build an `Error::$kind(message)`
///
/// # Example
///
/// ```no_run
/// # use rendan_engine::engine_err;
/// # use rendan_engine::rendan::Error;
/// let err: Error = engine_err!(InitError, "rendan::vulkan", "Failed to create swapchain: {}", -4);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($kind:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::rendan::Engine::log_detailed(
            $crate::rendan::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::rendan::Error::$kind(message)
    }};
}

/// Log at ERROR level and return `Err(Error::$kind(message))` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($kind:ident, $source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($kind, $source, $($arg)*))
    };
}

/// Log at WARN level and build an `Error::$kind(message)` (recoverable conditions)
#[macro_export]
macro_rules! engine_warn_err {
    ($kind:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::rendan::Engine::log(
            $crate::rendan::log::LogSeverity::Warn,
            $source,
            message.clone()
        );
        $crate::rendan::Error::$kind(message)
    }};
}

/// Log at WARN level and return `Err(Error::$kind(message))` from the current function
#[macro_export]
macro_rules! engine_bail_warn {
    ($kind:ident, $source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($kind, $source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
