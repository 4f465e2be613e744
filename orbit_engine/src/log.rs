//! Engine log records and the console sink
//!
//! Every subsystem reports through the `engine_*!` macros, tagging messages
//! with an `orbit::<Subsystem>` source. Records reach the logger installed in
//! `Engine` (the colored console by default) if they pass its minimum
//! severity. Errors carry the file and line that raised them; the
//! `engine_err!` family also turns them into an `Error` value.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for engine log records
///
/// # Example
///
/// ```no_run
/// use std::sync::Mutex;
/// use orbit_engine::orbit::log::{Logger, LogEntry, LogSeverity};
///
/// /// Keeps warnings for an in-game console
/// struct ConsoleHistory(Mutex<Vec<String>>);
///
/// impl Logger for ConsoleHistory {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity >= LogSeverity::Warn {
///             self.0.lock().unwrap().push(entry.message.clone());
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Reporting subsystem, such as "orbit::Screen" or "orbit::headless"
    pub source: String,
    pub message: String,
    /// Set together with `line` for ERROR records
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// `file:line` of the code that raised the record, if known
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Severity of a record, from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    /// Recoverable failure: missing driver, refused content, skipped draw
    Warn,
    /// Broken precondition, reported with its location
    Error,
}

impl LogSeverity {
    /// Fixed-width tag used in console output
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Colored console logger installed by default
///
/// Lines read `[time] [SEVERITY] [source] message`, followed by
/// `(file:line)` when the record has a location. Warnings and errors go to
/// stderr, the rest to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Uncolored console line for `entry`
    pub fn format_line(entry: &LogEntry) -> String {
        let time: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            time.format("%H:%M:%S%.3f"),
            entry.severity.label(),
            entry.source,
            entry.message
        );
        if let Some(location) = entry.location() {
            line.push_str(&format!(" ({})", location));
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let time: DateTime<Local> = entry.timestamp.into();
        let label = entry.severity.label();
        let tag = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };
        let location = entry.location().map(|at| format!(" ({})", at)).unwrap_or_default();
        let line = format!(
            "[{}] [{}] [{}] {}{}",
            time.format("%H:%M:%S%.3f"),
            tag,
            entry.source.bright_blue(),
            entry.message,
            location.dimmed()
        );

        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Send a formatted record of the given severity to the engine logger
///
/// ```no_run
/// # use orbit_engine::engine_log;
/// engine_log!(Info, "orbit::Screen", "Resolution {}x{}", 800, 600);
/// ```
#[macro_export]
macro_rules! engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::orbit::Engine::log(
            $crate::orbit::log::LogSeverity::$severity,
            $source,
            format!($($arg)*)
        )
    };
}

#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Trace, $source, $($arg)*) };
}

/// ```no_run
/// # use orbit_engine::engine_debug;
/// engine_debug!("orbit::Screen", "Tracking {} resources", 3);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Debug, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Info, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Warn, $source, $($arg)*) };
}

/// Log an ERROR record located at the call site
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::orbit::Engine::log_detailed(
            $crate::orbit::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log a located ERROR and wrap its message in `Error::$variant`
#[doc(hidden)]
#[macro_export]
macro_rules! engine_fail {
    ($variant:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::orbit::Engine::log_detailed(
            $crate::orbit::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::orbit::Error::$variant(message)
    }};
}

/// Log an ERROR and evaluate to `Error::BackendError`
///
/// ```no_run
/// # use orbit_engine::engine_err;
/// # fn f() -> orbit_engine::orbit::Result<()> {
/// let value: Option<u32> = None;
/// let _v = value.ok_or_else(|| engine_err!("orbit::Screen", "missing value"))?;
/// # Ok(()) }
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => { $crate::engine_fail!(BackendError, $source, $($arg)*) };
}

/// Log an ERROR and return `Err(Error::BackendError)`
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log an ERROR and evaluate to `Error::InvalidState`
#[macro_export]
macro_rules! engine_state_err {
    ($source:expr, $($arg:tt)*) => { $crate::engine_fail!(InvalidState, $source, $($arg)*) };
}

/// Log an ERROR and return `Err(Error::InvalidState)`
#[macro_export]
macro_rules! engine_bail_state {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_state_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
