//! Structured log sink used by the engine.
//!
//! The machine never logs through a global: it forwards every message to an
//! injected [`LogSink`] handle. The default sink is [`NullSink`], which
//! discards everything. [`StdLogger`] bridges the sink onto the `log` crate
//! macros for applications that already run a `log`-based pipeline.

/// Severity of a log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    /// Human readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Fatal => "Fatal",
        }
    }
}

/// Module tag attached to every message emitted by the engine.
pub const LOG_MODULE: &str = "statecraft";

/// Sink interface the machine writes to.
///
/// Implementations must not call back into the machine; they receive the
/// module tag, the severity and the formatted message.
pub trait LogSink {
    fn write_log(&self, module: &str, level: LogLevel, message: &str);
}

/// Sink that discards all messages. The machine's default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn write_log(&self, _module: &str, _level: LogLevel, _message: &str) {}
}

/// Sink forwarding to the `log` crate macros, with the module as target.
///
/// `Fatal` has no `log` counterpart and is reported as an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdLogger;

impl LogSink for StdLogger {
    fn write_log(&self, module: &str, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => log::debug!(target: "statecraft", "[{module}] {message}"),
            LogLevel::Info => log::info!(target: "statecraft", "[{module}] {message}"),
            LogLevel::Warning => log::warn!(target: "statecraft", "[{module}] {message}"),
            LogLevel::Error | LogLevel::Fatal => {
                log::error!(target: "statecraft", "[{module}] {message}")
            }
        }
    }
}
