use std::str::FromStr;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

/// Verbosity of `Logger`, set with `LOG_LEVEL`. A level also enables every
/// level listed before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Silent,
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for Level {
    type Err = String;

    /// Case insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Level::Silent),
            "error" => Ok(Level::Error),
            "warn" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// The logging capability handed to every parser and to the dataset/API builders.
pub trait Log: Send + Sync {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Level-gated logger forwarding to `tracing`.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: Level,
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(Level::Info)
    }
}

impl Logger {
    pub fn new(level: Level) -> Self {
        Logger { level }
    }

    /// Info when LOG_LEVEL is unset or not a level name.
    pub fn from_env() -> Self {
        Logger::new(level_or_default(std::env::var("LOG_LEVEL").ok().as_deref()))
    }

    pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;

        Ok(())
    }

    fn enabled(&self, level: Level) -> bool {
        self.level >= level
    }
}

fn level_or_default(value: Option<&str>) -> Level {
    value.and_then(|v| v.parse().ok()).unwrap_or(Level::Info)
}

impl Log for Logger {
    fn debug(&self, msg: &str) {
        if self.enabled(Level::Debug) {
            tracing::debug!("{}", msg);
        }
    }

    fn info(&self, msg: &str) {
        if self.enabled(Level::Info) {
            tracing::info!("{}", msg);
        }
    }

    fn warn(&self, msg: &str) {
        if self.enabled(Level::Warn) {
            tracing::warn!("{}", msg);
        }
    }

    fn error(&self, msg: &str) {
        if self.enabled(Level::Error) {
            tracing::error!("{}", msg);
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Log for NoopLogger {
    fn debug(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Keeps every message with its level, for tests and for callers that report afterwards.
#[derive(Default)]
pub struct MemoryLogger {
    messages: Mutex<Vec<(Level, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        MemoryLogger::default()
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.lock().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    fn push(&self, level: Level, msg: &str) {
        self.messages.lock().push((level, msg.to_string()));
    }
}

impl Log for MemoryLogger {
    fn debug(&self, msg: &str) {
        self.push(Level::Debug, msg);
    }

    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}
