use std::io::IsTerminal;

use crate::logger::{format::LoggerFormat, level::LoggerLevel};

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: LoggerLevel,
    /// Print the event target (`solti.build.watcher`, ...) next to each line.
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}
