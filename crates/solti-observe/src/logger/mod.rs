mod config;
mod error;
mod format;
mod init;
mod level;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;
pub use init::init_logger;
pub use level::LoggerLevel;
