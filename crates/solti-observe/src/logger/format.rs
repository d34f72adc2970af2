use std::{fmt, str::FromStr};

use crate::logger::error::LoggerError;

/// Output backend for the agent's log stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggerFormat {
    /// Human-readable lines on stdout.
    #[default]
    Text,
    /// One JSON object per event on stdout.
    Json,
    /// Native systemd journal (Linux, `journald` feature).
    Journald,
}

impl LoggerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggerFormat::Text => "text",
            LoggerFormat::Json => "json",
            LoggerFormat::Journald => "journald",
        }
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LoggerFormat::Text),
            "json" => Ok(LoggerFormat::Json),
            "journald" | "journal" => {
                if cfg!(all(target_os = "linux", feature = "journald")) {
                    Ok(LoggerFormat::Journald)
                } else {
                    Err(LoggerError::JournaldNotSupported)
                }
            }
            _ => Err(LoggerError::InvalidFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" JSON ".parse::<LoggerFormat>().unwrap(), LoggerFormat::Json);
        assert_eq!("Text".parse::<LoggerFormat>().unwrap(), LoggerFormat::Text);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "yaml".parse::<LoggerFormat>().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(ref s) if s == "yaml"));
    }

    #[cfg(not(all(target_os = "linux", feature = "journald")))]
    #[test]
    fn journald_requires_feature() {
        let err = "journald".parse::<LoggerFormat>().unwrap_err();
        assert!(matches!(err, LoggerError::JournaldNotSupported));
    }

    #[test]
    fn display_matches_parse_input() {
        for f in [LoggerFormat::Text, LoggerFormat::Json] {
            assert_eq!(f.to_string().parse::<LoggerFormat>().unwrap(), f);
        }
    }
}
