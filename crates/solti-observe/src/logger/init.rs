use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// Install the global subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] when a global subscriber is already set.
pub fn init_logger(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = cfg.level.to_filter()?;

    match cfg.format {
        LoggerFormat::Text => {
            let layer = fmt::layer()
                .with_ansi(cfg.use_color)
                .with_target(cfg.with_targets)
                .with_timer(local_timer());
            install(tracing_subscriber::registry().with(filter).with(layer))
        }
        LoggerFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(cfg.with_targets)
                .with_timer(local_timer());
            install(tracing_subscriber::registry().with(filter).with(layer))
        }
        LoggerFormat::Journald => journald(filter),
    }
}

fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn install<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e| {
        let s = e.to_string();
        if s.contains("already") {
            LoggerError::AlreadyInitialized
        } else {
            LoggerError::InitializationFailed(s)
        }
    })
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald(filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?;
    install(tracing_subscriber::registry().with(filter).with(layer))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald(_filter: EnvFilter) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoggerLevel;

    #[test]
    fn second_init_is_rejected() {
        let cfg = LoggerConfig {
            level: LoggerLevel::new("warn").unwrap(),
            use_color: false,
            ..Default::default()
        };
        // Another test in this binary may have won the race already.
        let _ = init_logger(&cfg);
        assert!(init_logger(&cfg).is_err());
    }

    #[test]
    fn timer_writes_rfc3339() {
        use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

        let mut out = String::new();
        local_timer().format_time(&mut Writer::new(&mut out)).unwrap();

        // 2026-01-02T03:04:05.123456789+00:00
        assert_eq!(out.as_bytes()[4], b'-', "{out}");
        assert_eq!(out.as_bytes()[10], b'T', "{out}");
        assert!(out.ends_with('Z') || out[out.len() - 6..].starts_with(['+', '-']), "{out}");
    }
}
