use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::time::OffsetTime, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = filter(&cfg.level)?;
    tracing_subscriber::registry()
        .with(output(cfg))
        .with(filter)
        .try_init()
        .map_err(|e| {
            // Both the dispatcher and the `log` bridge report a second install
            // as "already ... set/initialized".
            let msg = e.to_string();
            if msg.contains("already") {
                LoggerError::AlreadyInitialized
            } else {
                LoggerError::Setup(msg)
            }
        })
}

fn output(cfg: &LoggerConfig) -> BoxedLayer {
    match cfg.format {
        LoggerFormat::Text => fmt::layer()
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(local_rfc3339())
            .boxed(),
        LoggerFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(cfg.with_targets)
            .with_timer(local_rfc3339())
            .boxed(),
    }
}

fn filter(directives: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directives).map_err(|e| LoggerError::InvalidFilter {
        filter: directives.to_string(),
        reason: e.to_string(),
    })
}

/// Timestamps in the machine's offset, falling back to UTC when it cannot be read.
fn local_rfc3339() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::logger_init;

    #[test]
    fn filter_accepts_per_crate_directives() {
        assert!(filter("info").is_ok());
        assert!(filter("schtick_core=debug,warn").is_ok());
    }

    #[test]
    fn filter_rejects_unknown_level() {
        let err = filter("schtick_core=loud").unwrap_err();
        assert!(matches!(
            err,
            LoggerError::InvalidFilter { ref filter, .. } if filter == "schtick_core=loud"
        ));
    }

    #[test]
    fn only_first_install_wins() {
        let cfg = LoggerConfig {
            format: LoggerFormat::Json,
            ..LoggerConfig::default()
        };
        logger_init(&cfg).unwrap();
        tracing::info!(check = "installed", "logger up");
        assert_eq!(logger_init(&cfg), Err(LoggerError::AlreadyInitialized));
    }
}
