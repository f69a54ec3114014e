//! Log subscriber for the CLI and embedding hosts.
//!
//! `RUST_LOG` filters as usual. Without it the crate logs at `info` and
//! everything else at `warn`. `ARCWALLET_LOG_FORMAT` picks the line format.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,arcwallet=info";

/// Line format written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" | "text" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }

    /// `ARCWALLET_LOG_FORMAT`, or JSON when `ARCWALLET_LOG_JSON=1`.
    pub fn from_env() -> Self {
        if let Some(format) = std::env::var("ARCWALLET_LOG_FORMAT").ok().and_then(|v| Self::from_str(&v)) {
            return format;
        }
        match std::env::var("ARCWALLET_LOG_JSON").as_deref() {
            Ok("1") => LogFormat::Json,
            _ => LogFormat::default(),
        }
    }
}

/// Install the stderr subscriber in the format chosen by the environment.
pub fn init_logging() { init_logging_with(LogFormat::from_env()); }

/// Install the stderr subscriber. Returns false when one was already set.
pub fn init_logging_with(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(LogFormat::from_str("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_str(" compact "), Some(LogFormat::Compact));
        assert_eq!(LogFormat::from_str("text"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::from_str("xml"), None);
    }

    #[test]
    fn test_second_install_is_refused() {
        init_logging_with(LogFormat::Compact);
        assert!(!init_logging_with(LogFormat::Json));
    }
}
