//! Log subscriber setup.
//!
//! `LOG_FORMAT` picks `human` (default) or `json`. `RUST_LOG` wins when set;
//! otherwise `LOG_LEVEL` (default `info`) applies to gatehouse's own targets
//! and framework noise is held at `warn`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub type InitError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to `Human`.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Human
        }
    }
}

/// Settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Full filter directive, either `RUST_LOG` verbatim or built from `LOG_LEVEL`
    pub filter: String,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = lookup("LOG_FORMAT")
            .map(|s| LogFormat::parse(&s))
            .unwrap_or(LogFormat::Human);
        let filter = match lookup("RUST_LOG").filter(|s| !s.trim().is_empty()) {
            Some(directives) => directives,
            None => default_filter(lookup("LOG_LEVEL").as_deref().unwrap_or("info")),
        };
        Self { format, filter }
    }
}

/// Filter for gatehouse targets at `level`, with hyper and tower kept quiet.
pub fn default_filter(level: &str) -> String {
    format!("gatehouse={},axum=warn,tower=warn,hyper=warn", level.trim())
}

/// Install the global subscriber.
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init_tracing(settings: &LogSettings) -> Result<(), InitError> {
    let filter = EnvFilter::try_new(&settings.filter)?;
    let registry = tracing_subscriber::registry().with(filter);

    match settings.format {
        LogFormat::Human => registry
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_level(true),
            )
            .try_init()?,
    }

    tracing::info!(format = ?settings.format, filter = %settings.filter, "logging initialized");
    Ok(())
}

/// Resolve settings from the environment and install the subscriber.
pub fn init_tracing_from_env() -> Result<(), InitError> {
    init_tracing(&LogSettings::from_env())
}
