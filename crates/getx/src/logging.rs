#![forbid(unsafe_code)]

//! Log output for getx applications.
//!
//! The library crates only emit `tracing` events. This module installs a
//! global `tracing-subscriber` fmt subscriber so those events are printed.
//!
//! # Environment
//!
//! | Variable | Values |
//! |---|---|
//! | `GETX_LOG` | `off`/`0`/`false` disables, `on`/`1`/`true` uses the default filter, anything else is an `EnvFilter` directive |
//! | `GETX_LOG_JSON` | `1`/`true` selects JSON lines (needs the `json` feature) |

use tracing_subscriber::EnvFilter;

/// Default filter: getx crates at `info`, everything else at `warn`.
pub const DEFAULT_FILTER: &str = "warn,getx=info,getx_reactive=info,getx_di=info,getx_nav=info";

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub enabled: bool,
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Logging switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Read `GETX_LOG` and `GETX_LOG_JSON` through `lookup`.
    ///
    /// Pass `|k| std::env::var(k).ok()` for the process environment.
    #[must_use]
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup("GETX_LOG") {
            let value = raw.trim();
            match value.to_ascii_lowercase().as_str() {
                "" | "on" | "1" | "true" => {}
                "off" | "0" | "false" => config.enabled = false,
                _ => config.filter = value.to_string(),
            }
        }
        if let Some(raw) = lookup("GETX_LOG_JSON") {
            config.json = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true");
        }
        config
    }

    /// Build the [`EnvFilter`] for this config.
    pub fn env_filter(&self) -> Result<EnvFilter, LogInitError> {
        EnvFilter::try_new(&self.filter).map_err(|err| LogInitError::Filter {
            directive: self.filter.clone(),
            message: err.to_string(),
        })
    }
}

/// Installing the subscriber failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogInitError {
    /// The filter directive did not parse.
    Filter { directive: String, message: String },
    /// JSON output was requested without the `json` feature.
    JsonUnavailable,
    /// A global subscriber is already installed.
    AlreadySet(String),
}

impl std::fmt::Display for LogInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filter { directive, message } => {
                write!(f, "invalid log filter '{directive}': {message}")
            }
            Self::JsonUnavailable => write!(f, "JSON log output needs the `json` feature"),
            Self::AlreadySet(message) => write!(f, "global subscriber already set: {message}"),
        }
    }
}

impl std::error::Error for LogInitError {}

/// Install the global subscriber described by `config`.
///
/// Returns `Ok(false)` when logging is disabled.
pub fn init_logging(config: &LogConfig) -> Result<bool, LogInitError> {
    if !config.enabled {
        return Ok(false);
    }
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        #[cfg(feature = "json")]
        {
            builder.json().try_init()
        }
        #[cfg(not(feature = "json"))]
        {
            return Err(LogInitError::JsonUnavailable);
        }
    } else {
        builder.try_init()
    };
    installed.map_err(|err| LogInitError::AlreadySet(err.to_string()))?;
    tracing::debug!(filter = %config.filter, json = config.json, "logging installed");
    Ok(true)
}
