//! Tracing/logging initialization.
//!
//! `RUST_LOG` selects the filter (default `info`); `LOG_FORMAT` selects JSON
//! (default) or human-readable `pretty` output.

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> anyhow::Result<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("json") => Ok(LogFormat::Json),
            Some("pretty") => Ok(LogFormat::Pretty),
            Some(other) => bail!("unsupported LOG_FORMAT '{other}' (expected json or pretty)"),
        }
    }
}

/// Install the global subscriber.
///
/// Fails on an invalid `RUST_LOG`/`LOG_FORMAT` or when a subscriber is already installed.
pub fn try_init() -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => {
            EnvFilter::try_new(&directives).with_context(|| format!("invalid RUST_LOG '{directives}'"))?
        }
        Err(_) => EnvFilter::new("info"),
    };
    let format = LogFormat::from_env()?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = match format {
        LogFormat::Json => builder.json().with_timer(SystemTime).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|err| anyhow::anyhow!("installing the global tracing subscriber: {err}"))?;

    ::tracing::debug!(?format, "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_json() {
        assert_eq!(LogFormat::parse(None).unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" ")).unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")).unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn unknown_format_is_an_error() {
        let err = LogFormat::parse(Some("xml")).unwrap_err();
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn second_install_fails_but_init_stays_quiet() {
        crate::init();
        assert!(try_init().is_err());
        crate::init();
    }
}
