//! Tracing subscriber setup for the binary.
//!
//! Priority of the log filter, highest first:
//!
//! 1. `CODOSCOPE_LOG` env var
//! 2. `RUST_LOG` env var
//! 3. `-v` / `-q` flags (debug / error)
//! 4. `[logging] level` from the configuration file
//! 5. `warn`

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV_VAR: &str = "CODOSCOPE_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Verbose wins when both flags are given.
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Installs the global subscriber writing to stderr. A second call is a
/// no-op.
pub fn init_subscriber(verbosity: Verbosity, configured: Option<&str>) {
    let filter = build_env_filter(verbosity, configured);
    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true);

    let result = if verbosity == Verbosity::Verbose {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.with_timer(fmt::time::uptime()))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.without_time().compact())
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn build_env_filter(verbosity: Verbosity, configured: Option<&str>) -> EnvFilter {
    if let Some(filter) = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
    {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    fallback_filter(verbosity, configured)
}

fn fallback_filter(verbosity: Verbosity, configured: Option<&str>) -> EnvFilter {
    let level = verbosity.default_level();
    let directive = match (verbosity, configured) {
        (Verbosity::Normal, Some(configured)) => configured.to_string(),
        (Verbosity::Verbose, _) => format!("{level},codoscope=debug"),
        _ => level.to_string(),
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
    }

    #[test]
    fn default_level_mapping() {
        assert_eq!(Verbosity::Quiet.default_level(), Level::ERROR);
        assert_eq!(Verbosity::Normal.default_level(), Level::WARN);
        assert_eq!(Verbosity::Verbose.default_level(), Level::DEBUG);
    }

    #[test]
    fn configured_level_applies_without_flags() {
        let filter = fallback_filter(Verbosity::Normal, Some("codoscope=trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
        let filter = fallback_filter(Verbosity::Quiet, Some("codoscope=trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn bad_configured_level_falls_back() {
        let filter = fallback_filter(Verbosity::Normal, Some("codoscope=loud"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn init_twice_is_tolerated() {
        init_subscriber(Verbosity::Quiet, None);
        init_subscriber(Verbosity::Verbose, None);
    }
}
