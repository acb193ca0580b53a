// 📝 Logging - tracing subscriber for the binaries
//
// Diagnostics go to stderr so that command output on stdout stays clean.
// The library only emits events; it never installs a subscriber itself.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter from a directive such as "info" or "aurum_calc=debug"
pub fn build_env_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::builder()
        .parse(directive)
        .with_context(|| format!("Invalid log filter '{}'", directive))
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init(directive: &str) -> Result<()> {
    let filter = build_env_filter(directive)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert!(build_env_filter("info").is_ok());
        assert!(build_env_filter("off").is_ok());
        assert!(build_env_filter("aurum_calc=debug,warn").is_ok());
        assert!(build_env_filter("aurum_calc=loud").is_err());
    }
}
