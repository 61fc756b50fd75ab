//! Tracing setup and credential redaction.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber, writing human-readable logs to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` over `warn`.
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Filter directives used when `RUST_LOG` is unset.
///
/// Verbose mode covers both the library and the `storyboard` binary target.
#[must_use]
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "storyboard=debug,storyboard_ai=debug,warn"
    } else {
        "warn"
    }
}

/// Mask a secret for display, keeping only a short prefix.
#[must_use]
pub fn redact(secret: &str) -> String {
    let secret = secret.trim();
    if secret.is_empty() {
        return String::new();
    }
    let prefix: String = secret.chars().take(3).collect();
    if secret.chars().count() <= 8 {
        "[REDACTED]".to_string()
    } else {
        format!("{prefix}...[REDACTED]")
    }
}
