//! # Logging
//!
//! Installs the `tracing-subscriber` formatter for the binary. `RUST_LOG`
//! wins when set; otherwise the `-v` count picks the level for this
//! workspace's crates and everything else stays at `warn`.

use tracing_subscriber::EnvFilter;

/// Crates whose level follows `-v`.
const WORKSPACE_TARGETS: [&str; 3] = ["promoter", "promoter_core", "promoter_firebase"];

/// Level name for a `-v` count.
#[must_use]
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directives used when `RUST_LOG` is not set.
#[must_use]
pub fn default_directives(verbosity: u8) -> String {
    let level = level_for(verbosity);
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        WORKSPACE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level)),
    );
    directives.join(",")
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for command output. Calling this twice is a no-op.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn directives_cover_workspace_crates() {
        assert_eq!(
            default_directives(2),
            "warn,promoter=debug,promoter_core=debug,promoter_firebase=debug"
        );
        assert!(EnvFilter::try_new(default_directives(0)).is_ok());
    }
}
