//! # Configuration
//!
//! Resolves command line flags and environment variables into the settings
//! a run needs. Sources, highest precedence first:
//!
//! 1. Command line flags (`--database-url`, `--local-db`, ...)
//! 2. Environment (`FIREBASE_DATABASE_URL`, `FIREBASE_AUTH`, `PROMOTER_SESSION_FILE`)
//! 3. Defaults (5 write attempts, 30 s timeout, session file in the config dir)

use crate::cli::Cli;
use crate::promoter::PromoterConfig;
use crate::session::SessionFile;
use promoter_firebase::ClientOptions;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no database configured: pass --database-url (or set FIREBASE_DATABASE_URL) or --local-db")]
    MissingStore,
}

/// Where user records live.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// A Realtime Database reached over REST.
    Firebase {
        database_url: String,
        options: ClientOptions,
    },
    /// A JSON file holding the database root, loaded into memory.
    LocalFile(PathBuf),
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    /// Session cache to mirror promotions into; `None` disables mirroring.
    pub session_file: Option<PathBuf>,
    pub promoter: PromoterConfig,
    /// Print outcomes as JSON instead of text.
    pub json: bool,
}

impl AppConfig {
    /// Build the configuration from parsed arguments.
    ///
    /// `--local-db` wins over a database URL, so a URL exported in the
    /// environment does not get in the way of offline runs.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let store = match (&cli.local_db, &cli.database_url) {
            (Some(path), _) => StoreConfig::LocalFile(path.clone()),
            (None, Some(url)) if !url.trim().is_empty() => StoreConfig::Firebase {
                database_url: url.trim().to_string(),
                options: ClientOptions {
                    auth: cli.auth.clone().filter(|a| !a.is_empty()),
                    timeout: Duration::from_secs(cli.timeout_secs),
                },
            },
            _ => return Err(ConfigError::MissingStore),
        };

        let session_file = if cli.no_session {
            None
        } else {
            cli.session_file.clone().or_else(SessionFile::default_path)
        };

        Ok(Self {
            store,
            session_file,
            promoter: PromoterConfig {
                max_attempts: cli.max_attempts,
            },
            json: cli.json,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["promoter"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn firebase_store_from_flags() {
        let cli = parse(&[
            "--database-url",
            "https://demo.firebaseio.com",
            "--auth",
            "tok",
            "--timeout-secs",
            "7",
            "--session-file",
            "/tmp/s.json",
            "list-admins",
        ]);
        let config = AppConfig::from_cli(&cli).unwrap();

        match config.store {
            StoreConfig::Firebase {
                database_url,
                options,
            } => {
                assert_eq!(database_url, "https://demo.firebaseio.com");
                assert_eq!(options.auth.as_deref(), Some("tok"));
                assert_eq!(options.timeout, Duration::from_secs(7));
            }
            other => panic!("expected Firebase store, got {:?}", other),
        }
        assert_eq!(config.session_file, Some(PathBuf::from("/tmp/s.json")));
        assert_eq!(config.promoter.max_attempts, 5);
    }

    #[test]
    fn local_db_wins_over_url() {
        let cli = parse(&[
            "--database-url",
            "https://demo.firebaseio.com",
            "--local-db",
            "db.json",
            "list-admins",
        ]);
        let config = AppConfig::from_cli(&cli).unwrap();
        assert!(matches!(config.store, StoreConfig::LocalFile(ref p) if p == &PathBuf::from("db.json")));
    }

    #[test]
    fn no_session_disables_mirroring() {
        let cli = parse(&["--local-db", "db.json", "--no-session", "make-admin", "alice"]);
        let config = AppConfig::from_cli(&cli).unwrap();
        assert_eq!(config.session_file, None);
    }

    #[test]
    fn max_attempts_and_json() {
        let cli = parse(&["--local-db", "db.json", "--max-attempts", "2", "list-admins", "--json"]);
        let config = AppConfig::from_cli(&cli).unwrap();
        assert_eq!(config.promoter.max_attempts, 2);
        assert!(config.json);
    }

    #[test]
    fn zero_attempts_rejected_by_parser() {
        let result = Cli::try_parse_from(["promoter", "--max-attempts", "0", "list-admins"]);
        assert!(result.is_err());
    }
}
