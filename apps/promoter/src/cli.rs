//! # CLI Module
//!
//! Command definitions and handlers.
//!
//! Each `cmd_*` handler runs one operation against a ready [`Promoter`] and
//! writes its report to `out`; [`run`] wires configuration, store and session
//! cache together for the binary.

use crate::config::{AppConfig, DEFAULT_TIMEOUT_SECS, StoreConfig};
use crate::promoter::{DEFAULT_MAX_ATTEMPTS, Promoter, PromoterConfig};
use crate::session::SessionFile;
use crate::store::{FirebaseStore, LocalFileStore, StoreError, UserStore};
use clap::{ArgAction, Parser, Subcommand};
use promoter_core::{PrivilegedUser, PromotionOutcome, Role};
use promoter_firebase::FirebaseClient;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

// =============================================================================
// ARGUMENTS
// =============================================================================

/// Promote registered users to admin or moderator.
#[derive(Parser, Debug)]
#[command(name = "promoter", version, about, long_about = None)]
pub struct Cli {
    /// Realtime Database URL (e.g. https://my-app-default-rtdb.firebaseio.com)
    #[arg(long, env = "FIREBASE_DATABASE_URL", value_name = "URL")]
    pub database_url: Option<String>,

    /// ID token or database secret sent as the `auth` query parameter
    #[arg(long, env = "FIREBASE_AUTH", hide_env_values = true, value_name = "TOKEN")]
    pub auth: Option<String>,

    /// Use a JSON file holding the database root instead of Firebase
    #[arg(long, value_name = "FILE")]
    pub local_db: Option<PathBuf>,

    /// Session cache to update when promoting your own username
    #[arg(long, env = "PROMOTER_SESSION_FILE", value_name = "FILE")]
    pub session_file: Option<PathBuf>,

    /// Never touch the session cache
    #[arg(long)]
    pub no_session: bool,

    /// Conditional write attempts before giving up on a busy record
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Promote a user to admin
    MakeAdmin {
        /// Username (key under registered_users)
        username: String,
    },

    /// Promote a user to moderator
    MakeModerator {
        /// Username (key under registered_users)
        username: String,
    },

    /// List users whose role is set and not "user"
    ListAdmins,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors that stop the CLI before or after an operation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Firebase(#[from] promoter_firebase::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

// =============================================================================
// COMMAND HANDLERS
// =============================================================================

/// Promote `username` to `role` and report the outcome.
pub async fn cmd_promote<S: UserStore>(
    promoter: &Promoter<S>,
    username: &str,
    role: Role,
    json: bool,
    out: &mut impl Write,
) -> Result<PromotionOutcome, CliError> {
    let outcome = promoter.promote(username, role).await;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&outcome)?)?;
    } else {
        writeln!(out, "{}", outcome.message())?;
        if let PromotionOutcome::Promoted(p) = &outcome {
            if p.session_updated {
                writeln!(out, "Updated current user session")?;
            }
        }
    }

    Ok(outcome)
}

/// List privileged users.
pub async fn cmd_list_admins<S: UserStore>(
    promoter: &Promoter<S>,
    json: bool,
    out: &mut impl Write,
) -> Result<Vec<PrivilegedUser>, CliError> {
    let users = promoter.list_privileged_users().await;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&users)?)?;
    } else if users.is_empty() {
        writeln!(out, "No users with elevated roles")?;
    } else {
        write!(out, "{}", format_users(&users))?;
    }

    Ok(users)
}

/// Run `command` against `promoter`.
///
/// Returns `true` when the command succeeded (a promotion went through, or
/// the listing ran).
pub async fn execute<S: UserStore>(
    promoter: &Promoter<S>,
    command: &Commands,
    json: bool,
    out: &mut impl Write,
) -> Result<bool, CliError> {
    match command {
        Commands::MakeAdmin { username } => {
            let outcome = cmd_promote(promoter, username, Role::Admin, json, out).await?;
            Ok(outcome.is_promoted())
        }
        Commands::MakeModerator { username } => {
            let outcome = cmd_promote(promoter, username, Role::Moderator, json, out).await?;
            Ok(outcome.is_promoted())
        }
        Commands::ListAdmins => {
            cmd_list_admins(promoter, json, out).await?;
            Ok(true)
        }
    }
}

/// Entry point used by the binary.
pub async fn run(cli: &Cli, out: &mut impl Write) -> Result<bool, CliError> {
    let config = AppConfig::from_cli(cli)?;

    match &config.store {
        StoreConfig::Firebase {
            database_url,
            options,
        } => {
            info!(database_url, "using Realtime Database");
            let client = FirebaseClient::with_options(database_url, options.clone())?;
            let promoter = build_promoter(FirebaseStore::new(client), &config);
            execute(&promoter, &cli.command, config.json, out).await
        }
        StoreConfig::LocalFile(path) => {
            let store = LocalFileStore::open(path)?;
            info!(path = %store.path().display(), "using local database file");
            let promoter = build_promoter(store, &config);
            execute(&promoter, &cli.command, config.json, out).await
        }
    }
}

fn build_promoter<S: UserStore>(store: S, config: &AppConfig) -> Promoter<S> {
    let promoter = Promoter::new(store).with_config(PromoterConfig {
        max_attempts: config.promoter.max_attempts,
    });
    match &config.session_file {
        Some(path) => promoter.with_session(SessionFile::new(path.clone())),
        None => promoter,
    }
}

// =============================================================================
// TEXT OUTPUT
// =============================================================================

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render users as an aligned table.
#[must_use]
pub fn format_users(users: &[PrivilegedUser]) -> String {
    let header = ["USERNAME", "ROLE", "PROMOTED AT", "CREATED AT"];
    let rows: Vec<[String; 4]> = users
        .iter()
        .map(|u| {
            [
                u.username.clone(),
                cell(Some(&u.role)),
                cell(u.promoted_at.as_ref()),
                cell(u.created_at.as_ref()),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut output = String::new();
    let line = |cells: [&str; 4]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{:<width$}", c, width = w))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    output.push_str(&line(header));
    for row in &rows {
        output.push_str(&line([&row[0], &row[1], &row[2], &row[3]]));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_aligns_columns() {
        let users = vec![
            PrivilegedUser {
                username: "alice".to_string(),
                role: json!("admin"),
                promoted_at: Some(json!(1700000000000u64)),
                created_at: Some(json!(100)),
            },
            PrivilegedUser {
                username: "bo".to_string(),
                role: json!("moderator"),
                promoted_at: None,
                created_at: Some(json!("2024-01-01")),
            },
        ];

        let table = format_users(&users);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "USERNAME  ROLE       PROMOTED AT    CREATED AT");
        assert_eq!(lines[1], "alice     admin      1700000000000  100");
        assert_eq!(lines[2], "bo        moderator  -              2024-01-01");
    }

    #[test]
    fn non_string_roles_render_as_json() {
        let users = vec![PrivilegedUser {
            username: "x".to_string(),
            role: json!(1),
            promoted_at: None,
            created_at: None,
        }];
        let table = format_users(&users);
        assert_eq!(table.lines().nth(1), Some("x         1     -            -"));
    }
}
