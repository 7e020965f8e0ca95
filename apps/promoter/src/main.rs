//! Promoter - promote registered users to admin or moderator.
//!
//! # Usage
//!
//! ```bash
//! export FIREBASE_DATABASE_URL=https://my-app-default-rtdb.firebaseio.com
//! export FIREBASE_AUTH=<id token or database secret>
//!
//! promoter make-admin john_doe
//! promoter make-moderator jane_smith
//! promoter list-admins --json
//!
//! # Offline, against a JSON export of the database
//! promoter --local-db export.json make-admin john_doe
//! ```

use clap::Parser;
use promoter::cli::{self, Cli};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    promoter::logging::init(cli.verbose);

    let mut stdout = std::io::stdout().lock();
    match cli::run(&cli, &mut stdout).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
