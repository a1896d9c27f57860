// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keeper - a personal secrets vault.
//!
//! This is the command-line entry point.

mod commands;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use keeper_config::KeeperConfig;
use keeper_core::{GENERIC_FAILURE, KeeperError, RecordKind};

/// Keeper - a personal secrets vault.
#[derive(Parser, Debug)]
#[command(name = "keeper", version, about, long_about = None)]
struct Cli {
    /// Configuration file. Without it the XDG hierarchy is searched.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Bearer token obtained from `keeper login`.
#[derive(Args, Debug)]
struct TokenArg {
    #[arg(long, env = "KEEPER_TOKEN", hide_env_values = true)]
    token: String,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account. The password comes from KEEPER_PASSWORD or a prompt.
    Register { login: String },
    /// Log in and print a bearer token.
    Login { login: String },
    /// Seal and store a secret. The value comes from KEEPER_SECRET or a prompt.
    Store {
        #[command(flatten)]
        auth: TokenArg,
        #[arg(long, default_value = "text", value_parser = parse_kind)]
        kind: RecordKind,
        key: String,
    },
    /// Fetch and print a stored secret.
    Fetch {
        #[command(flatten)]
        auth: TokenArg,
        #[arg(long, default_value = "text", value_parser = parse_kind)]
        kind: RecordKind,
        key: String,
    },
    /// Store or fetch bank cards.
    #[command(subcommand)]
    Card(CardCommands),
    /// Check that the vault database is reachable.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CardCommands {
    /// Store a card. Number and CVC come from KEEPER_CARD_NUMBER and
    /// KEEPER_CARD_CVC or prompts.
    Store {
        #[command(flatten)]
        auth: TokenArg,
        #[arg(long)]
        holder: String,
        /// Expiry as MM/YY.
        #[arg(long)]
        expiry: String,
    },
    /// Fetch the card ending in the given four digits.
    Fetch {
        #[command(flatten)]
        auth: TokenArg,
        last_four: String,
    },
}

/// Record kinds reachable through `store`/`fetch`. Cards have their own
/// subcommand so their payload is always validated.
fn parse_kind(s: &str) -> Result<RecordKind, String> {
    match RecordKind::from_str(s) {
        Ok(RecordKind::BankCard) => Err("bank cards are managed with `keeper card`".to_string()),
        Ok(kind) => Ok(kind),
        Err(_) => Err(format!("unknown kind `{s}`, expected login-password or text")),
    }
}

fn load_config(path: Option<&PathBuf>) -> KeeperConfig {
    let loaded = match path {
        Some(path) => keeper_config::load_and_validate_path(path),
        None => keeper_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            keeper_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr so stdout stays clean for tokens and secrets.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keeper={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

async fn run(command: Commands, config: &KeeperConfig) -> Result<(), KeeperError> {
    match command {
        Commands::Register { login } => commands::run_register(config, &login).await,
        Commands::Login { login } => commands::run_login(config, &login).await,
        Commands::Store { auth, kind, key } => {
            commands::run_store(config, &auth.token, kind, &key).await
        }
        Commands::Fetch { auth, kind, key } => {
            commands::run_fetch(config, &auth.token, kind, &key).await
        }
        Commands::Card(CardCommands::Store {
            auth,
            holder,
            expiry,
        }) => commands::run_card_store(config, &auth.token, &holder, &expiry).await,
        Commands::Card(CardCommands::Fetch { auth, last_four }) => {
            commands::run_card_fetch(config, &auth.token, &last_four).await
        }
        Commands::Status { json } => commands::run_status(config, json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.service.log_level);

    if let Err(e) = run(cli.command, &config).await {
        let message = e.public_message();
        if message == GENERIC_FAILURE {
            tracing::error!(error = %e, "command failed");
        }
        eprintln!("keeper: {message}");
        std::process::exit(1);
    }
}
