// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Each command opens the service, performs one vault operation and closes
//! the store again. Secrets are read from the environment or a TTY prompt,
//! never from argv.

use std::io::Write;

use keeper_auth::RequestCredentials;
use keeper_config::KeeperConfig;
use keeper_core::{BankCard, HealthStatus, KeeperError, RecordKind};
use keeper_service::KeeperService;
use keeper_vault::prompt::PASSWORD_ENV_VAR;
use keeper_vault::{read_secret, read_secret_with_confirm};
use secrecy::ExposeSecret;
use serde::Serialize;

/// Environment variable holding the secret value for `keeper store`.
pub const SECRET_ENV_VAR: &str = "KEEPER_SECRET";
/// Environment variable holding the card number for `keeper card store`.
pub const CARD_NUMBER_ENV_VAR: &str = "KEEPER_CARD_NUMBER";
/// Environment variable holding the card CVC for `keeper card store`.
pub const CARD_CVC_ENV_VAR: &str = "KEEPER_CARD_CVC";

/// Close the store, then hand back the operation's outcome.
async fn finish<T>(
    service: KeeperService,
    result: Result<T, KeeperError>,
) -> Result<T, KeeperError> {
    if let Err(e) = service.close().await {
        tracing::warn!(error = %e, "failed to close vault store cleanly");
    }
    result
}

fn write_stdout(bytes: &[u8]) -> Result<(), KeeperError> {
    let mut out = std::io::stdout().lock();
    out.write_all(bytes)
        .and_then(|()| out.flush())
        .map_err(|e| KeeperError::Internal(format!("failed to write output: {e}")))
}

/// `keeper register <login>`
pub async fn run_register(config: &KeeperConfig, login: &str) -> Result<(), KeeperError> {
    let password = read_secret_with_confirm(PASSWORD_ENV_VAR, "Password")?;
    let service = KeeperService::open(config).await?;
    let result = service
        .register(&RequestCredentials::anonymous(), login, &password)
        .await;
    let user = finish(service, result).await?;
    eprintln!("registered {login} (user {user})");
    Ok(())
}

/// `keeper login <login>`: prints the bearer token on stdout.
pub async fn run_login(config: &KeeperConfig, login: &str) -> Result<(), KeeperError> {
    let password = read_secret(PASSWORD_ENV_VAR, "Password")?;
    let service = KeeperService::open(config).await?;
    let result = service
        .login(&RequestCredentials::anonymous(), login, &password)
        .await;
    let token = finish(service, result).await?;
    println!("{token}");
    Ok(())
}

/// `keeper store --kind <kind> <key>`
pub async fn run_store(
    config: &KeeperConfig,
    token: &str,
    kind: RecordKind,
    lookup_key: &str,
) -> Result<(), KeeperError> {
    let secret = read_secret(SECRET_ENV_VAR, "Secret")?;
    let credentials = RequestCredentials::bearer(token);
    let service = KeeperService::open(config).await?;
    let result = service
        .store_secret(
            &credentials,
            kind,
            lookup_key,
            secret.expose_secret().as_bytes(),
        )
        .await;
    let record = finish(service, result).await?;
    eprintln!("stored {kind} `{lookup_key}` (record {record})");
    Ok(())
}

/// `keeper fetch --kind <kind> <key>`: writes the plaintext to stdout.
pub async fn run_fetch(
    config: &KeeperConfig,
    token: &str,
    kind: RecordKind,
    lookup_key: &str,
) -> Result<(), KeeperError> {
    let credentials = RequestCredentials::bearer(token);
    let service = KeeperService::open(config).await?;
    let result = service.fetch_secret(&credentials, kind, lookup_key).await;
    let plaintext = finish(service, result).await?;
    write_stdout(&plaintext)?;
    if std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        println!();
    }
    Ok(())
}

/// `keeper card store --holder <name> --expiry <MM/YY>`
pub async fn run_card_store(
    config: &KeeperConfig,
    token: &str,
    holder: &str,
    expiry: &str,
) -> Result<(), KeeperError> {
    let number = read_secret(CARD_NUMBER_ENV_VAR, "Card number")?;
    let cvc = read_secret(CARD_CVC_ENV_VAR, "CVC")?;
    let card = BankCard {
        number: number.expose_secret().replace([' ', '-'], ""),
        holder: holder.to_string(),
        expiry: expiry.to_string(),
        cvc: cvc.expose_secret().to_string(),
    };
    let credentials = RequestCredentials::bearer(token);
    let service = KeeperService::open(config).await?;
    let result = service.store_card(&credentials, &card).await;
    finish(service, result).await?;
    eprintln!("stored card ending in {}", card.last_four());
    Ok(())
}

/// `keeper card fetch <last-four>`
pub async fn run_card_fetch(
    config: &KeeperConfig,
    token: &str,
    last_four: &str,
) -> Result<(), KeeperError> {
    let credentials = RequestCredentials::bearer(token);
    let service = KeeperService::open(config).await?;
    let result = service.fetch_card(&credentials, last_four).await;
    let card = finish(service, result).await?;
    println!("number: {}", card.number);
    println!("holder: {}", card.holder);
    println!("expiry: {}", card.expiry);
    println!("cvc:    {}", card.cvc);
    Ok(())
}

/// Structured output for `keeper status --json`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub detail: Option<String>,
    pub database_path: String,
}

impl StatusResponse {
    pub fn new(health: &HealthStatus, database_path: &str) -> Self {
        let (status, detail) = match health {
            HealthStatus::Healthy => ("healthy", None),
            HealthStatus::Degraded(d) => ("degraded", Some(d.clone())),
            HealthStatus::Unhealthy(d) => ("unhealthy", Some(d.clone())),
        };
        Self {
            status: status.to_string(),
            detail,
            database_path: database_path.to_string(),
        }
    }
}

/// `keeper status`
pub async fn run_status(config: &KeeperConfig, json: bool) -> Result<(), KeeperError> {
    let service = KeeperService::open(config).await?;
    let result = service.orchestrator().health_check().await;
    let health = finish(service, result).await?;
    let response = StatusResponse::new(&health, &config.storage.database_path);

    if json {
        let rendered = serde_json::to_string_pretty(&response)
            .map_err(|e| KeeperError::Internal(format!("failed to encode status: {e}")))?;
        println!("{rendered}");
    } else {
        match &response.detail {
            Some(detail) => println!("{}: {detail}", response.status),
            None => println!("{}", response.status),
        }
        println!("database: {}", response.database_path);
    }
    Ok(())
}
