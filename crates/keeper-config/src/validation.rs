// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::KeeperConfig;

/// Minimum signing secret length in bytes.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation rather than failing fast. An absent
/// `auth.token_secret` or `vault.master_key` is not an error here: the
/// binary refuses to start without a signing secret, and record operations
/// report a key-unavailable error without a master key.
pub fn validate_config(config: &KeeperConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.service.log_level
            ),
        });
    }

    if config.service.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "service.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if let Some(secret) = &config.auth.token_secret
        && secret.len() < MIN_TOKEN_SECRET_LEN
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "auth.token_secret must be at least {MIN_TOKEN_SECRET_LEN} bytes, got {}",
                secret.len()
            ),
        });
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "auth.token_ttl_secs must be at least 1".to_string(),
        });
    }

    if config.vault.master_key.is_some() && config.vault.master_key_bytes().is_none() {
        errors.push(ConfigError::Validation {
            message: "vault.master_key must be 64 hex characters (32 bytes)".to_string(),
        });
    }

    if config.vault.kdf_memory_cost < 32768 {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.kdf_memory_cost must be at least 32768 (32 MiB), got {}",
                config.vault.kdf_memory_cost
            ),
        });
    }

    if config.vault.kdf_iterations < 2 {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.kdf_iterations must be at least 2, got {}",
                config.vault.kdf_iterations
            ),
        });
    }

    if config.vault.kdf_parallelism < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.kdf_parallelism must be at least 1, got {}",
                config.vault.kdf_parallelism
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
