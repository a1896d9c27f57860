// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keeper.toml` > `~/.config/keeper/keeper.toml` > `/etc/keeper/keeper.toml`
//! with environment variable overrides via `KEEPER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeeperConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keeper/keeper.toml`
/// 3. `~/.config/keeper/keeper.toml`
/// 4. `./keeper.toml`
/// 5. `KEEPER_*` environment variables
pub fn load_config() -> Result<KeeperConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file("/etc/keeper/keeper.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keeper/keeper.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("keeper.toml"))
        .merge(env_provider())
}

/// Top-level config sections reachable through `KEEPER_<SECTION>_<KEY>`.
const ENV_SECTIONS: [&str; 4] = ["service_", "storage_", "auth_", "vault_"];

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `KEEPER_AUTH_TOKEN_SECRET`
/// must land on `auth.token_secret`, not `auth.token.secret`. Variables
/// outside the config sections (`KEEPER_PASSWORD`, `KEEPER_TOKEN`, ...) are
/// runtime inputs and are ignored here.
fn env_provider() -> Env {
    Env::prefixed("KEEPER_")
        .filter(|key| ENV_SECTIONS.iter().any(|s| key.as_str().starts_with(s)))
        .map(|key| {
            let mapped = key
                .as_str()
                .replacen("service_", "service.", 1)
                .replacen("storage_", "storage.", 1)
                .replacen("auth_", "auth.", 1)
                .replacen("vault_", "vault.", 1);
            mapped.into()
        })
}
