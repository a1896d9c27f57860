// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shape checks run before any storage call.

use keeper_core::KeeperError;
use secrecy::{ExposeSecret, SecretString};

const MAX_LOGIN_LEN: usize = 256;
const MAX_LOOKUP_KEY_LEN: usize = 256;

pub(crate) fn login(login: &str) -> Result<(), KeeperError> {
    if login.trim().is_empty() {
        return Err(KeeperError::Validation("login must not be empty".to_string()));
    }
    if login.len() > MAX_LOGIN_LEN {
        return Err(KeeperError::Validation(format!(
            "login must be at most {MAX_LOGIN_LEN} bytes"
        )));
    }
    Ok(())
}

pub(crate) fn password(password: &SecretString) -> Result<(), KeeperError> {
    if password.expose_secret().is_empty() {
        return Err(KeeperError::Validation(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn lookup_key(key: &str) -> Result<(), KeeperError> {
    if key.trim().is_empty() {
        return Err(KeeperError::Validation(
            "lookup key must not be empty".to_string(),
        ));
    }
    if key.len() > MAX_LOOKUP_KEY_LEN {
        return Err(KeeperError::Validation(format!(
            "lookup key must be at most {MAX_LOOKUP_KEY_LEN} bytes"
        )));
    }
    Ok(())
}

pub(crate) fn payload(payload: &[u8]) -> Result<(), KeeperError> {
    if payload.is_empty() {
        return Err(KeeperError::Validation(
            "content must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn last_four(digits: &str) -> Result<(), KeeperError> {
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeeperError::Validation(
            "card lookup takes the last four digits".to_string(),
        ));
    }
    Ok(())
}
