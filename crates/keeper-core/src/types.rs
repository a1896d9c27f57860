// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Keeper workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use zeroize::Zeroizing;

use crate::error::KeeperError;

/// Storage-assigned user identifier. Positive, immutable, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-assigned record identifier, unique within a [`RecordKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of secret categories.
///
/// Each kind owns its own table and its own key-derivation domain, so
/// identically numbered records of different kinds never share key material.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    LoginPassword,
    Text,
    BankCard,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [
        RecordKind::LoginPassword,
        RecordKind::Text,
        RecordKind::BankCard,
    ];

    /// Table holding records of this kind.
    pub fn table(self) -> &'static str {
        match self {
            RecordKind::LoginPassword => "logins_and_passwords",
            RecordKind::Text => "texts",
            RecordKind::BankCard => "bank_cards",
        }
    }

    /// Domain label mixed into per-record key derivation.
    pub fn key_domain(self) -> &'static str {
        match self {
            RecordKind::LoginPassword => "login-password",
            RecordKind::Text => "text",
            RecordKind::BankCard => "bank-card",
        }
    }
}

/// Salted one-way credential material as persisted for a user.
///
/// `hash` is a PHC-format string; `salt` is the base64 salt it was built with.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash {
    pub hash: String,
    pub salt: String,
}

impl std::fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHash")
            .field("hash", &"[REDACTED]")
            .field("salt", &self.salt)
            .finish()
    }
}

/// A 256-bit symmetric key bound to one record. Zeroized on drop.
pub struct RecordKey(Zeroizing<[u8; 32]>);

impl RecordKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A ciphertext row returned by a storage lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub ciphertext: Vec<u8>,
}

/// Health status reported by storage health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Structured bank card payload.
///
/// Only ever persisted as sealed JSON; the last four digits double as the
/// record's lookup key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankCard {
    pub number: String,
    pub holder: String,
    /// Expiry in `MM/YY` form.
    pub expiry: String,
    pub cvc: String,
}

impl std::fmt::Debug for BankCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankCard")
            .field("number", &format_args!("****{}", self.last_four()))
            .field("holder", &self.holder)
            .field("expiry", &self.expiry)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

impl BankCard {
    /// Last four digits of the card number (fewer if the number is shorter).
    pub fn last_four(&self) -> &str {
        let start = self.number.len().saturating_sub(4);
        self.number.get(start..).unwrap_or_default()
    }

    /// Check the card's shape. Collects nothing; fails on the first problem.
    pub fn validate(&self) -> Result<(), KeeperError> {
        let number = self.number.as_str();
        if !(12..=19).contains(&number.len()) || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeeperError::Validation(
                "card number must be 12 to 19 digits".to_string(),
            ));
        }
        if !luhn_valid(number) {
            return Err(KeeperError::Validation(
                "card number fails checksum".to_string(),
            ));
        }
        if self.holder.trim().is_empty() {
            return Err(KeeperError::Validation(
                "card holder must not be empty".to_string(),
            ));
        }
        if !expiry_valid(&self.expiry) {
            return Err(KeeperError::Validation(
                "card expiry must be MM/YY".to_string(),
            ));
        }
        if !(3..=4).contains(&self.cvc.len()) || !self.cvc.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeeperError::Validation(
                "card cvc must be 3 or 4 digits".to_string(),
            ));
        }
        Ok(())
    }
}

/// Luhn mod-10 checksum over an all-digit string.
fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn expiry_valid(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    if month.len() != 2 || year.len() != 2 {
        return false;
    }
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}
