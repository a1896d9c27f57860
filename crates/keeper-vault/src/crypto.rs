// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM seal/open for record payloads.
//!
//! Sealed layout: `nonce (12) || ciphertext || tag (16)`. Every call to
//! [`seal`] draws a fresh random 96-bit nonce from the system CSPRNG; nonce
//! reuse under one key would break GCM.

use keeper_core::{CryptoError, KeeperError, RecordKey};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Length of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Smallest valid sealed payload: nonce plus tag over an empty plaintext.
pub const MIN_SEALED_LEN: usize = NONCE_LEN + TAG_LEN;

fn aead_key(key: &RecordKey) -> Result<LessSafeKey, KeeperError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key.as_bytes())
        .map_err(|_| KeeperError::Internal("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key`.
///
/// Fails only if the system RNG or the key setup fails, which is an
/// internal fault rather than a per-request outcome.
pub fn seal(plaintext: &[u8], key: &RecordKey) -> Result<Vec<u8>, KeeperError> {
    let aead = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| KeeperError::Internal("failed to generate random nonce".to_string()))?;

    let mut in_out = plaintext.to_vec();
    aead.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| KeeperError::Internal("AES-256-GCM encryption failed".to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&in_out);
    Ok(sealed)
}

/// Decrypt a payload produced by [`seal`].
///
/// Any tampering, truncation, or key mismatch fails with
/// `CryptoError::AuthenticationFailed`. No partial plaintext is returned.
pub fn open(sealed: &[u8], key: &RecordKey) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
    if sealed.len() < MIN_SEALED_LEN {
        return Err(CryptoError::AuthenticationFailed.into());
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| KeeperError::from(CryptoError::AuthenticationFailed))?;

    let aead = aead_key(key)?;
    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext_len = aead
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| KeeperError::from(CryptoError::AuthenticationFailed))?
        .len();

    in_out.truncate(plaintext_len);
    Ok(in_out)
}

/// Generate a random 32-byte key. Used for tests and decoy material.
pub fn generate_random_key() -> Result<RecordKey, KeeperError> {
    let mut key = [0u8; 32];
    SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| KeeperError::Internal("failed to generate random key".to_string()))?;
    Ok(RecordKey::from_bytes(key))
}
