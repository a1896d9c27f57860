// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret acquisition via environment variable or TTY prompt.

use keeper_core::KeeperError;
use secrecy::SecretString;

/// Environment variable holding the account password for headless use.
pub const PASSWORD_ENV_VAR: &str = "KEEPER_PASSWORD";

fn read_tty(prompt: &str) -> Result<String, KeeperError> {
    eprint!("{prompt}: ");
    rpassword::read_password()
        .map_err(|e| KeeperError::Internal(format!("failed to read secret from terminal: {e}")))
}

fn from_env(env_var: &str) -> Option<SecretString> {
    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

fn no_source(env_var: &str) -> KeeperError {
    KeeperError::Validation(format!(
        "no secret provided; set {env_var} or run interactively"
    ))
}

/// Read a secret from `env_var`, falling back to an interactive prompt.
///
/// An empty value from either source is rejected.
pub fn read_secret(env_var: &str, prompt: &str) -> Result<SecretString, KeeperError> {
    if let Some(secret) = from_env(env_var) {
        return Ok(secret);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let value = read_tty(prompt)?;
        if value.is_empty() {
            return Err(KeeperError::Validation("empty secret not allowed".to_string()));
        }
        return Ok(SecretString::from(value));
    }

    Err(no_source(env_var))
}

/// Like [`read_secret`], but prompts twice on a TTY and requires a match.
/// The environment variable is taken as-is.
pub fn read_secret_with_confirm(env_var: &str, prompt: &str) -> Result<SecretString, KeeperError> {
    if let Some(secret) = from_env(env_var) {
        return Ok(secret);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let first = read_tty(prompt)?;
        let second = read_tty(&format!("Confirm {}", prompt.to_lowercase()))?;
        if first != second {
            return Err(KeeperError::Validation("secrets do not match".to_string()));
        }
        if first.is_empty() {
            return Err(KeeperError::Validation("empty secret not allowed".to_string()));
        }
        return Ok(SecretString::from(first));
    }

    Err(no_source(env_var))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    const TEST_VAR: &str = "KEEPER_TEST_PROMPT_SECRET";

    #[test]
    #[serial]
    fn reads_secret_from_env_var() {
        // SAFETY: test-only env mutation, serialized.
        unsafe { std::env::set_var(TEST_VAR, "hunter2") };
        let result = read_secret(TEST_VAR, "Password");
        unsafe { std::env::remove_var(TEST_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "hunter2");
    }

    #[test]
    #[serial]
    fn confirm_variant_takes_env_var_without_prompting() {
        unsafe { std::env::set_var(TEST_VAR, "hunter2") };
        let result = read_secret_with_confirm(TEST_VAR, "Password");
        unsafe { std::env::remove_var(TEST_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "hunter2");
    }

    #[test]
    #[serial]
    fn empty_env_var_without_tty_is_rejected() {
        unsafe { std::env::set_var(TEST_VAR, "") };
        // Test runners do not attach a terminal to stdin.
        let result = read_secret(TEST_VAR, "Password");
        unsafe { std::env::remove_var(TEST_VAR) };

        if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
            assert!(matches!(result, Err(KeeperError::Validation(m)) if m.contains(TEST_VAR)));
        }
    }
}
