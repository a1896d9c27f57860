// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-operation admission control.
//!
//! Register and login are bootstrap operations and pass through untouched.
//! Every other operation needs a valid bearer token, taken from the
//! `Authorization: Bearer` header or, failing that, the `AuthJWT` cookie.
//! A guarded operation whose token is missing or invalid is never invoked.

use std::future::Future;
use std::sync::Arc;

use keeper_core::{AuthError, KeeperError, UserId};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::token::TokenValidator;

/// Cookie carrying the token when no `Authorization` header is present.
pub const AUTH_COOKIE: &str = "AuthJWT";

/// Operations exposed by the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Operation {
    Register,
    Login,
    StoreSecret,
    FetchSecret,
    StoreCard,
    FetchCard,
}

impl Operation {
    /// Operations that run before a token can exist.
    pub fn is_bootstrap(self) -> bool {
        matches!(self, Operation::Register | Operation::Login)
    }
}

/// Proof that a request's token was validated.
///
/// Only [`AuthGate`] can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    user: UserId,
}

impl AuthContext {
    pub fn user(&self) -> UserId {
        self.user
    }
}

/// Outcome of a successful admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Register or login; no identity yet.
    Bootstrap,
    Authenticated(AuthContext),
}

impl Admission {
    pub fn context(&self) -> Option<&AuthContext> {
        match self {
            Admission::Bootstrap => None,
            Admission::Authenticated(ctx) => Some(ctx),
        }
    }
}

/// Anything a bearer token can be read from.
pub trait TokenSource {
    fn bearer_token(&self) -> Option<&str>;
}

/// Raw credential-bearing request metadata, as a transport would hand it over.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    /// Value of the `Authorization` header.
    pub authorization: Option<String>,
    /// Value of the `Cookie` header.
    pub cookie: Option<String>,
}

impl RequestCredentials {
    /// Credentials carrying `token` as a bearer header.
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self {
            authorization: Some(format!("Bearer {}", token.as_ref())),
            cookie: None,
        }
    }

    /// Credentials with no token at all.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl TokenSource for RequestCredentials {
    fn bearer_token(&self) -> Option<&str> {
        let from_header = self
            .authorization
            .as_deref()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if from_header.is_some() {
            return from_header;
        }

        self.cookie.as_deref().and_then(|header| {
            header.split(';').find_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (name == AUTH_COOKIE && !value.is_empty()).then_some(value)
            })
        })
    }
}

/// Admits or rejects requests before any vault work happens.
#[derive(Clone)]
pub struct AuthGate {
    validator: Arc<dyn TokenValidator>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }

    /// Decide whether `operation` may proceed.
    ///
    /// Missing and invalid tokens both surface as `AuthError::Unauthenticated`.
    pub fn admit(
        &self,
        operation: Operation,
        source: &dyn TokenSource,
    ) -> Result<Admission, KeeperError> {
        if operation.is_bootstrap() {
            return Ok(Admission::Bootstrap);
        }

        let Some(token) = source.bearer_token() else {
            warn!(%operation, "request rejected: no token presented");
            return Err(AuthError::Unauthenticated.into());
        };

        match self.validator.validate(token) {
            Ok(user) => {
                debug!(%operation, user_id = %user, "request admitted");
                Ok(Admission::Authenticated(AuthContext { user }))
            }
            Err(e) => {
                warn!(%operation, error = %e, "request rejected: token did not validate");
                Err(AuthError::Unauthenticated.into())
            }
        }
    }

    /// Admit a guarded operation and return its context.
    pub fn authenticate(
        &self,
        operation: Operation,
        source: &dyn TokenSource,
    ) -> Result<AuthContext, KeeperError> {
        match self.admit(operation, source)? {
            Admission::Authenticated(ctx) => Ok(ctx),
            Admission::Bootstrap => Err(KeeperError::Internal(format!(
                "{operation} does not carry an authenticated context"
            ))),
        }
    }

    /// Run `op` only if the request is admitted.
    pub async fn guard<T, F, Fut>(
        &self,
        operation: Operation,
        source: &dyn TokenSource,
        op: F,
    ) -> Result<T, KeeperError>
    where
        F: FnOnce(Admission) -> Fut,
        Fut: Future<Output = Result<T, KeeperError>>,
    {
        let admission = self.admit(operation, source)?;
        op(admission).await
    }
}
