// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication for the Keeper secrets vault.
//!
//! [`token`] issues and validates HS256 bearer tokens that bind a request to
//! a user id. [`gate`] decides, per operation, whether a request proceeds
//! and mints the [`AuthContext`] that record operations require.

pub mod gate;
pub mod token;

pub use gate::{
    Admission, AuthContext, AuthGate, Operation, RequestCredentials, TokenSource, AUTH_COOKIE,
};
pub use token::{JwtAuthority, TokenIssuer, TokenValidator};
