// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider capability.
//!
//! Every method that acts on an existing account takes the current
//! [`AuthSession`]; methods that change tokens return the new session.

use crate::error::ProviderError;
use crate::models::AuthSession;
use async_trait::async_trait;

/// Display fields pushed to the identity record. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl ProfileFields {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.photo_url.is_none()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account; the new user is signed in.
    async fn create_user(&self, email: &str, password: &str)
        -> Result<AuthSession, ProviderError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ProviderError>;

    async fn sign_out(&self, session: &AuthSession) -> Result<(), ProviderError>;

    /// Succeeds whether or not the account exists.
    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError>;

    async fn send_email_verification(&self, session: &AuthSession) -> Result<(), ProviderError>;

    async fn update_profile(
        &self,
        session: &AuthSession,
        fields: &ProfileFields,
    ) -> Result<AuthSession, ProviderError>;

    /// Prove possession of the password again before a sensitive change.
    async fn reauthenticate(
        &self,
        session: &AuthSession,
        password: &str,
    ) -> Result<AuthSession, ProviderError>;

    async fn update_email(
        &self,
        session: &AuthSession,
        new_email: &str,
    ) -> Result<AuthSession, ProviderError>;

    async fn update_password(
        &self,
        session: &AuthSession,
        new_password: &str,
    ) -> Result<AuthSession, ProviderError>;

    async fn delete_account(&self, session: &AuthSession) -> Result<(), ProviderError>;

    /// Exchange the refresh token for fresh credentials.
    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, ProviderError>;

    /// Apply an out-of-band action code (email verification). Returns the
    /// email address the code was issued for.
    async fn apply_action_code(&self, code: &str) -> Result<String, ProviderError>;

    /// Re-establish a session for a previously signed-in uid without a
    /// password. Providers that can't do this return `Ok(None)`.
    async fn resume(&self, uid: &str) -> Result<Option<AuthSession>, ProviderError>;
}
