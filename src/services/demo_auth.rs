// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process identity provider for demo mode and tests.
//!
//! Accounts live in memory. Passwords are stored only as salted
//! HMAC-SHA256 digests. ID tokens are HS256 JWTs signed with the demo key,
//! and outgoing "emails" are recorded in an outbox instead of being sent.

use crate::error::{AuthErrorCode, ProviderError};
use crate::models::AuthSession;
use crate::services::identity::{IdentityProvider, ProfileFields};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use validator::ValidateEmail;

type HmacSha256 = Hmac<Sha256>;

/// Same floor the hosted provider enforces.
const MIN_PASSWORD_LEN: usize = 6;
const ID_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Verification,
    PasswordReset,
}

/// An email the provider would have sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub kind: EmailKind,
    pub code: String,
}

struct DemoAccount {
    uid: String,
    email: String,
    salt: Vec<u8>,
    digest: Vec<u8>,
    display_name: Option<String>,
    photo_url: Option<String>,
    email_verified: bool,
    disabled: bool,
    refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DemoClaims {
    sub: String,
    email: String,
    email_verified: bool,
    iat: i64,
    exp: i64,
}

pub struct DemoIdentityProvider {
    accounts: DashMap<String, DemoAccount>,
    /// Lower-cased email -> uid
    emails: DashMap<String, String>,
    /// One-shot action code -> (uid, kind)
    action_codes: DashMap<String, (String, EmailKind)>,
    outbox: Mutex<Vec<SentEmail>>,
    signing_key: Vec<u8>,
    rng: SystemRandom,
    refresh_failures: AtomicBool,
    refresh_delay_ms: AtomicU64,
}

/// Random bytes from the system CSPRNG, hex encoded.
pub fn random_hex(len: usize) -> Result<String, ProviderError> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| ProviderError::other("System RNG unavailable"))?;
    Ok(hex::encode(bytes))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    email.trim().validate_email()
}

fn digest_password(salt: &[u8], password: &str) -> Result<Vec<u8>, ProviderError> {
    let mut mac = HmacSha256::new_from_slice(salt)
        .map_err(|e| ProviderError::other(format!("HMAC init failed: {}", e)))?;
    mac.update(password.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn not_found() -> ProviderError {
    ProviderError::new(AuthErrorCode::UserNotFound, "EMAIL_NOT_FOUND")
}

impl DemoIdentityProvider {
    pub fn new(signing_key: Vec<u8>) -> Self {
        Self {
            accounts: DashMap::new(),
            emails: DashMap::new(),
            action_codes: DashMap::new(),
            outbox: Mutex::new(Vec::new()),
            signing_key,
            rng: SystemRandom::new(),
            refresh_failures: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
        }
    }

    /// Emails "sent" so far, oldest first.
    pub async fn sent_emails(&self) -> Vec<SentEmail> {
        self.outbox.lock().await.clone()
    }

    /// Make token refresh fail, as when the account is revoked server-side.
    pub fn fail_refreshes(&self, fail: bool) {
        self.refresh_failures.store(fail, Ordering::SeqCst);
    }

    /// Hold every refresh call for `delay` before answering, like a slow
    /// token endpoint.
    pub fn delay_refreshes(&self, delay: std::time::Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.refresh_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Administrative disable; sign-in and refresh are rejected afterwards.
    pub fn disable_account(&self, uid: &str) -> bool {
        match self.accounts.get_mut(uid) {
            Some(mut account) => {
                account.disabled = true;
                true
            }
            None => false,
        }
    }

    fn random_token(&self, len: usize) -> Result<String, ProviderError> {
        let mut bytes = vec![0u8; len];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| ProviderError::other("System RNG unavailable"))?;
        Ok(hex::encode(bytes))
    }

    fn check_password_strength(password: &str) -> Result<(), ProviderError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::new(
                AuthErrorCode::WeakPassword,
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ));
        }
        Ok(())
    }

    fn set_password(&self, account: &mut DemoAccount, password: &str) -> Result<(), ProviderError> {
        let mut salt = vec![0u8; 16];
        self.rng
            .fill(&mut salt)
            .map_err(|_| ProviderError::other("System RNG unavailable"))?;
        account.digest = digest_password(&salt, password)?;
        account.salt = salt;
        Ok(())
    }

    fn password_matches(account: &DemoAccount, password: &str) -> Result<bool, ProviderError> {
        let candidate = digest_password(&account.salt, password)?;
        Ok(bool::from(candidate.ct_eq(&account.digest)))
    }

    /// Mint a fresh ID token and rotate the refresh token.
    fn mint_session(&self, account: &mut DemoAccount) -> Result<AuthSession, ProviderError> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(ID_TOKEN_TTL_MINUTES);
        let claims = DemoClaims {
            sub: account.uid.clone(),
            email: account.email.clone(),
            email_verified: account.email_verified,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let id_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| ProviderError::other(format!("Token signing failed: {}", e)))?;

        account.refresh_token = self.random_token(32)?;

        Ok(AuthSession {
            uid: account.uid.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            photo_url: account.photo_url.clone(),
            email_verified: account.email_verified,
            id_token,
            refresh_token: account.refresh_token.clone(),
            expires_at,
        })
    }

    /// Signature check on a session's ID token. Expiry is not enforced; the
    /// session timer refreshes well inside the token lifetime.
    fn verify_token(&self, session: &AuthSession) -> Result<DemoClaims, ProviderError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = decode::<DemoClaims>(
            &session.id_token,
            &DecodingKey::from_secret(&self.signing_key),
            &validation,
        )
        .map_err(|e| {
            ProviderError::new(
                AuthErrorCode::RequiresRecentLogin,
                format!("INVALID_ID_TOKEN: {}", e),
            )
        })?;

        if data.claims.sub != session.uid {
            return Err(ProviderError::new(
                AuthErrorCode::RequiresRecentLogin,
                "INVALID_ID_TOKEN",
            ));
        }
        Ok(data.claims)
    }

    /// Run `f` on the session's account after verifying its token.
    fn with_account<T, F>(&self, session: &AuthSession, f: F) -> Result<T, ProviderError>
    where
        F: FnOnce(&mut DemoAccount) -> Result<T, ProviderError>,
    {
        self.verify_token(session)?;
        let mut account = self.accounts.get_mut(&session.uid).ok_or_else(not_found)?;
        if account.disabled {
            return Err(ProviderError::new(AuthErrorCode::UserDisabled, "USER_DISABLED"));
        }
        f(&mut account)
    }

    async fn send(&self, uid: &str, to: &str, kind: EmailKind) -> Result<(), ProviderError> {
        let code = self.random_token(16)?;
        self.action_codes
            .insert(code.clone(), (uid.to_string(), kind));
        tracing::debug!(to, ?kind, "Demo email queued");
        self.outbox.lock().await.push(SentEmail {
            to: to.to_string(),
            kind,
            code,
        });
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for DemoIdentityProvider {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError> {
        if !is_valid_email(email) {
            return Err(ProviderError::new(AuthErrorCode::InvalidEmail, "INVALID_EMAIL"));
        }
        Self::check_password_strength(password)?;

        let uid = self.random_token(14)?;
        let mut account = DemoAccount {
            uid: uid.clone(),
            email: email.trim().to_string(),
            salt: Vec::new(),
            digest: Vec::new(),
            display_name: None,
            photo_url: None,
            email_verified: false,
            disabled: false,
            refresh_token: String::new(),
        };
        self.set_password(&mut account, password)?;
        let session = self.mint_session(&mut account)?;

        match self.emails.entry(normalize_email(email)) {
            Entry::Occupied(_) => {
                return Err(ProviderError::new(
                    AuthErrorCode::EmailAlreadyInUse,
                    "EMAIL_EXISTS",
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(uid.clone());
                self.accounts.insert(uid.clone(), account);
            }
        }

        tracing::info!(uid = %uid, "Demo account created");
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ProviderError> {
        if !is_valid_email(email) {
            return Err(ProviderError::new(AuthErrorCode::InvalidEmail, "INVALID_EMAIL"));
        }
        let uid = self
            .emails
            .get(&normalize_email(email))
            .map(|uid| uid.clone())
            .ok_or_else(not_found)?;

        let mut account = self.accounts.get_mut(&uid).ok_or_else(not_found)?;
        if account.disabled {
            return Err(ProviderError::new(AuthErrorCode::UserDisabled, "USER_DISABLED"));
        }
        if !Self::password_matches(&account, password)? {
            return Err(ProviderError::new(
                AuthErrorCode::WrongPassword,
                "INVALID_PASSWORD",
            ));
        }
        self.mint_session(&mut account)
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), ProviderError> {
        // Revoke the refresh token; the ID token simply ages out.
        if let Some(mut account) = self.accounts.get_mut(&session.uid) {
            if bool::from(account.refresh_token.as_bytes().ct_eq(session.refresh_token.as_bytes())) {
                account.refresh_token.clear();
            }
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        if !is_valid_email(email) {
            return Err(ProviderError::new(AuthErrorCode::InvalidEmail, "INVALID_EMAIL"));
        }
        let uid = self
            .emails
            .get(&normalize_email(email))
            .map(|uid| uid.clone());
        match uid {
            Some(uid) => self.send(&uid, email.trim(), EmailKind::PasswordReset).await,
            // Don't reveal whether the account exists.
            None => Ok(()),
        }
    }

    async fn send_email_verification(&self, session: &AuthSession) -> Result<(), ProviderError> {
        let email = self.with_account(session, |account| Ok(account.email.clone()))?;
        self.send(&session.uid, &email, EmailKind::Verification).await
    }

    async fn update_profile(
        &self,
        session: &AuthSession,
        fields: &ProfileFields,
    ) -> Result<AuthSession, ProviderError> {
        self.with_account(session, |account| {
            if let Some(name) = &fields.display_name {
                account.display_name = Some(name.clone());
            }
            if let Some(url) = &fields.photo_url {
                account.photo_url = Some(url.clone());
            }
            Ok(AuthSession {
                display_name: account.display_name.clone(),
                photo_url: account.photo_url.clone(),
                ..session.clone()
            })
        })
    }

    async fn reauthenticate(
        &self,
        session: &AuthSession,
        password: &str,
    ) -> Result<AuthSession, ProviderError> {
        self.with_account(session, |account| {
            if !Self::password_matches(account, password)? {
                return Err(ProviderError::new(
                    AuthErrorCode::WrongPassword,
                    "INVALID_PASSWORD",
                ));
            }
            self.mint_session(account)
        })
    }

    async fn update_email(
        &self,
        session: &AuthSession,
        new_email: &str,
    ) -> Result<AuthSession, ProviderError> {
        if !is_valid_email(new_email) {
            return Err(ProviderError::new(AuthErrorCode::InvalidEmail, "INVALID_EMAIL"));
        }
        // Token and disabled checks come before the index is touched.
        let old_email = self.with_account(session, |account| Ok(account.email.clone()))?;
        let new_key = normalize_email(new_email);
        let old_key = normalize_email(&old_email);
        let moved = new_key != old_key;

        if moved {
            match self.emails.entry(new_key.clone()) {
                Entry::Occupied(_) => {
                    return Err(ProviderError::new(
                        AuthErrorCode::EmailAlreadyInUse,
                        "EMAIL_EXISTS",
                    ))
                }
                Entry::Vacant(slot) => {
                    slot.insert(session.uid.clone());
                }
            }
        }

        let result = self.with_account(session, |account| {
            account.email = new_email.trim().to_string();
            account.email_verified = false;
            self.mint_session(account)
        });
        if moved {
            // Whichever address the account ended up with keeps the index.
            let stale = if result.is_ok() { old_key } else { new_key };
            self.emails.remove(&stale);
        }
        result
    }

    async fn update_password(
        &self,
        session: &AuthSession,
        new_password: &str,
    ) -> Result<AuthSession, ProviderError> {
        Self::check_password_strength(new_password)?;
        self.with_account(session, |account| {
            self.set_password(account, new_password)?;
            self.mint_session(account)
        })
    }

    async fn delete_account(&self, session: &AuthSession) -> Result<(), ProviderError> {
        self.verify_token(session)?;
        let (_, account) = self.accounts.remove(&session.uid).ok_or_else(not_found)?;
        self.emails.remove(&normalize_email(&account.email));
        self.action_codes.retain(|_, (uid, _)| *uid != session.uid);
        tracing::info!(uid = %session.uid, "Demo account deleted");
        Ok(())
    }

    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, ProviderError> {
        let delay = self.refresh_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if self.refresh_failures.load(Ordering::SeqCst) {
            return Err(ProviderError::new(
                AuthErrorCode::RequiresRecentLogin,
                "TOKEN_EXPIRED",
            ));
        }
        let mut account = self.accounts.get_mut(&session.uid).ok_or_else(not_found)?;
        if account.disabled {
            return Err(ProviderError::new(AuthErrorCode::UserDisabled, "USER_DISABLED"));
        }
        let presented = session.refresh_token.as_bytes();
        if account.refresh_token.is_empty()
            || !bool::from(account.refresh_token.as_bytes().ct_eq(presented))
        {
            return Err(ProviderError::new(
                AuthErrorCode::RequiresRecentLogin,
                "INVALID_REFRESH_TOKEN",
            ));
        }
        self.mint_session(&mut account)
    }

    async fn apply_action_code(&self, code: &str) -> Result<String, ProviderError> {
        let invalid = || ProviderError::new(AuthErrorCode::InvalidActionCode, "INVALID_OOB_CODE");

        let (_, (uid, kind)) = self.action_codes.remove(code.trim()).ok_or_else(invalid)?;
        if kind != EmailKind::Verification {
            return Err(invalid());
        }
        let mut account = self.accounts.get_mut(&uid).ok_or_else(invalid)?;
        account.email_verified = true;
        tracing::info!(uid = %uid, "Demo email verified");
        Ok(account.email.clone())
    }

    async fn resume(&self, uid: &str) -> Result<Option<AuthSession>, ProviderError> {
        match self.accounts.get_mut(uid) {
            Some(mut account) if !account.disabled => self.mint_session(&mut account).map(Some),
            _ => Ok(None),
        }
    }
}
