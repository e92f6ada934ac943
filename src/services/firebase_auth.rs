// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client over the Identity Toolkit REST API.
//!
//! Handles:
//! - Email/password sign-up and sign-in
//! - Out-of-band emails (verification, password reset) and action codes
//! - Account updates and deletion
//! - ID token refresh via the Secure Token service
//!
//! Provider error strings are mapped onto [`AuthErrorCode`].

use crate::error::{AuthErrorCode, ProviderError};
use crate::models::AuthSession;
use crate::services::identity::{IdentityProvider, ProfileFields};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// Firebase Auth REST client.
#[derive(Clone)]
pub struct FirebaseAuth {
    http: reqwest::Client,
    api_key: String,
    identity_url: String,
    token_url: String,
}

/// Token triple returned by sign-up, sign-in and credential-changing updates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

/// Response from the Secure Token service (snake_case on the wire).
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    email_verified: bool,
    display_name: Option<String>,
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
struct ActionCodeResponse {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map an Identity Toolkit error message onto the error table.
///
/// Messages look like `EMAIL_EXISTS` or
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
pub fn map_error_message(message: &str) -> AuthErrorCode {
    let code = message
        .split(|c: char| c == ' ' || c == ':')
        .next()
        .unwrap_or_default();
    match code {
        "EMAIL_EXISTS" => AuthErrorCode::EmailAlreadyInUse,
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthErrorCode::InvalidEmail,
        "WEAK_PASSWORD" => AuthErrorCode::WeakPassword,
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthErrorCode::UserNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "MISSING_PASSWORD" => {
            AuthErrorCode::WrongPassword
        }
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyRequests,
        "USER_DISABLED" => AuthErrorCode::UserDisabled,
        "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" | "TOKEN_EXPIRED" | "INVALID_ID_TOKEN"
        | "INVALID_REFRESH_TOKEN" => AuthErrorCode::RequiresRecentLogin,
        "INVALID_OOB_CODE" | "EXPIRED_OOB_CODE" => AuthErrorCode::InvalidActionCode,
        _ => AuthErrorCode::Other,
    }
}

/// Turn a non-2xx response body into a [`ProviderError`].
fn parse_error_body(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = map_error_message(&envelope.error.message);
            ProviderError::new(code, envelope.error.message)
        }
        Err(_) if status.as_u16() == 429 => ProviderError::new(
            AuthErrorCode::TooManyRequests,
            "TOO_MANY_ATTEMPTS_TRY_LATER",
        ),
        Err(_) => ProviderError::other(format!("HTTP {}: {}", status, body)),
    }
}

fn expiry_from(expires_in: &str) -> chrono::DateTime<Utc> {
    let secs = expires_in.trim().parse::<i64>().unwrap_or(3600);
    Utc::now() + Duration::seconds(secs)
}

impl FirebaseAuth {
    /// Create a client for the project identified by `api_key`.
    ///
    /// For local development with the Auth emulator, set
    /// FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(api_key: String) -> Self {
        if let Ok(host) = std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            tracing::info!(host = %host, "Using Firebase Auth emulator");
            return Self::with_base_urls(
                api_key,
                format!("http://{}/identitytoolkit.googleapis.com/v1", host),
                format!("http://{}/securetoken.googleapis.com/v1", host),
            );
        }
        Self::with_base_urls(
            api_key,
            IDENTITY_TOOLKIT_URL.to_string(),
            SECURE_TOKEN_URL.to_string(),
        )
    }

    pub fn with_base_urls(api_key: String, identity_url: String, token_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            identity_url,
            token_url,
        }
    }

    /// POST to `accounts:{method}`.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, ProviderError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.identity_url,
            method,
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::other(format!("Request failed: {}", e)))?;

        Self::check_response_json(response).await
    }

    async fn check_response_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let err = parse_error_body(status, &body);
            tracing::debug!(status = %status, code = %err.code, "Firebase Auth request rejected");
            return Err(err);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::other(format!("JSON parse error: {}", e)))
    }

    async fn lookup(&self, id_token: &str) -> Result<AccountInfo, ProviderError> {
        let response: LookupResponse = self.call("lookup", &json!({ "idToken": id_token })).await?;
        response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new(AuthErrorCode::UserNotFound, "USER_NOT_FOUND"))
    }

    /// Build a session from fresh tokens; profile fields come from a lookup.
    async fn session_from_tokens(
        &self,
        id_token: String,
        refresh_token: String,
        expires_in: &str,
    ) -> Result<AuthSession, ProviderError> {
        let expires_at = expiry_from(expires_in);
        let info = self.lookup(&id_token).await?;
        Ok(AuthSession {
            uid: info.local_id,
            email: info.email,
            display_name: info.display_name,
            photo_url: info.photo_url,
            email_verified: info.email_verified,
            id_token,
            refresh_token,
            expires_at,
        })
    }

    async fn password_grant(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError> {
        let tokens: TokenResponse = self
            .call(
                method,
                &json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        tracing::debug!(uid = %tokens.local_id, method, "Firebase password grant");
        self.session_from_tokens(tokens.id_token, tokens.refresh_token, &tokens.expires_in)
            .await
    }

    /// Credential-changing update (email or password); tokens are reissued.
    async fn update_credentials(
        &self,
        session: &AuthSession,
        field: &str,
        value: &str,
    ) -> Result<AuthSession, ProviderError> {
        let mut body = json!({
            "idToken": session.id_token,
            "returnSecureToken": true,
        });
        body[field] = json!(value);

        let tokens: TokenResponse = self.call("update", &body).await?;
        self.session_from_tokens(tokens.id_token, tokens.refresh_token, &tokens.expires_in)
            .await
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ProviderError> {
        self.password_grant("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ProviderError> {
        self.password_grant("signInWithPassword", email, password)
            .await
    }

    async fn sign_out(&self, _session: &AuthSession) -> Result<(), ProviderError> {
        // No server-side sign-out in the REST API; dropping the tokens is it.
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }

    async fn send_email_verification(&self, session: &AuthSession) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &json!({ "requestType": "VERIFY_EMAIL", "idToken": session.id_token }),
            )
            .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        session: &AuthSession,
        fields: &ProfileFields,
    ) -> Result<AuthSession, ProviderError> {
        if fields.is_empty() {
            return Ok(session.clone());
        }

        let mut body = json!({
            "idToken": session.id_token,
            "returnSecureToken": false,
        });
        if let Some(name) = &fields.display_name {
            body["displayName"] = json!(name);
        }
        if let Some(url) = &fields.photo_url {
            body["photoUrl"] = json!(url);
        }

        let info: AccountInfo = self.call("update", &body).await?;
        Ok(AuthSession {
            display_name: info.display_name.or_else(|| session.display_name.clone()),
            photo_url: info.photo_url.or_else(|| session.photo_url.clone()),
            ..session.clone()
        })
    }

    async fn reauthenticate(
        &self,
        session: &AuthSession,
        password: &str,
    ) -> Result<AuthSession, ProviderError> {
        let fresh = self
            .password_grant("signInWithPassword", &session.email, password)
            .await?;
        if fresh.uid != session.uid {
            return Err(ProviderError::other("USER_MISMATCH"));
        }
        Ok(fresh)
    }

    async fn update_email(
        &self,
        session: &AuthSession,
        new_email: &str,
    ) -> Result<AuthSession, ProviderError> {
        self.update_credentials(session, "email", new_email).await
    }

    async fn update_password(
        &self,
        session: &AuthSession,
        new_password: &str,
    ) -> Result<AuthSession, ProviderError> {
        self.update_credentials(session, "password", new_password)
            .await
    }

    async fn delete_account(&self, session: &AuthSession) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call("delete", &json!({ "idToken": session.id_token }))
            .await?;
        Ok(())
    }

    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, ProviderError> {
        let url = format!(
            "{}/token?key={}",
            self.token_url,
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::other(format!("Request failed: {}", e)))?;

        let tokens: RefreshResponse = Self::check_response_json(response).await?;
        if tokens.user_id != session.uid {
            return Err(ProviderError::other("USER_MISMATCH"));
        }

        Ok(AuthSession {
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
            expires_at: expiry_from(&tokens.expires_in),
            ..session.clone()
        })
    }

    async fn apply_action_code(&self, code: &str) -> Result<String, ProviderError> {
        let response: ActionCodeResponse =
            self.call("update", &json!({ "oobCode": code })).await?;
        Ok(response.email)
    }

    async fn resume(&self, _uid: &str) -> Result<Option<AuthSession>, ProviderError> {
        // Needs a refresh token, which is never persisted.
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_error_message() {
        assert_eq!(map_error_message("EMAIL_EXISTS"), AuthErrorCode::EmailAlreadyInUse);
        assert_eq!(
            map_error_message("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthErrorCode::WeakPassword
        );
        assert_eq!(
            map_error_message("INVALID_LOGIN_CREDENTIALS"),
            AuthErrorCode::WrongPassword
        );
        assert_eq!(
            map_error_message("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            AuthErrorCode::TooManyRequests
        );
        assert_eq!(
            map_error_message("CREDENTIAL_TOO_OLD_LOGIN_AGAIN"),
            AuthErrorCode::RequiresRecentLogin
        );
        assert_eq!(
            map_error_message("EXPIRED_OOB_CODE"),
            AuthErrorCode::InvalidActionCode
        );
        assert_eq!(map_error_message("QUOTA_EXCEEDED"), AuthErrorCode::Other);
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND","errors":[]}}"#;
        let err = parse_error_body(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(err.code, AuthErrorCode::UserNotFound);
        assert_eq!(err.message, "EMAIL_NOT_FOUND");

        let err = parse_error_body(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(err.code, AuthErrorCode::TooManyRequests);

        let err = parse_error_body(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.code, AuthErrorCode::Other);
        assert!(err.message.contains("502"));
    }

    #[test]
    fn test_expiry_from() {
        let before = Utc::now();
        let expiry = expiry_from("3600");
        assert!(expiry >= before + Duration::seconds(3599));
        // Garbage falls back to an hour rather than failing the sign-in.
        assert!(expiry_from("soon") > before + Duration::seconds(3000));
    }

    #[test]
    fn test_account_info_deserialize() {
        let info: AccountInfo = serde_json::from_str(
            r#"{"localId":"abc","email":"a@x.com","emailVerified":true,"displayName":"Alice"}"#,
        )
        .unwrap();
        assert_eq!(info.local_id, "abc");
        assert!(info.email_verified);
        assert!(info.photo_url.is_none());
    }
}
