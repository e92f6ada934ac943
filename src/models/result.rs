// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Uniform `{success, message}` result returned by facade operations.

use crate::error::ProviderError;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult<T = ()> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error_code: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error_code: None,
        }
    }

    /// Failure carrying the provider's code and the mapped user message.
    pub fn from_provider_error(err: &ProviderError) -> Self {
        Self {
            success: false,
            message: err.user_message(),
            data: None,
            error_code: Some(err.code.as_str().to_string()),
        }
    }

    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }
}

/// Extra data attached to a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct LoginOutcome {
    pub verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorCode;

    #[test]
    fn test_provider_error_result() {
        let err = ProviderError::new(AuthErrorCode::EmailAlreadyInUse, "EMAIL_EXISTS");
        let result: ActionResult = ActionResult::from_provider_error(&err);
        assert!(!result.success);
        assert_eq!(
            result.message,
            "This email is already in use. Please try a different one or login."
        );
        assert_eq!(result.error_code.as_deref(), Some("auth/email-already-in-use"));
    }

    #[test]
    fn test_serialized_shape() {
        let result = ActionResult::ok("Login successful.").with_data(LoginOutcome { verified: false });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "message": "Login successful.",
                "data": {"verified": false}
            })
        );
    }
}
