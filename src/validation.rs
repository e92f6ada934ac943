// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page form bodies and their advisory checks.
//!
//! Each form validates with the `validator` derive. Only the first failing
//! rule (in the order the page checks them) is reported, as the warning
//! toast the user sees.

use crate::models::profile::{EmailNotifications, PlatformNotifications};
use crate::models::{NotificationPreferences, UserPreferences};
use crate::services::facade::{ProfileChanges, Registration};
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError, ValidationErrors};

/// Characters that count as "special" in a signup password.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

mod codes {
    pub const REQUIRED: &str = "required";
    pub const TOO_SHORT: &str = "too_short";
    pub const COMPLEXITY: &str = "complexity";
    pub const MISMATCH: &str = "mismatch";
    pub const UNCONFIRMED: &str = "unconfirmed";
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(codes::REQUIRED));
    }
    Ok(())
}

/// Blank passwords report `required`; the length rule is separate.
fn strong_password(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    let digit = value.chars().any(|c| c.is_ascii_digit());
    let special = value.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c));
    if digit && special {
        Ok(())
    } else {
        Err(ValidationError::new(codes::COMPLEXITY))
    }
}

fn checked(value: &bool) -> Result<(), ValidationError> {
    if *value {
        Ok(())
    } else {
        Err(ValidationError::new(codes::UNCONFIRMED))
    }
}

/// HTML checkboxes are either absent or carry a value such as `on`.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.is_some_and(|v| !matches!(v.as_str(), "" | "false" | "off" | "0")))
}

fn first_violation(
    errors: &ValidationErrors,
    rules: &[(&str, &'static str)],
) -> Option<&'static str> {
    let failed: Vec<&str> = errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .map(|e| e.code.as_ref())
        .collect();
    rules
        .iter()
        .find(|(code, _)| failed.contains(code))
        .map(|(_, message)| *message)
}

/// A form with an ordered list of `(error code, warning message)` rules.
pub trait PageForm: Validate {
    const RULES: &'static [(&'static str, &'static str)];

    /// `Err` carries the warning toast for the first rule that fails.
    fn check(&self) -> Result<(), &'static str> {
        match self.validate() {
            Ok(()) => Ok(()),
            Err(errors) => Err(first_violation(&errors, Self::RULES)
                .unwrap_or("Please check the form and try again")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupForm {
    #[validate(custom(function = "not_blank"))]
    pub full_name: String,
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[validate(
        length(min = 8, code = "too_short"),
        custom(function = "strong_password")
    )]
    pub password: String,
    pub organization: Option<String>,
    #[serde(deserialize_with = "checkbox")]
    pub newsletter: bool,
}

impl PageForm for SignupForm {
    const RULES: &'static [(&'static str, &'static str)] = &[
        (codes::REQUIRED, "Please fill in all required fields"),
        (
            codes::TOO_SHORT,
            "Password must be at least 8 characters long",
        ),
        (
            codes::COMPLEXITY,
            "Password must include at least one number and one special character",
        ),
    ];
}

impl From<SignupForm> for Registration {
    fn from(form: SignupForm) -> Self {
        Registration {
            email: form.email.trim().to_string(),
            password: form.password,
            full_name: form.full_name.trim().to_string(),
            organization: form.organization.filter(|o| !o.trim().is_empty()),
            newsletter: form.newsletter,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginForm {
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    /// Page the login modal was opened from.
    pub page: Option<String>,
}

impl PageForm for LoginForm {
    const RULES: &'static [(&'static str, &'static str)] =
        &[(codes::REQUIRED, "Please enter both email and password")];
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ForgotPasswordForm {
    #[validate(custom(function = "not_blank"))]
    pub email: String,
}

impl PageForm for ForgotPasswordForm {
    const RULES: &'static [(&'static str, &'static str)] = &[(
        codes::REQUIRED,
        "Please enter your email address to reset your password",
    )];
}

/// Personal-information form; empty inputs are ignored by the update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfoForm {
    pub full_name: Option<String>,
    pub organization: Option<String>,
    pub job_title: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
}

impl PageForm for PersonalInfoForm {
    const RULES: &'static [(&'static str, &'static str)] = &[];
}

impl From<PersonalInfoForm> for ProfileChanges {
    fn from(form: PersonalInfoForm) -> Self {
        ProfileChanges {
            full_name: form.full_name,
            organization: form.organization,
            job_title: form.job_title,
            bio: form.bio,
            phone: form.phone,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeEmailForm {
    #[validate(custom(function = "not_blank"))]
    pub new_email: String,
    #[validate(custom(function = "not_blank"))]
    pub password_for_email: String,
}

impl PageForm for ChangeEmailForm {
    const RULES: &'static [(&'static str, &'static str)] =
        &[(codes::REQUIRED, "Please fill in all fields")];
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordForm {
    #[validate(custom(function = "not_blank"))]
    pub current_password: String,
    #[validate(
        custom(function = "not_blank"),
        length(min = 8, code = "too_short")
    )]
    pub new_password: String,
    #[validate(
        custom(function = "not_blank"),
        must_match(other = "new_password", code = "mismatch")
    )]
    pub confirm_password: String,
}

impl PageForm for ChangePasswordForm {
    const RULES: &'static [(&'static str, &'static str)] = &[
        (codes::REQUIRED, "Please fill in all fields"),
        (codes::MISMATCH, "New passwords do not match"),
        (
            codes::TOO_SHORT,
            "Password must be at least 8 characters long",
        ),
    ];
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationsForm {
    #[serde(deserialize_with = "checkbox")]
    pub course_updates: bool,
    #[serde(deserialize_with = "checkbox")]
    pub new_courses: bool,
    #[serde(deserialize_with = "checkbox")]
    pub completion_reminders: bool,
    #[serde(deserialize_with = "checkbox")]
    pub discussion_replies: bool,
    #[serde(deserialize_with = "checkbox")]
    pub certificate_awarded: bool,
    #[serde(deserialize_with = "checkbox")]
    pub system_announcements: bool,
}

impl PageForm for NotificationsForm {
    const RULES: &'static [(&'static str, &'static str)] = &[];
}

impl From<NotificationsForm> for NotificationPreferences {
    fn from(form: NotificationsForm) -> Self {
        NotificationPreferences {
            email: EmailNotifications {
                course_updates: form.course_updates,
                new_courses: form.new_courses,
                completion_reminders: form.completion_reminders,
            },
            platform: PlatformNotifications {
                discussion_replies: form.discussion_replies,
                certificate_awarded: form.certificate_awarded,
                system_announcements: form.system_announcements,
            },
            updated_at: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesForm {
    pub language: Option<String>,
    pub timezone: Option<String>,
    #[serde(deserialize_with = "checkbox")]
    pub dark_mode: bool,
    #[serde(deserialize_with = "checkbox")]
    pub newsletter: bool,
}

impl PageForm for PreferencesForm {
    const RULES: &'static [(&'static str, &'static str)] = &[];
}

impl From<PreferencesForm> for UserPreferences {
    fn from(form: PreferencesForm) -> Self {
        let defaults = UserPreferences::default();
        let pick = |value: Option<String>, fallback: String| {
            value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
        };
        UserPreferences {
            language: pick(form.language, defaults.language),
            timezone: pick(form.timezone, defaults.timezone),
            dark_mode: form.dark_mode,
            newsletter: form.newsletter,
            updated_at: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteAccountForm {
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[serde(deserialize_with = "checkbox")]
    #[validate(custom(function = "checked"))]
    pub confirm_delete: bool,
}

impl PageForm for DeleteAccountForm {
    const RULES: &'static [(&'static str, &'static str)] = &[
        (codes::REQUIRED, "Please enter your password"),
        (
            codes::UNCONFIRMED,
            "Please confirm that you understand this action is permanent",
        ),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(full_name: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_signup_rule_order() {
        assert_eq!(
            signup("", "a@example.com", "x").check(),
            Err("Please fill in all required fields")
        );
        assert_eq!(
            signup("Alice", "a@example.com", "").check(),
            Err("Please fill in all required fields")
        );
        assert_eq!(
            signup("Alice", "a@example.com", "abc1!").check(),
            Err("Password must be at least 8 characters long")
        );
        assert_eq!(
            signup("Alice", "a@example.com", "abcdefgh1").check(),
            Err("Password must include at least one number and one special character")
        );
        assert_eq!(
            signup("Alice", "a@example.com", "abcdefgh!").check(),
            Err("Password must include at least one number and one special character")
        );
        assert_eq!(signup("Alice", "a@example.com", "abcdefg1!").check(), Ok(()));
    }

    #[test]
    fn test_special_chars_match_page() {
        for c in PASSWORD_SPECIAL_CHARS.chars() {
            let password = format!("abcdefg1{c}");
            assert_eq!(signup("A", "a@b.c", &password).check(), Ok(()), "{c}");
        }
        assert!(signup("A", "a@b.c", "abcdefg1-").check().is_err());
    }

    #[test]
    fn test_change_password_order() {
        let form = |cur: &str, new: &str, confirm: &str| ChangePasswordForm {
            current_password: cur.to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
        };
        assert_eq!(
            form("", "abcdefgh", "abcdefgh").check(),
            Err("Please fill in all fields")
        );
        assert_eq!(
            form("old", "short", "other").check(),
            Err("New passwords do not match")
        );
        assert_eq!(
            form("old", "short", "short").check(),
            Err("Password must be at least 8 characters long")
        );
        assert_eq!(form("old", "longenough", "longenough").check(), Ok(()));
    }

    #[test]
    fn test_delete_account_needs_confirmation() {
        let form = DeleteAccountForm {
            password: String::new(),
            confirm_delete: false,
        };
        assert_eq!(form.check(), Err("Please enter your password"));

        let form = DeleteAccountForm {
            password: "pw".to_string(),
            confirm_delete: false,
        };
        assert_eq!(
            form.check(),
            Err("Please confirm that you understand this action is permanent")
        );
    }

    #[test]
    fn test_checkbox_parsing() {
        let form: SignupForm = serde_json::from_value(serde_json::json!({
            "fullName": "Alice",
            "email": "a@example.com",
            "password": "abcdefg1!",
            "newsletter": "on"
        }))
        .unwrap();
        assert!(form.newsletter);

        let form: PreferencesForm =
            serde_json::from_value(serde_json::json!({"language": "fr"})).unwrap();
        assert!(!form.dark_mode);
        let prefs = UserPreferences::from(form);
        assert_eq!(prefs.language, "fr");
        assert_eq!(prefs.timezone, "UTC");
    }

    #[test]
    fn test_signup_into_registration() {
        let mut form = signup(" Alice ", " a@example.com ", "abcdefg1!");
        form.organization = Some("  ".to_string());
        let registration = Registration::from(form);
        assert_eq!(registration.full_name, "Alice");
        assert_eq!(registration.email, "a@example.com");
        assert_eq!(registration.organization, None);
    }
}
