// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session/auth facade.
//!
//! Mediates every call to the identity provider, the profile store and the
//! blob store. It owns the one session of this process and publishes
//! sign-in/sign-out transitions on a watch channel.
//!
//! Operations the pages call directly return an [`ActionResult`] and never
//! fail. Operations that need a signed-in user and have no result contract
//! of their own return `Result` with [`AppError::NotLoggedIn`].

use crate::db::ProfileStore;
use crate::error::{AppError, AuthErrorCode, ProviderError, Result};
use crate::models::{
    ActionResult, AuthSession, CourseProgress, CurrentUser, ListField, LoginOutcome,
    NotificationPreferences, ProfileUpdate, Role, UserPreferences, UserProfile,
};
use crate::services::identity::{IdentityProvider, ProfileFields};
use crate::services::local_cache::{CachedAuthState, LocalSessionCache};
use crate::services::session_timer::{SessionTimer, TimerState};
use crate::services::storage::{profile_photo_key, validate_photo, BlobStore};
use crate::time_utils::now_rfc3339;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

/// User-facing strings returned in [`ActionResult::message`].
pub mod messages {
    pub const REGISTERED: &str =
        "Account created successfully. Please check your email to verify your account.";
    pub const LOGIN_OK: &str = "Login successful.";
    pub const LOGIN_UNVERIFIED: &str =
        "Login successful. Please verify your email to access all features.";
    pub const LOGOUT_OK: &str = "Logged out successfully.";
    pub const LOGOUT_FAILED: &str = "Failed to log out. Please try again.";
    pub const RESET_SENT: &str = "Password reset email sent. Please check your inbox.";
    pub const VERIFICATION_SENT: &str = "Verification email sent. Please check your inbox.";
    pub const PROFILE_UPDATED: &str = "Profile updated successfully.";
    pub const PROFILE_UPDATE_FAILED: &str = "Failed to update profile. Please try again.";
    pub const EMAIL_UPDATED: &str =
        "Email updated successfully. Please verify your new email address.";
    pub const PASSWORD_CHANGED: &str = "Password changed successfully.";
    pub const ACCOUNT_DELETED: &str = "Your account has been deleted.";
    pub const DELETE_WRONG_PASSWORD: &str = "Incorrect password. Please try again.";
    pub const DELETE_RECENT_LOGIN: &str =
        "For security reasons, please log out and log back in before deleting your account.";
    pub const DELETE_FAILED: &str = "Failed to delete account. Please try again.";
    pub const EMAIL_VERIFIED: &str = "Your email has been verified.";
    pub const NO_VERIFICATION_CODE: &str =
        "No verification code provided. Please check your email for a valid verification link.";
    pub const INVALID_VERIFICATION_LINK: &str =
        "This verification link is invalid or has expired. Please request a new verification email.";
}

/// Input for [`AuthFacade::register`].
#[derive(Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub organization: Option<String>,
    pub newsletter: bool,
}

/// Partial profile edit. Blank strings count as not provided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub photo_url: Option<String>,
    pub organization: Option<String>,
    pub job_title: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub newsletter: Option<bool>,
}

fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ProfileChanges {
    fn into_update(self, now: String) -> ProfileUpdate {
        ProfileUpdate {
            full_name: provided(self.full_name),
            photo_url: provided(self.photo_url),
            organization: provided(self.organization),
            job_title: provided(self.job_title),
            bio: provided(self.bio),
            phone: provided(self.phone),
            address: provided(self.address),
            newsletter: self.newsletter,
            updated_at: Some(now),
            ..Default::default()
        }
    }
}

/// Tunables for [`AuthFacade::new`].
#[derive(Debug, Clone)]
pub struct FacadeOptions {
    pub refresh_interval: Duration,
    /// Demo-mode persistence of the signed-in state.
    pub cache: Option<LocalSessionCache>,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(crate::config::DEFAULT_SESSION_REFRESH_SECS),
            cache: None,
        }
    }
}

#[derive(Clone)]
struct ActiveSession {
    auth: AuthSession,
    is_new_user: bool,
}

/// The process's single session. Written only by facade transitions.
#[derive(Default)]
pub struct SessionContext {
    inner: RwLock<Option<ActiveSession>>,
}

impl SessionContext {
    async fn snapshot(&self) -> Option<ActiveSession> {
        self.inner.read().await.clone()
    }

    async fn current(&self) -> Option<AuthSession> {
        self.inner.read().await.as_ref().map(|s| s.auth.clone())
    }

    async fn replace(&self, auth: AuthSession, is_new_user: bool) {
        *self.inner.write().await = Some(ActiveSession { auth, is_new_user });
    }

    async fn clear(&self) -> Option<AuthSession> {
        self.inner.write().await.take().map(|s| s.auth)
    }

    /// Whether `auth` is still the live session, not just the same user.
    async fn holds(&self, auth: &AuthSession) -> bool {
        self.inner
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.auth.uid == auth.uid && s.auth.refresh_token == auth.refresh_token)
    }

    /// Replace `previous` with its refreshed credentials, unless a logout
    /// or another login got there first.
    async fn rotate(&self, previous: &AuthSession, refreshed: AuthSession) -> bool {
        let mut guard = self.inner.write().await;
        match guard.as_mut() {
            Some(active)
                if active.auth.uid == previous.uid
                    && active.auth.refresh_token == previous.refresh_token =>
            {
                active.auth = refreshed;
                true
            }
            _ => false,
        }
    }

    /// Swap in new credentials if the same user is still signed in.
    async fn update(&self, auth: AuthSession) -> bool {
        let mut guard = self.inner.write().await;
        match guard.as_mut() {
            Some(active) if active.auth.uid == auth.uid => {
                active.auth = auth;
                true
            }
            _ => false,
        }
    }
}

/// Handle returned by [`AuthFacade::on_auth_change`]. Dropping it
/// unsubscribes too.
pub struct AuthSubscription {
    handle: JoinHandle<()>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct AuthFacade {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    blobs: Arc<dyn BlobStore>,
    session: SessionContext,
    timer: SessionTimer,
    auth_state: watch::Sender<Option<CurrentUser>>,
    cache: Option<LocalSessionCache>,
    /// Lets the timer task call back into the facade without keeping it alive.
    me: Weak<AuthFacade>,
}

impl AuthFacade {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        blobs: Arc<dyn BlobStore>,
        options: FacadeOptions,
    ) -> Arc<Self> {
        let (auth_state, _) = watch::channel(None);
        Arc::new_cyclic(|me| Self {
            identity,
            profiles,
            blobs,
            session: SessionContext::default(),
            timer: SessionTimer::new(options.refresh_interval),
            auth_state,
            cache: options.cache,
            me: me.clone(),
        })
    }

    // ─── Core Operations ─────────────────────────────────────────

    /// Create an account and sign the new user in.
    pub async fn register(&self, registration: Registration) -> ActionResult {
        let Registration {
            email,
            password,
            full_name,
            organization,
            newsletter,
        } = registration;

        let session = match self.identity.create_user(&email, &password).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "Registration failed");
                return ActionResult::from_provider_error(&e);
            }
        };
        let uid = session.uid.clone();

        // The account exists from here on; the rest is best-effort.
        let fields = ProfileFields {
            display_name: Some(full_name.clone()),
            photo_url: None,
        };
        let session = match self.identity.update_profile(&session, &fields).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Failed to set display name");
                session
            }
        };

        if let Err(e) = self.identity.send_email_verification(&session).await {
            tracing::warn!(uid = %uid, error = %e, "Failed to send verification email");
        }

        let profile = UserProfile::new_student(
            &full_name,
            &email,
            organization.as_deref().unwrap_or_default(),
            newsletter,
            &now_rfc3339(),
        );
        if let Err(e) = self.profiles.create_profile(&uid, &profile).await {
            tracing::warn!(uid = %uid, error = %e, "Failed to create profile record");
        }

        tracing::info!(uid = %uid, "User registered");
        self.signed_in(session, true).await;

        ActionResult::ok(messages::REGISTERED)
    }

    pub async fn login(&self, email: &str, password: &str) -> ActionResult<LoginOutcome> {
        let session = match self.identity.sign_in(email, password).await {
            Ok(session) => session,
            Err(e) => {
                tracing::info!(email, code = %e.code, "Login rejected");
                return ActionResult::from_provider_error(&e);
            }
        };

        let update = ProfileUpdate {
            last_login: Some(now_rfc3339()),
            is_verified: session.email_verified.then_some(true),
            ..Default::default()
        };
        if let Err(e) = self.profiles.update_profile(&session.uid, &update).await {
            tracing::warn!(uid = %session.uid, error = %e, "Failed to record last login");
        }

        let verified = session.email_verified;
        tracing::info!(uid = %session.uid, verified, "User logged in");
        self.signed_in(session, false).await;

        let message = if verified {
            messages::LOGIN_OK
        } else {
            messages::LOGIN_UNVERIFIED
        };
        ActionResult::ok(message).with_data(LoginOutcome { verified })
    }

    pub async fn logout(&self) -> ActionResult {
        if let Some(session) = self.session.current().await {
            if let Err(e) = self.identity.sign_out(&session).await {
                tracing::error!(uid = %session.uid, error = %e, "Sign-out failed");
                return ActionResult::fail(messages::LOGOUT_FAILED);
            }
            tracing::info!(uid = %session.uid, "User logged out");
        }
        self.signed_out().await;
        ActionResult::ok(messages::LOGOUT_OK)
    }

    pub async fn reset_password(&self, email: &str) -> ActionResult {
        match self.identity.send_password_reset(email).await {
            Ok(()) => ActionResult::ok(messages::RESET_SENT),
            Err(e) => {
                tracing::warn!(error = %e, "Password reset request failed");
                ActionResult::from_provider_error(&e)
            }
        }
    }

    pub async fn resend_verification(&self) -> ActionResult {
        let Some(session) = self.session.current().await else {
            return ActionResult::fail(AppError::NotLoggedIn.to_string());
        };
        match self.identity.send_email_verification(&session).await {
            Ok(()) => ActionResult::ok(messages::VERIFICATION_SENT),
            Err(e) => ActionResult::from_provider_error(&e),
        }
    }

    /// Write the provided fields of `changes`; display name and photo are
    /// pushed to the identity record as well.
    pub async fn update_profile(&self, changes: ProfileChanges) -> ActionResult {
        match self.try_update_profile(changes).await {
            Ok(()) => ActionResult::ok(messages::PROFILE_UPDATED),
            Err(e) => {
                tracing::warn!(error = %e, "Profile update failed");
                ActionResult::fail(messages::PROFILE_UPDATE_FAILED)
            }
        }
    }

    async fn try_update_profile(&self, changes: ProfileChanges) -> Result<()> {
        let session = self.require_session().await?;
        let update = changes.into_update(now_rfc3339());

        let fields = ProfileFields {
            display_name: update.full_name.clone(),
            photo_url: update.photo_url.clone(),
        };
        if !fields.is_empty() {
            let updated = self.identity.update_profile(&session, &fields).await?;
            self.session.update(updated).await;
        }

        self.profiles.update_profile(&session.uid, &update).await?;
        tracing::info!(uid = %session.uid, fields = ?update.field_paths(), "Profile updated");
        Ok(())
    }

    pub async fn change_email(&self, new_email: &str, current_password: &str) -> ActionResult {
        let Some(session) = self.session.current().await else {
            return ActionResult::fail(AppError::NotLoggedIn.to_string());
        };

        let session = match self.reauthenticated(&session, current_password).await {
            Ok(session) => session,
            Err(e) => return ActionResult::from_provider_error(&e),
        };
        let session = match self.identity.update_email(&session, new_email).await {
            Ok(session) => session,
            Err(e) => return ActionResult::from_provider_error(&e),
        };
        self.session.update(session.clone()).await;

        if let Err(e) = self.identity.send_email_verification(&session).await {
            tracing::warn!(uid = %session.uid, error = %e, "Failed to send verification email");
        }
        let update = ProfileUpdate {
            email: Some(new_email.to_string()),
            is_verified: Some(false),
            updated_at: Some(now_rfc3339()),
            ..Default::default()
        };
        if let Err(e) = self.profiles.update_profile(&session.uid, &update).await {
            tracing::warn!(uid = %session.uid, error = %e, "Failed to record email change");
        }

        tracing::info!(uid = %session.uid, "Email changed");
        ActionResult::ok(messages::EMAIL_UPDATED)
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> ActionResult {
        let Some(session) = self.session.current().await else {
            return ActionResult::fail(AppError::NotLoggedIn.to_string());
        };

        let session = match self.reauthenticated(&session, current_password).await {
            Ok(session) => session,
            Err(e) => return ActionResult::from_provider_error(&e),
        };
        let session = match self.identity.update_password(&session, new_password).await {
            Ok(session) => session,
            Err(e) => return ActionResult::from_provider_error(&e),
        };
        self.session.update(session.clone()).await;

        let now = now_rfc3339();
        let update = ProfileUpdate {
            updated_at: Some(now.clone()),
            password_last_changed: Some(now),
            ..Default::default()
        };
        if let Err(e) = self.profiles.update_profile(&session.uid, &update).await {
            tracing::warn!(uid = %session.uid, error = %e, "Failed to record password change");
        }

        tracing::info!(uid = %session.uid, "Password changed");
        ActionResult::ok(messages::PASSWORD_CHANGED)
    }

    /// Re-authenticate and adopt the fresh credentials.
    async fn reauthenticated(
        &self,
        session: &AuthSession,
        password: &str,
    ) -> std::result::Result<AuthSession, ProviderError> {
        let fresh = self.identity.reauthenticate(session, password).await?;
        self.session.update(fresh.clone()).await;
        Ok(fresh)
    }

    // ─── Roles & Current User ────────────────────────────────────

    /// Role from the profile record; `None` when signed out, missing or
    /// unreadable.
    async fn current_role(&self) -> Option<Role> {
        let session = self.session.current().await?;
        match self.profiles.get_profile(&session.uid).await {
            Ok(profile) => profile.map(|p| p.role),
            Err(e) => {
                tracing::warn!(uid = %session.uid, error = %e, "Role lookup failed");
                None
            }
        }
    }

    pub async fn has_role(&self, role: Role) -> bool {
        self.current_role().await == Some(role)
    }

    pub async fn is_admin(&self) -> bool {
        self.has_role(Role::Admin).await
    }

    pub async fn is_instructor(&self) -> bool {
        self.current_role().await.is_some_and(|role| role.is_staff())
    }

    /// Identity merged with the profile record. A store failure degrades to
    /// identity fields only.
    pub async fn get_current_user(&self) -> Option<CurrentUser> {
        let active = self.session.snapshot().await?;
        let profile = match self.profiles.get_profile(&active.auth.uid).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(uid = %active.auth.uid, error = %e, "Profile lookup failed");
                None
            }
        };
        Some(CurrentUser::from_parts(
            &active.auth,
            profile,
            active.is_new_user,
        ))
    }

    pub async fn current_session(&self) -> Option<AuthSession> {
        self.session.current().await
    }

    // ─── Auth State ──────────────────────────────────────────────

    /// Call `callback` with the current state now and after every sign-in
    /// or sign-out. Rapid transitions may be coalesced into the latest one.
    pub fn on_auth_change<F>(&self, callback: F) -> AuthSubscription
    where
        F: Fn(Option<CurrentUser>) + Send + Sync + 'static,
    {
        let mut rx = self.auth_state.subscribe();
        let handle = tokio::spawn(async move {
            let current = rx.borrow_and_update().clone();
            callback(current);
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                callback(next);
            }
        });
        AuthSubscription { handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.auth_state.subscribe()
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    async fn signed_in(&self, session: AuthSession, is_new_user: bool) {
        self.session.replace(session, is_new_user).await;
        self.arm_session_timer();

        let user = self.get_current_user().await;
        if let Some(user) = &user {
            self.persist(CachedAuthState::signed_in(user)).await;
        }
        self.auth_state.send_replace(user);
    }

    async fn signed_out(&self) {
        self.session.clear().await;
        self.timer.disarm();
        self.persist(CachedAuthState::default()).await;
        self.auth_state.send_replace(None);
    }

    async fn persist(&self, state: CachedAuthState) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.store(&state).await {
            tracing::warn!(error = %e, "Failed to persist session cache");
        }
    }

    fn arm_session_timer(&self) {
        let facade = self.me.clone();
        self.timer.arm(move || async move {
            if let Some(facade) = facade.upgrade() {
                facade.refresh_session().await;
            }
        });
    }

    /// Exchange the refresh token. On failure the user is logged out.
    /// Returns whether a session is still active.
    pub async fn refresh_session(&self) -> bool {
        let Some(session) = self.session.current().await else {
            return false;
        };

        // The session may change while the provider call is in flight.
        match self.identity.refresh(&session).await {
            Ok(refreshed) => {
                if self.session.rotate(&session, refreshed).await {
                    self.arm_session_timer();
                    tracing::info!(uid = %session.uid, "Session refreshed");
                    true
                } else {
                    tracing::debug!(uid = %session.uid, "Session replaced during refresh");
                    self.session.current().await.is_some()
                }
            }
            Err(e) => {
                if !self.session.holds(&session).await {
                    tracing::debug!(uid = %session.uid, error = %e, "Stale session refresh failed");
                    return self.session.current().await.is_some();
                }
                tracing::warn!(uid = %session.uid, error = %e, "Session refresh failed, logging out");
                self.logout().await;
                false
            }
        }
    }

    /// Demo-mode start-up: adopt the cached session if the provider still
    /// knows the user, otherwise forget it.
    pub async fn restore_session(&self) -> Result<bool> {
        let Some(cache) = &self.cache else {
            return Ok(false);
        };
        let cached = cache.load().await?;

        if let (true, Some(user)) = (cached.is_authenticated, cached.user) {
            if let Some(session) = self.identity.resume(&user.uid).await? {
                tracing::info!(uid = %user.uid, "Restored cached session");
                self.signed_in(session, user.is_new_user).await;
                return Ok(true);
            }
            tracing::info!(uid = %user.uid, "Cached session no longer valid");
        }

        cache.clear().await?;
        Ok(false)
    }

    // ─── Profile Page ────────────────────────────────────────────

    async fn require_session(&self) -> Result<AuthSession> {
        self.session.current().await.ok_or(AppError::NotLoggedIn)
    }

    pub async fn update_notification_preferences(
        &self,
        mut preferences: NotificationPreferences,
    ) -> Result<()> {
        let session = self.require_session().await?;
        preferences.updated_at = now_rfc3339();
        let update = ProfileUpdate {
            notification_preferences: Some(preferences),
            ..Default::default()
        };
        self.profiles.update_profile(&session.uid, &update).await?;
        tracing::info!(uid = %session.uid, "Notification preferences updated");
        Ok(())
    }

    /// Store display preferences; `newsletter` is mirrored at the record root.
    pub async fn update_preferences(&self, mut preferences: UserPreferences) -> Result<()> {
        let session = self.require_session().await?;
        preferences.updated_at = now_rfc3339();
        let update = ProfileUpdate {
            newsletter: Some(preferences.newsletter),
            preferences: Some(preferences),
            ..Default::default()
        };
        self.profiles.update_profile(&session.uid, &update).await?;
        tracing::info!(uid = %session.uid, "Preferences updated");
        Ok(())
    }

    /// Upload a new profile photo and point the identity and profile at it.
    /// Returns the download URL.
    pub async fn upload_profile_photo(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let session = self.require_session().await?;
        validate_photo(&bytes, content_type).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let key = profile_photo_key(&session.uid, chrono::Utc::now().timestamp_millis());
        self.blobs
            .upload(&key, bytes, content_type, &session.id_token)
            .await?;
        let url = self.blobs.download_url(&key, &session.id_token).await?;

        let fields = ProfileFields {
            display_name: None,
            photo_url: Some(url.clone()),
        };
        let updated = self.identity.update_profile(&session, &fields).await?;
        self.session.update(updated).await;

        let update = ProfileUpdate {
            photo_url: Some(url.clone()),
            updated_at: Some(now_rfc3339()),
            ..Default::default()
        };
        self.profiles.update_profile(&session.uid, &update).await?;

        tracing::info!(uid = %session.uid, key = %key, "Profile photo updated");
        Ok(url)
    }

    pub async fn delete_account(&self, password: &str) -> ActionResult {
        match self.try_delete_account(password).await {
            Ok(()) => ActionResult::ok(messages::ACCOUNT_DELETED),
            Err(e) => {
                tracing::warn!(error = %e, "Account deletion failed");
                let message = match e.auth_code() {
                    Some(AuthErrorCode::WrongPassword) => messages::DELETE_WRONG_PASSWORD,
                    Some(AuthErrorCode::RequiresRecentLogin) => messages::DELETE_RECENT_LOGIN,
                    _ => messages::DELETE_FAILED,
                };
                let mut result = ActionResult::fail(message);
                result.error_code = e.auth_code().map(|code| code.as_str().to_string());
                result
            }
        }
    }

    async fn try_delete_account(&self, password: &str) -> Result<()> {
        let session = self.require_session().await?;
        let session = self.reauthenticated(&session, password).await?;

        self.profiles.delete_profile(&session.uid).await?;
        self.identity.delete_account(&session).await?;

        tracing::info!(uid = %session.uid, "Account deleted");
        self.signed_out().await;
        Ok(())
    }

    /// Apply an email-verification action code.
    pub async fn verify_email(&self, action_code: Option<&str>) -> ActionResult {
        let Some(code) = action_code.map(str::trim).filter(|c| !c.is_empty()) else {
            return ActionResult::fail(messages::NO_VERIFICATION_CODE);
        };

        let email = match self.identity.apply_action_code(code).await {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(error = %e, "Email verification failed");
                let mut result = ActionResult::fail(messages::INVALID_VERIFICATION_LINK);
                result.error_code = Some(e.code.as_str().to_string());
                return result;
            }
        };

        // The link may belong to an account other than the signed-in one.
        // That owner's record catches up on their next login.
        if let Some(session) = self
            .session
            .current()
            .await
            .filter(|s| s.email.eq_ignore_ascii_case(&email))
        {
            self.session
                .update(AuthSession {
                    email_verified: true,
                    ..session.clone()
                })
                .await;
            let update = ProfileUpdate {
                is_verified: Some(true),
                updated_at: Some(now_rfc3339()),
                ..Default::default()
            };
            if let Err(e) = self.profiles.update_profile(&session.uid, &update).await {
                tracing::warn!(uid = %session.uid, error = %e, "Failed to mark profile verified");
            }
        }

        tracing::info!(email = %email, "Email verified");
        ActionResult::ok(messages::EMAIL_VERIFIED)
    }

    // ─── Course Page ─────────────────────────────────────────────

    pub async fn enroll_in_course(&self, course_id: &str) -> Result<()> {
        let session = self.require_session().await?;
        self.profiles
            .append_to_list(&session.uid, ListField::Courses, course_id, &now_rfc3339())
            .await?;
        tracing::info!(uid = %session.uid, course_id, "Enrolled in course");
        Ok(())
    }

    pub async fn award_certificate(&self, certificate_id: &str) -> Result<()> {
        let session = self.require_session().await?;
        self.profiles
            .append_to_list(
                &session.uid,
                ListField::Certificates,
                certificate_id,
                &now_rfc3339(),
            )
            .await?;
        tracing::info!(uid = %session.uid, certificate_id, "Certificate awarded");
        Ok(())
    }

    pub async fn record_lesson_completion(
        &self,
        course_id: &str,
        lesson_id: &str,
        total_lessons: u32,
    ) -> Result<CourseProgress> {
        let session = self.require_session().await?;
        if total_lessons == 0 {
            return Err(AppError::BadRequest(
                "totalLessons must be at least 1".to_string(),
            ));
        }

        let profile = self
            .profiles
            .get_profile(&session.uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile {}", session.uid)))?;

        let mut progress = profile.progress.get(course_id).cloned().unwrap_or_default();
        progress.complete_lesson(lesson_id, total_lessons, &now_rfc3339());

        self.profiles
            .set_progress(&session.uid, course_id, &progress)
            .await?;
        tracing::debug!(
            uid = %session.uid,
            course_id,
            lesson_id,
            percent = progress.percent,
            "Lesson completed"
        );
        Ok(progress)
    }
}
