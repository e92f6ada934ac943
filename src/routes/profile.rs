// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile page controllers. Every route here sits behind `require_session`.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use std::sync::Arc;

use super::{PageResponse, LANDING_PAGE};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{NotificationPreferences, UserPreferences};
use crate::services::facade::ProfileChanges;
use crate::services::storage::{validate_photo, MAX_PHOTO_BYTES};
use crate::ui::views::ProfileView;
use crate::validation::{
    ChangeEmailForm, ChangePasswordForm, DeleteAccountForm, NotificationsForm, PageForm,
    PersonalInfoForm, PreferencesForm,
};
use crate::AppState;

pub const UPLOAD_PHOTO_MODAL: &str = "uploadPhotoModal";
pub const DELETE_ACCOUNT_MODAL: &str = "deleteAccountModal";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/personal-info", post(update_personal_info))
        .route("/profile/email", post(change_email))
        .route("/profile/password", post(change_password))
        .route("/profile/notifications", post(update_notifications))
        .route("/profile/preferences", post(update_preferences))
        // Oversized photos must reach the handler to get the warning toast.
        .route(
            "/profile/photo",
            post(upload_photo).layer(DefaultBodyLimit::max(4 * MAX_PHOTO_BYTES)),
        )
        .route("/profile/delete", post(delete_account))
        .route("/profile/resend-verification", post(resend_verification))
}

async fn profile_view(state: &AppState) -> Result<ProfileView> {
    let user = state
        .facade
        .get_current_user()
        .await
        .ok_or(AppError::NotLoggedIn)?;
    Ok(ProfileView::new(&user))
}

async fn get_profile(State(state): State<Arc<AppState>>) -> Result<Json<ProfileView>> {
    Ok(Json(profile_view(&state).await?))
}

/// Attach the refreshed profile view so the page can re-render.
async fn with_profile(state: &AppState, response: PageResponse) -> PageResponse {
    match profile_view(state).await {
        Ok(view) => response.with_data(&view),
        Err(_) => response,
    }
}

async fn update_personal_info(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PersonalInfoForm>,
) -> Json<PageResponse> {
    if let Err(warning) = form.check() {
        return Json(PageResponse::warning(&state.toasts, warning));
    }

    let result = state.facade.update_profile(ProfileChanges::from(form)).await;
    if !result.success {
        return Json(PageResponse::from_result(&state.toasts, &result));
    }
    let response = PageResponse::success(&state.toasts, "Profile updated successfully");
    Json(with_profile(&state, response).await)
}

async fn change_email(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ChangeEmailForm>,
) -> Json<PageResponse> {
    if let Err(warning) = form.check() {
        return Json(PageResponse::warning(&state.toasts, warning));
    }

    let result = state
        .facade
        .change_email(form.new_email.trim(), &form.password_for_email)
        .await;
    let response = PageResponse::from_result(&state.toasts, &result);
    if result.success {
        return Json(with_profile(&state, response).await);
    }
    Json(response)
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ChangePasswordForm>,
) -> Json<PageResponse> {
    if let Err(warning) = form.check() {
        return Json(PageResponse::warning(&state.toasts, warning));
    }

    let result = state
        .facade
        .change_password(&form.current_password, &form.new_password)
        .await;
    Json(PageResponse::from_result(&state.toasts, &result))
}

async fn update_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Form(form): Form<NotificationsForm>,
) -> Json<PageResponse> {
    let preferences = NotificationPreferences::from(form);
    match state
        .facade
        .update_notification_preferences(preferences)
        .await
    {
        Ok(()) => Json(PageResponse::success(
            &state.toasts,
            "Notification preferences updated",
        )),
        Err(e) => {
            tracing::warn!(uid = %user.uid, error = %e, "Notification preference update failed");
            Json(PageResponse::error(
                &state.toasts,
                "Failed to update notification preferences",
            ))
        }
    }
}

async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Form(form): Form<PreferencesForm>,
) -> Json<PageResponse> {
    let preferences = UserPreferences::from(form);
    match state.facade.update_preferences(preferences).await {
        Ok(()) => {
            let response = PageResponse::success(&state.toasts, "Preferences updated successfully");
            Json(with_profile(&state, response).await)
        }
        Err(e) => {
            tracing::warn!(uid = %user.uid, error = %e, "Preference update failed");
            Json(PageResponse::error(&state.toasts, "Failed to update preferences"))
        }
    }
}

/// Raw image body; the type comes from `Content-Type`.
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<PageResponse> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Err(e) = validate_photo(&body, content_type) {
        return Json(PageResponse::warning(&state.toasts, e.to_string()));
    }

    match state
        .facade
        .upload_profile_photo(body.to_vec(), content_type)
        .await
    {
        Ok(url) => {
            state.modals.close_modal(UPLOAD_PHOTO_MODAL);
            let response = PageResponse::success(&state.toasts, "Profile photo updated successfully")
                .close_modal(UPLOAD_PHOTO_MODAL);
            tracing::debug!(uid = %user.uid, url = %url, "Photo uploaded");
            Json(with_profile(&state, response).await)
        }
        Err(e) => {
            tracing::warn!(uid = %user.uid, error = %e, "Photo upload failed");
            Json(PageResponse::error(
                &state.toasts,
                "Failed to upload photo. Please try again.",
            ))
        }
    }
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    Form(form): Form<DeleteAccountForm>,
) -> Json<PageResponse> {
    if let Err(warning) = form.check() {
        return Json(PageResponse::warning(&state.toasts, warning));
    }

    let result = state.facade.delete_account(&form.password).await;
    let response = PageResponse::from_result(&state.toasts, &result);
    if result.success {
        state.modals.close_modal(DELETE_ACCOUNT_MODAL);
        return Json(response.redirect(LANDING_PAGE));
    }
    Json(response)
}

async fn resend_verification(State(state): State<Arc<AppState>>) -> Json<PageResponse> {
    let result = state.facade.resend_verification().await;
    Json(PageResponse::from_result(&state.toasts, &result))
}
