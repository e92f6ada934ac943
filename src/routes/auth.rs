// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, login, logout and password-reset controllers.

use axum::{
    extract::State,
    routing::{get, post},
    Form, Json, Router,
};
use std::sync::Arc;

use super::{PageResponse, DASHBOARD_PAGE, LANDING_PAGE};
use crate::services::facade::Registration;
use crate::ui::views::HeaderView;
use crate::validation::{ForgotPasswordForm, LoginForm, PageForm, SignupForm};
use crate::AppState;

pub const LOGIN_MODAL: &str = "loginModal";
pub const SIGNUP_MODAL: &str = "signupModal";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/session", get(session))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Json<PageResponse> {
    if let Err(warning) = form.check() {
        return Json(PageResponse::warning(&state.toasts, warning));
    }

    let result = state.facade.register(Registration::from(form)).await;
    let mut response = PageResponse::from_result(&state.toasts, &result);
    if result.success {
        state.modals.close_modal(SIGNUP_MODAL);
        response = response.close_modal(SIGNUP_MODAL);
    }
    Json(response)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Json<PageResponse> {
    if let Err(warning) = form.check() {
        return Json(PageResponse::warning(&state.toasts, warning));
    }

    let result = state.facade.login(form.email.trim(), &form.password).await;
    if !result.success {
        return Json(PageResponse::from_result(&state.toasts, &result));
    }

    state.modals.close_modal(LOGIN_MODAL);
    let mut response = PageResponse::success(&state.toasts, "Login successful")
        .close_modal(LOGIN_MODAL);
    if let Some(outcome) = &result.data {
        response = response.with_data(outcome);
    }

    // Only the landing page moves on to the dashboard.
    let from_landing = form
        .page
        .as_deref()
        .is_some_and(|page| page.contains(LANDING_PAGE));
    let response = if from_landing {
        response.redirect(DASHBOARD_PAGE)
    } else {
        response.reload()
    };
    Json(response)
}

async fn logout(State(state): State<Arc<AppState>>) -> Json<PageResponse> {
    let result = state.facade.logout().await;
    let response = PageResponse::from_result(&state.toasts, &result);
    if result.success {
        return Json(response.redirect(LANDING_PAGE));
    }
    Json(response)
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ForgotPasswordForm>,
) -> Json<PageResponse> {
    if let Err(warning) = form.check() {
        return Json(PageResponse::warning(&state.toasts, warning));
    }
    let result = state.facade.reset_password(form.email.trim()).await;
    Json(PageResponse::from_result(&state.toasts, &result))
}

/// Header state for whoever is signed in (or nobody).
async fn session(State(state): State<Arc<AppState>>) -> Json<HeaderView> {
    let user = state.facade.get_current_user().await;
    Json(HeaderView::for_user(user.as_ref()))
}
