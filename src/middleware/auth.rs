// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session-required middleware for the profile and course pages.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// The signed-in user, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
}

/// Middleware that answers 401 unless a session is active.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(session) = state.facade.current_session().await else {
        tracing::debug!(path = %request.uri().path(), "Rejected request without a session");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let auth_user = AuthUser {
        uid: session.uid,
        email: session.email,
        email_verified: session.email_verified,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
