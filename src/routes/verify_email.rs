// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Landing page for email-verification links.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;

use super::PageResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/verify-email", get(verify_email))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailParams {
    oob_code: Option<String>,
    continue_url: Option<String>,
}

/// Only same-site targets are offered as the "continue" button. The target
/// is resolved the way a browser would resolve a link on the frontend, then
/// must land on exactly the frontend's origin over http(s).
fn safe_continue_url(target: &str, frontend_url: &str) -> bool {
    let Ok(site) = Url::parse(frontend_url) else {
        return false;
    };
    match site.join(target.trim()) {
        Ok(resolved) => {
            matches!(resolved.scheme(), "http" | "https") && resolved.origin() == site.origin()
        }
        Err(_) => false,
    }
}

/// Applies the code and reports the outcome. No toast: the page shows a
/// success or error panel instead.
async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyEmailParams>,
) -> Json<PageResponse> {
    let result = state.facade.verify_email(params.oob_code.as_deref()).await;

    let mut response = PageResponse {
        success: result.success,
        message: result.message,
        ..Default::default()
    };
    if result.success {
        if let Some(url) = params
            .continue_url
            .filter(|u| safe_continue_url(u, &state.config.frontend_url))
        {
            response = response.with_data(&serde_json::json!({ "continueUrl": url }));
        }
    }
    Json(response)
}
