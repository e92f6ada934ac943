// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP page controllers.

pub mod auth;
pub mod course;
pub mod profile;
pub mod ui;
pub mod verify_email;

use crate::middleware::auth::require_session;
use crate::middleware::security::with_page_headers;
use crate::models::ActionResult;
use crate::ui::{Toast, ToastManager};
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Page the landing-page login redirects away from.
pub const LANDING_PAGE: &str = "lms.html";
pub const DASHBOARD_PAGE: &str = "dashboard.html";

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// What a page controller tells the page to do: show a toast, and maybe
/// close a modal, reload, or navigate.
#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toast: Option<Toast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_modal: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub data: Option<serde_json::Value>,
}

impl PageResponse {
    pub fn success(toasts: &ToastManager, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: true,
            toast: Some(toasts.success(message.clone())),
            message,
            ..Default::default()
        }
    }

    pub fn error(toasts: &ToastManager, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            toast: Some(toasts.error(message.clone())),
            message,
            ..Default::default()
        }
    }

    /// Form rejected before anything was sent.
    pub fn warning(toasts: &ToastManager, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            toast: Some(toasts.warning(message.clone())),
            message,
            ..Default::default()
        }
    }

    /// Toast the facade's own message, success or error.
    pub fn from_result<T>(toasts: &ToastManager, result: &ActionResult<T>) -> Self {
        if result.success {
            Self::success(toasts, result.message.clone())
        } else {
            Self::error(toasts, result.message.clone())
        }
    }

    pub fn close_modal(mut self, modal_id: &str) -> Self {
        self.close_modal = Some(modal_id.to_string());
        self
    }

    pub fn redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect = Some(to.into());
        self
    }

    pub fn reload(mut self) -> Self {
        self.reload = true;
        self
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.data = Some(value),
            Err(e) => tracing::error!(error = %e, "Failed to serialize page data"),
        }
        self
    }
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(verify_email::routes())
        .merge(course::public_routes())
        .merge(ui::routes());

    // Pages that need a signed-in user
    let protected_routes = Router::new()
        .merge(profile::routes())
        .merge(course::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let pages = Router::new().merge(public_routes).merge(protected_routes);

    with_page_headers(pages)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
