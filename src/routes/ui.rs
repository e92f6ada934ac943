// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Modal, toast and notification-panel state shared by every page.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::ui::{NotificationsPanel, Toast};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ui/state", get(ui_state))
        .route("/ui/modals/{modal_id}/open", post(open_modal))
        .route("/ui/modals/close", post(close_modal))
        .route("/ui/keydown", post(keydown))
        .route("/ui/backdrop-click", post(backdrop_click))
        .route("/ui/toasts/{id}/close", post(close_toast))
        .route("/ui/notifications", get(notifications))
        .route("/ui/notifications/toggle", post(toggle_notifications))
        .route("/ui/notifications/close", post(close_notifications))
        .route("/ui/notifications/read-all", post(mark_all_read))
        .route("/ui/notifications/{id}/read", post(mark_read))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub active_modal: Option<String>,
    pub scroll_locked: bool,
    pub toasts: Vec<Toast>,
    pub unread_notifications: usize,
}

async fn ui_state(State(state): State<Arc<AppState>>) -> Json<UiState> {
    let unread_notifications = state.notifications.lock().await.unread_count();
    Json(UiState {
        active_modal: state.modals.active(),
        scroll_locked: state.modals.scroll_locked(),
        toasts: state.toasts.active(),
        unread_notifications,
    })
}

async fn open_modal(
    State(state): State<Arc<AppState>>,
    Path(modal_id): Path<String>,
) -> Result<Json<UiState>> {
    if !state.modals.open(&modal_id) {
        return Err(AppError::NotFound(format!("modal {}", modal_id)));
    }
    Ok(ui_state(State(state)).await)
}

async fn close_modal(State(state): State<Arc<AppState>>) -> Json<UiState> {
    state.modals.close();
    ui_state(State(state)).await
}

#[derive(Debug, Deserialize)]
pub struct KeyEvent {
    key: String,
}

async fn keydown(
    State(state): State<Arc<AppState>>,
    Json(event): Json<KeyEvent>,
) -> Json<UiState> {
    state.modals.handle_key(&event.key);
    ui_state(State(state)).await
}

async fn backdrop_click(State(state): State<Arc<AppState>>) -> Json<UiState> {
    state.modals.handle_backdrop_click();
    ui_state(State(state)).await
}

async fn close_toast(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> StatusCode {
    if state.toasts.close(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn notifications(State(state): State<Arc<AppState>>) -> Json<NotificationsPanel> {
    Json(state.notifications.lock().await.clone())
}

async fn toggle_notifications(State(state): State<Arc<AppState>>) -> Json<NotificationsPanel> {
    let mut panel = state.notifications.lock().await;
    panel.toggle();
    Json(panel.clone())
}

async fn close_notifications(State(state): State<Arc<AppState>>) -> Json<NotificationsPanel> {
    let mut panel = state.notifications.lock().await;
    panel.close();
    Json(panel.clone())
}

async fn mark_all_read(State(state): State<Arc<AppState>>) -> Json<NotificationsPanel> {
    let mut panel = state.notifications.lock().await;
    panel.mark_all_read();
    Json(panel.clone())
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Json<NotificationsPanel> {
    let mut panel = state.notifications.lock().await;
    panel.mark_read(id);
    Json(panel.clone())
}
