// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! LMS Portal: session/auth facade and page controllers for a course site.
//!
//! Accounts live in an identity provider (Firebase Auth, or an in-process
//! demo provider), per-user records in Firestore, and profile photos in
//! Firebase Storage. Pages talk to this server through small form
//! controllers that answer with toast/redirect directives.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod ui;
pub mod validation;

use config::{AuthBackend, Config};
use db::{FirestoreDb, MemoryProfileStore, ProfileStore};
use error::AppError;
use services::demo_auth::random_hex;
use services::{
    AuthFacade, BlobStore, DemoIdentityProvider, FacadeOptions, FirebaseAuth, FirebaseStorage,
    IdentityProvider, LocalSessionCache, MemoryBlobStore,
};
use std::sync::Arc;
use ui::{ModalManager, NotificationsPanel, ToastManager, PAGE_MODALS};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub facade: Arc<AuthFacade>,
    pub toasts: ToastManager,
    pub modals: ModalManager,
    pub notifications: tokio::sync::Mutex<NotificationsPanel>,
}

impl AppState {
    pub fn new(config: Config, facade: Arc<AuthFacade>) -> Self {
        Self {
            toasts: ToastManager::new(config.toast_dismiss_after),
            modals: ModalManager::new(PAGE_MODALS),
            notifications: tokio::sync::Mutex::new(NotificationsPanel::course_feed()),
            config,
            facade,
        }
    }
}

/// Wire the facade to the backends `config` selects.
pub async fn build_facade(config: &Config) -> Result<Arc<AuthFacade>, AppError> {
    let identity: Arc<dyn IdentityProvider>;
    let profiles: Arc<dyn ProfileStore>;
    let blobs: Arc<dyn BlobStore>;
    let mut cache = None;

    match config.auth_backend {
        AuthBackend::Firebase => {
            identity = Arc::new(FirebaseAuth::new(config.firebase_api_key.clone()));
            profiles = Arc::new(FirestoreDb::new(&config.gcp_project_id).await?);
            blobs = Arc::new(FirebaseStorage::new(config.storage_bucket.clone()));
        }
        AuthBackend::Demo => {
            let signing_key = match &config.demo_signing_key {
                Some(key) => key.clone(),
                None => {
                    tracing::warn!("DEMO_SIGNING_KEY not set; generating a per-process key");
                    random_hex(32)?.into_bytes()
                }
            };
            identity = Arc::new(DemoIdentityProvider::new(signing_key));
            profiles = Arc::new(MemoryProfileStore::new());
            blobs = Arc::new(MemoryBlobStore::new());
            cache = config.demo_session_cache.clone().map(LocalSessionCache::new);
        }
    }

    tracing::info!(backend = ?config.auth_backend, "Auth backend selected");
    Ok(AuthFacade::new(
        identity,
        profiles,
        blobs,
        FacadeOptions {
            refresh_interval: config.session_refresh_interval,
            cache,
        },
    ))
}
