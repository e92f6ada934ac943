// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use lms_portal::config::Config;
use lms_portal::db::{FirestoreDb, MemoryProfileStore};
use lms_portal::routes::create_router;
use lms_portal::services::facade::Registration;
use lms_portal::services::{
    AuthFacade, DemoIdentityProvider, FacadeOptions, LocalSessionCache, MemoryBlobStore,
};
use lms_portal::AppState;
use std::sync::Arc;
use std::time::Duration;

pub const PASSWORD: &str = "s3cret!pass";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// A facade over the in-memory backends, with handles to inspect them.
#[allow(dead_code)]
pub struct Harness {
    pub facade: Arc<AuthFacade>,
    pub identity: Arc<DemoIdentityProvider>,
    pub profiles: MemoryProfileStore,
    pub blobs: Arc<MemoryBlobStore>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_options(FacadeOptions::default())
    }

    pub fn with_refresh_interval(interval: Duration) -> Self {
        Self::with_options(FacadeOptions {
            refresh_interval: interval,
            cache: None,
        })
    }

    pub fn with_cache(cache: LocalSessionCache) -> Self {
        Self::with_options(FacadeOptions {
            cache: Some(cache),
            ..Default::default()
        })
    }

    pub fn with_options(options: FacadeOptions) -> Self {
        let identity = Arc::new(DemoIdentityProvider::new(
            b"test_demo_key_32_bytes_minimum!!".to_vec(),
        ));
        Self::with_identity(identity, options)
    }

    /// Share `identity` with another harness, like two runs of the same
    /// demo deployment.
    pub fn with_identity(identity: Arc<DemoIdentityProvider>, options: FacadeOptions) -> Self {
        let profiles = MemoryProfileStore::new();
        let blobs = Arc::new(MemoryBlobStore::new());
        let facade = AuthFacade::new(
            identity.clone(),
            Arc::new(profiles.clone()),
            blobs.clone(),
            options,
        );
        Self {
            facade,
            identity,
            profiles,
            blobs,
        }
    }

    /// Register `email` and leave the new user signed in. Returns the uid.
    pub async fn register(&self, email: &str) -> String {
        let result = self
            .facade
            .register(Registration {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                full_name: "Alice Smith".to_string(),
                organization: Some("Acme".to_string()),
                newsletter: true,
            })
            .await;
        assert!(result.success, "register failed: {}", result.message);
        self.facade
            .current_session()
            .await
            .expect("registered user is signed in")
            .uid
    }

    /// Most recent action code mailed to `email`.
    pub async fn last_code_for(&self, email: &str) -> String {
        self.identity
            .sent_emails()
            .await
            .into_iter()
            .rev()
            .find(|m| m.to.eq_ignore_ascii_case(email))
            .map(|m| m.code)
            .expect("an email was sent")
    }
}

/// Create a test app over the in-memory backends.
/// Returns the router, the shared state and the harness behind it.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Harness) {
    let harness = Harness::new();
    let state = Arc::new(AppState::new(Config::default(), harness.facade.clone()));
    (create_router(state.clone()), state, harness)
}
