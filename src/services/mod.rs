// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - auth facade and the external capabilities it wraps.

pub mod demo_auth;
pub mod facade;
pub mod firebase_auth;
pub mod identity;
pub mod local_cache;
pub mod session_timer;
pub mod storage;

pub use demo_auth::DemoIdentityProvider;
pub use facade::{AuthFacade, AuthSubscription, FacadeOptions, ProfileChanges, Registration};
pub use firebase_auth::FirebaseAuth;
pub use identity::{IdentityProvider, ProfileFields};
pub use local_cache::LocalSessionCache;
pub use session_timer::{SessionTimer, TimerState};
pub use storage::{BlobStore, FirebaseStorage, MemoryBlobStore, PhotoError};
