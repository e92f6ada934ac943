// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod profile;
pub mod result;
pub mod session;

pub use profile::{
    CourseProgress, ListField, NotificationPreferences, ProfileUpdate, Role, UserPreferences,
    UserProfile,
};
pub use result::{ActionResult, LoginOutcome};
pub use session::{AuthSession, CurrentUser};
