// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page-level UI state (modals, toasts, notifications) and view models.

pub mod modal;
pub mod notifications;
pub mod toast;
pub mod views;

pub use modal::{ModalEvent, ModalManager};
pub use notifications::NotificationsPanel;
pub use toast::{Toast, ToastKind, ToastManager};

/// Modal dialogs present on the LMS pages.
pub const PAGE_MODALS: [&str; 6] = [
    "loginModal",
    "signupModal",
    "forgotPasswordModal",
    "uploadPhotoModal",
    "deleteAccountModal",
    "courseTrailer",
];
