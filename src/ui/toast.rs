// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transient toast notifications with timed auto-dismiss.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

/// The single toast container. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ToastManager {
    toasts: Arc<DashMap<u64, Toast>>,
    next_id: Arc<AtomicU64>,
    dismiss_after: Duration,
}

impl ToastManager {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            toasts: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            dismiss_after,
        }
    }

    /// Show a toast; it removes itself after the dismiss delay.
    pub fn show(&self, message: impl Into<String>, kind: ToastKind) -> Toast {
        let toast = Toast {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            message: message.into(),
        };
        self.toasts.insert(toast.id, toast.clone());

        let toasts = Arc::clone(&self.toasts);
        let id = toast.id;
        let delay = self.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            toasts.remove(&id);
        });

        toast
    }

    pub fn success(&self, message: impl Into<String>) -> Toast {
        self.show(message, ToastKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> Toast {
        self.show(message, ToastKind::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> Toast {
        self.show(message, ToastKind::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> Toast {
        self.show(message, ToastKind::Info)
    }

    /// Explicit close. Returns false if the toast was already gone.
    pub fn close(&self, id: u64) -> bool {
        self.toasts.remove(&id).is_some()
    }

    /// Visible toasts, oldest first.
    pub fn active(&self) -> Vec<Toast> {
        let mut toasts: Vec<Toast> = self.toasts.iter().map(|t| t.value().clone()).collect();
        toasts.sort_by_key(|t| t.id);
        toasts
    }
}
