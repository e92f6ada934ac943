// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Modal dialog state: at most one modal is open at a time.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(tag = "event", content = "modal", rename_all = "camelCase")]
pub enum ModalEvent {
    ModalOpen(String),
    ModalClose(String),
}

pub struct ModalManager {
    known: HashSet<String>,
    active: Mutex<Option<String>>,
    events: broadcast::Sender<ModalEvent>,
}

impl ModalManager {
    /// Manager for the modals that exist on the page.
    pub fn new<I, S>(modal_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            known: modal_ids.into_iter().map(Into::into).collect(),
            active: Mutex::new(None),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ModalEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModalEvent> {
        self.events.subscribe()
    }

    pub fn active(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Page scrolling is locked while any modal is open.
    pub fn scroll_locked(&self) -> bool {
        self.lock().is_some()
    }

    /// Open `modal_id`, closing the active modal first. Unknown ids are
    /// ignored and return false.
    pub fn open(&self, modal_id: &str) -> bool {
        if !self.known.contains(modal_id) {
            tracing::debug!(modal_id, "Ignoring unknown modal");
            return false;
        }

        let mut active = self.lock();
        if let Some(previous) = active.take() {
            self.emit(ModalEvent::ModalClose(previous));
        }
        *active = Some(modal_id.to_string());
        self.emit(ModalEvent::ModalOpen(modal_id.to_string()));
        true
    }

    /// Close whatever is open. Returns the closed modal.
    pub fn close(&self) -> Option<String> {
        let closed = self.lock().take();
        if let Some(id) = &closed {
            self.emit(ModalEvent::ModalClose(id.clone()));
        }
        closed
    }

    /// Close `modal_id` only if it is the active one.
    pub fn close_modal(&self, modal_id: &str) -> bool {
        let mut active = self.lock();
        if active.as_deref() != Some(modal_id) {
            return false;
        }
        *active = None;
        self.emit(ModalEvent::ModalClose(modal_id.to_string()));
        true
    }

    /// Escape closes the active modal; other keys are ignored.
    pub fn handle_key(&self, key: &str) -> bool {
        key == "Escape" && self.close().is_some()
    }

    /// A click that landed on the backdrop rather than the dialog closes it.
    pub fn handle_backdrop_click(&self) -> bool {
        self.close().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ModalManager {
        ModalManager::new(["loginModal", "signupModal"])
    }

    #[test]
    fn test_open_replaces_active() {
        let modals = manager();
        let mut events = modals.subscribe();

        assert!(modals.open("loginModal"));
        assert!(modals.open("signupModal"));
        assert_eq!(modals.active().as_deref(), Some("signupModal"));

        assert_eq!(
            events.try_recv().unwrap(),
            ModalEvent::ModalOpen("loginModal".to_string())
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ModalEvent::ModalClose("loginModal".to_string())
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ModalEvent::ModalOpen("signupModal".to_string())
        );
    }

    #[test]
    fn test_escape_closes() {
        let modals = manager();
        assert!(!modals.handle_key("Escape"));
        modals.open("loginModal");
        assert!(modals.scroll_locked());
        assert!(!modals.handle_key("Enter"));
        assert!(modals.handle_key("Escape"));
        assert_eq!(modals.active(), None);
        assert!(!modals.scroll_locked());
    }

    #[test]
    fn test_unknown_modal_ignored() {
        let modals = manager();
        modals.open("loginModal");
        assert!(!modals.open("nopeModal"));
        assert_eq!(modals.active().as_deref(), Some("loginModal"));
    }

    #[test]
    fn test_close_modal_only_if_active() {
        let modals = manager();
        modals.open("loginModal");
        assert!(!modals.close_modal("signupModal"));
        assert!(modals.close_modal("loginModal"));
        assert!(modals.active().is_none());
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(ModalEvent::ModalOpen("loginModal".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"event": "modalOpen", "modal": "loginModal"}));
    }
}
