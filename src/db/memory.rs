// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory [`ProfileStore`] used by demo mode and tests.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{CourseProgress, ListField, ProfileUpdate, Role, UserProfile};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    docs: Arc<DashMap<String, UserProfile>>,
    offline: Arc<AtomicBool>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a database error, like a dropped
    /// connection.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Snapshot of a record, bypassing the offline switch.
    pub fn get(&self, uid: &str) -> Option<UserProfile> {
        self.docs.get(uid).map(|doc| doc.clone())
    }

    /// Out-of-band role assignment, as an administrator would do it in the
    /// console.
    pub fn assign_role(&self, uid: &str, role: Role) -> bool {
        match self.docs.get_mut(uid) {
            Some(mut doc) => {
                doc.role = role;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "Database not connected (offline mode)".to_string(),
            ));
        }
        Ok(())
    }

    fn with_doc<F>(&self, uid: &str, modify: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut UserProfile),
    {
        self.check_online()?;
        let mut doc = self
            .docs
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("profile {}", uid)))?;
        modify(&mut doc);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.check_online()?;
        Ok(self.get(uid))
    }

    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), AppError> {
        self.check_online()?;
        self.docs.insert(uid.to_string(), profile.clone());
        Ok(())
    }

    async fn update_profile(&self, uid: &str, update: &ProfileUpdate) -> Result<(), AppError> {
        if update.is_empty() {
            return Ok(());
        }
        self.with_doc(uid, |doc| doc.apply(update))
    }

    async fn append_to_list(
        &self,
        uid: &str,
        field: ListField,
        value: &str,
        updated_at: &str,
    ) -> Result<(), AppError> {
        self.with_doc(uid, |doc| {
            if doc.append_unique(field, value) {
                doc.updated_at = updated_at.to_string();
            }
        })
    }

    async fn set_progress(
        &self,
        uid: &str,
        course_id: &str,
        progress: &CourseProgress,
    ) -> Result<(), AppError> {
        self.with_doc(uid, |doc| {
            doc.progress.insert(course_id.to_string(), progress.clone());
            doc.updated_at = progress.updated_at.clone();
        })
    }

    async fn delete_profile(&self, uid: &str) -> Result<(), AppError> {
        self.check_online()?;
        self.docs.remove(uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let store = MemoryProfileStore::new();
        let update = ProfileUpdate {
            bio: Some("x".to_string()),
            ..Default::default()
        };
        let err = store.update_profile("ghost", &update).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = MemoryProfileStore::new();
        store.set_offline(true);
        let err = store.get_profile("u1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_append_only_stamps_on_change() {
        let store = MemoryProfileStore::new();
        let profile = UserProfile::new_student("Alice", "a@x.com", "", false, "t0");
        store.create_profile("u1", &profile).await.unwrap();

        store
            .append_to_list("u1", ListField::Certificates, "cert-1", "t1")
            .await
            .unwrap();
        store
            .append_to_list("u1", ListField::Certificates, "cert-1", "t2")
            .await
            .unwrap();

        let doc = store.get("u1").unwrap();
        assert_eq!(doc.certificates, vec!["cert-1"]);
        assert_eq!(doc.updated_at, "t1");
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let store = MemoryProfileStore::new();
        store
            .create_profile("u1", &UserProfile::default())
            .await
            .unwrap();
        store.delete_profile("u1").await.unwrap();
        assert!(store.get_profile("u1").await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
