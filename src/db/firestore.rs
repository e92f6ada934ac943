// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`ProfileStore`].
//!
//! Sparse updates are written with a field mask so fields not named in the
//! update are never touched. List appends and progress writes are
//! read-modify-write transactions whose read is bound to the transaction,
//! so a conflicting writer aborts the commit (reported as a `Database`
//! error) rather than losing an entry. There is no automatic retry.

use crate::db::{collections, ProfileStore};
use crate::error::AppError;
use crate::models::{CourseProgress, ListField, ProfileUpdate, UserProfile};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any bearer token; skip ADC lookup entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJsbXMtZGV2In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Read-modify-write of a single profile inside a transaction.
    ///
    /// `modify` returns false when nothing needs writing. Only `field_paths`
    /// are written back.
    async fn modify_in_transaction<F>(
        &self,
        uid: &str,
        field_paths: &[&str],
        modify: F,
    ) -> Result<(), AppError>
    where
        F: FnOnce(&mut UserProfile) -> bool,
    {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Read through the transaction: a concurrent commit to this
        // document then fails ours instead of being overwritten.
        let reader = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );
        let current: Option<UserProfile> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read profile in transaction: {}", e))
            })?;

        let Some(mut profile) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("profile {}", uid)));
        };

        if !modify(&mut profile) {
            let _ = transaction.rollback().await;
            return Ok(());
        }

        client
            .fluent()
            .update()
            .fields(field_paths.iter().copied())
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&profile)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add profile to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FirestoreDb {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn update_profile(&self, uid: &str, update: &ProfileUpdate) -> Result<(), AppError> {
        let paths = update.field_paths();
        if paths.is_empty() {
            return Ok(());
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths)
            .in_col(collections::USERS)
            .document_id(uid)
            .object(update)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn append_to_list(
        &self,
        uid: &str,
        field: ListField,
        value: &str,
        updated_at: &str,
    ) -> Result<(), AppError> {
        self.modify_in_transaction(uid, &[field.as_str(), "updatedAt"], |profile| {
            if !profile.append_unique(field, value) {
                return false;
            }
            profile.updated_at = updated_at.to_string();
            true
        })
        .await?;

        tracing::debug!(uid, field = field.as_str(), value, "Profile list appended");
        Ok(())
    }

    async fn set_progress(
        &self,
        uid: &str,
        course_id: &str,
        progress: &CourseProgress,
    ) -> Result<(), AppError> {
        // The whole map is rewritten: course ids are not valid bare field paths.
        self.modify_in_transaction(uid, &["progress", "updatedAt"], |profile| {
            profile
                .progress
                .insert(course_id.to_string(), progress.clone());
            profile.updated_at = progress.updated_at.clone();
            true
        })
        .await
    }

    async fn delete_profile(&self, uid: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
