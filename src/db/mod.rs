//! Profile record storage (Firestore, with an in-memory stand-in).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryProfileStore;

use crate::error::AppError;
use crate::models::{CourseProgress, ListField, ProfileUpdate, UserProfile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Profile records (keyed by identity uid)
    pub const USERS: &str = "users";
}

/// Document store holding one profile record per user id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError>;

    /// Create or overwrite the whole record.
    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), AppError>;

    /// Write only the fields present in `update`.
    async fn update_profile(&self, uid: &str, update: &ProfileUpdate) -> Result<(), AppError>;

    /// Set-union append to an array field. `updated_at` is stamped too.
    async fn append_to_list(
        &self,
        uid: &str,
        field: ListField,
        value: &str,
        updated_at: &str,
    ) -> Result<(), AppError>;

    /// Replace one course's entry in the progress map.
    async fn set_progress(
        &self,
        uid: &str,
        course_id: &str,
        progress: &CourseProgress,
    ) -> Result<(), AppError>;

    async fn delete_profile(&self, uid: &str) -> Result<(), AppError>;
}
