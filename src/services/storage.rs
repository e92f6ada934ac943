// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Blob storage for profile photos.

use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use dashmap::DashMap;
use serde::Deserialize;

/// Upload limit for profile photos.
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;
pub const ALLOWED_PHOTO_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

const STORAGE_URL: &str = "https://firebasestorage.googleapis.com/v0";

/// Client-side checks run before an upload is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhotoError {
    #[error("Please select a photo to upload")]
    Missing,
    #[error("Photo must be less than 2MB")]
    TooLarge,
    #[error("Only JPG, PNG, and GIF files are supported")]
    UnsupportedType,
}

pub fn validate_photo(bytes: &[u8], content_type: &str) -> Result<(), PhotoError> {
    if bytes.is_empty() {
        return Err(PhotoError::Missing);
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(PhotoError::TooLarge);
    }
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !ALLOWED_PHOTO_TYPES.contains(&mime.as_str()) {
        return Err(PhotoError::UnsupportedType);
    }
    Ok(())
}

/// Object key for a user's profile photo uploaded at `millis`.
pub fn profile_photo_key(uid: &str, millis: i64) -> String {
    format!("userProfiles/{}_{}", uid, millis)
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`. `auth_token` is the user's ID token.
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        auth_token: &str,
    ) -> Result<(), AppError>;

    /// Public download URL for a stored object.
    async fn download_url(&self, key: &str, auth_token: &str) -> Result<String, AppError>;
}

/// Firebase Storage over its REST API.
#[derive(Clone)]
pub struct FirebaseStorage {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    /// Comma-separated; the first one is used.
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    pub fn new(bucket: String) -> Self {
        let base_url = match std::env::var("FIREBASE_STORAGE_EMULATOR_HOST") {
            Ok(host) => format!("http://{}/v0", host),
            Err(_) => STORAGE_URL.to_string(),
        };
        Self {
            http: reqwest::Client::new(),
            base_url,
            bucket,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(key)
        )
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AppError::Unauthorized);
        }
        if status.as_u16() == 404 {
            return Err(AppError::NotFound(body));
        }
        Err(AppError::Storage(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait]
impl BlobStore for FirebaseStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        auth_token: &str,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/b/{}/o?name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(key)
        );
        let size = bytes.len();

        let response = self
            .http
            .post(&url)
            .bearer_auth(auth_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload failed: {}", e)))?;
        Self::check_response(response).await?;

        tracing::info!(key, size, "Blob uploaded");
        Ok(())
    }

    async fn download_url(&self, key: &str, auth_token: &str) -> Result<String, AppError> {
        let response = self
            .http
            .get(self.object_url(key))
            .bearer_auth(auth_token)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Metadata request failed: {}", e)))?;
        let metadata: ObjectMetadata = Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("JSON parse error: {}", e)))?;

        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|t| t.split(',').next())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Storage(format!("No download token for {}", metadata.name))
            })?;

        Ok(format!("{}?alt=media&token={}", self.object_url(key), token))
    }
}

/// In-memory blob store; download URLs are `data:` URLs.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, (String, Vec<u8>)>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.iter().map(|e| e.key().clone()).collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        _auth_token: &str,
    ) -> Result<(), AppError> {
        self.objects
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(())
    }

    async fn download_url(&self, key: &str, _auth_token: &str) -> Result<String, AppError> {
        let object = self
            .objects
            .get(key)
            .ok_or_else(|| AppError::NotFound(key.to_string()))?;
        let (content_type, bytes) = object.value();
        Ok(format!("data:{};base64,{}", content_type, STANDARD.encode(bytes)))
    }
}
