// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! On-disk `{isAuthenticated, user}` cache used by demo mode to survive
//! restarts.

use crate::error::AppError;
use crate::models::CurrentUser;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedUser {
    pub uid: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub is_new_user: bool,
}

impl From<&CurrentUser> for CachedUser {
    fn from(user: &CurrentUser) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            name: user.display_label(),
            is_new_user: user.is_new_user,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CachedAuthState {
    pub is_authenticated: bool,
    pub user: Option<CachedUser>,
}

impl CachedAuthState {
    pub fn signed_in(user: &CurrentUser) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalSessionCache {
    path: PathBuf,
}

impl LocalSessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable cache files read as signed out.
    pub async fn load(&self) -> Result<CachedAuthState, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CachedAuthState::default()),
            Err(e) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Failed to read session cache {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding corrupt session cache");
                Ok(CachedAuthState::default())
            }
        }
    }

    pub async fn store(&self, state: &CachedAuthState) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Serialize session cache: {}", e)))?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to write session cache {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "Failed to remove session cache {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
