// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with: FIRESTORE_EMULATOR_HOST=localhost:8080 cargo test --test firestore_integration
//!
//! The emulator provides a clean state for each test run.

use lms_portal::db::ProfileStore;
use lms_portal::models::{CourseProgress, ListField, ProfileUpdate, Role, UserProfile};

mod common;
use common::test_db;

/// Generate a unique uid for test isolation.
fn unique_uid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-{}", nanos)
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn test_profile() -> UserProfile {
    UserProfile::new_student("Test User", "test@example.com", "Acme", true, &now())
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_profile_create_and_get() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();

    let before = db.get_profile(&uid).await.unwrap();
    assert!(before.is_none(), "Profile should not exist before creation");

    db.create_profile(&uid, &test_profile()).await.unwrap();

    let stored = db.get_profile(&uid).await.unwrap().expect("Profile exists");
    assert_eq!(stored.full_name, "Test User");
    assert_eq!(stored.role, Role::Student);
    assert!(stored.newsletter);
    assert!(!stored.is_verified);
    assert!(stored.courses.is_empty());
}

#[tokio::test]
async fn test_sparse_update_keeps_other_fields() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();
    db.create_profile(&uid, &test_profile()).await.unwrap();

    let update = ProfileUpdate {
        bio: Some("Data journalist".to_string()),
        updated_at: Some(now()),
        ..Default::default()
    };
    db.update_profile(&uid, &update).await.unwrap();

    let stored = db.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(stored.bio.as_deref(), Some("Data journalist"));
    assert_eq!(stored.full_name, "Test User");
    assert_eq!(stored.organization, "Acme");
}

#[tokio::test]
async fn test_append_is_set_union() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();
    db.create_profile(&uid, &test_profile()).await.unwrap();

    for course in ["finance-101", "data-viz", "finance-101"] {
        db.append_to_list(&uid, ListField::Courses, course, &now())
            .await
            .unwrap();
    }

    let stored = db.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(stored.courses, vec!["finance-101", "data-viz"]);
    assert!(stored.certificates.is_empty());
}

#[tokio::test]
async fn test_certificates_append_independently() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();
    db.create_profile(&uid, &test_profile()).await.unwrap();
    db.append_to_list(&uid, ListField::Courses, "finance-101", &now())
        .await
        .unwrap();

    for i in 0..3 {
        db.append_to_list(&uid, ListField::Certificates, &format!("cert-{}", i), &now())
            .await
            .unwrap();
    }

    let stored = db.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(stored.certificates, vec!["cert-0", "cert-1", "cert-2"]);
    assert_eq!(stored.courses, vec!["finance-101"]);
}

#[tokio::test]
async fn test_concurrent_appends_never_silently_dropped() {
    require_emulator!();

    let db = std::sync::Arc::new(test_db().await);
    let uid = unique_uid();
    db.create_profile(&uid, &test_profile()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..5 {
        let db = db.clone();
        let uid = uid.clone();
        handles.push(tokio::spawn(async move {
            let cert = format!("cert-{}", i);
            let result = db
                .append_to_list(&uid, ListField::Certificates, &cert, &now())
                .await;
            (cert, result.is_ok())
        }));
    }

    let mut committed = Vec::new();
    for handle in handles {
        let (cert, ok) = handle.await.unwrap();
        if ok {
            committed.push(cert);
        }
    }

    // A contended append may fail, but one that reported success must stick.
    let stored = db.get_profile(&uid).await.unwrap().unwrap();
    assert!(!committed.is_empty());
    for cert in &committed {
        assert!(stored.certificates.contains(cert), "{} was lost", cert);
    }
}

#[tokio::test]
async fn test_append_to_missing_profile_is_not_found() {
    require_emulator!();

    let db = test_db().await;
    let err = db
        .append_to_list(&unique_uid(), ListField::Courses, "finance-101", &now())
        .await
        .unwrap_err();
    assert!(matches!(err, lms_portal::error::AppError::NotFound(_)));
}

#[tokio::test]
async fn test_progress_entry_replaced() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();
    db.create_profile(&uid, &test_profile()).await.unwrap();

    let mut progress = CourseProgress::default();
    progress.complete_lesson("intro", 3, &now());
    db.set_progress(&uid, "finance-101", &progress).await.unwrap();
    progress.complete_lesson("budgets", 3, &now());
    db.set_progress(&uid, "finance-101", &progress).await.unwrap();

    let stored = db.get_profile(&uid).await.unwrap().unwrap();
    let entry = &stored.progress["finance-101"];
    assert_eq!(entry.completed_lessons, vec!["budgets", "intro"]);
    assert_eq!(entry.percent, 67);
}

#[tokio::test]
async fn test_delete_profile() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid();
    db.create_profile(&uid, &test_profile()).await.unwrap();

    db.delete_profile(&uid).await.unwrap();
    assert!(db.get_profile(&uid).await.unwrap().is_none());

    // Deleting again is not an error.
    db.delete_profile(&uid).await.unwrap();
}
