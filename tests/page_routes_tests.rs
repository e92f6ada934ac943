// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page controller tests.
//!
//! These tests verify that:
//! 1. Forms are checked before anything reaches the facade
//! 2. Successful actions carry the right toast/modal/redirect directives
//! 3. Session-only pages answer 401 when signed out

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use lms_portal::middleware::security::page_headers;
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::{create_test_app, PASSWORD};

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn post_form(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

fn signup_body(email: &str) -> String {
    format!(
        "fullName=Alice+Smith&email={}&password={}&organization=Acme&newsletter=on",
        urlencoding::encode(email),
        urlencoding::encode(PASSWORD)
    )
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = create_test_app();
    let (status, json) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_signup_validation_warnings() {
    let (app, state, harness) = create_test_app();

    let (status, json) = post_form(&app, "/auth/signup", "email=a%40example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Please fill in all required fields");
    assert_eq!(json["toast"]["kind"], "warning");

    let (_, json) = post_form(
        &app,
        "/auth/signup",
        "fullName=A&email=a%40example.com&password=abcdefghij",
    )
    .await;
    assert_eq!(
        json["message"],
        "Password must include at least one number and one special character"
    );

    // Nothing was created.
    assert!(harness.profiles.is_empty());
    assert_eq!(state.toasts.active().len(), 2);
}

#[tokio::test]
async fn test_signup_closes_modal() {
    let (app, state, harness) = create_test_app();
    state.modals.open("signupModal");

    let (_, json) = post_form(&app, "/auth/signup", &signup_body("alice@example.com")).await;
    assert_eq!(json["success"], true);
    assert_eq!(
        json["message"],
        "Account created successfully. Please check your email to verify your account."
    );
    assert_eq!(json["toast"]["kind"], "success");
    assert_eq!(json["closeModal"], "signupModal");
    assert_eq!(state.modals.active(), None);

    let uid = harness.facade.current_session().await.unwrap().uid;
    let profile = harness.profiles.get(&uid).unwrap();
    assert!(profile.newsletter);
    assert_eq!(profile.organization, "Acme");
}

#[tokio::test]
async fn test_login_redirects_from_landing_page() {
    let (app, _, harness) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("bob@example.com")).await;
    harness.facade.logout().await;

    let (_, json) = post_form(&app, "/auth/login", "email=bob%40example.com").await;
    assert_eq!(json["message"], "Please enter both email and password");

    let body = format!(
        "email=bob%40example.com&password={}&page=%2Flms.html",
        urlencoding::encode(PASSWORD)
    );
    let (_, json) = post_form(&app, "/auth/login", &body).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Login successful");
    assert_eq!(json["redirect"], "dashboard.html");
    assert_eq!(json["closeModal"], "loginModal");
    assert_eq!(json["data"]["verified"], false);
    assert!(json.get("reload").is_none());

    harness.facade.logout().await;
    let body = format!(
        "email=bob%40example.com&password={}&page=%2Fcourse-data.html",
        urlencoding::encode(PASSWORD)
    );
    let (_, json) = post_form(&app, "/auth/login", &body).await;
    assert_eq!(json["reload"], true);
    assert!(json.get("redirect").is_none());
}

#[tokio::test]
async fn test_login_wrong_password_is_error_toast() {
    let (app, _, harness) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("carol@example.com")).await;
    harness.facade.logout().await;

    let (_, json) = post_form(
        &app,
        "/auth/login",
        "email=carol%40example.com&password=wrong-pw1!",
    )
    .await;
    assert_eq!(json["success"], false);
    assert_eq!(json["toast"]["kind"], "error");
    assert_eq!(
        json["message"],
        "Incorrect password. Please try again or reset your password."
    );
}

#[tokio::test]
async fn test_session_header() {
    let (app, _, _) = create_test_app();
    let (_, json) = get(&app, "/auth/session").await;
    assert_eq!(json["signedIn"], false);
    assert_eq!(json["courseButtonLabel"], "Start Learning");

    post_form(&app, "/auth/signup", &signup_body("dave@example.com")).await;
    let (_, json) = get(&app, "/auth/session").await;
    assert_eq!(json["signedIn"], true);
    assert_eq!(json["displayName"], "Alice Smith");
    assert_eq!(json["avatarUrl"], "img/default-avatar.png");
    assert_eq!(json["showAdminLink"], false);
    assert_eq!(json["courseButtonLabel"], "Continue Course");
}

#[tokio::test]
async fn test_profile_pages_require_session() {
    let (app, _, _) = create_test_app();

    let (status, _) = get(&app, "/profile").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_form(&app, "/profile/personal-info", "bio=x").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_form(&app, "/courses/finance-101/enroll", "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_view_and_update() {
    let (app, _, _) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("erin@example.com")).await;

    let (status, json) = get(&app, "/profile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["roleLabel"], "Student");
    assert_eq!(json["fullName"], "Alice Smith");
    assert_eq!(json["verification"]["showResend"], true);
    assert_eq!(
        json["verification"]["message"],
        "Please verify your email to access all features."
    );

    let (_, json) = post_form(&app, "/profile/personal-info", "bio=Hello&jobTitle=").await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Profile updated successfully");
    assert_eq!(json["data"]["bio"], "Hello");
    assert_eq!(json["data"]["fullName"], "Alice Smith");
}

#[tokio::test]
async fn test_change_password_checks() {
    let (app, _, _) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("frank@example.com")).await;

    let (_, json) = post_form(
        &app,
        "/profile/password",
        "currentPassword=x&newPassword=abcdefgh&confirmPassword=abcdefgx",
    )
    .await;
    assert_eq!(json["message"], "New passwords do not match");

    let (_, json) = post_form(
        &app,
        "/profile/password",
        "currentPassword=x&newPassword=abc&confirmPassword=abc",
    )
    .await;
    assert_eq!(json["message"], "Password must be at least 8 characters long");

    let body = format!(
        "currentPassword={}&newPassword=longer-pw-9&confirmPassword=longer-pw-9",
        urlencoding::encode(PASSWORD)
    );
    let (_, json) = post_form(&app, "/profile/password", &body).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Password changed successfully.");
}

#[tokio::test]
async fn test_photo_upload() {
    let (app, state, harness) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("gina@example.com")).await;
    state.modals.open("uploadPhotoModal");

    let request = Request::builder()
        .method("POST")
        .uri("/profile/photo")
        .header(header::CONTENT_TYPE, "image/webp")
        .body(Body::from(vec![1u8, 2, 3]))
        .unwrap();
    let (_, json) = send(&app, request).await;
    assert_eq!(json["message"], "Only JPG, PNG, and GIF files are supported");
    assert_eq!(json["toast"]["kind"], "warning");

    let request = Request::builder()
        .method("POST")
        .uri("/profile/photo")
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(vec![0u8; 2 * 1024 * 1024 + 1]))
        .unwrap();
    let (_, json) = send(&app, request).await;
    assert_eq!(json["message"], "Photo must be less than 2MB");

    let request = Request::builder()
        .method("POST")
        .uri("/profile/photo")
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(vec![0x89u8, b'P', b'N', b'G']))
        .unwrap();
    let (_, json) = send(&app, request).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["closeModal"], "uploadPhotoModal");
    assert_eq!(state.modals.active(), None);
    assert_eq!(harness.blobs.keys().len(), 1);
}

#[tokio::test]
async fn test_delete_account_form() {
    let (app, _, harness) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("hank@example.com")).await;

    let (_, json) = post_form(&app, "/profile/delete", "password=").await;
    assert_eq!(json["message"], "Please enter your password");

    let body = format!("password={}", urlencoding::encode(PASSWORD));
    let (_, json) = post_form(&app, "/profile/delete", &body).await;
    assert_eq!(
        json["message"],
        "Please confirm that you understand this action is permanent"
    );

    let (_, json) = post_form(
        &app,
        "/profile/delete",
        "password=wrong-pw1!&confirmDelete=on",
    )
    .await;
    assert_eq!(json["message"], "Incorrect password. Please try again.");

    let body = format!("password={}&confirmDelete=on", urlencoding::encode(PASSWORD));
    let (_, json) = post_form(&app, "/profile/delete", &body).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["redirect"], "lms.html");
    assert!(harness.profiles.is_empty());

    let (status, _) = get(&app, "/profile").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_notifications_and_preferences_forms() {
    let (app, _, harness) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("ivy@example.com")).await;
    let uid = harness.facade.current_session().await.unwrap().uid;

    let (_, json) = post_form(
        &app,
        "/profile/notifications",
        "courseUpdates=on&certificateAwarded=on",
    )
    .await;
    assert_eq!(json["message"], "Notification preferences updated");

    let (_, json) = post_form(
        &app,
        "/profile/preferences",
        "language=es&timezone=Europe%2FMadrid&darkMode=on",
    )
    .await;
    assert_eq!(json["message"], "Preferences updated successfully");

    let profile = harness.profiles.get(&uid).unwrap();
    let notifications = profile.notification_preferences.unwrap();
    assert!(notifications.email.course_updates);
    assert!(!notifications.email.new_courses);
    assert!(notifications.platform.certificate_awarded);
    let prefs = profile.preferences.unwrap();
    assert_eq!(prefs.timezone, "Europe/Madrid");
    assert!(prefs.dark_mode);
    // Unchecked newsletter box clears the root flag too.
    assert!(!profile.newsletter);
}

#[tokio::test]
async fn test_course_routes() {
    let (app, _, harness) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("jack@example.com")).await;

    let (status, json) = post_form(&app, "/courses/finance-101/enroll", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["courses"], serde_json::json!(["finance-101"]));

    let request = Request::builder()
        .method("POST")
        .uri("/courses/finance-101/lessons/intro/complete")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"totalLessons": 4}"#))
        .unwrap();
    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["percent"], 25);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/courses/open?title=Data%20Analysis%20%26%20Visualization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "course-data-analysis-visualization.html"
    );

    let uid = harness.facade.current_session().await.unwrap().uid;
    assert_eq!(harness.profiles.get(&uid).unwrap().courses, vec!["finance-101"]);
}

#[tokio::test]
async fn test_verify_email_page() {
    let (app, _, harness) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("kate@example.com")).await;

    let (_, json) = get(&app, "/verify-email").await;
    assert_eq!(json["success"], false);
    assert_eq!(
        json["message"],
        "No verification code provided. Please check your email for a valid verification link."
    );

    let code = harness.last_code_for("kate@example.com").await;
    let uri = format!(
        "/verify-email?mode=verifyEmail&oobCode={}&continueUrl=profile.html",
        code
    );
    let (_, json) = get(&app, &uri).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["continueUrl"], "profile.html");
    assert!(json.get("toast").is_none());

    let (_, json) = get(&app, "/profile").await;
    assert_eq!(json["verification"]["message"], "Your email is verified.");
}

#[tokio::test]
async fn test_verify_email_drops_offsite_continue_url() {
    let (app, _, harness) = create_test_app();
    post_form(&app, "/auth/signup", &signup_body("liam@example.com")).await;

    for target in [
        "javascript%3Aalert(document.cookie)",
        "http%3A%2F%2Flocalhost%3A5173.evil.com%2F",
        "%2F%5Cevil.example.com",
    ] {
        let code = harness.last_code_for("liam@example.com").await;
        let uri = format!("/verify-email?oobCode={}&continueUrl={}", code, target);
        let (_, json) = get(&app, &uri).await;
        assert_eq!(json["success"], true, "{}", target);
        assert!(json.get("data").is_none(), "{}", target);

        // Fresh code for the next round.
        post_form(&app, "/profile/resend-verification", "").await;
    }
}

#[tokio::test]
async fn test_security_headers_on_pages() {
    let (app, _, _) = create_test_app();

    // Public page, and a protected one answered by the session guard.
    for uri in ["/health", "/profile"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        for (name, value) in page_headers() {
            assert_eq!(response.headers().get(&name), Some(&value), "{} {}", uri, name);
        }
    }
}
