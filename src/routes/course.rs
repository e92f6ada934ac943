// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course page: enrolment, lesson progress and course links.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::CourseProgress;
use crate::ui::views::course_page_url;
use crate::AppState;

/// Course routes that need a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/courses/{course_id}/enroll", post(enroll))
        .route(
            "/courses/{course_id}/lessons/{lesson_id}/complete",
            post(complete_lesson),
        )
        .route("/certificates/{certificate_id}", post(award_certificate))
}

/// "Continue Course" buttons work for everyone.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/courses/open", get(open_course))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub course_id: String,
    pub courses: Vec<String>,
}

async fn enroll(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<Json<EnrollmentResponse>> {
    state.facade.enroll_in_course(&course_id).await?;

    let courses = state
        .facade
        .get_current_user()
        .await
        .and_then(|u| u.profile)
        .map(|p| p.courses)
        .unwrap_or_default();
    tracing::debug!(uid = %user.uid, course_id = %course_id, "Enrollment recorded");

    Ok(Json(EnrollmentResponse { course_id, courses }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompletion {
    pub total_lessons: u32,
}

async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Path((course_id, lesson_id)): Path<(String, String)>,
    Json(body): Json<LessonCompletion>,
) -> Result<Json<CourseProgress>> {
    let progress = state
        .facade
        .record_lesson_completion(&course_id, &lesson_id, body.total_lessons)
        .await?;
    Ok(Json(progress))
}

async fn award_certificate(
    State(state): State<Arc<AppState>>,
    Path(certificate_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.facade.award_certificate(&certificate_id).await?;
    Ok(Json(serde_json::json!({ "certificateId": certificate_id })))
}

#[derive(Debug, Deserialize)]
pub struct OpenCourseParams {
    title: Option<String>,
}

async fn open_course(Query(params): Query<OpenCourseParams>) -> Result<Redirect> {
    let title = params
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing course title".to_string()))?;
    Ok(Redirect::to(&course_page_url(&title)))
}
