// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View models the LMS pages render from.

use crate::models::{CurrentUser, Role};
use crate::time_utils::format_display;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_AVATAR: &str = "img/default-avatar.png";
pub const CONTINUE_COURSE: &str = "Continue Course";
pub const START_LEARNING: &str = "Start Learning";
pub const NO_RECENT_LOGIN: &str = "No recent login data";

/// `"Data Analysis & Visualization"` -> `"data-analysis-visualization"`.
///
/// Lower-cases, drops everything but ASCII word characters and spaces, then
/// turns each run of spaces into one dash.
pub fn course_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.to_lowercase().chars() {
        if c == ' ' {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
            in_space = false;
        }
    }
    slug
}

pub fn course_page_url(title: &str) -> String {
    format!("course-{}.html", course_slug(title))
}

/// Role badge text; unknown roles read as "Student".
pub fn format_role_text(role: Option<Role>) -> &'static str {
    role.unwrap_or_default().display_name()
}

/// Header/nav state for every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct HeaderView {
    pub signed_in: bool,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub show_admin_link: bool,
    pub show_notifications: bool,
    pub course_button_label: String,
}

impl HeaderView {
    pub fn signed_in(user: &CurrentUser) -> Self {
        Self {
            signed_in: true,
            display_name: Some(user.display_label()),
            email: Some(user.email.clone()),
            avatar_url: Some(
                user.photo_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            ),
            show_admin_link: user.role.is_staff(),
            show_notifications: true,
            course_button_label: CONTINUE_COURSE.to_string(),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            signed_in: false,
            display_name: None,
            email: None,
            avatar_url: None,
            show_admin_link: false,
            show_notifications: false,
            course_button_label: START_LEARNING.to_string(),
        }
    }

    pub fn for_user(user: Option<&CurrentUser>) -> Self {
        user.map_or_else(Self::signed_out, Self::signed_in)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct VerificationBanner {
    pub verified: bool,
    pub message: String,
    pub show_resend: bool,
}

impl VerificationBanner {
    pub fn new(verified: bool) -> Self {
        let message = if verified {
            "Your email is verified."
        } else {
            "Please verify your email to access all features."
        };
        Self {
            verified,
            message: message.to_string(),
            show_resend: !verified,
        }
    }
}

/// Everything the profile page fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub header: HeaderView,
    pub username: String,
    pub role_label: String,
    pub full_name: String,
    pub email: String,
    pub organization: String,
    pub job_title: String,
    pub bio: String,
    pub phone: String,
    pub newsletter: bool,
    pub last_login: String,
    pub verification: VerificationBanner,
}

impl ProfileView {
    pub fn new(user: &CurrentUser) -> Self {
        let profile = user.profile.as_ref();
        let text = |field: Option<&Option<String>>| field.cloned().flatten().unwrap_or_default();

        let full_name = profile
            .map(|p| p.full_name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| user.display_name.clone())
            .unwrap_or_default();

        let last_login = profile
            .and_then(|p| p.last_login.as_deref())
            .and_then(format_display)
            .unwrap_or_else(|| NO_RECENT_LOGIN.to_string());

        Self {
            header: HeaderView::signed_in(user),
            username: user.display_label(),
            role_label: format_role_text(profile.map(|p| p.role)).to_string(),
            full_name,
            email: user.email.clone(),
            organization: profile.map(|p| p.organization.clone()).unwrap_or_default(),
            job_title: text(profile.map(|p| &p.job_title)),
            bio: text(profile.map(|p| &p.bio)),
            phone: text(profile.map(|p| &p.phone)),
            newsletter: profile.is_some_and(|p| p.newsletter),
            last_login,
            verification: VerificationBanner::new(user.email_verified),
        }
    }
}
