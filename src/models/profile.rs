// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile record stored in the `users` collection.
//!
//! Field names are camelCase on the wire so that records written by the
//! hosted front end and by this crate are interchangeable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role. Assigned at creation and never written by this crate
/// afterwards; promotion happens out of band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    /// Capitalized label for the role badge.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Instructor => "Instructor",
            Role::Admin => "Admin",
        }
    }

    /// Instructors and admins see the admin panel.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Instructor | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase", default)]
pub struct EmailNotifications {
    pub course_updates: bool,
    pub new_courses: bool,
    pub completion_reminders: bool,
}

impl Default for EmailNotifications {
    fn default() -> Self {
        Self {
            course_updates: true,
            new_courses: true,
            completion_reminders: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformNotifications {
    pub discussion_replies: bool,
    pub certificate_awarded: bool,
    pub system_announcements: bool,
}

impl Default for PlatformNotifications {
    fn default() -> Self {
        Self {
            discussion_replies: true,
            certificate_awarded: true,
            system_announcements: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub email: EmailNotifications,
    pub platform: PlatformNotifications,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub language: String,
    pub timezone: String,
    pub dark_mode: bool,
    pub newsletter: bool,
    pub updated_at: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            timezone: "UTC".to_string(),
            dark_mode: false,
            newsletter: false,
            updated_at: String::new(),
        }
    }
}

/// Per-course lesson completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase", default)]
pub struct CourseProgress {
    /// Completed lesson ids, sorted and unique.
    pub completed_lessons: Vec<String>,
    pub total_lessons: u32,
    pub percent: u8,
    pub updated_at: String,
}

impl CourseProgress {
    /// Mark a lesson complete and recompute the percentage.
    pub fn complete_lesson(&mut self, lesson_id: &str, total_lessons: u32, now: &str) {
        if let Err(pos) = self.completed_lessons.binary_search_by(|l| l.as_str().cmp(lesson_id)) {
            self.completed_lessons.insert(pos, lesson_id.to_string());
        }
        self.total_lessons = total_lessons;
        self.percent = progress_percentage(self.completed_lessons.len(), total_lessons);
        self.updated_at = now.to_string();
    }
}

/// round(completed / total * 100), clamped to 100. Zero lessons is 0%.
pub fn progress_percentage(completed: usize, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round();
    pct.min(100.0) as u8
}

/// Array fields that only ever grow by set-union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Courses,
    Certificates,
}

impl ListField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListField::Courses => "courses",
            ListField::Certificates => "certificates",
        }
    }
}

/// Profile document keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub full_name: String,
    pub email: String,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub organization: String,
    pub role: Role,
    pub newsletter: bool,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_preferences: Option<NotificationPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
    pub courses: Vec<String>,
    pub progress: BTreeMap<String, CourseProgress>,
    pub certificates: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_last_changed: Option<String>,
}

impl UserProfile {
    /// Fresh record for a just-registered user.
    pub fn new_student(
        full_name: &str,
        email: &str,
        organization: &str,
        newsletter: bool,
        now: &str,
    ) -> Self {
        Self {
            full_name: full_name.to_string(),
            email: email.to_string(),
            organization: organization.to_string(),
            role: Role::Student,
            newsletter,
            is_verified: false,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            last_login: Some(now.to_string()),
            ..Default::default()
        }
    }

    /// Merge a sparse update into this record. Fields absent from the
    /// update are left untouched.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        fn set<T: Clone>(dst: &mut T, src: &Option<T>) {
            if let Some(v) = src {
                *dst = v.clone();
            }
        }
        fn set_opt<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }

        set(&mut self.full_name, &update.full_name);
        set(&mut self.email, &update.email);
        set_opt(&mut self.photo_url, &update.photo_url);
        set(&mut self.organization, &update.organization);
        set_opt(&mut self.bio, &update.bio);
        set_opt(&mut self.job_title, &update.job_title);
        set_opt(&mut self.phone, &update.phone);
        set_opt(&mut self.address, &update.address);
        set(&mut self.newsletter, &update.newsletter);
        set(&mut self.is_verified, &update.is_verified);
        set_opt(
            &mut self.notification_preferences,
            &update.notification_preferences,
        );
        set_opt(&mut self.preferences, &update.preferences);
        set(&mut self.updated_at, &update.updated_at);
        set_opt(&mut self.last_login, &update.last_login);
        set_opt(&mut self.password_last_changed, &update.password_last_changed);
    }

    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::Courses => &self.courses,
            ListField::Certificates => &self.certificates,
        }
    }

    /// Set-union append. Returns false if the value was already present.
    pub fn append_unique(&mut self, field: ListField, value: &str) -> bool {
        let list = match field {
            ListField::Courses => &mut self.courses,
            ListField::Certificates => &mut self.certificates,
        };
        if list.iter().any(|v| v == value) {
            return false;
        }
        list.push(value.to_string());
        true
    }
}

/// Sparse write to a profile record. Only `Some` fields are serialized,
/// so the same value can be handed to a store as a field mask.
///
/// There is deliberately no `role` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newsletter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_preferences: Option<NotificationPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_last_changed: Option<String>,
}

impl ProfileUpdate {
    /// Document field paths this update writes.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let present = [
            ("fullName", self.full_name.is_some()),
            ("email", self.email.is_some()),
            ("photoURL", self.photo_url.is_some()),
            ("organization", self.organization.is_some()),
            ("bio", self.bio.is_some()),
            ("jobTitle", self.job_title.is_some()),
            ("phone", self.phone.is_some()),
            ("address", self.address.is_some()),
            ("newsletter", self.newsletter.is_some()),
            ("isVerified", self.is_verified.is_some()),
            (
                "notificationPreferences",
                self.notification_preferences.is_some(),
            ),
            ("preferences", self.preferences.is_some()),
            ("updatedAt", self.updated_at.is_some()),
            ("lastLogin", self.last_login.is_some()),
            ("passwordLastChanged", self.password_last_changed.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(path, set)| set.then_some(path))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }
}
