// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course-page notifications panel.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct Notification {
    pub id: u32,
    pub icon: String,
    pub title: String,
    pub message: String,
    /// Relative time as displayed, e.g. "2 hours ago".
    pub time: String,
    pub unread: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct NotificationGroup {
    pub title: String,
    pub items: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsPanel {
    pub open: bool,
    pub groups: Vec<NotificationGroup>,
}

fn item(id: u32, icon: &str, title: &str, message: &str, time: &str, unread: bool) -> Notification {
    Notification {
        id,
        icon: icon.to_string(),
        title: title.to_string(),
        message: message.to_string(),
        time: time.to_string(),
        unread,
    }
}

impl NotificationsPanel {
    pub fn new(groups: Vec<NotificationGroup>) -> Self {
        Self {
            open: false,
            groups,
        }
    }

    /// The static feed shown on course pages.
    pub fn course_feed() -> Self {
        Self::new(vec![
            NotificationGroup {
                title: "Today".to_string(),
                items: vec![
                    item(
                        1,
                        "📚",
                        "Module 2 Quiz Available",
                        "The quiz for Data Journalism is now available. Complete it to unlock the next module.",
                        "2 hours ago",
                        true,
                    ),
                    item(
                        2,
                        "📝",
                        "Instructor Feedback",
                        "John Custer provided feedback on your Data Visualization exercise.",
                        "5 hours ago",
                        true,
                    ),
                ],
            },
            NotificationGroup {
                title: "Earlier".to_string(),
                items: vec![
                    item(
                        3,
                        "🏆",
                        "Module 1 Completed",
                        "Congratulations! You have completed the Data Foundations module.",
                        "2 days ago",
                        false,
                    ),
                    item(
                        4,
                        "📅",
                        "Live Webinar Reminder",
                        "Don't forget the upcoming \"Data Analysis Best Practices\" webinar tomorrow.",
                        "3 days ago",
                        false,
                    ),
                ],
            },
        ])
    }

    /// Returns the new open state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Close button or a click outside the panel.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Returns false for unknown or already-read items.
    pub fn mark_read(&mut self, id: u32) -> bool {
        match self
            .groups
            .iter_mut()
            .flat_map(|g| g.items.iter_mut())
            .find(|n| n.id == id)
        {
            Some(n) if n.unread => {
                n.unread = false;
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in self.groups.iter_mut().flat_map(|g| g.items.iter_mut()) {
            n.unread = false;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.items.iter())
            .filter(|n| n.unread)
            .count()
    }

    /// The header badge is hidden once nothing is unread.
    pub fn badge_visible(&self) -> bool {
        self.unread_count() > 0
    }
}
