// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time in the format stored on profile records.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Human-readable form used on the profile page, e.g.
/// "April 24, 2023 at 3:45 PM". Returns `None` for unparseable input.
pub fn format_display(timestamp: &str) -> Option<String> {
    let date = DateTime::parse_from_rfc3339(timestamp).ok()?;
    Some(
        date.with_timezone(&Utc)
            .format("%B %-d, %Y at %-I:%M %p")
            .to_string(),
    )
}
