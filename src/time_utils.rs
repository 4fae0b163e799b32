// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for study-day arithmetic.

use chrono::{DateTime, NaiveDate, Utc};

/// The UTC calendar date a learning event counts toward.
pub fn study_day(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// "YYYY-MM-DD" bucket key for per-day counters.
pub fn day_key(now: DateTime<Utc>) -> String {
    study_day(now).format("%Y-%m-%d").to_string()
}
