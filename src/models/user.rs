//! User model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Learner profile stored in Firestore.
///
/// XP, level and streak counters live directly on the user document and are
/// only changed through the learning pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    /// Total experience points
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp: u64,
    /// Level derived from `xp`
    #[serde(default = "default_level")]
    pub level: u32,
    /// Consecutive study days ending at `last_study_date`
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub longest_streak: u32,
    /// UTC calendar date of the most recent learning event
    #[serde(default)]
    pub last_study_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

fn default_level() -> u32 {
    1
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            display_name: None,
            xp: 0,
            level: default_level(),
            streak_days: 0,
            longest_streak: 0,
            last_study_date: None,
            created_at: now,
        }
    }
}
