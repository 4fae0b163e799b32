//! Achievement catalog entries and per-user unlock records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Condition that unlocks an achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementCriterion {
    LessonsCompleted { count: u32 },
    CardsReviewed { count: u32 },
    CardsMastered { count: u32 },
    StreakDays { days: u32 },
    XpEarned {
        #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
        xp: u64,
    },
    LevelReached { level: u32 },
}

/// A static achievement definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Achievement {
    /// Achievement ID (also used as document ID)
    pub id: String,
    pub name: String,
    pub description: String,
    pub criterion: AchievementCriterion,
    /// Bonus XP granted on unlock
    #[serde(default)]
    pub xp_reward: u32,
}

/// Unlock record.
///
/// Stored at: `user_achievements/{user_id}_{achievement_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserAchievement {
    pub user_id: String,
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
}

impl UserAchievement {
    pub fn doc_id(&self) -> String {
        format!("{}_{}", self.user_id, self.achievement_id)
    }
}
