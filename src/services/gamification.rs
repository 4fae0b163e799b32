// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! XP, levels and daily streaks.

use crate::models::User;
use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Reward tuning, loaded from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamificationRules {
    /// XP for completing a lesson the first time (unless the lesson overrides it)
    pub lesson_complete_xp: u32,
    /// XP for each flashcard review
    pub card_review_xp: u32,
    /// XP needed per level; must be positive
    pub xp_per_level: u64,
}

impl Default for GamificationRules {
    fn default() -> Self {
        Self {
            lesson_complete_xp: 20,
            card_review_xp: 2,
            xp_per_level: 100,
        }
    }
}

/// Level for a total XP amount. Level 1 starts at 0 XP.
pub fn level_for_xp(xp: u64, xp_per_level: u64) -> u32 {
    let level = xp / xp_per_level.max(1) + 1;
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// XP earned since the current level was reached.
pub fn xp_into_level(xp: u64, xp_per_level: u64) -> u64 {
    xp % xp_per_level.max(1)
}

/// XP still needed to reach the next level.
pub fn xp_to_next_level(xp: u64, xp_per_level: u64) -> u64 {
    let step = xp_per_level.max(1);
    step - xp % step
}

/// Result of granting XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct XpAward {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub gained: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total: u64,
    pub level: u32,
    pub leveled_up: bool,
}

impl XpAward {
    /// Fold a later award into this one.
    pub fn merge(self, later: XpAward) -> XpAward {
        XpAward {
            gained: self.gained.saturating_add(later.gained),
            total: later.total,
            level: later.level,
            leveled_up: self.leveled_up || later.leveled_up,
        }
    }
}

/// Add XP to a user and recompute the level.
pub fn award_xp(user: &mut User, amount: u64, rules: &GamificationRules) -> XpAward {
    let previous_level = user.level;
    user.xp = user.xp.saturating_add(amount);
    user.level = level_for_xp(user.xp, rules.xp_per_level);

    XpAward {
        gained: amount,
        total: user.xp,
        level: user.level,
        leveled_up: user.level > previous_level,
    }
}

/// How a study day changed the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    Started,
    Extended,
    Unchanged,
    Reset,
}

/// Streak state after a learning event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakUpdate {
    pub change: StreakChange,
    pub streak_days: u32,
    pub longest_streak: u32,
}

/// Count `today` as a study day for `user`.
pub fn record_study_day(user: &mut User, today: NaiveDate) -> StreakUpdate {
    let change = match user.last_study_date {
        None => {
            user.streak_days = 1;
            StreakChange::Started
        }
        Some(last) => {
            let gap = today.signed_duration_since(last).num_days();
            match gap {
                // Same day, or an event stamped before the last one.
                ..=0 => StreakChange::Unchanged,
                1 => {
                    user.streak_days = user.streak_days.saturating_add(1);
                    StreakChange::Extended
                }
                _ => {
                    user.streak_days = 1;
                    StreakChange::Reset
                }
            }
        }
    };

    if user.last_study_date.is_none_or(|last| today > last) {
        user.last_study_date = Some(today);
    }
    user.longest_streak = user.longest_streak.max(user.streak_days);

    StreakUpdate {
        change,
        streak_days: user.streak_days,
        longest_streak: user.longest_streak,
    }
}
