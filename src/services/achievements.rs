// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement evaluation and the built-in catalog.

use crate::models::{Achievement, AchievementCriterion, User, UserAchievement, UserStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

impl AchievementCriterion {
    /// Current value of the measured quantity.
    pub fn current(&self, user: &User, stats: &UserStats) -> u64 {
        match self {
            AchievementCriterion::LessonsCompleted { .. } => stats.lessons_completed.into(),
            AchievementCriterion::CardsReviewed { .. } => stats.cards_reviewed.into(),
            AchievementCriterion::CardsMastered { .. } => stats.cards_mastered().into(),
            // Longest streak, so a broken streak does not hide a past milestone.
            AchievementCriterion::StreakDays { .. } => user.longest_streak.into(),
            AchievementCriterion::XpEarned { .. } => user.xp,
            AchievementCriterion::LevelReached { .. } => user.level.into(),
        }
    }

    pub fn target(&self) -> u64 {
        match *self {
            AchievementCriterion::LessonsCompleted { count }
            | AchievementCriterion::CardsReviewed { count }
            | AchievementCriterion::CardsMastered { count } => count.into(),
            AchievementCriterion::StreakDays { days } => days.into(),
            AchievementCriterion::XpEarned { xp } => xp,
            AchievementCriterion::LevelReached { level } => level.into(),
        }
    }

    pub fn is_met(&self, user: &User, stats: &UserStats) -> bool {
        self.current(user, stats) >= self.target()
    }
}

/// Achievements that are met but not yet recorded as unlocked.
pub fn evaluate<'a>(
    catalog: &'a [Achievement],
    user: &User,
    stats: &UserStats,
) -> Vec<&'a Achievement> {
    catalog
        .iter()
        .filter(|a| !stats.unlocked_achievement_ids.contains(&a.id))
        .filter(|a| a.criterion.is_met(user, stats))
        .collect()
}

/// Unlock everything newly earned, marking each in `stats`.
///
/// Returns the new unlock records together with the bonus XP they carry.
/// The caller must grant the bonus and call again, since bonus XP can
/// satisfy XP or level criteria.
pub fn unlock_new(
    catalog: &[Achievement],
    user: &User,
    stats: &mut UserStats,
    now: DateTime<Utc>,
) -> (Vec<UserAchievement>, u64) {
    let earned: Vec<(String, u32)> = evaluate(catalog, user, stats)
        .into_iter()
        .map(|a| (a.id.clone(), a.xp_reward))
        .collect();

    let mut bonus = 0u64;
    let mut unlocked = Vec::with_capacity(earned.len());
    for (id, xp_reward) in earned {
        stats.unlocked_achievement_ids.insert(id.clone());
        bonus = bonus.saturating_add(xp_reward.into());
        unlocked.push(UserAchievement {
            user_id: user.id.clone(),
            achievement_id: id,
            unlocked_at: now,
        });
    }
    (unlocked, bonus)
}

/// Per-achievement progress for display.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub current: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub target: u64,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

pub fn achievement_statuses(
    catalog: &[Achievement],
    user: &User,
    stats: &UserStats,
    unlocked: &[UserAchievement],
) -> Vec<AchievementStatus> {
    let unlocked_at: HashMap<&str, DateTime<Utc>> = unlocked
        .iter()
        .map(|u| (u.achievement_id.as_str(), u.unlocked_at))
        .collect();

    catalog
        .iter()
        .map(|a| {
            let target = a.criterion.target();
            let when = unlocked_at.get(a.id.as_str()).copied();
            AchievementStatus {
                achievement: a.clone(),
                current: a.criterion.current(user, stats).min(target),
                target,
                unlocked: when.is_some() || stats.unlocked_achievement_ids.contains(&a.id),
                unlocked_at: when,
            }
        })
        .collect()
}

/// Catalog used when none has been stored.
pub fn default_catalog() -> Vec<Achievement> {
    use AchievementCriterion::*;

    let table = [
        (
            "first-lesson",
            "First Steps",
            "Complete your first lesson",
            LessonsCompleted { count: 1 },
            10,
        ),
        (
            "ten-lessons",
            "Dedicated Learner",
            "Complete 10 lessons",
            LessonsCompleted { count: 10 },
            50,
        ),
        (
            "fifty-lessons",
            "Scholar",
            "Complete 50 lessons",
            LessonsCompleted { count: 50 },
            200,
        ),
        (
            "first-review",
            "Card Shark",
            "Review your first flashcard",
            CardsReviewed { count: 1 },
            5,
        ),
        (
            "hundred-reviews",
            "Centurion",
            "Review 100 flashcards",
            CardsReviewed { count: 100 },
            50,
        ),
        (
            "thousand-reviews",
            "Memory Palace",
            "Review 1000 flashcards",
            CardsReviewed { count: 1000 },
            250,
        ),
        (
            "mastered-25",
            "Word Collector",
            "Master 25 flashcards",
            CardsMastered { count: 25 },
            50,
        ),
        (
            "streak-3",
            "On a Roll",
            "Study 3 days in a row",
            StreakDays { days: 3 },
            15,
        ),
        (
            "streak-7",
            "Week Warrior",
            "Study 7 days in a row",
            StreakDays { days: 7 },
            50,
        ),
        (
            "streak-30",
            "Unstoppable",
            "Study 30 days in a row",
            StreakDays { days: 30 },
            300,
        ),
        (
            "xp-1000",
            "Rising Star",
            "Earn 1000 XP",
            XpEarned { xp: 1000 },
            0,
        ),
        (
            "level-5",
            "Level 5",
            "Reach level 5",
            LevelReached { level: 5 },
            25,
        ),
        (
            "level-10",
            "Level 10",
            "Reach level 10",
            LevelReached { level: 10 },
            100,
        ),
    ];

    table
        .into_iter()
        .map(|(id, name, description, criterion, xp_reward)| Achievement {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            criterion,
            xp_reward,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap()
    }

    fn user() -> User {
        User::new("u1", "ana", now())
    }

    #[test]
    fn test_default_catalog_ids_unique() {
        let catalog = default_catalog();
        let ids: std::collections::HashSet<&str> =
            catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_evaluate_only_returns_met_and_locked() {
        let catalog = default_catalog();
        let mut stats = UserStats::default();
        stats.lessons_completed = 1;

        let earned: Vec<&str> = evaluate(&catalog, &user(), &stats)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(earned, vec!["first-lesson"]);

        stats.unlocked_achievement_ids.insert("first-lesson".to_string());
        assert!(evaluate(&catalog, &user(), &stats).is_empty());
    }

    #[test]
    fn test_unlock_new_is_idempotent() {
        let catalog = default_catalog();
        let mut stats = UserStats::default();
        stats.cards_reviewed = 100;

        let (first, bonus) = unlock_new(&catalog, &user(), &mut stats, now());
        assert_eq!(first.len(), 2);
        assert_eq!(bonus, 55);
        assert!(first.iter().all(|u| u.unlocked_at == now()));

        let (second, bonus) = unlock_new(&catalog, &user(), &mut stats, now());
        assert!(second.is_empty());
        assert_eq!(bonus, 0);
    }

    #[test]
    fn test_streak_criterion_uses_longest_streak() {
        let mut u = user();
        u.streak_days = 1;
        u.longest_streak = 7;
        let criterion = AchievementCriterion::StreakDays { days: 7 };
        assert!(criterion.is_met(&u, &UserStats::default()));
    }

    #[test]
    fn test_statuses_cap_current_at_target() {
        let catalog = vec![Achievement {
            id: "r10".to_string(),
            name: "Ten".to_string(),
            description: "Review 10".to_string(),
            criterion: AchievementCriterion::CardsReviewed { count: 10 },
            xp_reward: 0,
        }];
        let mut stats = UserStats::default();
        stats.cards_reviewed = 25;
        let record = UserAchievement {
            user_id: "u1".to_string(),
            achievement_id: "r10".to_string(),
            unlocked_at: now(),
        };

        let statuses = achievement_statuses(&catalog, &user(), &stats, &[record]);
        assert_eq!(statuses[0].current, 10);
        assert_eq!(statuses[0].target, 10);
        assert!(statuses[0].unlocked);
        assert_eq!(statuses[0].unlocked_at, Some(now()));
    }

    #[test]
    fn test_criterion_wire_format() {
        let json = serde_json::to_value(AchievementCriterion::StreakDays { days: 7 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "streak_days", "days": 7}));
    }
}
