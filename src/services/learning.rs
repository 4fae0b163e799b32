// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Learning event processing.
//!
//! Handles the core workflow for a review or a finished lesson:
//! 1. Read the user, their stats aggregate and the existing progress row
//! 2. Upsert the progress row
//! 3. Update stats, streak and XP
//! 4. Unlock achievements (and grant their bonus XP)
//! 5. Commit all documents
//!
//! Steps 1-5 run in one Firestore transaction that is retried on conflict.
//! Steps 2-4 are pure (`plan_*`) and take `now` explicitly.

use crate::db::{FirestoreDb, LearnerSnapshot};
use crate::error::{AppError, Result};
use crate::models::{
    progress_doc_id, Achievement, Difficulty, Flashcard, Lesson, Progress, ProgressKind, User,
    UserAchievement, UserStats,
};
use crate::services::achievements::{self, AchievementStatus};
use crate::services::gamification::{self, GamificationRules, StreakUpdate, XpAward};
use crate::services::progress;
use crate::services::scheduling::{self, StudyCard};
use crate::time_utils::study_day;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Current state a learning event is applied to.
pub struct LearningContext<'a> {
    pub user: User,
    pub stats: UserStats,
    pub existing: Option<Progress>,
    pub catalog: &'a [Achievement],
    pub rules: &'a GamificationRules,
    pub now: DateTime<Utc>,
}

/// Every document change produced by one learning event.
#[derive(Debug, Clone)]
pub struct LearningUpdate {
    pub user: User,
    pub stats: UserStats,
    pub progress: Progress,
    pub unlocked: Vec<UserAchievement>,
    pub xp: XpAward,
    pub streak: StreakUpdate,
}

/// Plan the effects of one flashcard review.
pub fn plan_card_review(
    ctx: LearningContext<'_>,
    card: &Flashcard,
    difficulty: Difficulty,
) -> LearningUpdate {
    let LearningContext {
        mut user,
        mut stats,
        existing,
        catalog,
        rules,
        now,
    } = ctx;

    let progress = progress::apply_card_review(existing, &user.id, card, difficulty, now);
    stats.record_review(&card.id, difficulty, now);
    let streak = gamification::record_study_day(&mut user, study_day(now));
    let xp = gamification::award_xp(&mut user, rules.card_review_xp.into(), rules);

    finish(user, stats, progress, xp, streak, catalog, rules, now)
}

/// Plan the effects of a finished lesson.
pub fn plan_lesson_completion(
    ctx: LearningContext<'_>,
    lesson: &Lesson,
    score: u32,
) -> Result<LearningUpdate> {
    let LearningContext {
        mut user,
        mut stats,
        existing,
        catalog,
        rules,
        now,
    } = ctx;

    if user.level < lesson.required_level {
        return Err(AppError::Forbidden(format!(
            "Lesson {} requires level {}",
            lesson.id, lesson.required_level
        )));
    }

    let result = progress::apply_lesson_result(existing, &user.id, lesson, score, now)?;
    let counted = stats.record_lesson_completion(&lesson.id, now);
    let streak = gamification::record_study_day(&mut user, study_day(now));

    // Repeats still count toward the streak but earn no XP.
    let reward = if result.first_completion && counted {
        lesson.xp_reward.unwrap_or(rules.lesson_complete_xp)
    } else {
        0
    };
    let xp = gamification::award_xp(&mut user, reward.into(), rules);

    Ok(finish(
        user,
        stats,
        result.progress,
        xp,
        streak,
        catalog,
        rules,
        now,
    ))
}

/// Unlock achievements until a fixed point, granting bonus XP as we go.
#[allow(clippy::too_many_arguments)]
fn finish(
    mut user: User,
    mut stats: UserStats,
    progress: Progress,
    mut xp: XpAward,
    streak: StreakUpdate,
    catalog: &[Achievement],
    rules: &GamificationRules,
    now: DateTime<Utc>,
) -> LearningUpdate {
    let mut unlocked = Vec::new();
    loop {
        let (batch, bonus) = achievements::unlock_new(catalog, &user, &mut stats, now);
        if batch.is_empty() {
            break;
        }
        for record in &batch {
            tracing::info!(
                user_id = %user.id,
                achievement_id = %record.achievement_id,
                "Achievement unlocked"
            );
        }
        unlocked.extend(batch);
        xp = xp.merge(gamification::award_xp(&mut user, bonus, rules));
    }

    LearningUpdate {
        user,
        stats,
        progress,
        unlocked,
        xp,
        streak,
    }
}

/// Response for a recorded review or lesson.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LearningOutcome {
    pub progress: Progress,
    pub xp: XpAward,
    pub streak: StreakUpdate,
    pub unlocked: Vec<UserAchievement>,
}

impl From<LearningUpdate> for LearningOutcome {
    fn from(update: LearningUpdate) -> Self {
        Self {
            progress: update.progress,
            xp: update.xp,
            streak: update.streak,
            unlocked: update.unlocked,
        }
    }
}

/// Dashboard summary for one user.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Dashboard {
    pub user_id: String,
    pub display_name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp: u64,
    pub level: u32,
    /// XP earned since reaching the current level
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp_into_level: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp_to_next_level: u64,
    /// Current streak, or 0 if the last study day was before yesterday
    pub streak_days: u32,
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,
    pub lessons_completed: u32,
    pub cards_reviewed: u32,
    pub cards_mastered: u32,
    pub reviews_today: u32,
    pub achievements_unlocked: u32,
    pub achievements_total: u32,
}

/// Build the dashboard from the user and their stats.
pub fn build_dashboard(
    user: &User,
    stats: &UserStats,
    catalog: &[Achievement],
    rules: &GamificationRules,
    now: DateTime<Utc>,
) -> Dashboard {
    let today = study_day(now);
    // The stored streak is only updated on activity, so it may be stale.
    let streak_days = match user.last_study_date {
        Some(last) if today.signed_duration_since(last).num_days() <= 1 => user.streak_days,
        _ => 0,
    };
    let achievements_unlocked = catalog
        .iter()
        .filter(|a| stats.unlocked_achievement_ids.contains(&a.id))
        .count() as u32;

    Dashboard {
        user_id: user.id.clone(),
        display_name: user
            .display_name
            .clone()
            .unwrap_or_else(|| user.username.clone()),
        xp: user.xp,
        level: user.level,
        xp_into_level: gamification::xp_into_level(user.xp, rules.xp_per_level),
        xp_to_next_level: gamification::xp_to_next_level(user.xp, rules.xp_per_level),
        streak_days,
        longest_streak: user.longest_streak,
        last_study_date: user.last_study_date,
        lessons_completed: stats.lessons_completed,
        cards_reviewed: stats.cards_reviewed,
        cards_mastered: stats.cards_mastered(),
        reviews_today: stats.reviews_on(now),
        achievements_unlocked,
        achievements_total: catalog.len() as u32,
    }
}

/// Split a transactional read into planning inputs. The user must exist.
fn snapshot_parts(
    snapshot: LearnerSnapshot,
    user_id: &str,
) -> Result<(User, UserStats, Option<Progress>)> {
    let user = snapshot
        .user
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
    Ok((user, snapshot.stats.unwrap_or_default(), snapshot.progress))
}

fn applied(update: LearningUpdate) -> LearningOutcome {
    tracing::debug!(
        user_id = %update.user.id,
        xp_gained = update.xp.gained,
        level = update.xp.level,
        streak = update.streak.streak_days,
        "Learning event applied"
    );
    update.into()
}

/// Orchestrates learning events against Firestore.
#[derive(Clone)]
pub struct LearningService {
    db: FirestoreDb,
    rules: GamificationRules,
}

impl LearningService {
    pub fn new(db: FirestoreDb, rules: GamificationRules) -> Self {
        Self { db, rules }
    }

    async fn load_user(&self, user_id: &str) -> Result<User> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Stored catalog, or the built-in one if nothing has been stored.
    async fn load_catalog(&self) -> Result<Vec<Achievement>> {
        let catalog = self.db.list_achievements().await?;
        if catalog.is_empty() {
            return Ok(achievements::default_catalog());
        }
        Ok(catalog)
    }

    /// Record a flashcard review.
    pub async fn record_review(
        &self,
        user_id: &str,
        card_id: &str,
        difficulty: Difficulty,
    ) -> Result<LearningOutcome> {
        tracing::info!(user_id, card_id, difficulty = %difficulty, "Recording review");

        let (card, catalog) =
            tokio::try_join!(self.db.get_flashcard(card_id), self.load_catalog())?;
        let card =
            card.ok_or_else(|| AppError::NotFound(format!("Flashcard {} not found", card_id)))?;

        let rules = self.rules;
        let now = Utc::now();
        let progress_id = progress_doc_id(user_id, ProgressKind::Flashcard, card_id);
        let owner = user_id.to_string();

        let update = self
            .db
            .apply_learning_event(user_id, &progress_id, move |snapshot| {
                let (user, stats, existing) = snapshot_parts(snapshot, &owner)?;
                Ok(plan_card_review(
                    LearningContext {
                        user,
                        stats,
                        existing,
                        catalog: &catalog,
                        rules: &rules,
                        now,
                    },
                    &card,
                    difficulty,
                ))
            })
            .await?;

        Ok(applied(update))
    }

    /// Record a finished lesson with its score (0-100).
    pub async fn complete_lesson(
        &self,
        user_id: &str,
        lesson_id: &str,
        score: u32,
    ) -> Result<LearningOutcome> {
        tracing::info!(user_id, lesson_id, score, "Completing lesson");

        let (lesson, catalog) =
            tokio::try_join!(self.db.get_lesson(lesson_id), self.load_catalog())?;
        let lesson =
            lesson.ok_or_else(|| AppError::NotFound(format!("Lesson {} not found", lesson_id)))?;

        let rules = self.rules;
        let now = Utc::now();
        let progress_id = progress_doc_id(user_id, ProgressKind::Lesson, lesson_id);
        let owner = user_id.to_string();

        let update = self
            .db
            .apply_learning_event(user_id, &progress_id, move |snapshot| {
                let (user, stats, existing) = snapshot_parts(snapshot, &owner)?;
                plan_lesson_completion(
                    LearningContext {
                        user,
                        stats,
                        existing,
                        catalog: &catalog,
                        rules: &rules,
                        now,
                    },
                    &lesson,
                    score,
                )
            })
            .await?;

        Ok(applied(update))
    }

    /// Cards due for study in a deck.
    pub async fn study_queue(
        &self,
        user_id: &str,
        deck_id: &str,
        limit: usize,
    ) -> Result<Vec<StudyCard>> {
        if self.db.get_deck(deck_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Deck {} not found", deck_id)));
        }
        let (_, cards, progress) = tokio::try_join!(
            self.load_user(user_id),
            self.db.list_flashcards_for_deck(deck_id),
            self.db.list_deck_progress(user_id, deck_id),
        )?;

        let progress_by_card: HashMap<String, Progress> = progress
            .into_iter()
            .map(|p| (p.target_id.clone(), p))
            .collect();

        let queue = scheduling::build_study_queue(&cards, &progress_by_card, Utc::now(), limit);
        tracing::debug!(
            user_id,
            deck_id,
            deck_size = cards.len(),
            queued = queue.len(),
            "Built study queue"
        );
        Ok(queue)
    }

    pub async fn dashboard(&self, user_id: &str) -> Result<Dashboard> {
        let (user, stats, catalog) = tokio::try_join!(
            self.load_user(user_id),
            self.db.get_user_stats(user_id),
            self.load_catalog(),
        )?;
        Ok(build_dashboard(
            &user,
            &stats.unwrap_or_default(),
            &catalog,
            &self.rules,
            Utc::now(),
        ))
    }

    pub async fn achievements(&self, user_id: &str) -> Result<Vec<AchievementStatus>> {
        let (user, stats, catalog, unlocked) = tokio::try_join!(
            self.load_user(user_id),
            self.db.get_user_stats(user_id),
            self.load_catalog(),
            self.db.list_user_achievements(user_id),
        )?;
        Ok(achievements::achievement_statuses(
            &catalog,
            &user,
            &stats.unwrap_or_default(),
            &unlocked,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AchievementCriterion, Proficiency, ProgressStatus};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 18, 30, 0).unwrap()
    }

    fn card(id: &str) -> Flashcard {
        Flashcard {
            id: id.to_string(),
            deck_id: "ja-kana".to_string(),
            front: "あ".to_string(),
            back: "a".to_string(),
            example: None,
            position: 0,
        }
    }

    fn lesson(required_level: u32, xp_reward: Option<u32>) -> Lesson {
        Lesson {
            id: "kana-1".to_string(),
            title: "Hiragana 1".to_string(),
            language: "ja".to_string(),
            level: Proficiency::Beginner,
            category: "script".to_string(),
            position: 1,
            xp_reward,
            required_level,
        }
    }

    fn ctx<'a>(
        user: User,
        stats: UserStats,
        existing: Option<Progress>,
        catalog: &'a [Achievement],
        rules: &'a GamificationRules,
        now: DateTime<Utc>,
    ) -> LearningContext<'a> {
        LearningContext {
            user,
            stats,
            existing,
            catalog,
            rules,
            now,
        }
    }

    #[test]
    fn test_first_review_awards_xp_and_starts_streak() {
        let rules = GamificationRules::default();
        let catalog = achievements::default_catalog();
        let user = User::new("u1", "kenji", t0());

        let update = plan_card_review(
            ctx(user, UserStats::default(), None, &catalog, &rules, t0()),
            &card("a"),
            Difficulty::Medium,
        );

        assert_eq!(update.progress.next_review_at, Some(t0() + Duration::days(3)));
        assert_eq!(update.stats.cards_reviewed, 1);
        assert_eq!(update.streak.streak_days, 1);
        // 2 XP for the review plus 5 for the "first-review" achievement.
        assert_eq!(update.xp.gained, 7);
        assert_eq!(update.user.xp, 7);
        let ids: Vec<&str> = update
            .unlocked
            .iter()
            .map(|u| u.achievement_id.as_str())
            .collect();
        assert_eq!(ids, vec!["first-review"]);
    }

    #[test]
    fn test_bonus_xp_can_unlock_level_achievement() {
        let rules = GamificationRules::default();
        let catalog = vec![
            Achievement {
                id: "first-lesson".to_string(),
                name: "First".to_string(),
                description: String::new(),
                criterion: AchievementCriterion::LessonsCompleted { count: 1 },
                xp_reward: 100,
            },
            Achievement {
                id: "level-2".to_string(),
                name: "Two".to_string(),
                description: String::new(),
                criterion: AchievementCriterion::LevelReached { level: 2 },
                xp_reward: 0,
            },
        ];
        let user = User::new("u1", "kenji", t0());

        let update = plan_lesson_completion(
            ctx(user, UserStats::default(), None, &catalog, &rules, t0()),
            &lesson(1, None),
            80,
        )
        .unwrap();

        assert_eq!(update.unlocked.len(), 2);
        assert_eq!(update.user.xp, 120);
        assert_eq!(update.user.level, 2);
        assert!(update.xp.leveled_up);
        assert_eq!(update.xp.gained, 120);
    }

    #[test]
    fn test_repeat_lesson_earns_no_xp() {
        let rules = GamificationRules::default();
        let catalog: Vec<Achievement> = Vec::new();
        let user = User::new("u1", "kenji", t0());

        let first = plan_lesson_completion(
            ctx(user, UserStats::default(), None, &catalog, &rules, t0()),
            &lesson(1, Some(35)),
            60,
        )
        .unwrap();
        assert_eq!(first.xp.gained, 35);

        let next_day = t0() + Duration::days(1);
        let second = plan_lesson_completion(
            ctx(
                first.user,
                first.stats,
                Some(first.progress),
                &catalog,
                &rules,
                next_day,
            ),
            &lesson(1, Some(35)),
            90,
        )
        .unwrap();

        assert_eq!(second.xp.gained, 0);
        assert_eq!(second.user.xp, 35);
        assert_eq!(second.stats.lessons_completed, 1);
        assert_eq!(second.progress.score, Some(90));
        assert_eq!(second.progress.status, ProgressStatus::Completed);
        assert_eq!(second.streak.streak_days, 2);
    }

    #[test]
    fn test_locked_lesson_is_forbidden() {
        let rules = GamificationRules::default();
        let user = User::new("u1", "kenji", t0());

        let err = plan_lesson_completion(
            ctx(user, UserStats::default(), None, &[], &rules, t0()),
            &lesson(3, None),
            100,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_dashboard_hides_stale_streak() {
        let rules = GamificationRules::default();
        let mut user = User::new("u1", "kenji", t0());
        user.streak_days = 4;
        user.longest_streak = 4;
        user.last_study_date = Some(study_day(t0()));

        let stats = UserStats::default();

        let fresh = build_dashboard(&user, &stats, &[], &rules, t0() + Duration::days(1));
        assert_eq!(fresh.streak_days, 4);

        let stale = build_dashboard(&user, &stats, &[], &rules, t0() + Duration::days(2));
        assert_eq!(stale.streak_days, 0);
        assert_eq!(stale.longest_streak, 4);
        assert_eq!(stale.display_name, "kenji");
        assert_eq!(stale.xp_into_level, 0);
        assert_eq!(stale.xp_to_next_level, 100);
    }

    #[test]
    fn test_dashboard_level_progress() {
        let rules = GamificationRules::default();
        let mut user = User::new("u1", "kenji", t0());
        user.xp = 245;
        user.level = 3;

        let dashboard = build_dashboard(&user, &UserStats::default(), &[], &rules, t0());
        assert_eq!(dashboard.xp_into_level, 45);
        assert_eq!(dashboard.xp_to_next_level, 55);
        assert_eq!(dashboard.xp_into_level + dashboard.xp_to_next_level, 100);
    }

    #[test]
    fn test_snapshot_without_user_is_not_found() {
        let err = snapshot_parts(LearnerSnapshot::default(), "ghost").unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.contains("ghost")));
    }

    #[test]
    fn test_snapshot_defaults_missing_stats() {
        let snapshot = LearnerSnapshot {
            user: Some(User::new("u1", "kenji", t0())),
            stats: None,
            progress: None,
        };
        let (user, stats, existing) = snapshot_parts(snapshot, "u1").unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(stats.cards_reviewed, 0);
        assert!(existing.is_none());
    }
}
