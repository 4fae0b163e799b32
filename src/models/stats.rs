//! User learning aggregates for efficient dashboard and achievement queries.
//!
//! These aggregates are updated together with every learning event, so
//! dashboards and achievement checks read one document instead of scanning
//! all progress rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::Difficulty;
use crate::time_utils::day_key;

/// Pre-computed learning statistics for a user.
///
/// Stored at: `user_stats/{user_id}`
///
/// Written in the same Firestore transaction as the progress row it
/// summarizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    // ─── Lessons ─────────────────────────────────────────────────
    /// Number of distinct lessons completed
    #[serde(default)]
    pub lessons_completed: u32,
    /// Completed lesson IDs (for first-completion detection)
    #[serde(default)]
    pub completed_lesson_ids: HashSet<String>,

    // ─── Flashcards ──────────────────────────────────────────────
    /// Total reviews across all cards
    #[serde(default)]
    pub cards_reviewed: u32,
    /// Cards whose latest rating is "easy"
    #[serde(default)]
    pub mastered_card_ids: HashSet<String>,
    /// Review count per UTC day ("YYYY-MM-DD" format)
    #[serde(default)]
    pub reviews_by_day: HashMap<String, u32>,

    // ─── Achievements ────────────────────────────────────────────
    #[serde(default)]
    pub unlocked_achievement_ids: HashSet<String>,

    // ─── Metadata ────────────────────────────────────────────────
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserStats {
    /// Record a completed lesson.
    ///
    /// Returns `true` if this is the first completion of the lesson.
    /// Returns `false` for a repeat, leaving the counters untouched.
    pub fn record_lesson_completion(&mut self, lesson_id: &str, now: DateTime<Utc>) -> bool {
        self.updated_at = Some(now);

        if !self.completed_lesson_ids.insert(lesson_id.to_string()) {
            return false;
        }
        self.lessons_completed = self.completed_lesson_ids.len() as u32;
        true
    }

    /// Record a single flashcard review.
    pub fn record_review(&mut self, card_id: &str, difficulty: Difficulty, now: DateTime<Utc>) {
        self.updated_at = Some(now);
        self.cards_reviewed = self.cards_reviewed.saturating_add(1);
        *self.reviews_by_day.entry(day_key(now)).or_insert(0) += 1;

        // Mastery follows the latest rating, so a card can fall back out.
        if difficulty == Difficulty::Easy {
            self.mastered_card_ids.insert(card_id.to_string());
        } else {
            self.mastered_card_ids.remove(card_id);
        }
    }

    pub fn cards_mastered(&self) -> u32 {
        self.mastered_card_ids.len() as u32
    }

    /// Reviews logged on the UTC day containing `now`.
    pub fn reviews_on(&self, now: DateTime<Utc>) -> u32 {
        self.reviews_by_day.get(&day_key(now)).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_lesson_completion_counts_distinct_lessons() {
        let mut stats = UserStats::default();

        assert!(stats.record_lesson_completion("greetings", at(1, 9)));
        assert!(!stats.record_lesson_completion("greetings", at(1, 10)));
        assert!(stats.record_lesson_completion("numbers", at(2, 9)));

        assert_eq!(stats.lessons_completed, 2);
        assert_eq!(stats.updated_at, Some(at(2, 9)));
    }

    #[test]
    fn test_review_buckets_by_day() {
        let mut stats = UserStats::default();
        stats.record_review("c1", Difficulty::Hard, at(1, 9));
        stats.record_review("c2", Difficulty::Hard, at(1, 23));
        stats.record_review("c1", Difficulty::Medium, at(2, 0));

        assert_eq!(stats.cards_reviewed, 3);
        assert_eq!(stats.reviews_by_day.get("2024-03-01"), Some(&2));
        assert_eq!(stats.reviews_on(at(2, 12)), 1);
        assert_eq!(stats.reviews_on(at(3, 12)), 0);
    }

    #[test]
    fn test_mastery_follows_latest_rating() {
        let mut stats = UserStats::default();
        stats.record_review("c1", Difficulty::Easy, at(1, 9));
        stats.record_review("c2", Difficulty::Easy, at(1, 9));
        assert_eq!(stats.cards_mastered(), 2);

        stats.record_review("c1", Difficulty::Hard, at(2, 9));
        assert_eq!(stats.cards_mastered(), 1);
        assert!(stats.mastered_card_ids.contains("c2"));
    }
}
