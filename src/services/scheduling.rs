// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Difficulty-based review scheduling.
//!
//! Each rating maps to a fixed day offset:
//! - easy: review again in 7 days
//! - medium: review again in 3 days
//! - hard: review again tomorrow
//!
//! Intervals do not grow with repeated success.

use crate::models::{Difficulty, Flashcard, Progress};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Days until the next review for a rating.
pub fn interval_days(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Easy => 7,
        Difficulty::Medium => 3,
        Difficulty::Hard => 1,
    }
}

pub fn review_interval(difficulty: Difficulty) -> Duration {
    Duration::days(interval_days(difficulty))
}

/// When a card rated `difficulty` at `reviewed_at` should be shown again.
pub fn next_review_at(difficulty: Difficulty, reviewed_at: DateTime<Utc>) -> DateTime<Utc> {
    reviewed_at + review_interval(difficulty)
}

/// A card is due if it was never scheduled or its review time has passed.
pub fn is_due(progress: Option<&Progress>, now: DateTime<Utc>) -> bool {
    match progress.and_then(|p| p.next_review_at) {
        Some(next) => next <= now,
        None => true,
    }
}

/// A card selected for study.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StudyCard {
    pub card: Flashcard,
    /// Latest rating, `None` for a new card
    pub difficulty: Option<Difficulty>,
    pub review_count: u32,
    pub next_review_at: Option<DateTime<Utc>>,
    pub is_new: bool,
}

/// Pick the cards to study now.
///
/// Overdue cards come first (most overdue first), then cards that were never
/// reviewed. Cards scheduled in the future are left out.
pub fn build_study_queue(
    cards: &[Flashcard],
    progress_by_card: &HashMap<String, Progress>,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<StudyCard> {
    let mut due: Vec<(&Flashcard, &Progress, DateTime<Utc>)> = Vec::new();
    let mut fresh: Vec<&Flashcard> = Vec::new();

    for card in cards {
        match progress_by_card.get(&card.id) {
            Some(progress) => match progress.next_review_at {
                Some(next) if next <= now => due.push((card, progress, next)),
                Some(_) => {}
                // A row without a schedule has never been rated.
                None => fresh.push(card),
            },
            None => fresh.push(card),
        }
    }

    due.sort_by(|a, b| a.2.cmp(&b.2).then_with(|| card_order(a.0, b.0)));
    fresh.sort_by(|a, b| card_order(a, b));

    due.into_iter()
        .map(|(card, progress, next)| StudyCard {
            card: card.clone(),
            difficulty: progress.difficulty,
            review_count: progress.review_count,
            next_review_at: Some(next),
            is_new: false,
        })
        .chain(fresh.into_iter().map(|card| StudyCard {
            card: card.clone(),
            difficulty: None,
            review_count: 0,
            next_review_at: None,
            is_new: true,
        }))
        .take(limit)
        .collect()
}

fn card_order(a: &Flashcard, b: &Flashcard) -> Ordering {
    a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id))
}
