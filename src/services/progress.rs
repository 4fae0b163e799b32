// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress upserts for card reviews and lesson results.

use crate::error::{AppError, Result};
use crate::models::{Difficulty, Flashcard, Lesson, Progress, ProgressKind, ProgressStatus};
use crate::services::scheduling;
use chrono::{DateTime, Utc};

/// Highest lesson score accepted.
pub const MAX_SCORE: u32 = 100;

/// Apply a review rating to a card's progress row, creating it if needed.
pub fn apply_card_review(
    existing: Option<Progress>,
    user_id: &str,
    card: &Flashcard,
    difficulty: Difficulty,
    now: DateTime<Utc>,
) -> Progress {
    let mut progress = existing
        .unwrap_or_else(|| Progress::new(user_id, ProgressKind::Flashcard, &card.id, now));

    progress.deck_id = Some(card.deck_id.clone());
    progress.difficulty = Some(difficulty);
    progress.review_count = progress.review_count.saturating_add(1);
    progress.last_reviewed_at = Some(now);
    progress.next_review_at = Some(scheduling::next_review_at(difficulty, now));
    progress.status = if difficulty == Difficulty::Easy {
        ProgressStatus::Completed
    } else {
        ProgressStatus::InProgress
    };
    if progress.status == ProgressStatus::Completed && progress.completed_at.is_none() {
        progress.completed_at = Some(now);
    }
    progress.updated_at = now;
    progress
}

/// Outcome of recording a lesson score.
#[derive(Debug, Clone)]
pub struct LessonResult {
    pub progress: Progress,
    /// True if the lesson had not been completed before
    pub first_completion: bool,
}

/// Record a finished lesson attempt. Keeps the best score and the first
/// completion time.
pub fn apply_lesson_result(
    existing: Option<Progress>,
    user_id: &str,
    lesson: &Lesson,
    score: u32,
    now: DateTime<Utc>,
) -> Result<LessonResult> {
    if score > MAX_SCORE {
        return Err(AppError::BadRequest(format!(
            "Score must be between 0 and {}",
            MAX_SCORE
        )));
    }

    let mut progress = existing
        .unwrap_or_else(|| Progress::new(user_id, ProgressKind::Lesson, &lesson.id, now));
    let first_completion = progress.status != ProgressStatus::Completed;

    progress.status = ProgressStatus::Completed;
    progress.score = Some(progress.score.map_or(score, |best| best.max(score)));
    progress.completed_at.get_or_insert(now);
    progress.updated_at = now;

    Ok(LessonResult {
        progress,
        first_completion,
    })
}
