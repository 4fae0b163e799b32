// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod achievement;
pub mod content;
pub mod progress;
pub mod stats;
pub mod user;

pub use achievement::{Achievement, AchievementCriterion, UserAchievement};
pub use content::{Flashcard, FlashcardDeck, Lesson, Proficiency};
pub use progress::{progress_doc_id, Difficulty, Progress, ProgressKind, ProgressStatus};
pub use stats::UserStats;
pub use user::User;
