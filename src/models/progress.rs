//! Per-user progress rows for lessons and flashcards.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Self-reported difficulty of a flashcard review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(AppError::BadRequest(format!(
                "Invalid difficulty '{}': expected easy, medium or hard",
                s
            ))),
        }
    }
}

/// What a progress row tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    Lesson,
    Flashcard,
}

impl ProgressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressKind::Lesson => "lesson",
            ProgressKind::Flashcard => "flashcard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Progress of one user on one lesson or card.
///
/// Stored at: `progress/{user_id}_{kind}_{target_id}`, so there is at most
/// one row per (user, kind, target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Progress {
    pub user_id: String,
    pub kind: ProgressKind,
    /// Lesson ID or flashcard ID
    pub target_id: String,
    /// Owning deck (flashcards only)
    #[serde(default)]
    pub deck_id: Option<String>,
    pub status: ProgressStatus,
    /// Best lesson score (0-100)
    #[serde(default)]
    pub score: Option<u32>,
    /// Most recent review rating
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_review_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    /// Fresh, not-started row.
    pub fn new(
        user_id: &str,
        kind: ProgressKind,
        target_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            target_id: target_id.to_string(),
            deck_id: None,
            status: ProgressStatus::NotStarted,
            score: None,
            difficulty: None,
            review_count: 0,
            last_reviewed_at: None,
            next_review_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn doc_id(&self) -> String {
        progress_doc_id(&self.user_id, self.kind, &self.target_id)
    }
}

/// Document ID for a progress row.
pub fn progress_doc_id(user_id: &str, kind: ProgressKind, target_id: &str) -> String {
    format!("{}_{}_{}", user_id, kind.as_str(), target_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parse_is_lenient_about_case_and_whitespace() {
        assert_eq!(" Easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!(matches!(
            "impossible".parse::<Difficulty>(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_progress_doc_id_separates_kinds() {
        let lesson = progress_doc_id("u1", ProgressKind::Lesson, "x");
        let card = progress_doc_id("u1", ProgressKind::Flashcard, "x");
        assert_eq!(lesson, "u1_lesson_x");
        assert_ne!(lesson, card);
    }

    #[test]
    fn test_difficulty_serializes_lowercase() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
