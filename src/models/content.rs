//! Learning content: lessons, flashcard decks and cards.
//!
//! Content is authored elsewhere and only read by this service.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Proficiency band a lesson or deck targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
}

/// A lesson in the curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson ID (also used as document ID)
    pub id: String,
    pub title: String,
    /// Target language code (e.g. "es", "ja")
    pub language: String,
    pub level: Proficiency,
    pub category: String,
    /// Ordering within the curriculum
    #[serde(default)]
    pub position: u32,
    /// Overrides the configured lesson XP when set
    #[serde(default)]
    pub xp_reward: Option<u32>,
    /// Minimum user level needed to complete the lesson
    #[serde(default = "default_required_level")]
    pub required_level: u32,
}

fn default_required_level() -> u32 {
    1
}

/// A named collection of flashcards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FlashcardDeck {
    /// Deck ID (also used as document ID)
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub language: String,
    pub level: Proficiency,
    pub category: String,
}

/// A single card: prompt on the front, answer on the back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Flashcard {
    /// Card ID (also used as document ID)
    pub id: String,
    pub deck_id: String,
    pub front: String,
    pub back: String,
    /// Example sentence using the term
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub position: u32,
}
