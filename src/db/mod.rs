//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, LearnerSnapshot};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const LESSONS: &str = "lessons";
    pub const DECKS: &str = "decks";
    pub const FLASHCARDS: &str = "flashcards";
    /// Per-user lesson/card progress (keyed by `progress_doc_id`)
    pub const PROGRESS: &str = "progress";
    /// Achievement catalog
    pub const ACHIEVEMENTS: &str = "achievements";
    /// Unlock records (keyed by `{user_id}_{achievement_id}`)
    pub const USER_ACHIEVEMENTS: &str = "user_achievements";
    /// User learning aggregates (keyed by user_id)
    pub const USER_STATS: &str = "user_stats";
}
