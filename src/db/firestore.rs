// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles with XP/streak counters)
//! - Content (lessons, decks, flashcards)
//! - Progress (per-user lesson and card rows)
//! - Achievements (catalog and unlock records)
//! - User stats (aggregates)
//! - Transactional learning updates

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    Achievement, Flashcard, FlashcardDeck, Lesson, Progress, ProgressKind, User, UserAchievement,
    UserStats,
};
use crate::services::learning::LearningUpdate;
use firestore::errors::{BackoffError, FirestoreError};
use firestore::FirestoreTransaction;
use futures_util::{stream, StreamExt};
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Fetch one document by ID.
    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        read_doc(self.get_client()?, collection, id).await
    }

    /// Create or replace one document.
    async fn set_doc<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.id, user).await
    }

    // ─── Content Operations ──────────────────────────────────────

    pub async fn get_lesson(&self, lesson_id: &str) -> Result<Option<Lesson>, AppError> {
        self.get_doc(collections::LESSONS, lesson_id).await
    }

    pub async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), AppError> {
        self.set_doc(collections::LESSONS, &lesson.id, lesson).await
    }

    /// All lessons, ordered by position.
    pub async fn list_lessons(&self) -> Result<Vec<Lesson>, AppError> {
        let mut lessons: Vec<Lesson> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::LESSONS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        lessons.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(lessons)
    }

    pub async fn get_deck(&self, deck_id: &str) -> Result<Option<FlashcardDeck>, AppError> {
        self.get_doc(collections::DECKS, deck_id).await
    }

    pub async fn upsert_deck(&self, deck: &FlashcardDeck) -> Result<(), AppError> {
        self.set_doc(collections::DECKS, &deck.id, deck).await
    }

    pub async fn get_flashcard(&self, card_id: &str) -> Result<Option<Flashcard>, AppError> {
        self.get_doc(collections::FLASHCARDS, card_id).await
    }

    pub async fn upsert_flashcard(&self, card: &Flashcard) -> Result<(), AppError> {
        self.set_doc(collections::FLASHCARDS, &card.id, card).await
    }

    /// All cards in a deck, ordered by position.
    pub async fn list_flashcards_for_deck(
        &self,
        deck_id: &str,
    ) -> Result<Vec<Flashcard>, AppError> {
        let mut cards: Vec<Flashcard> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FLASHCARDS)
            .filter(|q| q.for_all([q.field("deck_id").eq(deck_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here to avoid needing a composite index on (deck_id, position).
        cards.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(cards)
    }

    // ─── Progress Operations ─────────────────────────────────────

    pub async fn get_progress(&self, doc_id: &str) -> Result<Option<Progress>, AppError> {
        self.get_doc(collections::PROGRESS, doc_id).await
    }

    /// All flashcard progress rows a user has in one deck.
    pub async fn list_deck_progress(
        &self,
        user_id: &str,
        deck_id: &str,
    ) -> Result<Vec<Progress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PROGRESS)
            .filter(|q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("kind").eq(ProgressKind::Flashcard.as_str()),
                    q.field("deck_id").eq(deck_id),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Achievement Operations ──────────────────────────────────

    pub async fn list_achievements(&self) -> Result<Vec<Achievement>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACHIEVEMENTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store catalog entries.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn seed_achievements(&self, catalog: &[Achievement]) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(catalog.to_vec())
            .map(|achievement| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::ACHIEVEMENTS)
                    .document_id(&achievement.id)
                    .object(&achievement)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::info!(count = catalog.len(), "Seeded achievement catalog");
        Ok(())
    }

    pub async fn list_user_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserAchievement>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_ACHIEVEMENTS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Stats Operations ──────────────────────────────────

    pub async fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>, AppError> {
        self.get_doc(collections::USER_STATS, user_id).await
    }

    // ─── Atomic Learning Updates ────────────────────────────────

    /// Apply one learning event inside a read-write transaction.
    ///
    /// The user, their stats aggregate and the progress row are read through
    /// the transaction and handed to `plan`. Everything the plan produces (the
    /// progress row, the user's counters, the stats aggregate and any unlock
    /// records) is committed together. If another event for the same user
    /// commits first, Firestore aborts this attempt and `plan` runs again on
    /// fresh data, so concurrent events never overwrite each other.
    ///
    /// Errors from the reads or from `plan` abort without retrying and are
    /// passed through unchanged. Only commit conflicts are retried.
    pub async fn apply_learning_event<F>(
        &self,
        user_id: &str,
        progress_id: &str,
        plan: F,
    ) -> Result<LearningUpdate, AppError>
    where
        F: Fn(LearnerSnapshot) -> Result<LearningUpdate, AppError> + Send + Sync + 'static,
    {
        let client = self.get_client()?;
        let plan = Arc::new(plan);
        let user_id = user_id.to_string();
        let progress_id = progress_id.to_string();

        let update = client
            .run_transaction(|db, transaction| {
                let plan = Arc::clone(&plan);
                let user_id = user_id.clone();
                let progress_id = progress_id.clone();

                Box::pin(async move {
                    // Reads register these documents for conflict detection
                    let (user, stats, progress) = tokio::try_join!(
                        read_doc(&db, collections::USERS, &user_id),
                        read_doc(&db, collections::USER_STATS, &user_id),
                        read_doc(&db, collections::PROGRESS, &progress_id),
                    )
                    .map_err(BackoffError::permanent)?;

                    let update = plan(LearnerSnapshot {
                        user,
                        stats,
                        progress,
                    })
                    .map_err(BackoffError::permanent)?;
                    stage_learning_update(&db, transaction, &update)
                        .map_err(BackoffError::permanent)?;

                    Ok::<_, BackoffError<AppError>>(update)
                })
            })
            .await
            .map_err(transaction_error)?;

        tracing::info!(
            user_id = %update.user.id,
            target_id = %update.progress.target_id,
            kind = update.progress.kind.as_str(),
            unlocked = update.unlocked.len(),
            "Learning update committed"
        );

        Ok(update)
    }
}

/// Documents a learning event is planned against, as read in its transaction.
#[derive(Debug, Clone, Default)]
pub struct LearnerSnapshot {
    pub user: Option<User>,
    pub stats: Option<UserStats>,
    pub progress: Option<Progress>,
}

async fn read_doc<T>(
    db: &firestore::FirestoreDb,
    collection: &str,
    id: &str,
) -> Result<Option<T>, AppError>
where
    T: serde::de::DeserializeOwned + Send,
{
    db.fluent()
        .select()
        .by_id_in(collection)
        .obj()
        .one(id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Queue every write of `update` on the transaction.
fn stage_learning_update(
    db: &firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    update: &LearningUpdate,
) -> Result<(), AppError> {
    db.fluent()
        .update()
        .in_col(collections::PROGRESS)
        .document_id(update.progress.doc_id())
        .object(&update.progress)
        .add_to_transaction(transaction)
        .map_err(|e| AppError::Database(format!("Failed to add progress to transaction: {}", e)))?;

    db.fluent()
        .update()
        .in_col(collections::USERS)
        .document_id(&update.user.id)
        .object(&update.user)
        .add_to_transaction(transaction)
        .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

    db.fluent()
        .update()
        .in_col(collections::USER_STATS)
        .document_id(&update.user.id)
        .object(&update.stats)
        .add_to_transaction(transaction)
        .map_err(|e| AppError::Database(format!("Failed to add stats to transaction: {}", e)))?;

    for record in &update.unlocked {
        db.fluent()
            .update()
            .in_col(collections::USER_ACHIEVEMENTS)
            .document_id(record.doc_id())
            .object(record)
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add achievement {} to transaction: {}",
                    record.achievement_id, e
                ))
            })?;
    }

    Ok(())
}

/// Recover an error raised by the transaction body, or wrap a Firestore one.
fn transaction_error(err: FirestoreError) -> AppError {
    match err {
        FirestoreError::ErrorInTransaction(inner) => match inner.source.downcast::<AppError>() {
            Ok(app_err) => *app_err,
            Err(other) => AppError::Database(format!("Transaction failed: {}", other)),
        },
        other => AppError::Database(format!("Transaction failed: {}", other)),
    }
}
