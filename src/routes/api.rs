// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Learning API routes.
//!
//! All input is validated before any database access.

use crate::error::{AppError, Result};
use crate::models::Difficulty;
use crate::services::achievements::AchievementStatus;
use crate::services::learning::{Dashboard, LearningOutcome};
use crate::services::scheduling::StudyCard;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_ID_LEN: usize = 128;
const DEFAULT_STUDY_LIMIT: u32 = 20;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/{user_id}/reviews", post(record_review))
        .route(
            "/api/users/{user_id}/lessons/{lesson_id}/complete",
            post(complete_lesson),
        )
        .route("/api/users/{user_id}/decks/{deck_id}/study", get(study_queue))
        .route("/api/users/{user_id}/dashboard", get(get_dashboard))
        .route("/api/users/{user_id}/achievements", get(get_achievements))
}

// ─── Validation ──────────────────────────────────────────────

/// IDs are 1-128 characters of `[A-Za-z0-9_-]`.
fn validate_id(id: &str) -> std::result::Result<(), ValidationError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_id"))
    }
}

fn check_path_id(name: &str, id: &str) -> Result<()> {
    validate_id(id).map_err(|_| AppError::BadRequest(format!("Invalid '{}' parameter", name)))
}

// ─── Reviews ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(custom(function = "validate_id"))]
    pub card_id: String,
    /// "easy", "medium" or "hard"
    pub difficulty: String,
}

/// Record a flashcard review and reschedule the card.
async fn record_review(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    WithRejection(Json(request), _): WithRejection<Json<ReviewRequest>, AppError>,
) -> Result<Json<LearningOutcome>> {
    check_path_id("user_id", &user_id)?;
    request.validate()?;
    let difficulty: Difficulty = request.difficulty.parse()?;

    let outcome = state
        .learning
        .record_review(&user_id, &request.card_id, difficulty)
        .await?;
    Ok(Json(outcome))
}

// ─── Lessons ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteLessonRequest {
    /// Percentage score
    #[validate(range(max = 100))]
    pub score: u32,
}

async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Path((user_id, lesson_id)): Path<(String, String)>,
    WithRejection(Json(request), _): WithRejection<Json<CompleteLessonRequest>, AppError>,
) -> Result<Json<LearningOutcome>> {
    check_path_id("user_id", &user_id)?;
    check_path_id("lesson_id", &lesson_id)?;
    request.validate()?;

    let outcome = state
        .learning
        .complete_lesson(&user_id, &lesson_id, request.score)
        .await?;
    Ok(Json(outcome))
}

// ─── Study Queue ─────────────────────────────────────────────

#[derive(Deserialize)]
struct StudyQuery {
    /// Maximum cards to return
    #[serde(default = "default_study_limit")]
    limit: u32,
}

fn default_study_limit() -> u32 {
    DEFAULT_STUDY_LIMIT
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StudyQueueResponse {
    pub deck_id: String,
    pub cards: Vec<StudyCard>,
    pub new_cards: u32,
    pub due_reviews: u32,
}

/// Cards to study now in a deck: overdue reviews first, then new cards.
async fn study_queue(
    State(state): State<Arc<AppState>>,
    Path((user_id, deck_id)): Path<(String, String)>,
    WithRejection(Query(params), _): WithRejection<Query<StudyQuery>, AppError>,
) -> Result<Json<StudyQueueResponse>> {
    check_path_id("user_id", &user_id)?;
    check_path_id("deck_id", &deck_id)?;
    if params.limit == 0 {
        return Err(AppError::BadRequest(
            "Limit must be greater than 0".to_string(),
        ));
    }
    let limit = params.limit.min(state.config.study_queue_max);

    let cards = state
        .learning
        .study_queue(&user_id, &deck_id, limit as usize)
        .await?;
    let new_cards = cards.iter().filter(|c| c.is_new).count() as u32;

    Ok(Json(StudyQueueResponse {
        deck_id,
        due_reviews: cards.len() as u32 - new_cards,
        new_cards,
        cards,
    }))
}

// ─── Dashboard & Achievements ────────────────────────────────

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Dashboard>> {
    check_path_id("user_id", &user_id)?;
    Ok(Json(state.learning.dashboard(&user_id).await?))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementsResponse {
    pub achievements: Vec<AchievementStatus>,
    pub unlocked: u32,
    pub total: u32,
}

async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<AchievementsResponse>> {
    check_path_id("user_id", &user_id)?;
    let achievements = state.learning.achievements(&user_id).await?;

    tracing::debug!(user_id = %user_id, count = achievements.len(), "Fetched achievements");

    Ok(Json(AchievementsResponse {
        unlocked: achievements.iter().filter(|a| a.unlocked).count() as u32,
        total: achievements.len() as u32,
        achievements,
    }))
}
