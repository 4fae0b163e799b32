// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Polyglot Tracker: progress, review scheduling and gamification for
//! language learners.
//!
//! This crate provides the backend API that records flashcard reviews and
//! lesson results, schedules the next review of each card, and keeps XP,
//! streaks, levels and achievements up to date.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::LearningService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub learning: LearningService,
}

impl AppState {
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let learning = LearningService::new(db.clone(), config.rules);
        Self {
            config,
            db,
            learning,
        }
    }
}
