// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod achievements;
pub mod gamification;
pub mod learning;
pub mod progress;
pub mod scheduling;

pub use gamification::GamificationRules;
pub use learning::LearningService;
