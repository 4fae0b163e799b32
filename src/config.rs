//! Application configuration loaded from environment variables.
//!
//! Gamification tuning (XP values, level size) is read once at startup so a
//! deployment can rebalance rewards without a rebuild.

use crate::services::gamification::GamificationRules;
use std::env;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STUDY_QUEUE_MAX: u32 = 50;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// XP and level tuning
    pub rules: GamificationRules,
    /// Upper bound on cards returned by a single study queue request
    pub study_queue_max: u32,
}

impl Config {
    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: DEFAULT_PORT,
            rules: GamificationRules::default(),
            study_queue_max: DEFAULT_STUDY_QUEUE_MAX,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = GamificationRules::default();
        let rules = GamificationRules {
            lesson_complete_xp: parse_var("XP_LESSON_COMPLETE", defaults.lesson_complete_xp)?,
            card_review_xp: parse_var("XP_CARD_REVIEW", defaults.card_review_xp)?,
            xp_per_level: parse_var("XP_PER_LEVEL", defaults.xp_per_level)?,
        };
        if rules.xp_per_level == 0 {
            return Err(ConfigError::Invalid {
                name: "XP_PER_LEVEL",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            port: parse_var("PORT", DEFAULT_PORT)?,
            rules,
            study_queue_max: parse_var("STUDY_QUEUE_MAX", DEFAULT_STUDY_QUEUE_MAX)?,
        })
    }
}

/// Read an optional numeric variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw.clone(),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so everything touching them lives in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("GCP_PROJECT_ID", "lang-dev");
        env::set_var("XP_CARD_REVIEW", "3");
        env::remove_var("XP_LESSON_COMPLETE");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.gcp_project_id, "lang-dev");
        assert_eq!(config.rules.card_review_xp, 3);
        assert_eq!(config.rules.lesson_complete_xp, 20);

        env::set_var("XP_PER_LEVEL", "0");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "XP_PER_LEVEL", .. }));

        env::set_var("XP_PER_LEVEL", "lots");
        assert!(Config::from_env().is_err());

        env::remove_var("XP_PER_LEVEL");
        env::remove_var("XP_CARD_REVIEW");
    }
}
