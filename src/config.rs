use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::curriculum::{GUITAR_MAX_NOTE, GUITAR_MIN_NOTE};

/// Tuning knobs of the selection and promotion policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    /// Streak that promotes a learning item to mastered
    pub mastery_threshold: u32,
    /// Streak a lone learning item needs before the next item is introduced
    pub new_card_after_reviews: u32,
    /// Probability of interleaving a review when mastered items exist
    pub review_probability: f64,
    /// Learning set cap
    pub max_learning_cards: usize,
    /// Two mastered items whose `last_seen` differ by no more than this are
    /// ordered by review count instead
    pub review_dedup_window_ms: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: 3,
            new_card_after_reviews: 2,
            review_probability: 0.7,
            max_learning_cards: 5,
            review_dedup_window_ms: 10_000,
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mastery_threshold: env_u32("DRILL_MASTERY_THRESHOLD", defaults.mastery_threshold),
            new_card_after_reviews: env_u32(
                "DRILL_NEW_CARD_AFTER_REVIEWS",
                defaults.new_card_after_reviews,
            ),
            review_probability: env_f64("DRILL_REVIEW_PROBABILITY", defaults.review_probability),
            max_learning_cards: env_u64(
                "DRILL_MAX_LEARNING_CARDS",
                defaults.max_learning_cards as u64,
            ) as usize,
            review_dedup_window_ms: env_i64(
                "DRILL_REVIEW_DEDUP_WINDOW_MS",
                defaults.review_dedup_window_ms,
            ),
        }
        .sanitized()
    }

    /// Clamps values into ranges the policy can work with.
    pub fn sanitized(mut self) -> Self {
        self.mastery_threshold = self.mastery_threshold.max(1);
        self.max_learning_cards = self.max_learning_cards.max(1);
        self.review_probability = if self.review_probability.is_finite() {
            self.review_probability.clamp(0.0, 1.0)
        } else {
            Self::default().review_probability
        };
        self.review_dedup_window_ms = self.review_dedup_window_ms.max(0);
        self
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub save_debounce: Duration,
    pub data_dir: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(500),
            data_dir: PathBuf::from("./data/progress"),
        }
    }
}

impl PersistenceConfig {
    pub fn from_env() -> Self {
        let save_debounce_ms = env_u64("DRILL_SAVE_DEBOUNCE_MS", 500);
        let data_dir = std::env::var("DRILL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/progress"));

        Self {
            save_debounce: Duration::from_millis(save_debounce_ms),
            data_dir,
        }
    }
}

/// Where and how much the drill logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive
    pub level: String,
    /// Also write a daily rolling file under `dir`
    pub file_enabled: bool,
    pub dir: PathBuf,
    /// Prefix of the rolling file; the date is appended per rotation
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            dir: PathBuf::from("./logs"),
            file_name: "drill.log".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: std::env::var("RUST_LOG").unwrap_or(defaults.level),
            file_enabled: env_bool("ENABLE_FILE_LOGS", defaults.file_enabled),
            dir: std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
            file_name: std::env::var("DRILL_LOG_FILE")
                .ok()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.file_name),
        }
    }
}

/// Settings for the terminal drill binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub identity: String,
    pub min_note: String,
    pub max_note: String,
    pub seed: Option<u64>,
    pub scheduler: SchedulerConfig,
    pub persistence: PersistenceConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let identity = std::env::var("DRILL_USER")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "local".to_string());
        let min_note =
            std::env::var("DRILL_MIN_NOTE").unwrap_or_else(|_| GUITAR_MIN_NOTE.to_string());
        let max_note =
            std::env::var("DRILL_MAX_NOTE").unwrap_or_else(|_| GUITAR_MAX_NOTE.to_string());
        let seed = std::env::var("DRILL_SEED")
            .ok()
            .and_then(|value| value.parse::<u64>().ok());

        Self {
            logging: LoggingConfig::from_env(),
            identity,
            min_note,
            max_note,
            seed,
            scheduler: SchedulerConfig::from_env(),
            persistence: PersistenceConfig::from_env(),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(value.trim(), "1" | "true" | "TRUE" | "yes"),
        Err(_) => default,
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(default)
}
