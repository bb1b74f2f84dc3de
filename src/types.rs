//! Shared record and presentation types.

use serde::{Deserialize, Serialize};

// ==================== Records ====================

/// An item currently being reinforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningRecord {
    pub item: String,
    /// Consecutive correct answers since creation or the last miss
    pub correct_streak: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    /// Epoch milliseconds of the last answer (or creation)
    pub last_seen: i64,
}

impl LearningRecord {
    pub fn new(item: impl Into<String>, now_ms: i64) -> Self {
        Self {
            item: item.into(),
            correct_streak: 0,
            total_correct: 0,
            total_incorrect: 0,
            last_seen: now_ms,
        }
    }

    /// Converts into a mastered record, keeping the cumulative counters.
    pub fn promote(self, now_ms: i64) -> MasteredRecord {
        MasteredRecord {
            item: self.item,
            correct_streak: self.correct_streak,
            total_correct: self.total_correct,
            total_incorrect: self.total_incorrect,
            last_seen: self.last_seen,
            mastered_at: now_ms,
            review_count: 0,
        }
    }
}

/// An item promoted out of active learning, kept for periodic review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteredRecord {
    pub item: String,
    pub correct_streak: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    pub last_seen: i64,
    pub mastered_at: i64,
    /// Answers given while mastered
    pub review_count: u32,
}

impl MasteredRecord {
    /// Converts back into a fresh learning record. Streak restarts at zero,
    /// cumulative counters carry over unchanged.
    pub fn demote(self, now_ms: i64) -> LearningRecord {
        LearningRecord {
            item: self.item,
            correct_streak: 0,
            total_correct: self.total_correct,
            total_incorrect: self.total_incorrect,
            last_seen: now_ms,
        }
    }
}

// ==================== Presentation ====================

/// Why a card was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    New,
    Learning,
    Review,
}

impl CardKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            CardKind::New => "new",
            CardKind::Learning => "learning",
            CardKind::Review => "review",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMetadata {
    pub correct_streak: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
}

/// A single presentation handed to the caller.
///
/// `id` is allocated per presentation and is not part of persisted identity;
/// answers are reported back by `item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub item: String,
    pub kind: CardKind,
    pub metadata: CardMetadata,
}

// ==================== Progress ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total: usize,
    pub learning: usize,
    pub mastered: usize,
    pub not_started: usize,
    pub progress_percentage: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_correct: u64,
    pub total_incorrect: u64,
    pub accuracy: u32,
    #[serde(flatten)]
    pub progress: Progress,
}

/// Rounded percentage `100 * part / whole`, zero when `whole` is zero.
pub(crate) fn percentage(part: f64, whole: f64) -> u32 {
    if whole <= 0.0 {
        return 0;
    }
    (100.0 * part / whole).round().max(0.0) as u32
}
