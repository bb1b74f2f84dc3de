//! Pure selection rules over the learning and mastered sets.
//!
//! These functions never mutate; the engine decides what to do with the
//! returned indices.

use crate::config::SchedulerConfig;
use crate::types::{LearningRecord, MasteredRecord};

/// Whether the current learning set is far enough along to take on another item.
///
/// Size limits (cap, curriculum exhausted) are checked by the caller.
pub fn ready_for_new_item(learning: &[LearningRecord], config: &SchedulerConfig) -> bool {
    match learning {
        [] => true,
        [only] => only.correct_streak >= config.new_card_after_reviews,
        records => {
            if records
                .iter()
                .any(|r| r.correct_streak >= config.mastery_threshold)
            {
                return true;
            }
            records.iter().all(|r| r.total_correct >= 1)
                && records
                    .iter()
                    .any(|r| r.correct_streak >= config.new_card_after_reviews)
        }
    }
}

/// Weakest learning record: lowest streak, then oldest `last_seen`, then set order.
pub fn select_learning(learning: &[LearningRecord]) -> Option<usize> {
    learning
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.correct_streak
                .cmp(&b.correct_streak)
                .then(a.last_seen.cmp(&b.last_seen))
        })
        .map(|(index, _)| index)
}

/// Review candidate among mastered records.
///
/// The two least recently seen records are compared. If their `last_seen`
/// differ by more than `dedup_window_ms` the older one wins; otherwise the one
/// with fewer reviews wins, and equal review counts fall back to the older one.
pub fn select_review(mastered: &[MasteredRecord], dedup_window_ms: i64) -> Option<usize> {
    let mut order: Vec<usize> = (0..mastered.len()).collect();
    order.sort_by_key(|&i| mastered[i].last_seen);

    let (&oldest, rest) = order.split_first()?;
    let Some(&runner_up) = rest.first() else {
        return Some(oldest);
    };

    let a = &mastered[oldest];
    let b = &mastered[runner_up];
    if b.last_seen.saturating_sub(a.last_seen) > dedup_window_ms {
        return Some(oldest);
    }

    if b.review_count < a.review_count {
        Some(runner_up)
    } else {
        Some(oldest)
    }
}
