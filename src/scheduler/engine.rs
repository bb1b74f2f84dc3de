use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::curriculum::Curriculum;
use crate::random::{RandomSource, SeededRandom};
use crate::scheduler::selection::{ready_for_new_item, select_learning, select_review};
use crate::scheduler::snapshot::{Snapshot, SnapshotCard};
use crate::types::{
    percentage, Card, CardKind, CardMetadata, LearningRecord, MasteredRecord, Progress, Stats,
};

/// Progressive drill scheduler for a single learner.
///
/// Items enter the learning set in curriculum order, graduate to the mastered
/// set after `mastery_threshold` consecutive correct answers, and drop back
/// to learning on any review miss. Every [`next_card`](Self::next_card) call
/// re-evaluates the sets from scratch; there is no cursor.
pub struct ProgressiveScheduler {
    curriculum: Curriculum,
    config: SchedulerConfig,
    learning: Vec<LearningRecord>,
    mastered: Vec<MasteredRecord>,
    card_id_counter: u64,
    /// Bootstrapped first item, until it is presented or answered. It never
    /// went through introduction, so its first presentation is tagged new.
    unpresented_bootstrap: Option<String>,
    clock: Box<dyn Clock>,
    random: Box<dyn RandomSource>,
}

impl fmt::Debug for ProgressiveScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressiveScheduler")
            .field("curriculum_len", &self.curriculum.len())
            .field("config", &self.config)
            .field("learning", &self.learning)
            .field("mastered", &self.mastered)
            .field("card_id_counter", &self.card_id_counter)
            .finish()
    }
}

pub struct SchedulerBuilder {
    curriculum: Curriculum,
    config: SchedulerConfig,
    clock: Option<Box<dyn Clock>>,
    random: Option<Box<dyn RandomSource>>,
    snapshot: Option<Snapshot>,
}

impl SchedulerBuilder {
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Some(Box::new(random));
        self
    }

    pub fn seed(self, seed: u64) -> Self {
        self.random(SeededRandom::new(seed))
    }

    /// Prior state to restore. `None` or an empty snapshot bootstraps fresh.
    pub fn snapshot(mut self, snapshot: Option<Snapshot>) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn build(self) -> ProgressiveScheduler {
        let mut scheduler = ProgressiveScheduler {
            curriculum: self.curriculum,
            config: self.config.sanitized(),
            learning: Vec::new(),
            mastered: Vec::new(),
            card_id_counter: 0,
            unpresented_bootstrap: None,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            random: self
                .random
                .unwrap_or_else(|| Box::new(SeededRandom::from_entropy())),
        };

        match self.snapshot {
            Some(snapshot) if !snapshot.is_empty() => scheduler.restore(snapshot),
            _ => scheduler.bootstrap(),
        }
        scheduler
    }
}

impl ProgressiveScheduler {
    pub fn builder(curriculum: Curriculum) -> SchedulerBuilder {
        SchedulerBuilder {
            curriculum,
            config: SchedulerConfig::default(),
            clock: None,
            random: None,
            snapshot: None,
        }
    }

    /// Fresh scheduler with default policy, system clock and entropy-seeded randomness.
    pub fn new(curriculum: Curriculum) -> Self {
        Self::builder(curriculum).build()
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn learning(&self) -> &[LearningRecord] {
        &self.learning
    }

    pub fn mastered(&self) -> &[MasteredRecord] {
        &self.mastered
    }

    pub fn introduced_count(&self) -> usize {
        self.learning.len() + self.mastered.len()
    }

    // ==================== Selection ====================

    /// Picks the next card to present, introducing a new item when the
    /// learning set is ready for one.
    pub fn next_card(&mut self) -> Option<Card> {
        if self.should_introduce() {
            if let Some(index) = self.introduce() {
                return Some(self.present_learning(index, CardKind::New));
            }
        }

        if !self.mastered.is_empty() && self.random.chance(self.config.review_probability) {
            if let Some(index) = select_review(&self.mastered, self.config.review_dedup_window_ms)
            {
                return Some(self.present_review(index));
            }
        }

        if let Some(index) = select_learning(&self.learning) {
            let kind = match self.unpresented_bootstrap.take() {
                Some(first) if first == self.learning[index].item => CardKind::New,
                pending => {
                    self.unpresented_bootstrap = pending;
                    CardKind::Learning
                }
            };
            return Some(self.present_learning(index, kind));
        }

        select_review(&self.mastered, self.config.review_dedup_window_ms)
            .map(|index| self.present_review(index))
    }

    /// Up to `size` consecutive cards, stopping early when none is available.
    pub fn initial_stack(&mut self, size: usize) -> Vec<Card> {
        let mut stack = Vec::with_capacity(size);
        for _ in 0..size {
            match self.next_card() {
                Some(card) => stack.push(card),
                None => break,
            }
        }
        stack
    }

    fn should_introduce(&self) -> bool {
        self.learning.len() < self.config.max_learning_cards
            && self.introduced_count() < self.curriculum.len()
            && ready_for_new_item(&self.learning, &self.config)
    }

    /// Appends a learning record for the next curriculum item and returns its index.
    fn introduce(&mut self) -> Option<usize> {
        let position = self.introduced_count();
        let mut item = self.curriculum.get(position)?;

        // A restored snapshot that is not a curriculum prefix could make the
        // positional item one we already hold.
        if self.contains(item) {
            item = self.curriculum.iter().find(|candidate| !self.contains(candidate))?;
        }

        let record = LearningRecord::new(item, self.clock.now_ms());
        debug!(item = %record.item, position, "introducing item");
        self.learning.push(record);
        Some(self.learning.len() - 1)
    }

    fn contains(&self, item: &str) -> bool {
        self.learning.iter().any(|r| r.item == item) || self.mastered.iter().any(|r| r.item == item)
    }

    fn present_learning(&mut self, index: usize, kind: CardKind) -> Card {
        let record = &self.learning[index];
        let item = record.item.clone();
        let metadata = CardMetadata {
            correct_streak: record.correct_streak,
            total_correct: record.total_correct,
            total_incorrect: record.total_incorrect,
        };
        self.present(item, kind, metadata)
    }

    fn present_review(&mut self, index: usize) -> Card {
        let record = &self.mastered[index];
        let item = record.item.clone();
        let metadata = CardMetadata {
            correct_streak: record.correct_streak,
            total_correct: record.total_correct,
            total_incorrect: record.total_incorrect,
        };
        self.present(item, CardKind::Review, metadata)
    }

    fn present(&mut self, item: String, kind: CardKind, metadata: CardMetadata) -> Card {
        let id = format!("card_{}", self.card_id_counter);
        self.card_id_counter += 1;
        Card {
            id,
            item,
            kind,
            metadata,
        }
    }

    // ==================== Answers ====================

    /// Records a correct answer. Unknown items are ignored.
    pub fn mark_correct(&mut self, item: &str) {
        let now = self.clock.now_ms();
        self.clear_bootstrap(item);

        if let Some(index) = self.learning.iter().position(|r| r.item == item) {
            let record = &mut self.learning[index];
            record.correct_streak = record.correct_streak.saturating_add(1);
            record.total_correct = record.total_correct.saturating_add(1);
            record.last_seen = now;

            if record.correct_streak >= self.config.mastery_threshold {
                let record = self.learning.remove(index);
                debug!(item = %record.item, total_correct = record.total_correct, "item mastered");
                self.mastered.push(record.promote(now));
            }
            return;
        }

        if let Some(record) = self.mastered.iter_mut().find(|r| r.item == item) {
            record.correct_streak = record.correct_streak.saturating_add(1);
            record.total_correct = record.total_correct.saturating_add(1);
            record.review_count = record.review_count.saturating_add(1);
            record.last_seen = now;
            return;
        }

        debug!(item, "correct answer for unknown item ignored");
    }

    /// Records a miss. A miss on a mastered item demotes it back to learning.
    /// Unknown items are ignored.
    pub fn mark_incorrect(&mut self, item: &str) {
        let now = self.clock.now_ms();
        self.clear_bootstrap(item);

        if let Some(record) = self.learning.iter_mut().find(|r| r.item == item) {
            record.correct_streak = 0;
            record.total_incorrect = record.total_incorrect.saturating_add(1);
            record.last_seen = now;
            return;
        }

        if let Some(index) = self.mastered.iter().position(|r| r.item == item) {
            let mut record = self.mastered.remove(index);
            record.total_incorrect = record.total_incorrect.saturating_add(1);
            debug!(
                item = %record.item,
                review_count = record.review_count,
                "review missed, demoting to learning"
            );
            self.learning.push(record.demote(now));
            return;
        }

        debug!(item, "incorrect answer for unknown item ignored");
    }

    fn clear_bootstrap(&mut self, item: &str) {
        if self.unpresented_bootstrap.as_deref() == Some(item) {
            self.unpresented_bootstrap = None;
        }
    }

    // ==================== Progress ====================

    pub fn progress(&self) -> Progress {
        let total = self.curriculum.len();
        let learning = self.learning.len();
        let mastered = self.mastered.len();

        Progress {
            total,
            learning,
            mastered,
            not_started: total.saturating_sub(learning + mastered),
            progress_percentage: percentage(mastered as f64 + learning as f64 * 0.5, total as f64),
        }
    }

    pub fn stats(&self) -> Stats {
        let total_correct: u64 = self
            .learning
            .iter()
            .map(|r| r.total_correct as u64)
            .chain(self.mastered.iter().map(|r| r.total_correct as u64))
            .sum();
        let total_incorrect: u64 = self
            .learning
            .iter()
            .map(|r| r.total_incorrect as u64)
            .chain(self.mastered.iter().map(|r| r.total_incorrect as u64))
            .sum();

        Stats {
            total_correct,
            total_incorrect,
            accuracy: percentage(
                total_correct as f64,
                (total_correct + total_incorrect) as f64,
            ),
            progress: self.progress(),
        }
    }

    // ==================== Lifecycle ====================

    /// Forgets all progress and starts over from the first curriculum item.
    pub fn reset(&mut self) {
        self.learning.clear();
        self.mastered.clear();
        self.card_id_counter = 0;
        self.unpresented_bootstrap = None;
        self.bootstrap();
    }

    fn bootstrap(&mut self) {
        if let Some(first) = self.curriculum.get(0) {
            self.learning
                .push(LearningRecord::new(first, self.clock.now_ms()));
            self.unpresented_bootstrap = Some(first.to_string());
        }
    }

    pub fn serialize(&self) -> Snapshot {
        Snapshot {
            learning_cards: self.learning.iter().map(SnapshotCard::from).collect(),
            mastered_cards: self.mastered.iter().map(SnapshotCard::from).collect(),
            card_id_counter: self.card_id_counter,
            stats: Some(self.stats()),
        }
    }

    /// Replaces the current state with `snapshot`.
    ///
    /// Records without an item, with an item outside the curriculum, or
    /// repeating an item already restored are dropped. When nothing survives
    /// the scheduler bootstraps as if fresh.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let now = self.clock.now_ms();
        self.learning.clear();
        self.mastered.clear();
        self.unpresented_bootstrap = None;

        let mut seen: HashSet<String> = HashSet::new();
        for card in snapshot.learning_cards {
            if let Some(item) = self.accept_restored(&card, &mut seen) {
                self.learning.push(card.into_learning(item, now));
            }
        }
        for card in snapshot.mastered_cards {
            if let Some(item) = self.accept_restored(&card, &mut seen) {
                self.mastered.push(card.into_mastered(item, now));
            }
        }
        self.card_id_counter = snapshot.card_id_counter;

        if self.learning.is_empty() && self.mastered.is_empty() {
            self.bootstrap();
        }

        debug!(
            learning = self.learning.len(),
            mastered = self.mastered.len(),
            "scheduler state restored"
        );
    }

    fn accept_restored(&self, card: &SnapshotCard, seen: &mut HashSet<String>) -> Option<String> {
        let Some(item) = card.item.as_deref() else {
            warn!("dropping restored record without an item");
            return None;
        };
        if !self.curriculum.contains(item) {
            warn!(item, "dropping restored record outside the curriculum");
            return None;
        }
        if !seen.insert(item.to_string()) {
            warn!(item, "dropping duplicate restored record");
            return None;
        }
        Some(item.to_string())
    }
}
