//! A learner's live scheduler plus its debounced persistence.
//!
//! Every answer schedules a save `save_debounce` in the future. A newer
//! mutation supersedes any save still waiting, so a burst of answers results in
//! a single write of the latest state. Saves run one at a time, in order.
//! The in-memory scheduler is the source of truth: a failed save is logged and
//! nothing else happens.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::scheduler::{ProgressiveScheduler, SchedulerBuilder, Snapshot};
use crate::store::{ProgressStore, StoreResult};
use crate::types::{Card, Progress, Stats};

pub struct DrillSession {
    identity: String,
    engine: Arc<Mutex<ProgressiveScheduler>>,
    store: Arc<dyn ProgressStore>,
    save_debounce: Duration,
    /// Bumped on every scheduled save; a waiting save only runs if it still
    /// holds the latest generation.
    generation: Arc<AtomicU64>,
    save_lock: Arc<tokio::sync::Mutex<()>>,
    saving: Arc<AtomicBool>,
    discarded: AtomicBool,
    /// Runtime the session was opened on. Debounced saves are spawned here
    /// when an answer arrives from a thread outside any runtime.
    runtime: Option<Handle>,
}

impl DrillSession {
    /// Loads the identity's snapshot and builds the scheduler from it.
    ///
    /// Load errors are returned; no scheduler is created over storage that
    /// could not be read, so a later save cannot clobber it.
    pub async fn open(
        identity: impl Into<String>,
        store: Arc<dyn ProgressStore>,
        builder: SchedulerBuilder,
        save_debounce: Duration,
    ) -> StoreResult<Self> {
        let identity = identity.into();
        let snapshot = store.load(&identity).await?;
        let restored = snapshot.as_ref().is_some_and(|s| !s.is_empty());
        let engine = builder.snapshot(snapshot).build();

        info!(
            identity = %identity,
            restored,
            learning = engine.learning().len(),
            mastered = engine.mastered().len(),
            "drill session opened"
        );

        Ok(Self {
            identity,
            engine: Arc::new(Mutex::new(engine)),
            store,
            save_debounce,
            generation: Arc::new(AtomicU64::new(0)),
            save_lock: Arc::new(tokio::sync::Mutex::new(())),
            saving: Arc::new(AtomicBool::new(false)),
            discarded: AtomicBool::new(false),
            runtime: Handle::try_current().ok(),
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Relaxed)
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded.load(Ordering::Relaxed)
    }

    pub fn next_card(&self) -> Option<Card> {
        let (card, introduced) = {
            let mut engine = self.engine.lock();
            let before = engine.introduced_count();
            let card = engine.next_card();
            (card, engine.introduced_count() != before)
        };
        if introduced {
            self.schedule_save();
        }
        card
    }

    pub fn initial_stack(&self, size: usize) -> Vec<Card> {
        let stack = self.engine.lock().initial_stack(size);
        self.schedule_save();
        stack
    }

    pub fn mark_correct(&self, item: &str) {
        self.engine.lock().mark_correct(item);
        self.schedule_save();
    }

    pub fn mark_incorrect(&self, item: &str) {
        self.engine.lock().mark_incorrect(item);
        self.schedule_save();
    }

    pub fn progress(&self) -> Progress {
        self.engine.lock().progress()
    }

    pub fn stats(&self) -> Stats {
        self.engine.lock().stats()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.lock().serialize()
    }

    /// Starts over: cancels any waiting save, resets the scheduler and clears
    /// the stored snapshot.
    pub async fn reset(&self) -> StoreResult<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.engine.lock().reset();

        let _guard = self.save_lock.lock().await;
        self.store.clear(&self.identity).await?;
        info!(identity = %self.identity, "drill progress reset");
        Ok(())
    }

    /// Saves the current state now, superseding any waiting save.
    pub async fn flush(&self) -> StoreResult<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let _guard = self.save_lock.lock().await;
        let snapshot = self.engine.lock().serialize();
        self.saving.store(true, Ordering::Relaxed);
        let result = self.store.save(&self.identity, &snapshot).await;
        self.saving.store(false, Ordering::Relaxed);
        result
    }

    /// Drops any waiting save and stops scheduling new ones. Used when the
    /// active identity changes; unsaved answers from the last debounce window
    /// are lost.
    pub fn discard(&self) {
        if !self.discarded.swap(true, Ordering::SeqCst) {
            self.generation.fetch_add(1, Ordering::SeqCst);
            debug!(identity = %self.identity, "drill session discarded");
        }
    }

    fn schedule_save(&self) {
        if self.is_discarded() {
            return;
        }
        let Some(runtime) = Handle::try_current().ok().or_else(|| self.runtime.clone()) else {
            warn!(identity = %self.identity, "no tokio runtime, debounced save skipped");
            return;
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let engine = Arc::clone(&self.engine);
        let store = Arc::clone(&self.store);
        let save_lock = Arc::clone(&self.save_lock);
        let saving = Arc::clone(&self.saving);
        let identity = self.identity.clone();
        let delay = self.save_debounce;

        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }

            let _guard = save_lock.lock().await;
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }

            let snapshot = engine.lock().serialize();
            saving.store(true, Ordering::Relaxed);
            let result = store.save(&identity, &snapshot).await;
            saving.store(false, Ordering::Relaxed);

            match result {
                Ok(()) => debug!(identity = %identity, "debounced save complete"),
                Err(err) => warn!(identity = %identity, error = %err, "debounced save failed"),
            }
        });
    }
}

impl Drop for DrillSession {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
