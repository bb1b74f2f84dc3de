//! # danci-drill
//!
//! Adaptive drill scheduling over a fixed, ordered curriculum (musical notes
//! by default, but any list of unique item identifiers works).
//!
//! - [`scheduler`] - the policy engine: progressive introduction, streak-based
//!   mastery, review interleaving and demotion, plus the snapshot format
//! - [`curriculum`] - ordered item lists and the note-range builder
//! - [`store`] - persistence port and the in-memory / JSON-file stores
//! - [`session`] - one learner's scheduler with debounced saving
//! - [`registry`] - sessions keyed by learner identity
//!
//! ```rust
//! use danci_drill::{Curriculum, ProgressiveScheduler};
//!
//! let mut scheduler = ProgressiveScheduler::builder(Curriculum::guitar())
//!     .seed(7)
//!     .build();
//! let card = scheduler.next_card().unwrap();
//! assert_eq!(card.item, "E2");
//! scheduler.mark_correct(&card.item);
//! ```

pub mod clock;
pub mod config;
pub mod curriculum;
pub mod logging;
pub mod random;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, LoggingConfig, PersistenceConfig, SchedulerConfig};
pub use curriculum::{Curriculum, CurriculumError};
pub use random::{FixedRandom, RandomSource, SeededRandom};
pub use registry::{SchedulerFactory, SessionRegistry};
pub use scheduler::{ProgressiveScheduler, SchedulerBuilder, Snapshot, SnapshotCard};
pub use session::DrillSession;
pub use store::{JsonFileStore, MemoryStore, ProgressStore, StoreError, StoreResult};
pub use types::*;
