pub mod engine;
pub mod selection;
pub mod snapshot;

pub use engine::{ProgressiveScheduler, SchedulerBuilder};
pub use snapshot::{Snapshot, SnapshotCard};
