//! One-way mirroring: tree comparison, change logging and reconciliation.

pub mod compare;
pub mod engine;
pub mod exclude;
pub mod journal;

pub use compare::{ChangeEvent, ChangeKind, Changes, TreeComparator};
pub use engine::{CycleState, ReconcileOutcome, Reconciler};
pub use exclude::ExcludePatterns;
pub use journal::{Level, SyncLog};
