//! Transfer engine
//!
//! Applies a diff in one direction with bounded concurrency, per-file retry
//! and cooperative cancellation.

pub mod cancel;
pub mod engine;
pub mod report;
pub mod retry;

pub use cancel::CancelFlag;
pub use engine::{EngineConfig, TransferEngine, TransferTarget};
pub use report::{FailedTransfer, PlannedTransfer, TransferPlan, TransferReport};
pub use retry::{RetryFailure, RetryPolicy};
