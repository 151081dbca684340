//! Library half of the `dealwatch` binary, split out so integration tests
//! can drive the runner with a fake notifier.

pub mod commands;
pub mod runner;

pub use commands::{build_context, RunOptions};
pub use runner::{run_batch, run_target, Delivery, RunContext, TargetOutcome, TargetReport};
