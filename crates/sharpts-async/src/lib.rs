//! Await-point analysis (C3) and state-machine construction (C4).
//!
//! These two components feed the MoveNext emitter (C5, in
//! `sharpts-emitter`): the analyzer decides *which* variables must be
//! hoisted and *where* the suspension points are, the builder turns that
//! analysis into a concrete field layout the emitter can address.
//!
//! Per SPEC_FULL.md §C, a "suspension" is not only `await` — a plain
//! generator function suspends at `yield`, and an `async function*`
//! suspends at both. `SuspensionKind` is what lets the same hoisting and
//! segmented-try machinery serve all three without a parallel pipeline.

pub mod analyzer;
pub mod state_machine;
pub mod suspension;

pub use analyzer::{AsyncAnalysis, AwaitPointAnalyzer, CompileError};
pub use state_machine::{FieldHandle, StateMachineBuilder, StateMachineShape};
pub use suspension::{SuspensionKind, SuspensionPoint};
