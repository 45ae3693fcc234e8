//! Workflow adapters: the user-supplied transition function of a runtime.
//!
//! A workflow maps `(activity, state)` to a new state. It must be
//! deterministic with respect to its inputs; side effects go through the
//! adapter (see [`MachineWorkflow`]) and never hide inside state updates.
//!
//! Two shapes are provided:
//! - function-shaped: [`FnWorkflow`] wraps a plain closure, and
//!   [`MergeWorkflow`] is the default shape that folds STATE_CHANGE payloads
//!   into the state;
//! - machine-shaped: [`MachineWorkflow`] drives a [`Machine`] that advances a
//!   configuration and emits send effects executed through an
//!   [`ActivityRouter`].

pub mod context;
pub mod error;
pub mod function;
pub mod machine;
pub mod traits;

pub use context::WorkflowContext;
pub use error::WorkflowError;
pub use function::{FnWorkflow, MergeWorkflow};
pub use machine::{ActivityRouter, Effect, Machine, MachineWorkflow, Transition};
pub use traits::Workflow;
