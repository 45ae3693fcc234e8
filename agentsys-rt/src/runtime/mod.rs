//! Runtime state machine, state cell and processing loop.
//!
//! Each agent runtime owns one [`StateCell`] and one long-running processing
//! loop task. The loop is the only writer of the cell; everything else reads
//! consistent snapshots.

pub mod cell;
pub mod processor;
pub mod state;

pub use cell::StateCell;
pub use state::{AgentState, AgentStatus, ProcessingStats};
