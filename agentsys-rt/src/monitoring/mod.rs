//! Pluggable observation hooks for runtime lifecycle events.
//!
//! The registry and processing loop report [`RuntimeEvent`]s through a
//! [`Monitor`]. Recording must be cheap and non-blocking: the loop calls it
//! inline between activities. [`NoopMonitor`] is the zero-cost default;
//! [`InMemoryMonitor`] keeps a bounded history for tests and introspection.
//! Anything heavier (log shipping, audit sinks) belongs behind a custom
//! `Monitor` implementation that hands events off asynchronously.

pub mod events;
pub mod in_memory;
pub mod noop;
pub mod traits;

pub use events::{EventSeverity, RuntimeEvent, RuntimeEventKind};
pub use in_memory::InMemoryMonitor;
pub use noop::NoopMonitor;
pub use traits::Monitor;
