//! Zero-cost monitor that discards every event.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::events::RuntimeEvent;
use super::traits::Monitor;

/// Monitor that drops all events. The default when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl Monitor for NoopMonitor {
    fn record(&self, _event: RuntimeEvent) {}
}
