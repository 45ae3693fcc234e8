//! Activity envelope and classification types.
//!
//! An [`Activity`] is the immutable message unit consumed by agent runtimes:
//! an opaque JSON payload wrapped in an envelope carrying identity, ordering
//! and routing metadata. Payload interpretation belongs entirely to the
//! workflow; the runtime only inspects the envelope.

pub mod envelope;
pub mod types;

pub use envelope::{Activity, ActivityMetadata};
pub use types::{ActivityType, Priority};
