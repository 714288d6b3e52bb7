pub mod types;

pub use types::{EventAction, EventFamily, EventPayload, TemporalEvent};
