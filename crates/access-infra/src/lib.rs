//! Process-level containment and the RPC error boundary: the trip switch
//! and the error-to-status converter.

pub mod health;
pub mod status;
pub mod trip_switch;

pub use health::{HealthCheck, HealthState};
pub use status::{DomainFailure, ErrorHandlingConfig, ErrorToStatusConverter, StatusCode, WireStatus};
pub use trip_switch::{InterceptMode, TripSwitch, TripSwitchActuated};
