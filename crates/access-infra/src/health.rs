//! Minimal health reporting: a node is healthy iff its trip switch has not
//! actuated.

use std::sync::Arc;

use crate::trip_switch::TripSwitch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Tripped,
}

pub struct HealthCheck {
    trip_switch: Arc<TripSwitch>,
}

impl HealthCheck {
    pub fn new(trip_switch: Arc<TripSwitch>) -> Self {
        Self { trip_switch }
    }

    pub fn state(&self) -> HealthState {
        if self.trip_switch.is_tripped() {
            HealthState::Tripped
        } else {
            HealthState::Healthy
        }
    }
}
