//! Mapping of boolean sensor signals onto the representation's enumerated values
//!
//! The classifier has no notion of "unknown": callers only invoke it when the
//! report actually carries the signal. Battery state is strictly two-valued;
//! percentage thresholds are not inferred here.

use crate::hap::{ChargingState, OccupancyDetected, StatusLowBattery};

/// Map a driver-supplied low-battery flag
pub fn low_battery_status(low: bool) -> StatusLowBattery {
    if low {
        StatusLowBattery::Low
    } else {
        StatusLowBattery::Normal
    }
}

/// Charging state for a battery with no charge-state telemetry
pub fn charging_state(chargeable: bool) -> ChargingState {
    if chargeable {
        ChargingState::NotCharging
    } else {
        ChargingState::NotChargeable
    }
}

pub fn occupancy(detected: bool) -> OccupancyDetected {
    if detected {
        OccupancyDetected::Detected
    } else {
        OccupancyDetected::NotDetected
    }
}

/// Motion is boolean in the representation, so it passes through unchanged
pub fn motion(detected: bool) -> bool {
    detected
}
