//! # Twist Messages
//!
//! Velocity demands and reports exchanged with the rest of the vehicle
//! software.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Velocity demand produced by the waypoint follower.
///
/// Only the planar components meaningful to the vehicle are carried: the
/// longitudinal linear velocity and the yaw rate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct TwistDemand {
    /// Time at which the demand was produced.
    pub timestamp: DateTime<Utc>,

    /// Demanded linear velocity along the vehicle's longitudinal axis.
    ///
    /// Units: meters/second
    pub linear_ms: f64,

    /// Demanded angular velocity about the vehicle's vertical axis.
    ///
    /// Units: radians/second
    pub angular_rads: f64
}

/// Measured vehicle velocity from the vehicle bridge.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct VelocityReport {
    /// Time at which the measurement was taken.
    pub timestamp: DateTime<Utc>,

    /// Measured linear velocity along the vehicle's longitudinal axis.
    ///
    /// Units: meters/second
    pub linear_ms: f64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TwistDemand {
    /// Create a new demand stamped with the current time.
    pub fn new(linear_ms: f64, angular_rads: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            linear_ms,
            angular_rads
        }
    }
}

impl VelocityReport {
    /// Create a new report stamped with the current time.
    pub fn new(linear_ms: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            linear_ms
        }
    }
}
