//! # Drive-By-Wire Messages
//!
//! The drive-by-wire enable signal and the actuator commands published by
//! the DBW node.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Drive-by-wire authorisation signal from the vehicle bridge.
///
/// While `enabled` is false a human driver holds authority over the vehicle
/// and no actuator command may be issued.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct DbwEnable {
    /// Time at which the signal was raised.
    pub timestamp: DateTime<Utc>,

    /// True if electronic actuation is authorised.
    pub enabled: bool
}

/// Throttle command to the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ThrottleCmd {
    /// Time at which the command was produced.
    pub timestamp: DateTime<Utc>,

    /// True to engage the throttle actuator.
    pub enable: bool,

    /// Interpretation of `value`.
    pub cmd_type: ThrottleCmdType,

    /// Throttle demand, as a fraction of full pedal travel for
    /// [`ThrottleCmdType::Percent`].
    ///
    /// Units: fraction in [0, 1]
    pub value: f64
}

/// Brake command to the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct BrakeCmd {
    /// Time at which the command was produced.
    pub timestamp: DateTime<Utc>,

    /// True to engage the brake actuator.
    pub enable: bool,

    /// Interpretation of `value_nm`.
    pub cmd_type: BrakeCmdType,

    /// Brake demand for [`BrakeCmdType::Torque`].
    ///
    /// Units: newton-meters
    pub value_nm: f64
}

/// Steering command to the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SteeringCmd {
    /// Time at which the command was produced.
    pub timestamp: DateTime<Utc>,

    /// True to engage the steering actuator.
    pub enable: bool,

    /// Demanded steering wheel angle.
    ///
    /// Units: radians
    pub angle_rad: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Throttle command interpretations supported by the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleCmdType {
    /// `value` is a fraction of full pedal travel.
    Percent
}

/// Brake command interpretations supported by the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrakeCmdType {
    /// `value_nm` is a torque at the wheels.
    Torque
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DbwEnable {
    /// Create a new signal stamped with the current time.
    pub fn new(enabled: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            enabled
        }
    }
}

impl ThrottleCmd {
    /// Create an enabled percent-type throttle command stamped with the
    /// current time.
    pub fn new_percent(value: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            enable: true,
            cmd_type: ThrottleCmdType::Percent,
            value
        }
    }
}

impl BrakeCmd {
    /// Create an enabled torque-type brake command stamped with the current
    /// time.
    pub fn new_torque(value_nm: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            enable: true,
            cmd_type: BrakeCmdType::Torque,
            value_nm
        }
    }
}

impl SteeringCmd {
    /// Create an enabled steering command stamped with the current time.
    pub fn new(angle_rad: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            enable: true,
            angle_rad
        }
    }
}
