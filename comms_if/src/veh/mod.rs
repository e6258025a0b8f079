//! # Vehicle Messages
//!
//! Definitions of the messages exchanged with the vehicle bridge and the
//! upstream waypoint follower, along with the topics they are published
//! under.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod dbw;
mod twist;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use dbw::*;
pub use twist::*;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Topic carrying the drive-by-wire enable signal.
pub const TOPIC_DBW_ENABLE: &str = "dbw_enable";

/// Topic carrying the demanded twist from the waypoint follower.
pub const TOPIC_TWIST_DEMAND: &str = "twist_demand";

/// Topic carrying the measured vehicle velocity.
pub const TOPIC_VELOCITY_REPORT: &str = "velocity_report";

/// Topic carrying throttle commands to the vehicle.
pub const TOPIC_THROTTLE_CMD: &str = "throttle_cmd";

/// Topic carrying brake commands to the vehicle.
pub const TOPIC_BRAKE_CMD: &str = "brake_cmd";

/// Topic carrying steering commands to the vehicle.
pub const TOPIC_STEERING_CMD: &str = "steering_cmd";
