//! Twist controller module
//!
//! Converts the demanded twist (linear and angular velocity) and the
//! measured vehicle velocity into throttle, brake and steering demands. The
//! longitudinal law is a PID on the velocity error with braking torque
//! derived from the demanded deceleration; the lateral law is bicycle-model
//! steering geometry.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod lowpass;
mod params;
mod pid;
mod state;
mod yaw_calc;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use lowpass::*;
pub use params::*;
pub use pid::*;
pub use state::*;
pub use yaw_calc::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Density of petrol, used to fold the fuel load into the vehicle mass.
///
/// Units: kilograms/liter
pub const FUEL_DENSITY_KG_PER_L: f64 = 0.755;

/// Brake torque applied to hold the vehicle at a standstill against the
/// automatic transmission's creep.
///
/// Units: newton-meters
pub const HOLD_BRAKE_TORQUE_NM: f64 = 700.0;

/// Speed below which the vehicle is considered to be at a standstill.
///
/// Units: meters/second
pub const STANDSTILL_SPEED_MS: f64 = 0.1;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TwistCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TwistCtrlError {
    #[error("Failed to load the parameter file: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("The module has not been initialised")]
    NotInitialised,
}
