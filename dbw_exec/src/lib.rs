//! # DBW node library.
//!
//! This library allows tests and benches to access items defined inside the
//! drive-by-wire executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator command server - publishes throttle, brake and steering commands
pub mod act_server;

/// Control loop - the fixed-cadence driver tying the node together
pub mod control_loop;

/// Controller interface - the narrow seam between the loop and the control law
pub mod controller;

/// Enable gate - drive-by-wire authorisation state and reset discipline
pub mod enable_gate;

/// Input client - listener threads feeding the gate and velocity store
pub mod input_client;

/// Executable parameters
pub mod params;

/// Twist controller module - converts velocity demands into actuator demands
pub mod twist_ctrl;

/// Velocity store - latest demanded and measured velocities
pub mod velocity_store;
