//! # Velocity Store
//!
//! Holds the most recent velocity demand and velocity measurement recieved
//! by the node. Both are unknown until first observed, and the control loop
//! must not act until both have been seen - absence of data is a first-class
//! result here, not an error.
//!
//! The store is shared between the input listener threads and the control
//! loop behind a mutex; every operation copies a handful of floats so the
//! lock is only ever held for a negligible duration.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A demanded velocity pair.
///
/// The linear and angular components always come from the same demand
/// message - the pair is overwritten atomically on update and read back
/// atomically by [`VelocityStore::snapshot`], so a torn pairing across two
/// updates cannot be observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityTarget {
    /// Demanded linear velocity.
    ///
    /// Units: meters/second
    pub linear_ms: f64,

    /// Demanded angular velocity.
    ///
    /// Units: radians/second
    pub angular_rads: f64
}

/// A consistent reading of all velocity inputs, returned once both have
/// been observed.
#[derive(Debug, Clone, Copy)]
pub struct VelocitySnapshot {
    /// The most recent velocity demand.
    pub target: VelocityTarget,

    /// The most recent measured linear velocity.
    ///
    /// Units: meters/second
    pub current_ms: f64
}

/// Latest demanded and measured velocities, each `None` until first
/// observed.
#[derive(Debug, Default)]
pub struct VelocityStore {
    target: Option<VelocityTarget>,

    current_ms: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VelocityStore {
    /// Create a new store with both inputs unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new velocity demand, replacing any previous one.
    pub fn update_target(&mut self, linear_ms: f64, angular_rads: f64) {
        // Diagnostic only: note when the angular demand changes between
        // consecutive updates. The comparison is exact - this feeds a debug
        // line, nothing else.
        if let Some(prev) = self.target {
            if angular_rads != prev.angular_rads {
                debug!(
                    "New angular velocity demand: {} rad/s (was {} rad/s)",
                    angular_rads, prev.angular_rads
                );
            }
        }

        self.target = Some(VelocityTarget {
            linear_ms,
            angular_rads
        });
    }

    /// Record a new velocity measurement, replacing any previous one.
    pub fn update_current(&mut self, linear_ms: f64) {
        self.current_ms = Some(linear_ms);
    }

    /// Get a consistent reading of all inputs.
    ///
    /// Returns `None` until both the demand and the measurement have been
    /// observed at least once since process start.
    pub fn snapshot(&self) -> Option<VelocitySnapshot> {
        match (self.target, self.current_ms) {
            (Some(target), Some(current_ms)) => Some(VelocitySnapshot {
                target,
                current_ms
            }),
            _ => None
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
