//! # Enable Gate
//!
//! Tracks the drive-by-wire authorisation state and detects loss-of-authority
//! transitions.
//!
//! The gate starts DISABLED - the fail-safe assumption is that a human
//! driver holds authority until the vehicle says otherwise. When the signal
//! falls from enabled to disabled the gate latches a pending controller
//! reset, which the control loop consumes before its next control call. This
//! keeps the reset edge-triggered (repeated identical signals cause no
//! transitions and no reset storms) and keeps the asynchronous signal
//! callback away from loop-owned controller state: the callback only ever
//! calls [`EnableGate::update`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Drive-by-wire authorisation state.
#[derive(Debug)]
pub struct EnableGate {
    enabled: bool,

    /// Latched on an enabled->disabled transition, cleared when sampled.
    reset_required: bool,
}

/// The gate state as seen by one control loop tick.
#[derive(Debug, Clone, Copy)]
pub struct GateSample {
    /// True if electronic actuation is currently authorised.
    pub enabled: bool,

    /// True if authority was lost since the last sample. The consumer must
    /// reset the controller before its next control call.
    pub reset_required: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EnableGate {
    /// Create a new gate in the DISABLED state.
    pub fn new() -> Self {
        Self {
            enabled: false,
            reset_required: false
        }
    }

    /// Process a new value of the external enable signal.
    ///
    /// Repeated signals of the same value produce no transition.
    pub fn update(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }

        info!("Drive-by-wire {}", if enabled { "enabled" } else { "disabled" });

        // Loss of authority latches a controller reset
        if self.enabled && !enabled {
            self.reset_required = true;
        }

        self.enabled = enabled;
    }

    /// Read the gate state for one tick, consuming any pending reset.
    pub fn sample(&mut self) -> GateSample {
        let sample = GateSample {
            enabled: self.enabled,
            reset_required: self.reset_required
        };

        self.reset_required = false;

        sample
    }
}

impl Default for EnableGate {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disabled() {
        let mut gate = EnableGate::new();

        let sample = gate.sample();
        assert!(!sample.enabled);
        assert!(!sample.reset_required);
    }

    #[test]
    fn test_enable_does_not_require_reset() {
        let mut gate = EnableGate::new();

        gate.update(true);

        let sample = gate.sample();
        assert!(sample.enabled);
        assert!(!sample.reset_required);
    }

    #[test]
    fn test_disable_requires_reset_once() {
        let mut gate = EnableGate::new();

        gate.update(true);
        gate.update(false);

        let sample = gate.sample();
        assert!(!sample.enabled);
        assert!(sample.reset_required);

        // The pending reset is consumed by the sample
        let sample = gate.sample();
        assert!(!sample.reset_required);
    }

    #[test]
    fn test_repeated_signals_are_not_transitions() {
        let mut gate = EnableGate::new();

        // Repeated false from the initial state
        gate.update(false);
        gate.update(false);
        assert!(!gate.sample().reset_required);

        // Repeated true
        gate.update(true);
        gate.update(true);
        let sample = gate.sample();
        assert!(sample.enabled);
        assert!(!sample.reset_required);

        // One falling edge followed by repeats latches exactly one reset
        gate.update(false);
        gate.update(false);
        gate.update(false);
        assert!(gate.sample().reset_required);
        assert!(!gate.sample().reset_required);
    }

    #[test]
    fn test_fast_disable_enable_between_samples() {
        let mut gate = EnableGate::new();

        gate.update(true);
        gate.sample();

        // Both edges land between two ticks: the next sample must still
        // carry the reset along with the re-enabled state
        gate.update(false);
        gate.update(true);

        let sample = gate.sample();
        assert!(sample.enabled);
        assert!(sample.reset_required);
    }
}
