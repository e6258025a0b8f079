//! # DBW Executable Parameters
//!
//! This module provides parameters for the drive-by-wire executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct DbwExecParams {

    /// Rate at which the control loop ticks.
    ///
    /// Units: hertz
    pub sampling_rate_hz: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An error in the value of an executable parameter.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("Sampling rate must be a positive finite frequency, got {0} Hz")]
    InvalidSamplingRate(f64)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DbwExecParams {
    /// Check that the loaded parameters are usable.
    ///
    /// A failure here is fatal - the executable must refuse to start rather
    /// than run a control loop at a meaningless rate.
    pub fn validate(&self) -> Result<(), ParamError> {
        if !self.sampling_rate_hz.is_finite() || self.sampling_rate_hz <= 0.0 {
            return Err(ParamError::InvalidSamplingRate(self.sampling_rate_hz));
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(DbwExecParams { sampling_rate_hz: 50.0 }.validate().is_ok());
        assert!(DbwExecParams { sampling_rate_hz: 0.0 }.validate().is_err());
        assert!(DbwExecParams { sampling_rate_hz: -10.0 }.validate().is_err());
        assert!(DbwExecParams { sampling_rate_hz: f64::NAN }.validate().is_err());
        assert!(DbwExecParams { sampling_rate_hz: f64::INFINITY }.validate().is_err());
    }
}
