//! Parameters structure for TwistCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::TwistCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the twist controller.
#[derive(Debug, Default, Deserialize)]
pub struct Params {

    // ---- VEHICLE ----

    /// Mass of the vehicle excluding fuel.
    ///
    /// Units: kilograms
    pub vehicle_mass_kg: f64,

    /// Capacity of the fuel tank, assumed full for mass purposes.
    ///
    /// Units: liters
    pub fuel_capacity_l: f64,

    /// The radius of the vehicle's wheels.
    ///
    /// Units: meters
    pub wheel_radius_m: f64,

    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Ratio between steering wheel angle and front wheel angle.
    pub steer_ratio: f64,

    // ---- CAPABILITIES ----

    /// Most negative acceleration the controller may demand.
    ///
    /// Units: meters/second^2 (negative)
    pub decel_limit_mss: f64,

    /// Most positive acceleration the controller may demand.
    ///
    /// Units: meters/second^2
    pub accel_limit_mss: f64,

    /// Decelerations smaller than this are satisfied by engine braking
    /// alone, with no brake torque commanded.
    ///
    /// Units: meters/second^2
    pub brake_deadband_mss: f64,

    /// Maximum lateral acceleration permitted when steering.
    ///
    /// Units: meters/second^2
    pub max_lat_accel_mss: f64,

    /// Maximum steering wheel angle (either side of centre).
    ///
    /// Units: radians
    pub max_steer_angle_rad: f64,

    /// Lowest speed used when converting a yaw rate into a turn radius,
    /// preventing degenerate radii at a standstill.
    ///
    /// Units: meters/second
    pub min_speed_ms: f64,

    // ---- VELOCITY PID ----

    /// Proportional gain of the velocity PID.
    pub vel_kp: f64,

    /// Integral gain of the velocity PID.
    pub vel_ki: f64,

    /// Derivative gain of the velocity PID.
    pub vel_kd: f64,

    /// Time constant of the low-pass filter applied to the measured
    /// velocity.
    ///
    /// Units: seconds
    pub lpf_tau_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check that the loaded parameters describe a physically plausible
    /// vehicle.
    ///
    /// A failure here is fatal at startup.
    pub fn validate(&self) -> Result<(), TwistCtrlError> {
        let positive = [
            ("vehicle_mass_kg", self.vehicle_mass_kg),
            ("wheel_radius_m", self.wheel_radius_m),
            ("wheel_base_m", self.wheel_base_m),
            ("steer_ratio", self.steer_ratio),
            ("accel_limit_mss", self.accel_limit_mss),
            ("max_lat_accel_mss", self.max_lat_accel_mss),
            ("max_steer_angle_rad", self.max_steer_angle_rad),
        ];

        for (name, value) in positive.iter() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(TwistCtrlError::InvalidParam(format!(
                    "{} must be positive, got {}", name, value
                )));
            }
        }

        let non_negative = [
            ("fuel_capacity_l", self.fuel_capacity_l),
            ("brake_deadband_mss", self.brake_deadband_mss),
            ("min_speed_ms", self.min_speed_ms),
            ("vel_kp", self.vel_kp),
            ("vel_ki", self.vel_ki),
            ("vel_kd", self.vel_kd),
            ("lpf_tau_s", self.lpf_tau_s),
        ];

        for (name, value) in non_negative.iter() {
            if !value.is_finite() || *value < 0.0 {
                return Err(TwistCtrlError::InvalidParam(format!(
                    "{} must be non-negative, got {}", name, value
                )));
            }
        }

        if !self.decel_limit_mss.is_finite() || self.decel_limit_mss >= 0.0 {
            return Err(TwistCtrlError::InvalidParam(format!(
                "decel_limit_mss must be negative, got {}", self.decel_limit_mss
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
impl Params {
    /// Parameters matching the vehicle's launch configuration, for use in
    /// tests across the crate.
    pub(crate) fn test_default() -> Self {
        Self {
            vehicle_mass_kg: 1736.35,
            fuel_capacity_l: 13.5,
            wheel_radius_m: 0.2413,
            wheel_base_m: 2.8498,
            steer_ratio: 14.8,
            decel_limit_mss: -5.0,
            accel_limit_mss: 1.0,
            brake_deadband_mss: 0.1,
            max_lat_accel_mss: 3.0,
            max_steer_angle_rad: 8.0,
            min_speed_ms: 0.1,
            vel_kp: 0.8,
            vel_ki: 0.1,
            vel_kd: 0.0,
            lpf_tau_s: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_params_accepted() {
        assert!(Params::test_default().validate().is_ok());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = Params::test_default();
        params.vehicle_mass_kg = 0.0;
        assert!(params.validate().is_err());

        let mut params = Params::test_default();
        params.decel_limit_mss = 5.0;
        assert!(params.validate().is_err());

        let mut params = Params::test_default();
        params.wheel_radius_m = f64::NAN;
        assert!(params.validate().is_err());

        let mut params = Params::test_default();
        params.vel_ki = -0.1;
        assert!(params.validate().is_err());
    }
}
