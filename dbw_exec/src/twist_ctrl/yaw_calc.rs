//! Bicycle-model steering geometry

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Converts a demanded yaw rate into a steering wheel angle using the
/// bicycle model of the vehicle.
#[derive(Debug, Default, Clone, Copy)]
pub struct YawCalc {
    wheel_base_m: f64,
    steer_ratio: f64,
    min_speed_ms: f64,
    max_lat_accel_mss: f64,
    max_steer_angle_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl YawCalc {
    /// Create a new calculator for the given vehicle geometry.
    pub fn new(
        wheel_base_m: f64,
        steer_ratio: f64,
        min_speed_ms: f64,
        max_lat_accel_mss: f64,
        max_steer_angle_rad: f64
    ) -> Self {
        Self {
            wheel_base_m,
            steer_ratio,
            min_speed_ms,
            max_lat_accel_mss,
            max_steer_angle_rad,
        }
    }

    /// Compute the steering wheel angle for the demanded twist at the
    /// current speed.
    ///
    /// The demanded yaw rate is rescaled to the current speed so the turn
    /// radius of the demand is preserved, then clamped so the resulting
    /// lateral acceleration stays within the vehicle's limit.
    pub fn steering(
        &self,
        target_linear_ms: f64,
        target_angular_rads: f64,
        current_linear_ms: f64
    ) -> f64 {
        // Rescale the yaw rate to the speed actually being driven
        let yaw_rate = if target_linear_ms.abs() > 0.0 {
            current_linear_ms * target_angular_rads / target_linear_ms
        } else {
            0.0
        };

        // Clamp to the lateral acceleration limit, a_lat = v * yaw_rate
        let yaw_rate = if current_linear_ms.abs() > 0.1 {
            let max_yaw_rate = (self.max_lat_accel_mss / current_linear_ms).abs();
            yaw_rate.max(-max_yaw_rate).min(max_yaw_rate)
        } else {
            yaw_rate
        };

        if yaw_rate.abs() > 0.0 {
            let radius_m = current_linear_ms.max(self.min_speed_ms) / yaw_rate;
            self.wheel_angle_for_radius(radius_m)
        } else {
            0.0
        }
    }

    /// Steering wheel angle which produces the given turn radius.
    fn wheel_angle_for_radius(&self, radius_m: f64) -> f64 {
        let angle = (self.wheel_base_m / radius_m).atan() * self.steer_ratio;

        angle
            .max(-self.max_steer_angle_rad)
            .min(self.max_steer_angle_rad)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
