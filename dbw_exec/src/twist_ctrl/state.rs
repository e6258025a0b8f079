//! Implementations for the TwistCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{
    LowPass, Params, Pid, YawCalc,
    FUEL_DENSITY_KG_PER_L, HOLD_BRAKE_TORQUE_NM, STANDSTILL_SPEED_MS,
    TwistCtrlError
};
use crate::controller::{ActuatorDems, Controller};
use util::{
    module::State,
    params,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Twist controller module state
#[derive(Debug, Default)]
pub struct TwistCtrl {

    pub(crate) params: Params,

    /// Period of one control tick, zero until initialised.
    sample_period_s: f64,

    /// Mass of the vehicle including a full fuel load.
    total_mass_kg: f64,

    vel_pid: Pid,
    lpf_vel: LowPass,
    yaw_calc: YawCalc,

    pub(crate) report: StatusReport,
}

/// Data required to initialise TwistCtrl.
pub struct InitData {
    /// Path to the parameter file, relative to the params directory.
    pub param_file: &'static str,

    /// Rate of the control loop which will drive this module.
    ///
    /// Units: hertz
    pub sampling_rate_hz: f64
}

/// Input data for one tick of TwistCtrl processing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlInput {
    /// Demanded linear velocity [m/s].
    pub target_linear_ms: f64,

    /// Demanded angular velocity [rad/s].
    pub target_angular_rads: f64,

    /// Measured linear velocity [m/s].
    pub current_linear_ms: f64
}

/// Status report for TwistCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// The demanded acceleration hit one of the configured limits.
    pub accel_limited: bool,

    /// Brake torque was commanded this tick.
    pub braking: bool,

    /// The standstill hold torque was applied this tick.
    pub standstill_hold: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TwistCtrl {
    type InitData = InitData;
    type InitError = TwistCtrlError;

    type InputData = ControlInput;
    type OutputData = ActuatorDems;
    type StatusReport = StatusReport;
    type ProcError = TwistCtrlError;

    /// Initialise the TwistCtrl module.
    ///
    /// Loads and validates the vehicle parameters and builds the internal
    /// controllers from them.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = match params::load(init_data.param_file) {
            Ok(p) => p,
            Err(e) => return Err(TwistCtrlError::ParamLoadError(e))
        };

        self.configure(init_data.sampling_rate_hz)
    }

    /// Perform cyclic processing of the twist controller.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        if self.sample_period_s <= 0.0 {
            return Err(TwistCtrlError::NotInitialised);
        }

        let dems = self.control(
            input_data.target_linear_ms,
            input_data.target_angular_rads,
            input_data.current_linear_ms
        );

        Ok((dems, self.report))
    }
}

impl Controller for TwistCtrl {
    fn control(
        &mut self,
        target_linear_ms: f64,
        target_angular_rads: f64,
        current_linear_ms: f64
    ) -> ActuatorDems {
        // Clear the status report
        self.report = StatusReport::default();

        // Smooth the measured velocity before using it
        let current_ms = self.lpf_vel.filt(current_linear_ms);

        // Lateral: steering from the bicycle model
        let steer_angle_rad = self.yaw_calc.steering(
            target_linear_ms,
            target_angular_rads,
            current_ms
        );

        // Longitudinal: PID on the velocity error gives an acceleration
        // demand within [decel_limit, accel_limit]
        let vel_error_ms = target_linear_ms - current_ms;
        let accel_mss = self.vel_pid.step(vel_error_ms, self.sample_period_s);

        if accel_mss >= self.params.accel_limit_mss || accel_mss <= self.params.decel_limit_mss {
            self.report.accel_limited = true;
        }

        let throttle_percent;
        let brake_torque_nm;

        if target_linear_ms.abs() < STANDSTILL_SPEED_MS
            && current_ms.abs() < STANDSTILL_SPEED_MS
        {
            // Hold the vehicle against transmission creep when stopped
            throttle_percent = 0.0;
            brake_torque_nm = HOLD_BRAKE_TORQUE_NM;
            self.report.standstill_hold = true;
        }
        else if accel_mss > 0.0 {
            throttle_percent = accel_mss / self.params.accel_limit_mss;
            brake_torque_nm = 0.0;
        }
        else {
            throttle_percent = 0.0;

            let decel_mss = -accel_mss;
            if decel_mss < self.params.brake_deadband_mss {
                // Engine braking covers this, no torque commanded
                brake_torque_nm = 0.0;
            }
            else {
                brake_torque_nm =
                    decel_mss * self.total_mass_kg * self.params.wheel_radius_m;
                self.report.braking = true;
            }
        }

        ActuatorDems {
            throttle_percent,
            brake_torque_nm,
            steer_angle_rad
        }
    }

    fn reset(&mut self) {
        self.vel_pid.reset();
        self.lpf_vel.reset();
    }
}

impl TwistCtrl {
    /// Create a controller directly from in-memory parameters.
    ///
    /// The executable initialises from the parameter file instead (see the
    /// `State` impl); this constructor serves tests and benches.
    pub fn with_params(params: Params, sampling_rate_hz: f64) -> Result<Self, TwistCtrlError> {
        let mut ctrl = Self::default();
        ctrl.params = params;
        ctrl.configure(sampling_rate_hz)?;

        Ok(ctrl)
    }

    /// Build the internal controllers from the loaded parameters.
    pub(crate) fn configure(&mut self, sampling_rate_hz: f64) -> Result<(), TwistCtrlError> {
        self.params.validate()?;

        if !sampling_rate_hz.is_finite() || sampling_rate_hz <= 0.0 {
            return Err(TwistCtrlError::InvalidParam(format!(
                "sampling_rate_hz must be positive, got {}", sampling_rate_hz
            )));
        }

        self.sample_period_s = 1.0 / sampling_rate_hz;
        self.total_mass_kg = self.params.vehicle_mass_kg
            + self.params.fuel_capacity_l * FUEL_DENSITY_KG_PER_L;

        self.vel_pid = Pid::new(
            self.params.vel_kp,
            self.params.vel_ki,
            self.params.vel_kd,
            self.params.decel_limit_mss,
            self.params.accel_limit_mss
        );
        self.lpf_vel = LowPass::new(self.params.lpf_tau_s, self.sample_period_s);
        self.yaw_calc = YawCalc::new(
            self.params.wheel_base_m,
            self.params.steer_ratio,
            self.params.min_speed_ms,
            self.params.max_lat_accel_mss,
            self.params.max_steer_angle_rad
        );

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ctrl() -> TwistCtrl {
        TwistCtrl::with_params(Params::test_default(), 50.0).unwrap()
    }

    #[test]
    fn test_proc_before_init_fails() {
        let mut ctrl = TwistCtrl::default();

        let result = ctrl.proc(&ControlInput::default());
        assert!(matches!(result, Err(TwistCtrlError::NotInitialised)));
    }

    #[test]
    fn test_accelerates_towards_target() {
        let mut ctrl = test_ctrl();

        // Well below the demanded speed: throttle on, brakes off
        let dems = ctrl.control(10.0, 0.0, 2.0);
        assert!(dems.throttle_percent > 0.0);
        assert!(dems.throttle_percent <= 1.0);
        assert_eq!(dems.brake_torque_nm, 0.0);
        assert_eq!(dems.steer_angle_rad, 0.0);
    }

    #[test]
    fn test_brakes_when_overspeed() {
        let mut ctrl = test_ctrl();

        // Well above the demanded speed: the PID saturates at the decel
        // limit and the full braking torque is commanded
        let dems = ctrl.control(0.5, 0.0, 10.0);
        assert_eq!(dems.throttle_percent, 0.0);

        let total_mass_kg = 1736.35 + 13.5 * FUEL_DENSITY_KG_PER_L;
        let expected_nm = 5.0 * total_mass_kg * 0.2413;
        assert!((dems.brake_torque_nm - expected_nm).abs() < 1e-9);
        assert!(ctrl.report.braking);
        assert!(ctrl.report.accel_limited);
    }

    #[test]
    fn test_deadband_coasts() {
        let mut ctrl = test_ctrl();

        // Slightly above the demanded speed: the required deceleration is
        // within the deadband, so the vehicle coasts on engine braking
        let dems = ctrl.control(4.9, 0.0, 5.0);
        assert_eq!(dems.throttle_percent, 0.0);
        assert_eq!(dems.brake_torque_nm, 0.0);
        assert!(!ctrl.report.braking);
    }

    #[test]
    fn test_standstill_hold() {
        let mut ctrl = test_ctrl();

        let dems = ctrl.control(0.0, 0.0, 0.05);
        assert_eq!(dems.throttle_percent, 0.0);
        assert_eq!(dems.brake_torque_nm, HOLD_BRAKE_TORQUE_NM);
        assert!(ctrl.report.standstill_hold);
    }

    #[test]
    fn test_steering_follows_demand() {
        let mut ctrl = test_ctrl();

        let dems = ctrl.control(10.0, 0.3, 10.0);
        assert!(dems.steer_angle_rad > 0.0);

        let dems = ctrl.control(10.0, -0.3, 10.0);
        assert!(dems.steer_angle_rad < 0.0);
    }

    #[test]
    fn test_reset_clears_windup() {
        let mut ctrl = test_ctrl();

        // Drive with a large persistent error to wind up the integral
        for _ in 0..200 {
            ctrl.control(10.0, 0.0, 2.0);
        }

        // Without a reset, a zero-error tick still carries the windup in
        // the integral term
        let dems = ctrl.control(2.0, 0.0, 2.0);
        assert!(dems.throttle_percent > 0.0);

        // After a reset the same tick is neutral
        ctrl.reset();
        let dems = ctrl.control(2.0, 0.0, 2.0);
        assert_eq!(dems.throttle_percent, 0.0);
        assert_eq!(dems.brake_torque_nm, 0.0);
    }

    #[test]
    fn test_proc_matches_control() {
        let mut ctrl = test_ctrl();
        let input = ControlInput {
            target_linear_ms: 5.0,
            target_angular_rads: 0.1,
            current_linear_ms: 4.0
        };

        let (dems, report) = ctrl.proc(&input).unwrap();

        let mut ctrl2 = test_ctrl();
        let expected = ctrl2.control(5.0, 0.1, 4.0);

        assert_eq!(dems, expected);
        assert!(!report.standstill_hold);
    }
}
