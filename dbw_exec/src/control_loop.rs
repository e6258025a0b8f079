//! # Control Loop
//!
//! The fixed-cadence driver of the DBW node. Each tick samples the enable
//! gate and velocity store, runs the controller when the node holds
//! authority and both velocity inputs have been observed, and forwards the
//! resulting demands to the command sink.
//!
//! Ticks with nothing to do are skipped, not held over - the previous
//! command is never re-sent, so downstream consumers must tolerate gaps in
//! the command stream while the node is disabled or waiting for data.
//! Skipped ticks are paced exactly like active ones; the loop never
//! busy-spins.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use crate::controller::{ActuatorDems, Controller};
use crate::enable_gate::EnableGate;
use crate::velocity_store::VelocityStore;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Consumer of the demands produced on each active tick.
///
/// Implemented by the actuator command server; tests substitute a recording
/// sink.
pub trait CmdSink {
    /// Emit the given demands.
    ///
    /// Delivery is best-effort: implementations report channel failures via
    /// logging, never back to the loop.
    fn publish(&mut self, dems: &ActuatorDems);
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The controller ran and demands were published.
    Published,

    /// Drive-by-wire is not authorised, the tick was skipped.
    NotEnabled,

    /// One or both velocity inputs have not been observed yet, the tick was
    /// skipped.
    NotReady
}

/// Errors which terminate the control loop.
///
/// There is deliberately no recovery path here: both variants indicate a
/// programming defect, and substituting a default command in a
/// safety-critical actuation path is not an option.
#[derive(Debug, thiserror::Error)]
pub enum ControlLoopError {
    #[error(
        "Controller produced non-finite demands \
         (throttle: {throttle_percent}, brake: {brake_torque_nm}, steer: {steer_angle_rad})"
    )]
    InvalidDems {
        throttle_percent: f64,
        brake_torque_nm: f64,
        steer_angle_rad: f64
    },

    #[error("The {0} mutex was poisoned by a panicking writer")]
    LockPoisoned(&'static str)
}

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The fixed-cadence control loop.
///
/// Owns the controller and the command sink; shares the velocity store and
/// enable gate with the input listener threads, which only ever call the
/// update operations on them.
pub struct ControlLoop<C: Controller, S: CmdSink> {
    /// Target period of one tick.
    period: Duration,

    /// Number of ticks between heartbeat log lines.
    heartbeat_ticks: u64,

    velocity_store: Arc<Mutex<VelocityStore>>,
    enable_gate: Arc<Mutex<EnableGate>>,

    controller: C,
    sink: S,

    // Monitoring counters
    num_ticks: u64,
    num_published: u64,
    num_not_enabled: u64,
    num_not_ready: u64,
    num_consec_overruns: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<C: Controller, S: CmdSink> ControlLoop<C, S> {
    /// Create a new loop ticking at the given rate.
    ///
    /// The rate must already have been validated as positive and finite (see
    /// `DbwExecParams::validate`).
    pub fn new(
        sampling_rate_hz: f64,
        velocity_store: Arc<Mutex<VelocityStore>>,
        enable_gate: Arc<Mutex<EnableGate>>,
        controller: C,
        sink: S
    ) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / sampling_rate_hz),
            heartbeat_ticks: sampling_rate_hz.round().max(1.0) as u64,
            velocity_store,
            enable_gate,
            controller,
            sink,
            num_ticks: 0,
            num_published: 0,
            num_not_enabled: 0,
            num_not_ready: 0,
            num_consec_overruns: 0,
        }
    }

    /// Run the loop until the running flag is cleared.
    ///
    /// The flag is polled between ticks only, never mid-tick, so a shutdown
    /// can never interrupt a partially-emitted command set. Returns `Err` on
    /// a controller fault, which is fatal to the node.
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), ControlLoopError> {
        while running.load(Ordering::SeqCst) {
            // Get tick start time
            let tick_start = Instant::now();

            self.tick()?;

            // ---- CYCLE MANAGEMENT ----

            let tick_dur = tick_start.elapsed();

            // Sleep off the remainder of the period. An overrun delays the
            // next tick rather than triggering a catch-up burst.
            match self.period.checked_sub(tick_dur) {
                Some(d) => {
                    self.num_consec_overruns = 0;
                    thread::sleep(d);
                }
                None => {
                    warn!(
                        "Tick overran by {:.06} s",
                        (tick_dur - self.period).as_secs_f64()
                    );
                    self.num_consec_overruns += 1;
                }
            }
        }

        debug!("Control loop stopped between ticks");

        Ok(())
    }

    /// Execute a single tick of the loop body, without pacing.
    pub fn tick(&mut self) -> Result<TickOutcome, ControlLoopError> {
        self.num_ticks += 1;

        if self.num_ticks % self.heartbeat_ticks == 0 {
            debug!(
                "{} ticks: {} published, {} not enabled, {} not ready, {} consecutive overruns",
                self.num_ticks,
                self.num_published,
                self.num_not_enabled,
                self.num_not_ready,
                self.num_consec_overruns
            );
        }

        // Sample the gate, holding the lock only for the copy
        let gate = match self.enable_gate.lock() {
            Ok(mut gate) => gate.sample(),
            Err(_) => return Err(ControlLoopError::LockPoisoned("enable gate"))
        };

        // A pending reset is honoured before anything else, so that latent
        // controller state is cleared before the next authorised period even
        // if this tick goes on to be skipped
        if gate.reset_required {
            debug!("Resetting controller after loss of drive-by-wire authority");
            self.controller.reset();
        }

        if !gate.enabled {
            self.num_not_enabled += 1;
            return Ok(TickOutcome::NotEnabled);
        }

        // Take a consistent snapshot of the velocity inputs
        let snapshot = match self.velocity_store.lock() {
            Ok(store) => store.snapshot(),
            Err(_) => return Err(ControlLoopError::LockPoisoned("velocity store"))
        };

        let snap = match snapshot {
            Some(s) => s,
            None => {
                self.num_not_ready += 1;
                return Ok(TickOutcome::NotReady);
            }
        };

        // Run the control law
        let dems = self.controller.control(
            snap.target.linear_ms,
            snap.target.angular_rads,
            snap.current_ms
        );

        // A non-finite demand must fail-stop the node rather than reach an
        // actuator
        if !dems.is_finite() {
            return Err(ControlLoopError::InvalidDems {
                throttle_percent: dems.throttle_percent,
                brake_torque_nm: dems.brake_torque_nm,
                steer_angle_rad: dems.steer_angle_rad
            });
        }

        self.sink.publish(&dems);
        self.num_published += 1;

        Ok(TickOutcome::Published)
    }

    /// Total ticks executed so far.
    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    /// Total ticks which published a command set.
    pub fn num_published(&self) -> u64 {
        self.num_published
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Stub controller recording how it was driven.
    struct StubController {
        /// Demands to return from every control call.
        dems: ActuatorDems,

        /// Total control calls.
        num_control_calls: u64,

        /// Control calls since the last reset (or construction).
        calls_since_reset: u64,

        /// Total reset calls.
        num_resets: u64,

        /// For each control call, whether the controller was freshly reset
        /// at the time of the call.
        fresh_at_call: Vec<bool>,
    }

    impl StubController {
        fn returning(dems: ActuatorDems) -> Self {
            Self {
                dems,
                num_control_calls: 0,
                calls_since_reset: 0,
                num_resets: 0,
                fresh_at_call: Vec::new(),
            }
        }

        fn zeros() -> Self {
            Self::returning(ActuatorDems::zero())
        }
    }

    impl Controller for StubController {
        fn control(&mut self, _: f64, _: f64, _: f64) -> ActuatorDems {
            self.fresh_at_call.push(self.calls_since_reset == 0);
            self.num_control_calls += 1;
            self.calls_since_reset += 1;
            self.dems
        }

        fn reset(&mut self) {
            self.num_resets += 1;
            self.calls_since_reset = 0;
        }
    }

    /// Sink recording every published demand set.
    #[derive(Default)]
    struct RecordingSink {
        published: Vec<ActuatorDems>,
    }

    impl CmdSink for RecordingSink {
        fn publish(&mut self, dems: &ActuatorDems) {
            self.published.push(*dems);
        }
    }

    /// Sink shared with the test through an Arc, for loops moved into
    /// threads.
    #[derive(Clone, Default)]
    struct SharedSink {
        published: Arc<Mutex<Vec<ActuatorDems>>>,
    }

    impl CmdSink for SharedSink {
        fn publish(&mut self, dems: &ActuatorDems) {
            self.published.lock().unwrap().push(*dems);
        }
    }

    fn make_loop(
        rate_hz: f64,
        controller: StubController,
    ) -> (
        ControlLoop<StubController, RecordingSink>,
        Arc<Mutex<VelocityStore>>,
        Arc<Mutex<EnableGate>>,
    ) {
        let store = Arc::new(Mutex::new(VelocityStore::new()));
        let gate = Arc::new(Mutex::new(EnableGate::new()));

        let control_loop = ControlLoop::new(
            rate_hz,
            store.clone(),
            gate.clone(),
            controller,
            RecordingSink::default(),
        );

        (control_loop, store, gate)
    }

    #[test]
    fn test_never_publishes_while_disabled() {
        let (mut control_loop, store, _gate) = make_loop(50.0, StubController::zeros());

        // Velocities present, but the gate was never enabled
        {
            let mut store = store.lock().unwrap();
            store.update_target(5.0, 0.0);
            store.update_current(5.0);
        }

        for _ in 0..20 {
            assert_eq!(control_loop.tick().unwrap(), TickOutcome::NotEnabled);
        }

        assert!(control_loop.sink.published.is_empty());
        assert_eq!(control_loop.controller.num_control_calls, 0);
    }

    #[test]
    fn test_never_publishes_before_data() {
        let (mut control_loop, store, gate) = make_loop(50.0, StubController::zeros());

        gate.lock().unwrap().update(true);

        // No data at all
        assert_eq!(control_loop.tick().unwrap(), TickOutcome::NotReady);

        // Only the measurement
        store.lock().unwrap().update_current(3.0);
        assert_eq!(control_loop.tick().unwrap(), TickOutcome::NotReady);

        assert!(control_loop.sink.published.is_empty());

        // Both inputs present - now it publishes
        store.lock().unwrap().update_target(3.0, 0.0);
        assert_eq!(control_loop.tick().unwrap(), TickOutcome::Published);
    }

    #[test]
    fn test_only_target_never_publishes() {
        let (mut control_loop, store, gate) = make_loop(50.0, StubController::zeros());

        gate.lock().unwrap().update(true);
        store.lock().unwrap().update_target(5.0, 0.1);

        for _ in 0..10 {
            assert_eq!(control_loop.tick().unwrap(), TickOutcome::NotReady);
        }

        assert!(control_loop.sink.published.is_empty());
    }

    #[test]
    fn test_publishes_one_command_set_per_tick() {
        let (mut control_loop, store, gate) = make_loop(50.0, StubController::zeros());

        gate.lock().unwrap().update(true);
        {
            let mut store = store.lock().unwrap();
            store.update_target(5.0, 0.0);
            store.update_current(5.0);
        }

        for i in 1..=5 {
            assert_eq!(control_loop.tick().unwrap(), TickOutcome::Published);
            assert_eq!(control_loop.sink.published.len(), i);
        }

        // The stub returned zeros, and they were forwarded untouched
        for dems in &control_loop.sink.published {
            assert_eq!(*dems, ActuatorDems::zero());
        }
    }

    #[test]
    fn test_disable_resets_exactly_once() {
        let (mut control_loop, store, gate) = make_loop(50.0, StubController::zeros());

        {
            let mut store = store.lock().unwrap();
            store.update_target(5.0, 0.0);
            store.update_current(5.0);
        }

        gate.lock().unwrap().update(true);
        control_loop.tick().unwrap();

        // Loss of authority, with the signal repeated several times
        {
            let mut gate = gate.lock().unwrap();
            gate.update(false);
            gate.update(false);
            gate.update(false);
        }

        control_loop.tick().unwrap();
        assert_eq!(control_loop.controller.num_resets, 1);

        // Further disabled ticks add no resets
        control_loop.tick().unwrap();
        control_loop.tick().unwrap();
        assert_eq!(control_loop.controller.num_resets, 1);
    }

    #[test]
    fn test_reenable_runs_fresh_controller() {
        let (mut control_loop, store, gate) = make_loop(50.0, StubController::zeros());

        {
            let mut store = store.lock().unwrap();
            store.update_target(5.0, 0.0);
            store.update_current(5.0);
        }

        // Accumulate some controller state while enabled
        gate.lock().unwrap().update(true);
        for _ in 0..5 {
            control_loop.tick().unwrap();
        }

        // Disable then re-enable; velocities remain set
        gate.lock().unwrap().update(false);
        control_loop.tick().unwrap();
        gate.lock().unwrap().update(true);
        control_loop.tick().unwrap();

        // The first call after re-enable saw a freshly reset controller
        assert_eq!(control_loop.controller.num_resets, 1);
        let fresh = &control_loop.controller.fresh_at_call;
        assert_eq!(fresh.len(), 6);
        assert!(fresh[5]);
    }

    #[test]
    fn test_fast_disable_enable_still_resets_before_control() {
        let (mut control_loop, store, gate) = make_loop(50.0, StubController::zeros());

        {
            let mut store = store.lock().unwrap();
            store.update_target(5.0, 0.0);
            store.update_current(5.0);
        }

        gate.lock().unwrap().update(true);
        control_loop.tick().unwrap();

        // Both edges land between two ticks
        {
            let mut gate = gate.lock().unwrap();
            gate.update(false);
            gate.update(true);
        }

        assert_eq!(control_loop.tick().unwrap(), TickOutcome::Published);
        assert_eq!(control_loop.controller.num_resets, 1);
        assert!(control_loop.controller.fresh_at_call[1]);
    }

    #[test]
    fn test_non_finite_demands_are_fatal() {
        let stub = StubController::returning(ActuatorDems {
            throttle_percent: f64::NAN,
            brake_torque_nm: 0.0,
            steer_angle_rad: 0.0,
        });
        let (mut control_loop, store, gate) = make_loop(50.0, stub);

        gate.lock().unwrap().update(true);
        {
            let mut store = store.lock().unwrap();
            store.update_target(5.0, 0.0);
            store.update_current(5.0);
        }

        let result = control_loop.tick();
        assert!(matches!(result, Err(ControlLoopError::InvalidDems { .. })));

        // Nothing was forwarded to the sink
        assert!(control_loop.sink.published.is_empty());
    }

    #[test]
    fn test_run_paces_at_sampling_rate() {
        // 100 Hz loop left disabled: every tick is skipped, and skipped
        // ticks must still be paced rather than busy-spun
        let store = Arc::new(Mutex::new(VelocityStore::new()));
        let gate = Arc::new(Mutex::new(EnableGate::new()));
        let sink = SharedSink::default();

        let mut control_loop = ControlLoop::new(
            100.0,
            store.clone(),
            gate.clone(),
            StubController::zeros(),
            sink,
        );

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = thread::spawn(move || {
            control_loop.run(&running_clone).unwrap();
            control_loop
        });

        thread::sleep(Duration::from_millis(500));
        running.store(false, Ordering::SeqCst);
        let control_loop = handle.join().unwrap();

        // Expect ~50 ticks in 500 ms at 100 Hz; allow a generous jitter
        // margin for loaded test machines. A busy-spinning loop would rack
        // up orders of magnitude more ticks than the upper bound.
        let ticks = control_loop.num_ticks();
        assert!(ticks >= 20, "Only {} ticks in 500 ms at 100 Hz", ticks);
        assert!(ticks <= 80, "{} ticks in 500 ms at 100 Hz", ticks);
    }

    #[test]
    fn test_run_publishes_while_enabled_and_ready() {
        let store = Arc::new(Mutex::new(VelocityStore::new()));
        let gate = Arc::new(Mutex::new(EnableGate::new()));
        let sink = SharedSink::default();
        let published = sink.published.clone();

        gate.lock().unwrap().update(true);
        {
            let mut store = store.lock().unwrap();
            store.update_target(5.0, 0.0);
            store.update_current(5.0);
        }

        let mut control_loop = ControlLoop::new(
            100.0,
            store,
            gate,
            StubController::zeros(),
            sink,
        );

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = thread::spawn(move || {
            control_loop.run(&running_clone).unwrap();
            control_loop
        });

        thread::sleep(Duration::from_millis(200));
        running.store(false, Ordering::SeqCst);
        let control_loop = handle.join().unwrap();

        let num_published = published.lock().unwrap().len() as u64;
        assert!(num_published > 0);
        assert_eq!(num_published, control_loop.num_published());
    }
}
