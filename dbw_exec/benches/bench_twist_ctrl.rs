//! # Twist Controller Benchmark
//!
//! Measures the per-tick cost of the control law. At 50 Hz a tick lasts
//! 20 ms; the control computation should be a vanishingly small fraction of
//! that.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dbw_lib::controller::Controller;
use dbw_lib::twist_ctrl::{Params, TwistCtrl};

fn twist_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a controller with the vehicle's launch parameters ----

    let params = Params {
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
    };

    let mut ctrl = TwistCtrl::with_params(params, 50.0)
        .expect("Params should be valid");

    c.bench_function("twist_ctrl control tick", |b| {
        b.iter(|| {
            ctrl.control(
                black_box(10.0),
                black_box(0.1),
                black_box(9.5)
            )
        })
    });
}

criterion_group!(benches, twist_ctrl_benchmark);
criterion_main!(benches);
