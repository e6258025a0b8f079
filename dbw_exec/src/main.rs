//! Main drive-by-wire executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise the controller module
//!     - Start the input listener threads (enable signal, twist demand,
//!       velocity report), which feed the shared enable gate and velocity
//!       store
//!     - Run the fixed-cadence control loop on the main thread until
//!       shutdown or a controller fault
//!
//! The control loop is the only place actuator commands originate. The
//! input listeners never touch the controller or the command sockets - they
//! only call the update operations on the gate and store.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use dbw_lib::{
    act_server::ActServer,
    control_loop::ControlLoop,
    enable_gate::EnableGate,
    input_client::InputClient,
    params::DbwExecParams,
    twist_ctrl::{self, TwistCtrl},
    velocity_store::VelocityStore
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// Internal
use comms_if::net::NetParams;
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "dbw_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("DBW Node Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: DbwExecParams = util::params::load(
        "dbw_exec.toml"
    ).wrap_err("Could not load exec params")?;

    exec_params.validate()
        .wrap_err("Exec params are invalid")?;

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");
    info!("    Sampling rate: {} Hz", exec_params.sampling_rate_hz);

    // ---- INITIALISE SHARED STATE ----

    // The gate starts disabled and the store starts empty: until the
    // vehicle says otherwise no command may be produced.
    let velocity_store = Arc::new(Mutex::new(VelocityStore::new()));
    let enable_gate = Arc::new(Mutex::new(EnableGate::new()));

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut twist_ctrl = TwistCtrl::default();
    twist_ctrl.init(
        twist_ctrl::InitData {
            param_file: "twist_ctrl.toml",
            sampling_rate_hz: exec_params.sampling_rate_hz
        },
        &session
    ).wrap_err("Failed to initialise TwistCtrl")?;
    info!("TwistCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let input_client = InputClient::start(
        &zmq_ctx,
        &net_params,
        velocity_store.clone(),
        enable_gate.clone()
    ).wrap_err("Failed to initialise the InputClient")?;
    info!("InputClient initialised");

    let act_server = ActServer::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the ActServer")?;
    info!("ActServer initialised");

    info!("Network initialisation complete");

    // ---- SHUTDOWN HANDLING ----

    // The loop polls this flag between ticks, so a shutdown can never
    // interrupt a partially-emitted command set
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running_clone.store(false, Ordering::SeqCst);
    }).wrap_err("Failed to set the shutdown handler")?;

    // ---- MAIN LOOP ----

    info!("Beginning control loop\n");

    let mut control_loop = ControlLoop::new(
        exec_params.sampling_rate_hz,
        velocity_store,
        enable_gate,
        twist_ctrl,
        act_server
    );

    let loop_result = control_loop.run(&running);

    // ---- SHUTDOWN ----

    // Stop the listeners before deciding the exit status so their sockets
    // close cleanly either way
    input_client.stop();

    // A controller fault is fatal: report it rather than restarting
    loop_result.wrap_err("Control loop terminated abnormally")?;

    info!(
        "End of execution after {} ticks ({} commands published)",
        control_loop.num_ticks(),
        control_loop.num_published()
    );

    Ok(())
}
