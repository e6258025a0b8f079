//! # Input Client
//!
//! Receives the node's three asynchronous inputs and feeds them into the
//! shared state read by the control loop.
//!
//! Each input topic gets its own conflated SUB socket serviced by its own
//! listener thread, so the three delivery contexts are independent of each
//! other and of the loop. A listener only ever calls the single update
//! operation belonging to its topic - no listener holds a reference into
//! loop-owned state. Malformed messages are logged and dropped; they never
//! stop the node.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

// Internal
use comms_if::{
    net::{self, zmq, NetError},
    veh::{
        DbwEnable, TwistDemand, VelocityReport,
        TOPIC_DBW_ENABLE, TOPIC_TWIST_DEMAND, TOPIC_VELOCITY_REPORT
    }
};
use util::raise_error;

use crate::enable_gate::EnableGate;
use crate::velocity_store::VelocityStore;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout for the listener sockets.
///
/// Bounds how long a listener can take to observe the shutdown flag.
const RECV_TIMEOUT_MS: i32 = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Input client
///
/// Owns the listener threads for the node's input topics.
pub struct InputClient {
    shutdown: Arc<AtomicBool>,

    join_handles: Vec<thread::JoinHandle<()>>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum InputClientError {
    #[error("Could not open the {0} socket: {1}")]
    SocketError(&'static str, NetError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InputClient {
    /// Open the three input sockets and start their listener threads.
    pub fn start(
        ctx: &zmq::Context,
        params: &net::NetParams,
        velocity_store: Arc<Mutex<VelocityStore>>,
        enable_gate: Arc<Mutex<EnableGate>>
    ) -> Result<Self, InputClientError> {
        // Create all sockets up front so endpoint problems surface at
        // startup rather than inside a listener
        let enable_socket = net::sub_socket(
            ctx,
            &params.dbw_enable_endpoint,
            TOPIC_DBW_ENABLE,
            RECV_TIMEOUT_MS
        ).map_err(|e| InputClientError::SocketError(TOPIC_DBW_ENABLE, e))?;

        let twist_socket = net::sub_socket(
            ctx,
            &params.twist_demand_endpoint,
            TOPIC_TWIST_DEMAND,
            RECV_TIMEOUT_MS
        ).map_err(|e| InputClientError::SocketError(TOPIC_TWIST_DEMAND, e))?;

        let velocity_socket = net::sub_socket(
            ctx,
            &params.velocity_report_endpoint,
            TOPIC_VELOCITY_REPORT,
            RECV_TIMEOUT_MS
        ).map_err(|e| InputClientError::SocketError(TOPIC_VELOCITY_REPORT, e))?;

        let shutdown = Arc::new(AtomicBool::new(false));

        // Spawn one listener per input
        let mut join_handles = Vec::new();

        {
            let shutdown = shutdown.clone();
            let gate = enable_gate;
            join_handles.push(thread::spawn(move || {
                listen(shutdown, move || {
                    match net::receive::<DbwEnable>(&enable_socket, TOPIC_DBW_ENABLE) {
                        Ok(Some(msg)) => match gate.lock() {
                            Ok(mut gate) => gate.update(msg.enabled),
                            Err(_) => raise_error!("The enable gate mutex is poisoned")
                        },
                        Ok(None) => (),
                        Err(e) => warn!("Bad {} message: {}", TOPIC_DBW_ENABLE, e)
                    }
                })
            }));
        }

        {
            let shutdown = shutdown.clone();
            let store = velocity_store.clone();
            join_handles.push(thread::spawn(move || {
                listen(shutdown, move || {
                    match net::receive::<TwistDemand>(&twist_socket, TOPIC_TWIST_DEMAND) {
                        Ok(Some(msg)) => match store.lock() {
                            Ok(mut store) => store.update_target(msg.linear_ms, msg.angular_rads),
                            Err(_) => raise_error!("The velocity store mutex is poisoned")
                        },
                        Ok(None) => (),
                        Err(e) => warn!("Bad {} message: {}", TOPIC_TWIST_DEMAND, e)
                    }
                })
            }));
        }

        {
            let shutdown = shutdown.clone();
            let store = velocity_store;
            join_handles.push(thread::spawn(move || {
                listen(shutdown, move || {
                    match net::receive::<VelocityReport>(&velocity_socket, TOPIC_VELOCITY_REPORT) {
                        Ok(Some(msg)) => match store.lock() {
                            Ok(mut store) => store.update_current(msg.linear_ms),
                            Err(_) => raise_error!("The velocity store mutex is poisoned")
                        },
                        Ok(None) => (),
                        Err(e) => warn!("Bad {} message: {}", TOPIC_VELOCITY_REPORT, e)
                    }
                })
            }));
        }

        Ok(Self {
            shutdown,
            join_handles
        })
    }

    /// Stop the listener threads and wait for them to exit.
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::Relaxed);

        for handle in self.join_handles {
            if handle.join().is_err() {
                warn!("An input listener thread panicked");
            }
        }

        debug!("All input listeners stopped");
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Drive one listener body until the shutdown flag is raised.
fn listen<F: FnMut()>(shutdown: Arc<AtomicBool>, mut body: F) {
    while !shutdown.load(Ordering::Relaxed) {
        body();
    }
}
