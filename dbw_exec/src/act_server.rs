//! # Actuator Command Server
//!
//! Publishes the throttle, brake and steering commands produced by the
//! control loop.
//!
//! The three channels are independent: each is sent on its own topic, and a
//! failure delivering one channel is logged and does not block or roll back
//! the others. No consumer may rely on any ordering between the channels.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{self, zmq, NetError, NetParams, SocketOptions},
    veh::{
        BrakeCmd, SteeringCmd, ThrottleCmd,
        TOPIC_BRAKE_CMD, TOPIC_STEERING_CMD, TOPIC_THROTTLE_CMD
    }
};
use log::warn;

use crate::control_loop::CmdSink;
use crate::controller::ActuatorDems;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuator command server
pub struct ActServer {
    socket: zmq::Socket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ActServerError {
    #[error("Could not open the command socket: {0}")]
    SocketError(NetError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActServer {
    /// Create a new instance of the actuator command server.
    ///
    /// This binds the command endpoint and does not wait for subscribers to
    /// connect.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ActServerError> {
        // Create the socket options
        let socket_options = SocketOptions {
            bind: true,
            linger: 1,
            send_timeout: 10,
            ..Default::default()
        };

        // Create the socket
        let socket = net::create_socket(
            ctx,
            zmq::PUB,
            socket_options,
            &params.act_cmd_endpoint
        ).map_err(ActServerError::SocketError)?;

        // Create self
        Ok(Self {
            socket
        })
    }
}

impl CmdSink for ActServer {
    /// Publish the demands as one command per channel.
    fn publish(&mut self, dems: &ActuatorDems) {
        let tcmd = ThrottleCmd::new_percent(dems.throttle_percent);
        if let Err(e) = net::publish(&self.socket, TOPIC_THROTTLE_CMD, &tcmd) {
            warn!("Could not publish throttle command: {}", e);
        }

        let scmd = SteeringCmd::new(dems.steer_angle_rad);
        if let Err(e) = net::publish(&self.socket, TOPIC_STEERING_CMD, &scmd) {
            warn!("Could not publish steering command: {}", e);
        }

        let bcmd = BrakeCmd::new_torque(dems.brake_torque_nm);
        if let Err(e) = net::publish(&self.socket, TOPIC_BRAKE_CMD, &bcmd) {
            warn!("Could not publish brake command: {}", e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use comms_if::veh::ThrottleCmdType;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_three_channels_published() {
        let ctx = zmq::Context::new();

        let params = NetParams {
            dbw_enable_endpoint: String::new(),
            twist_demand_endpoint: String::new(),
            velocity_report_endpoint: String::new(),
            act_cmd_endpoint: "inproc://act_cmd_test".into()
        };

        // The server binds first, so inproc subscribers can connect
        let mut server = ActServer::new(&ctx, &params).unwrap();

        let throttle_sub =
            net::sub_socket(&ctx, &params.act_cmd_endpoint, TOPIC_THROTTLE_CMD, 1000).unwrap();
        let brake_sub =
            net::sub_socket(&ctx, &params.act_cmd_endpoint, TOPIC_BRAKE_CMD, 1000).unwrap();
        let steering_sub =
            net::sub_socket(&ctx, &params.act_cmd_endpoint, TOPIC_STEERING_CMD, 1000).unwrap();

        // Allow the subscriptions to propagate, then publish a few ticks
        thread::sleep(Duration::from_millis(200));

        let dems = ActuatorDems {
            throttle_percent: 0.25,
            brake_torque_nm: 12.5,
            steer_angle_rad: -0.1
        };

        for _ in 0..5 {
            server.publish(&dems);
            thread::sleep(Duration::from_millis(10));
        }

        // Each channel recieves its own command, independently of the others
        let tcmd: ThrottleCmd = net::receive(&throttle_sub, TOPIC_THROTTLE_CMD)
            .unwrap()
            .expect("No throttle command recieved");
        assert!(tcmd.enable);
        assert_eq!(tcmd.cmd_type, ThrottleCmdType::Percent);
        assert_eq!(tcmd.value, 0.25);

        let bcmd: BrakeCmd = net::receive(&brake_sub, TOPIC_BRAKE_CMD)
            .unwrap()
            .expect("No brake command recieved");
        assert!(bcmd.enable);
        assert_eq!(bcmd.value_nm, 12.5);

        let scmd: SteeringCmd = net::receive(&steering_sub, TOPIC_STEERING_CMD)
            .unwrap()
            .expect("No steering command recieved");
        assert!(scmd.enable);
        assert_eq!(scmd.angle_rad, -0.1);
    }
}
