//! Simple test publisher for driving the DBW node by hand.
//!
//! Binds a PUB socket and repeatedly publishes one of the node's three
//! inputs, for example:
//!
//! ```bash
//! demand_sender --endpoint "tcp://*:5000" enable true
//! demand_sender --endpoint "tcp://*:5001" twist 5.0 0.0
//! demand_sender --endpoint "tcp://*:5002" velocity 4.8
//! ```

use comms_if::net::{self, SocketOptions};
use comms_if::veh::{
    DbwEnable, TwistDemand, VelocityReport,
    TOPIC_DBW_ENABLE, TOPIC_TWIST_DEMAND, TOPIC_VELOCITY_REPORT
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "demand_sender", about = "Publish test inputs to the DBW node")]
struct Opts {
    /// Endpoint to bind the publisher to
    #[structopt(long, default_value = "tcp://*:5001")]
    endpoint: String,

    /// Publication period in milliseconds
    #[structopt(long, default_value = "100")]
    period_ms: u64,

    #[structopt(subcommand)]
    input: Input
}

#[derive(Debug, StructOpt)]
enum Input {
    /// Publish the drive-by-wire enable signal
    Enable {
        /// True to authorise electronic actuation
        #[structopt(parse(try_from_str))]
        enabled: bool
    },

    /// Publish a twist demand
    Twist {
        /// Demanded linear velocity (m/s)
        linear_ms: f64,

        /// Demanded angular velocity (rad/s)
        angular_rads: f64
    },

    /// Publish a velocity report
    Velocity {
        /// Measured linear velocity (m/s)
        linear_ms: f64
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {

    let opts = Opts::from_args();

    // Create zmq context
    let ctx = zmq::Context::new();

    // Create socket options
    let socket_options = SocketOptions {
        bind: true,
        ..Default::default()
    };

    // Create the socket
    let socket = net::create_socket(&ctx, zmq::PUB, socket_options, &opts.endpoint)?;

    println!("Publisher open on {}", opts.endpoint);

    // Send the input to subscribers, stamping each message at publication
    loop {
        match &opts.input {
            Input::Enable { enabled } => {
                net::publish(&socket, TOPIC_DBW_ENABLE, &DbwEnable::new(*enabled))?
            }
            Input::Twist { linear_ms, angular_rads } => {
                net::publish(&socket, TOPIC_TWIST_DEMAND, &TwistDemand::new(*linear_ms, *angular_rads))?
            }
            Input::Velocity { linear_ms } => {
                net::publish(&socket, TOPIC_VELOCITY_REPORT, &VelocityReport::new(*linear_ms))?
            }
        }

        std::thread::sleep(std::time::Duration::from_millis(opts.period_ms));
    }
}
