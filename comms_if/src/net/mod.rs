//! # Network Module
//!
//! This module provides networking abstractions over ZMQ, the networking
//! library chosen for the software.
//!
//! All links between the DBW node and its peers are PUB/SUB. Messages are
//! framed as `topic json-payload`, the topic being used by subscribers to
//! filter data with `ZMQ_SUBSCRIBE`. Subscriber sockets are conflated
//! (`ZMQ_CONFLATE`), so only the most recently published message is ever
//! delivered - stale messages are overwritten in the socket, not queued.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network endpoint parameters, loaded from `net.toml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint publishing the drive-by-wire enable signal
    pub dbw_enable_endpoint: String,

    /// Endpoint publishing the demanded twist (from the waypoint follower)
    pub twist_demand_endpoint: String,

    /// Endpoint publishing the measured vehicle velocity
    pub velocity_report_endpoint: String,

    /// Endpoint this node binds to publish actuator commands
    pub act_cmd_endpoint: String
}

/// Represents options which can be set on a socket.
///
/// Most options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
pub struct SocketOptions {

    /// Indicates if the socket should bind itself to the endpoint. Publishers
    /// should have this value set as `true`, subscribers should have it set
    /// as `false`.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// `ZMQ_CONFLATE`: Keep only the last message in the receive queue.
    ///
    /// Set on subscriber sockets so that the delivered message is always the
    /// most recently published one.
    pub conflate: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),

    #[error("Could not connect the socket to {0}: {1}")]
    ConnectError(String, zmq::Error),

    #[error("Could not send the message: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the message: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the message payload: {0}")]
    DeserializeError(serde_json::Error),

    #[error("Recieved a message which was not valid UTF-8")]
    NonUtf8Message,

    #[error("Recieved a message with an unexpected topic: {0}")]
    UnexpectedTopic(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {

        // Set all the socket options, we use a macro here to make the error
        // handling nice and easy
        set_sockopts!(
            socket,
            (set_conflate, self.conflate),
            (set_linger, self.linger),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            conflate: false,
            linger: 30_000,
            recv_timeout: -1,
            send_timeout: 0
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a new socket of the given type, set its options, and connect or
/// bind it to the endpoint.
pub fn create_socket(
    ctx: &Context,
    socket_type: SocketType,
    socket_options: SocketOptions,
    endpoint: &str
) -> Result<Socket, NetError> {
    // Create socket
    let socket = ctx.socket(socket_type)
        .map_err(NetError::CreateSocketError)?;

    // Set the options on the socket
    socket_options.set(&socket)?;

    // Connect or bind the socket to its endpoint
    match socket_options.bind {
        false => socket.connect(endpoint),
        true => socket.bind(endpoint)
    }.map_err(|e| NetError::ConnectError(endpoint.into(), e))?;

    debug!(
        "{:?} socket {} {}",
        socket_type,
        if socket_options.bind { "bound to" } else { "connected to" },
        endpoint
    );

    Ok(socket)
}

/// Create a subscriber socket connected to the endpoint and subscribed to
/// the given topic.
///
/// The socket is conflated, so a receive always yields the most recently
/// published message, and `recv_timeout_ms` bounds how long a receive will
/// block for.
pub fn sub_socket(
    ctx: &Context,
    endpoint: &str,
    topic: &str,
    recv_timeout_ms: i32
) -> Result<Socket, NetError> {
    let socket_options = SocketOptions {
        conflate: true,
        linger: 1,
        recv_timeout: recv_timeout_ms,
        ..Default::default()
    };

    let socket = create_socket(ctx, zmq::SUB, socket_options, endpoint)?;

    socket.set_subscribe(topic.as_bytes())
        .map_err(|e| NetError::SocketOptionError("set_subscribe".into(), e))?;

    Ok(socket)
}

/// Publish a message on the socket under the given topic.
pub fn publish<T: serde::Serialize>(
    socket: &Socket,
    topic: &str,
    msg: &T
) -> Result<(), NetError> {
    let frame = frame_msg(topic, msg)?;

    socket.send(&frame, 0)
        .map_err(NetError::SendError)
}

/// Recieve a message from the socket, expecting the given topic.
///
/// Returns `Ok(None)` if no message was available within the socket's
/// receive timeout.
pub fn receive<T: DeserializeOwned>(
    socket: &Socket,
    topic: &str
) -> Result<Option<T>, NetError> {
    let msg = match socket.recv_msg(0) {
        Ok(m) => m,
        // EAGAIN indicates the receive timed out, which is not an error
        Err(zmq::Error::EAGAIN) => return Ok(None),
        Err(e) => return Err(NetError::RecvError(e))
    };

    let frame = match msg.as_str() {
        Some(s) => s,
        None => return Err(NetError::NonUtf8Message)
    };

    parse_msg(frame, topic).map(Some)
}

/// Build the `topic json-payload` frame for a message.
pub fn frame_msg<T: serde::Serialize>(topic: &str, msg: &T) -> Result<String, NetError> {
    let payload = serde_json::to_string(msg)
        .map_err(NetError::SerializationError)?;

    Ok(format!("{} {}", topic, payload))
}

/// Parse a `topic json-payload` frame, checking the topic matches.
pub fn parse_msg<T: DeserializeOwned>(frame: &str, topic: &str) -> Result<T, NetError> {
    // Split on the first space, the left half being the topic
    let (msg_topic, payload) = match frame.find(' ') {
        Some(idx) => (&frame[..idx], &frame[idx + 1..]),
        None => return Err(NetError::UnexpectedTopic(frame.into()))
    };

    if msg_topic != topic {
        return Err(NetError::UnexpectedTopic(msg_topic.into()));
    }

    serde_json::from_str(payload)
        .map_err(NetError::DeserializeError)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct TestMsg {
        value: f64
    }

    #[test]
    fn test_frame_and_parse() {
        let msg = TestMsg { value: 2.5 };

        let frame = frame_msg("test_topic", &msg).unwrap();
        assert!(frame.starts_with("test_topic "));

        let parsed: TestMsg = parse_msg(&frame, "test_topic").unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_parse_wrong_topic() {
        let msg = TestMsg { value: 1.0 };
        let frame = frame_msg("topic_a", &msg).unwrap();

        let result: Result<TestMsg, _> = parse_msg(&frame, "topic_b");
        assert!(matches!(result, Err(NetError::UnexpectedTopic(_))));
    }

    #[test]
    fn test_parse_no_payload() {
        let result: Result<TestMsg, _> = parse_msg("barewords", "barewords");
        assert!(result.is_err());
    }
}
