//! # Network telemetry publisher
//!
//! Publishes every telemetry update on a ZMQ PUB socket as a JSON encoded `TmEntry`. Dashboards
//! subscribe to the socket and keep their own copy of the board.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use zmq::{Context, Socket};

use crate::telemetry::{TelemetrySink, TmValue};

// Export zmq
pub use zmq;

// ---------------------------------------------------------------------------
// MACROS
// ---------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| TmPublisherError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Network parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Whether telemetry should be published at all
    pub publish_tm: bool,

    /// Endpoint the telemetry publisher binds to, such as `"tcp://*:5800"`
    pub tm_endpoint: String,

    /// `ZMQ_LINGER`: linger period for socket shutdown in milliseconds
    pub linger_ms: i32,

    /// `ZMQ_SNDTIMEO`: maximum time a send may block in milliseconds
    pub send_timeout_ms: i32,
}

/// A single telemetry update as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmEntry {
    pub key: String,
    pub value: TmValue,
}

/// Telemetry publisher.
pub struct TmPublisher {
    socket: Mutex<Socket>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmPublisherError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not bind the socket: {0}")]
    BindError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),

    #[error("Could not send telemetry: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the telemetry: {0}")]
    SerializationError(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl TmPublisher {
    /// Create a new publisher bound to the endpoint in the params.
    pub fn new(ctx: &Context, params: &NetParams) -> Result<Self, TmPublisherError> {
        let socket = ctx
            .socket(zmq::PUB)
            .map_err(TmPublisherError::CreateSocketError)?;

        set_sockopts!(
            socket,
            (set_linger, params.linger_ms),
            (set_sndtimeo, params.send_timeout_ms)
        );

        socket
            .bind(&params.tm_endpoint)
            .map_err(TmPublisherError::BindError)?;

        Ok(Self {
            socket: Mutex::new(socket),
        })
    }

    /// Send one entry.
    pub fn send(&self, entry: &TmEntry) -> Result<(), TmPublisherError> {
        let msg = serde_json::to_string(entry).map_err(TmPublisherError::SerializationError)?;

        let socket = self.socket.lock().unwrap_or_else(|e| e.into_inner());
        socket.send(msg.as_str(), 0).map_err(TmPublisherError::SendError)
    }

    fn publish(&self, key: &str, value: TmValue) {
        let entry = TmEntry {
            key: key.into(),
            value,
        };

        // Telemetry is best effort, the robot keeps running without it
        if let Err(e) = self.send(&entry) {
            warn!("Telemetry for {} not published: {}", key, e);
        }
    }
}

impl TelemetrySink for TmPublisher {
    fn put_number(&self, key: &str, value: f64) {
        self.publish(key, TmValue::Number(value))
    }

    fn put_bool(&self, key: &str, value: bool) {
        self.publish(key, TmValue::Bool(value))
    }

    fn put_string(&self, key: &str, value: &str) {
        self.publish(key, TmValue::String(value.into()))
    }
}

impl Default for NetParams {
    fn default() -> Self {
        Self {
            publish_tm: false,
            tm_endpoint: "tcp://*:5800".into(),
            linger_ms: 1,
            send_timeout_ms: 10,
        }
    }
}
