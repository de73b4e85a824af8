//! Error taxonomy for the client edge.
//!
//! Everything here is fatal to the run: there is no retry layer, and partial
//! results are not preserved past the failing call. The variants mirror the
//! failure classes of the protocol: session establishment, per-chunk load
//! rejection, per-step rejection, transport, and the client-side timeout
//! wrapped around every call.

use std::time::Duration;

use thiserror::Error;

use crate::load::DataKind;

/// Errors surfaced by session, load, and step operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Channel establishment or HTTP/2-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The server answered with a gRPC status instead of a message.
    #[error("rpc failed: {0}")]
    Rpc(#[from] tonic::Status),

    /// `NewSession` answered without a session id; continuing would push
    /// scenario data into the void.
    #[error("server returned no session id")]
    MissingSessionId,

    /// The returned session id is not a UUID.
    #[error("server returned a malformed session id: {0}")]
    MalformedSessionId(#[from] uuid::Error),

    /// `NewSession` answered with a non-success application code.
    #[error("session rejected (code {code}): {text}")]
    SessionRejected { code: u32, text: String },

    /// A chunk acknowledgement carried a non-success application code.
    #[error("{kind} push rejected (code {code}): {text}")]
    LoadRejected {
        kind: DataKind,
        code: u32,
        text: String,
    },

    /// A step response carried a non-success application code.
    #[error("step {index} rejected (code {code}): {text}")]
    StepRejected {
        index: usize,
        code: u32,
        text: String,
    },

    /// A call exceeded the configured per-call timeout.
    #[error("{phase} timed out after {after:?}")]
    TimedOut {
        phase: &'static str,
        after: Duration,
    },
}
