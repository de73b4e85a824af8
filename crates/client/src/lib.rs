//! Gridflow Client Edge
//!
//! The client edge mediates between locally built scenario data and the
//! remote simulation service. It owns:
//! - Endpoint configuration and address normalization
//! - Session creation and probing
//! - Chunked bulk loading of scenario data, one stream per data kind
//! - The step driver consuming per-step state bundles
//!
//! # Call Model
//!
//! Everything is sequential: one channel, the phases in fixed order (session,
//! grid, conflict zones, traffic lights, trips, steps), every suspension
//! point an awaited stream message. There is no client-side parallelism and
//! no retry; transport failures are fatal. Every remote interaction is
//! bounded by a per-call timeout so a silent server fails the run instead of
//! stalling it.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod load;
pub mod rpc;
pub mod session;
pub mod step;

pub use config::ClientConfig;
pub use error::ClientError;
pub use load::{DataKind, LoadAck, LoadOptions, LoadReport, load_scenario};
pub use rpc::SimulationClient;
pub use session::Srid;
pub use step::run_steps;

use std::future::Future;
use std::time::Duration;

/// Await `fut` for at most `limit`, mapping expiry to [`ClientError::TimedOut`].
pub(crate) async fn with_timeout<T>(
    phase: &'static str,
    limit: Duration,
    fut: impl Future<Output = T>,
) -> Result<T, ClientError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ClientError::TimedOut {
            phase,
            after: limit,
        })
}
