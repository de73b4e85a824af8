//! Chunked bulk loading of scenario data.
//!
//! For each of the four data kinds the loader opens one bidirectional
//! stream, emits one message per chunk (the chunk producer legally emits
//! zero, one, or many chunks), and drains the acknowledgement stream: one
//! `(code, text)` per chunk. The protocol does not enforce an order between
//! the kinds, but conflict zones, traffic lights, and trips all reference
//! cell ids, so [`load_scenario`] pushes the grid first.
//!
//! A non-success acknowledgement is escalated to
//! [`ClientError::LoadRejected`]: a partially loaded scenario is not worth
//! stepping.

use std::fmt;
use std::time::Duration;

use tokio_stream::{Stream, StreamExt};
use tonic::Status;
use uuid::Uuid;

use gridflow_scenario::Scenario;
use gridflow_wire::{self as wire, Ack};

use crate::config::DEFAULT_CALL_TIMEOUT;
use crate::error::ClientError;
use crate::rpc::SimulationClient;
use crate::with_timeout;

/// Cap on entities per chunk message, matching the server's limit.
pub const MAX_CHUNK_ENTITIES: usize = 10_000;

/// The four scenario data kinds, in required load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Grid,
    ConflictZones,
    TrafficLights,
    Trips,
}

impl DataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::ConflictZones => "conflict zones",
            Self::TrafficLights => "traffic lights",
            Self::Trips => "trips",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loader knobs.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Entities per chunk message.
    pub chunk_size: usize,
    /// Timeout applied to each acknowledgement read.
    pub call_timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            chunk_size: MAX_CHUNK_ENTITIES,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// One acknowledgement from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAck {
    pub code: u32,
    pub text: String,
}

/// Acknowledgements per data kind for a completed load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub grid: Vec<LoadAck>,
    pub conflict_zones: Vec<LoadAck>,
    pub traffic_lights: Vec<LoadAck>,
    pub trips: Vec<LoadAck>,
}

fn session_ref(session: Uuid) -> Option<wire::Uuid4> {
    Some(wire::Uuid4 {
        value: session.to_string(),
    })
}

/// Push grid cells.
pub async fn push_grid(
    client: &mut SimulationClient,
    session: Uuid,
    cells: &[gridflow_scenario::Cell],
    opts: &LoadOptions,
) -> Result<Vec<LoadAck>, ClientError> {
    let chunks: Vec<wire::SessionGrid> = cells
        .chunks(opts.chunk_size.max(1))
        .map(|chunk| wire::SessionGrid {
            session_id: session_ref(session),
            data: chunk.iter().map(Into::into).collect(),
        })
        .collect();
    let expected = chunks.len();
    let responses = client.push_session_grid(tokio_stream::iter(chunks)).await?;
    collect_acks(DataKind::Grid, expected, responses, opts.call_timeout).await
}

/// Push conflict zones.
pub async fn push_conflict_zones(
    client: &mut SimulationClient,
    session: Uuid,
    zones: &[gridflow_scenario::ConflictZone],
    opts: &LoadOptions,
) -> Result<Vec<LoadAck>, ClientError> {
    let chunks: Vec<wire::SessionConflictZones> = zones
        .chunks(opts.chunk_size.max(1))
        .map(|chunk| wire::SessionConflictZones {
            session_id: session_ref(session),
            data: chunk.iter().map(Into::into).collect(),
        })
        .collect();
    let expected = chunks.len();
    let responses = client
        .push_session_conflict_zones(tokio_stream::iter(chunks))
        .await?;
    collect_acks(DataKind::ConflictZones, expected, responses, opts.call_timeout).await
}

/// Push traffic lights.
pub async fn push_traffic_lights(
    client: &mut SimulationClient,
    session: Uuid,
    lights: &[gridflow_scenario::TrafficLight],
    opts: &LoadOptions,
) -> Result<Vec<LoadAck>, ClientError> {
    let chunks: Vec<wire::SessionTls> = lights
        .chunks(opts.chunk_size.max(1))
        .map(|chunk| wire::SessionTls {
            session_id: session_ref(session),
            data: chunk.iter().map(Into::into).collect(),
        })
        .collect();
    let expected = chunks.len();
    let responses = client.push_session_tls(tokio_stream::iter(chunks)).await?;
    collect_acks(DataKind::TrafficLights, expected, responses, opts.call_timeout).await
}

/// Push trips.
pub async fn push_trips(
    client: &mut SimulationClient,
    session: Uuid,
    trips: &[gridflow_scenario::Trip],
    opts: &LoadOptions,
) -> Result<Vec<LoadAck>, ClientError> {
    let chunks: Vec<wire::SessionTrip> = trips
        .chunks(opts.chunk_size.max(1))
        .map(|chunk| wire::SessionTrip {
            session_id: session_ref(session),
            data: chunk.iter().map(Into::into).collect(),
        })
        .collect();
    let expected = chunks.len();
    let responses = client.push_session_trip(tokio_stream::iter(chunks)).await?;
    collect_acks(DataKind::Trips, expected, responses, opts.call_timeout).await
}

/// Push a complete scenario in reference order: grid, conflict zones,
/// traffic lights, trips.
pub async fn load_scenario(
    client: &mut SimulationClient,
    session: Uuid,
    scenario: &Scenario,
    opts: &LoadOptions,
) -> Result<LoadReport, ClientError> {
    let grid = push_grid(client, session, &scenario.cells, opts).await?;
    let conflict_zones =
        push_conflict_zones(client, session, &scenario.conflict_zones, opts).await?;
    let traffic_lights =
        push_traffic_lights(client, session, &scenario.traffic_lights, opts).await?;
    let trips = push_trips(client, session, &scenario.trips, opts).await?;
    Ok(LoadReport {
        grid,
        conflict_zones,
        traffic_lights,
        trips,
    })
}

/// Drain an acknowledgement stream, failing fast on the first non-success
/// code.
///
/// Generic over the stream so tests can drive it with synthetic responses.
async fn collect_acks<M, S>(
    kind: DataKind,
    expected: usize,
    mut responses: S,
    timeout: Duration,
) -> Result<Vec<LoadAck>, ClientError>
where
    M: Ack,
    S: Stream<Item = Result<M, Status>> + Unpin,
{
    let mut acks = Vec::with_capacity(expected);
    loop {
        let next = with_timeout(kind.as_str(), timeout, responses.next()).await?;
        let Some(item) = next else { break };
        let message = item?;
        if !message.is_ok() {
            return Err(ClientError::LoadRejected {
                kind,
                code: message.ack_code(),
                text: message.ack_text().to_string(),
            });
        }
        tracing::debug!(%kind, code = message.ack_code(), text = message.ack_text(), "chunk acknowledged");
        acks.push(LoadAck {
            code: message.ack_code(),
            text: message.ack_text().to_string(),
        });
    }
    if acks.len() != expected {
        tracing::warn!(%kind, expected, received = acks.len(), "acknowledgement count mismatch");
    }
    Ok(acks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ack(code: u32, text: &str) -> Result<wire::SessionGridResponse, Status> {
        Ok(wire::SessionGridResponse {
            code,
            text: text.to_string(),
        })
    }

    #[tokio::test]
    async fn all_chunks_acknowledged() {
        let stream = tokio_stream::iter(vec![ack(0, "OK"), ack(0, "OK")]);
        let acks = collect_acks(DataKind::Grid, 2, stream, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(acks.len(), 2);
        assert!(acks.iter().all(|a| a.code == wire::CODE_OK));
    }

    #[tokio::test]
    async fn zero_chunks_yield_zero_acks() {
        let stream = tokio_stream::iter(Vec::<Result<wire::SessionGridResponse, Status>>::new());
        let acks = collect_acks(DataKind::Grid, 0, stream, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(acks.is_empty());
    }

    #[tokio::test]
    async fn non_success_code_fails_fast() {
        let stream = tokio_stream::iter(vec![ack(0, "OK"), ack(3, "invalid argument")]);
        let err = collect_acks(DataKind::Grid, 2, stream, Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            ClientError::LoadRejected { kind, code, text } => {
                assert_eq!(kind, DataKind::Grid);
                assert_eq!(code, 3);
                assert_eq!(text, "invalid argument");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn grpc_status_propagates() {
        let stream = tokio_stream::iter(vec![
            ack(0, "OK"),
            Err(Status::not_found("session not found")),
        ]);
        let err = collect_acks(DataKind::Trips, 2, stream, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_stream_times_out() {
        let stream = tokio_stream::pending::<Result<wire::SessionGridResponse, Status>>();
        let err = collect_acks(DataKind::Grid, 1, stream, Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::TimedOut { .. }));
    }

    #[test]
    fn default_chunk_size_matches_server_cap() {
        assert_eq!(LoadOptions::default().chunk_size, MAX_CHUNK_ENTITIES);
    }
}
