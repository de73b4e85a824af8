//! The step driver.
//!
//! One bidirectional stream carries the whole run: the client emits one
//! `SessionStep` request per desired step (eagerly; each names only the
//! session id) and reads back one `SessionStepResponse` per accepted step.
//! The server assigns timestamps in non-decreasing order, one response per
//! request, in request order.
//!
//! A stream that closes before all requested steps were answered means the
//! simulation ended early; the collected prefix is returned, not an error.

use std::time::Duration;

use tokio_stream::{Stream, StreamExt};
use tonic::Status;
use uuid::Uuid;

use gridflow_wire as wire;

use crate::error::ClientError;
use crate::rpc::SimulationClient;
use crate::with_timeout;

/// Drive `steps` simulation steps and collect the per-step state bundles.
pub async fn run_steps(
    client: &mut SimulationClient,
    session: Uuid,
    steps: u64,
    timeout: Duration,
) -> Result<Vec<wire::SessionStepResponse>, ClientError> {
    let requests: Vec<wire::SessionStep> = (0..steps)
        .map(|_| wire::SessionStep {
            session_id: Some(wire::Uuid4 {
                value: session.to_string(),
            }),
        })
        .collect();
    let responses = client
        .simulation_step_session(tokio_stream::iter(requests))
        .await?;
    collect_steps(steps, responses, timeout).await
}

/// Read up to `requested` step responses off a stream.
///
/// Generic over the stream so tests can drive it with synthetic responses.
async fn collect_steps<S>(
    requested: u64,
    mut responses: S,
    timeout: Duration,
) -> Result<Vec<wire::SessionStepResponse>, ClientError>
where
    S: Stream<Item = Result<wire::SessionStepResponse, Status>> + Unpin,
{
    let mut collected: Vec<wire::SessionStepResponse> = Vec::with_capacity(requested as usize);
    let mut last_timestamp: Option<i64> = None;

    while (collected.len() as u64) < requested {
        let next = with_timeout("SimulationStepSession", timeout, responses.next()).await?;
        let Some(item) = next else {
            // The server closed the stream: simulation ended early.
            tracing::warn!(
                received = collected.len(),
                requested,
                "step stream ended before all requested steps"
            );
            break;
        };
        let response = item?;
        if response.code != wire::CODE_OK {
            return Err(ClientError::StepRejected {
                index: collected.len(),
                code: response.code,
                text: response.text,
            });
        }
        // The ordering guarantee belongs to the server; a regression here is
        // a diagnostic, not a reason to drop data already received.
        if let Some(previous) = last_timestamp {
            if response.timestamp < previous {
                tracing::warn!(
                    previous,
                    current = response.timestamp,
                    "step timestamps regressed"
                );
            }
        }
        last_timestamp = Some(response.timestamp);
        collected.push(response);
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(timestamp: i64) -> Result<wire::SessionStepResponse, Status> {
        Ok(wire::SessionStepResponse {
            code: wire::CODE_OK,
            text: "OK".to_string(),
            timestamp,
            vehicle_data: Vec::new(),
            tls_data: Vec::new(),
        })
    }

    #[tokio::test]
    async fn collects_one_response_per_step() {
        let stream = tokio_stream::iter((0..50).map(step).collect::<Vec<_>>());
        let collected = collect_steps(50, stream, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(collected.len(), 50);
        let timestamps: Vec<i64> = collected.iter().map(|r| r.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_unstable();
        assert_eq!(timestamps, sorted, "timestamps must be non-decreasing");
        sorted.dedup();
        assert_eq!(sorted.len(), 50, "timestamps must be distinct");
    }

    #[tokio::test]
    async fn early_close_returns_the_prefix() {
        let stream = tokio_stream::iter(vec![step(0), step(1), step(2)]);
        let collected = collect_steps(50, stream, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(collected.len(), 3);
    }

    #[tokio::test]
    async fn stops_reading_after_requested_count() {
        let stream = tokio_stream::iter((0..10).map(step).collect::<Vec<_>>());
        let collected = collect_steps(4, stream, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(collected.len(), 4);
        assert_eq!(collected.last().unwrap().timestamp, 3);
    }

    #[tokio::test]
    async fn non_success_code_is_an_error() {
        let rejected = Ok(wire::SessionStepResponse {
            code: 10,
            text: "aborted".to_string(),
            timestamp: 2,
            vehicle_data: Vec::new(),
            tls_data: Vec::new(),
        });
        let stream = tokio_stream::iter(vec![step(0), step(1), rejected]);
        let err = collect_steps(5, stream, Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            ClientError::StepRejected { index, code, .. } => {
                assert_eq!(index, 2);
                assert_eq!(code, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn timestamp_regression_still_collects() {
        // The regression is logged, not fatal; reporting covers what arrived.
        let stream = tokio_stream::iter(vec![step(5), step(3), step(7)]);
        let collected = collect_steps(3, stream, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(collected.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_stream_times_out() {
        let stream = tokio_stream::pending::<Result<wire::SessionStepResponse, Status>>();
        let err = collect_steps(1, stream, Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn zero_steps_reads_nothing() {
        let stream = tokio_stream::iter(Vec::<Result<wire::SessionStepResponse, Status>>::new());
        let collected = collect_steps(0, stream, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(collected.is_empty());
    }
}
