//! Hand-written gRPC bindings for the simulation service.
//!
//! The service surface is small and the wire types live in
//! [`gridflow_wire`], so the bindings are written directly against
//! [`tonic::client::Grpc`] with the prost codec instead of going through a
//! codegen step: one method per RPC, unary for session lifecycle,
//! bidirectional streaming for bulk loads and stepping.

use tokio_stream::Stream;
use tonic::Request;
use tonic::Status;
use tonic::client::Grpc;
use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};

use gridflow_wire as wire;

/// Fully qualified gRPC service name.
pub const SERVICE_NAME: &str = "gridflow.v1.Simulation";

/// Client for the simulation service.
#[derive(Debug, Clone)]
pub struct SimulationClient {
    inner: Grpc<Channel>,
}

impl SimulationClient {
    /// Dial `uri` (scheme included, e.g. `http://127.0.0.1:50051`) and wrap
    /// the resulting channel.
    pub async fn connect(uri: String) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(uri)?.connect().await?;
        Ok(Self::new(channel))
    }

    /// Wrap an already-established channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: Grpc::new(channel),
        }
    }

    async fn ready(&mut self) -> Result<(), Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unknown(format!("transport not ready: {e}")))
    }

    /// Open a new simulation session.
    pub async fn new_session(
        &mut self,
        request: wire::SessionReq,
    ) -> Result<wire::NewSessionResponse, Status> {
        self.ready().await?;
        let codec: ProstCodec<wire::SessionReq, wire::NewSessionResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static("/gridflow.v1.Simulation/NewSession");
        let response = self.inner.unary(Request::new(request), path, codec).await?;
        Ok(response.into_inner())
    }

    /// Probe an existing session.
    pub async fn info_session(
        &mut self,
        request: wire::Uuid4,
    ) -> Result<wire::InfoSessionResponse, Status> {
        self.ready().await?;
        let codec: ProstCodec<wire::Uuid4, wire::InfoSessionResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static("/gridflow.v1.Simulation/InfoSession");
        let response = self.inner.unary(Request::new(request), path, codec).await?;
        Ok(response.into_inner())
    }

    /// Stream grid-cell chunks into a session; one acknowledgement per chunk.
    pub async fn push_session_grid<S>(
        &mut self,
        requests: S,
    ) -> Result<Streaming<wire::SessionGridResponse>, Status>
    where
        S: Stream<Item = wire::SessionGrid> + Send + 'static,
    {
        self.ready().await?;
        let codec: ProstCodec<wire::SessionGrid, wire::SessionGridResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static("/gridflow.v1.Simulation/PushSessionGrid");
        let response = self
            .inner
            .streaming(Request::new(requests), path, codec)
            .await?;
        Ok(response.into_inner())
    }

    /// Stream conflict-zone chunks into a session.
    pub async fn push_session_conflict_zones<S>(
        &mut self,
        requests: S,
    ) -> Result<Streaming<wire::SessionConflictZonesResponse>, Status>
    where
        S: Stream<Item = wire::SessionConflictZones> + Send + 'static,
    {
        self.ready().await?;
        let codec: ProstCodec<wire::SessionConflictZones, wire::SessionConflictZonesResponse> =
            ProstCodec::default();
        let path = PathAndQuery::from_static("/gridflow.v1.Simulation/PushSessionConflictZones");
        let response = self
            .inner
            .streaming(Request::new(requests), path, codec)
            .await?;
        Ok(response.into_inner())
    }

    /// Stream traffic-light chunks into a session.
    pub async fn push_session_tls<S>(
        &mut self,
        requests: S,
    ) -> Result<Streaming<wire::SessionTlsResponse>, Status>
    where
        S: Stream<Item = wire::SessionTls> + Send + 'static,
    {
        self.ready().await?;
        let codec: ProstCodec<wire::SessionTls, wire::SessionTlsResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static("/gridflow.v1.Simulation/PushSessionTLS");
        let response = self
            .inner
            .streaming(Request::new(requests), path, codec)
            .await?;
        Ok(response.into_inner())
    }

    /// Stream trip chunks into a session.
    pub async fn push_session_trip<S>(
        &mut self,
        requests: S,
    ) -> Result<Streaming<wire::SessionTripResponse>, Status>
    where
        S: Stream<Item = wire::SessionTrip> + Send + 'static,
    {
        self.ready().await?;
        let codec: ProstCodec<wire::SessionTrip, wire::SessionTripResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static("/gridflow.v1.Simulation/PushSessionTrip");
        let response = self
            .inner
            .streaming(Request::new(requests), path, codec)
            .await?;
        Ok(response.into_inner())
    }

    /// Stream step requests and receive one state bundle per accepted step.
    pub async fn simulation_step_session<S>(
        &mut self,
        requests: S,
    ) -> Result<Streaming<wire::SessionStepResponse>, Status>
    where
        S: Stream<Item = wire::SessionStep> + Send + 'static,
    {
        self.ready().await?;
        let codec: ProstCodec<wire::SessionStep, wire::SessionStepResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static("/gridflow.v1.Simulation/SimulationStepSession");
        let response = self
            .inner
            .streaming(Request::new(requests), path, codec)
            .await?;
        Ok(response.into_inner())
    }
}
