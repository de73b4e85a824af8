//! Session establishment.
//!
//! A session is the server-side container for one scenario's static data and
//! its evolving simulation state. The id returned by `NewSession` must
//! accompany every subsequent call; an empty or malformed id aborts the run
//! before any scenario data is pushed.

use std::time::Duration;

use uuid::Uuid;

use gridflow_wire as wire;

use crate::error::ClientError;
use crate::rpc::SimulationClient;
use crate::with_timeout;

/// Spatial reference system of a session's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Srid {
    /// Planar Euclidean coordinates.
    #[default]
    Euclidean,
    /// WGS84 geographic coordinates.
    Wgs84,
}

impl Srid {
    /// Numeric spatial-reference id on the wire.
    pub fn code(self) -> i32 {
        match self {
            Self::Euclidean => 0,
            Self::Wgs84 => 4326,
        }
    }
}

/// Open a new session and return its id.
pub async fn open(
    client: &mut SimulationClient,
    srid: Srid,
    timeout: Duration,
) -> Result<Uuid, ClientError> {
    let request = wire::SessionReq { srid: srid.code() };
    let response = with_timeout("NewSession", timeout, client.new_session(request)).await??;
    let id = session_id_from(response)?;
    tracing::info!(session = %id, "session created");
    Ok(id)
}

/// Check whether `session` is still known to the server.
pub async fn probe(
    client: &mut SimulationClient,
    session: Uuid,
    timeout: Duration,
) -> Result<bool, ClientError> {
    let request = wire::Uuid4 {
        value: session.to_string(),
    };
    let response = with_timeout("InfoSession", timeout, client.info_session(request)).await??;
    Ok(response.code == wire::CODE_OK && response.data.is_some())
}

/// Extract and parse the session id from a `NewSession` response.
fn session_id_from(response: wire::NewSessionResponse) -> Result<Uuid, ClientError> {
    if response.code != wire::CODE_OK {
        return Err(ClientError::SessionRejected {
            code: response.code,
            text: response.text,
        });
    }
    let value = response
        .id
        .map(|id| id.value)
        .filter(|v| !v.is_empty())
        .ok_or(ClientError::MissingSessionId)?;
    Ok(Uuid::parse_str(&value)?)
}
