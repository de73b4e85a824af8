//! Gridflow Wire Protocol Types
//!
//! This crate defines the Protobuf message types of the traffic simulation
//! service's RPC surface. The messages are hand-written with `prost` derives
//! and explicit field tags; there is no codegen step, so the contract is
//! exactly what this file says it is.
//!
//! # Message Categories
//!
//! - **Session lifecycle** (unary): `SessionReq` → `NewSessionResponse`,
//!   `Uuid4` → `InfoSessionResponse`
//! - **Bulk loads** (bidirectional streams): one `Session*` chunk message per
//!   data kind, acknowledged chunk-by-chunk with a `(code, text)` response
//! - **Stepping** (bidirectional stream): `SessionStep` requests answered by
//!   `SessionStepResponse` bundles of vehicle and signal state
//!
//! Scenario-side types ([`gridflow_scenario`]) convert into their wire
//! counterparts via `From`; optional successor links become the `-1`
//! sentinel only here.

#![deny(unsafe_code)]

use prost::Message;

/// Wire sentinel for "no successor cell".
pub const NO_CELL: i64 = -1;

/// Application status code meaning success, shared by every acknowledgement.
pub const CODE_OK: u32 = 0;

// ============================================================================
// Enumerations
// ============================================================================

/// Classification of a cell's role. Values are fixed by the wire contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ZoneType {
    Undefined = 0,
    Birth = 1,
    Death = 2,
    Coordination = 3,
    Common = 4,
    Isolated = 5,
    LaneForBus = 6,
    Transit = 7,
    Crosswalk = 8,
}

/// Kind of agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AgentType {
    Undefined = 0,
    Car = 1,
    Bus = 2,
    Taxi = 3,
    Pedestrian = 4,
}

/// Declared priority between the two streams of a conflict zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ConflictWinner {
    Undefined = 0,
    Equal = 1,
    First = 2,
    Second = 3,
}

/// Geometry class of a conflict zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ConflictZoneType {
    Undefined = 0,
}

/// Vehicle-generation policy of a trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TripType {
    Undefined = 0,
    Scheduled = 1,
    Random = 2,
}

/// Driving behaviour of generated agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BehaviourType {
    Undefined = 0,
    Aggressive = 1,
    Regular = 2,
    Cooperative = 3,
}

/// Kind of a signal group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum GroupType {
    Undefined = 0,
    Vehicle = 1,
    Pedestrian = 2,
}

// ============================================================================
// Session Lifecycle Messages
// ============================================================================

/// A 128-bit session identifier in canonical textual form.
#[derive(Clone, PartialEq, Message)]
pub struct Uuid4 {
    #[prost(string, tag = "1")]
    pub value: String,
}

/// Request to open a simulation session.
#[derive(Clone, PartialEq, Message)]
pub struct SessionReq {
    /// Spatial reference system id; 0 = planar Euclidean, 4326 = WGS84.
    #[prost(int32, tag = "1")]
    pub srid: i32,
}

/// Response carrying the freshly minted session id.
#[derive(Clone, PartialEq, Message)]
pub struct NewSessionResponse {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub text: String,
    #[prost(message, optional, tag = "3")]
    pub id: Option<Uuid4>,
}

/// Server-side session descriptor.
#[derive(Clone, PartialEq, Message)]
pub struct Session {
    #[prost(message, optional, tag = "1")]
    pub id: Option<Uuid4>,
}

/// Response to a session presence probe.
#[derive(Clone, PartialEq, Message)]
pub struct InfoSessionResponse {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub text: String,
    #[prost(message, optional, tag = "3")]
    pub data: Option<Session>,
}

// ============================================================================
// Geometry
// ============================================================================

/// A 2-D world position.
#[derive(Clone, PartialEq, Message)]
pub struct Point {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
}

// ============================================================================
// Grid Messages
// ============================================================================

/// Atomic road segment. Successor links are cell ids or [`NO_CELL`].
#[derive(Clone, PartialEq, Message)]
pub struct Cell {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(message, optional, tag = "2")]
    pub geom: Option<Point>,
    #[prost(enumeration = "ZoneType", tag = "3")]
    pub zone_type: i32,
    #[prost(int64, tag = "4")]
    pub speed_limit: i64,
    #[prost(int64, tag = "5")]
    pub left_node: i64,
    #[prost(int64, tag = "6")]
    pub forward_node: i64,
    #[prost(int64, tag = "7")]
    pub right_node: i64,
    /// Mesoscopic-link grouping id.
    #[prost(int64, tag = "8")]
    pub meso_link_id: i64,
}

impl Cell {
    /// Decoded zone classification; unknown values read as `Undefined`.
    pub fn zone(&self) -> ZoneType {
        ZoneType::try_from(self.zone_type).unwrap_or(ZoneType::Undefined)
    }
}

/// One chunk of grid cells for a session.
#[derive(Clone, PartialEq, Message)]
pub struct SessionGrid {
    #[prost(message, optional, tag = "1")]
    pub session_id: Option<Uuid4>,
    #[prost(message, repeated, tag = "2")]
    pub data: Vec<Cell>,
}

/// Per-chunk acknowledgement for a grid push.
#[derive(Clone, PartialEq, Message)]
pub struct SessionGridResponse {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub text: String,
}

// ============================================================================
// Conflict Zone Messages
// ============================================================================

/// Overlap of two directed transitions: `source_x → target_x` on the first
/// road, `source_y → target_y` on the crossing road.
#[derive(Clone, PartialEq, Message)]
pub struct ConflictZone {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub source_x: i64,
    #[prost(int64, tag = "3")]
    pub target_x: i64,
    #[prost(int64, tag = "4")]
    pub source_y: i64,
    #[prost(int64, tag = "5")]
    pub target_y: i64,
    #[prost(enumeration = "ConflictWinner", tag = "6")]
    pub conflict_winner: i32,
    #[prost(enumeration = "ConflictZoneType", tag = "7")]
    pub conflict_type: i32,
}

/// One chunk of conflict zones for a session.
#[derive(Clone, PartialEq, Message)]
pub struct SessionConflictZones {
    #[prost(message, optional, tag = "1")]
    pub session_id: Option<Uuid4>,
    #[prost(message, repeated, tag = "2")]
    pub data: Vec<ConflictZone>,
}

/// Per-chunk acknowledgement for a conflict-zone push.
#[derive(Clone, PartialEq, Message)]
pub struct SessionConflictZonesResponse {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub text: String,
}

// ============================================================================
// Traffic Light Messages
// ============================================================================

/// A signal group: the cells it controls and its signal cycle.
#[derive(Clone, PartialEq, Message)]
pub struct Group {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub label: String,
    /// Optional polyline describing the group's physical extent.
    #[prost(message, repeated, tag = "3")]
    pub geom: Vec<Point>,
    #[prost(int64, repeated, tag = "4")]
    pub cells: Vec<i64>,
    /// Signal symbols, one per phase ("g", "y", "r").
    #[prost(string, repeated, tag = "5")]
    pub signals: Vec<String>,
    /// Movement labels; informational only.
    #[prost(string, repeated, tag = "6")]
    pub movements: Vec<String>,
    #[prost(double, tag = "7")]
    pub crosswalk_length: f64,
    #[prost(enumeration = "GroupType", tag = "8")]
    pub group_type: i32,
}

/// A physical signal installation with its groups and shared phase durations.
#[derive(Clone, PartialEq, Message)]
pub struct TrafficLight {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(message, optional, tag = "2")]
    pub geom: Option<Point>,
    #[prost(message, repeated, tag = "3")]
    pub groups: Vec<Group>,
    /// Phase durations, one per position in every group's signal cycle.
    #[prost(int64, repeated, tag = "4")]
    pub times: Vec<i64>,
    /// Signal-kind labels; informational only.
    #[prost(string, repeated, tag = "5")]
    pub signals_kinds: Vec<String>,
}

/// One chunk of traffic lights for a session.
#[derive(Clone, PartialEq, Message)]
pub struct SessionTls {
    #[prost(message, optional, tag = "1")]
    pub session_id: Option<Uuid4>,
    #[prost(message, repeated, tag = "2")]
    pub data: Vec<TrafficLight>,
}

/// Per-chunk acknowledgement for a traffic-light push.
#[derive(Clone, PartialEq, Message)]
pub struct SessionTlsResponse {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub text: String,
}

// ============================================================================
// Trip Messages
// ============================================================================

/// A vehicle-generation rule.
#[derive(Clone, PartialEq, Message)]
pub struct Trip {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(enumeration = "TripType", tag = "2")]
    pub trip_type: i32,
    #[prost(int64, tag = "3")]
    pub from_node: i64,
    #[prost(int64, tag = "4")]
    pub to_node: i64,
    #[prost(int64, tag = "5")]
    pub initial_speed: i64,
    /// Per-step spawn probability in [0, 1].
    #[prost(double, tag = "6")]
    pub probability: f64,
    #[prost(enumeration = "AgentType", tag = "7")]
    pub agent_type: i32,
    #[prost(enumeration = "BehaviourType", tag = "8")]
    pub behaviour_type: i32,
    /// Departure time for scheduled trips.
    #[prost(int64, tag = "9")]
    pub time: i64,
    /// Activity window for windowed generation; unused when zero.
    #[prost(int64, tag = "10")]
    pub start_time: i64,
    #[prost(int64, tag = "11")]
    pub end_time: i64,
    #[prost(int64, tag = "12")]
    pub relax_time: i64,
    /// Intermediate transit stops.
    #[prost(int64, repeated, tag = "13")]
    pub transits: Vec<i64>,
}

/// One chunk of trips for a session.
#[derive(Clone, PartialEq, Message)]
pub struct SessionTrip {
    #[prost(message, optional, tag = "1")]
    pub session_id: Option<Uuid4>,
    #[prost(message, repeated, tag = "2")]
    pub data: Vec<Trip>,
}

/// Per-chunk acknowledgement for a trip push.
#[derive(Clone, PartialEq, Message)]
pub struct SessionTripResponse {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub text: String,
}

// ============================================================================
// Step Messages
// ============================================================================

/// Request to advance the session by one simulation step.
#[derive(Clone, PartialEq, Message)]
pub struct SessionStep {
    #[prost(message, optional, tag = "1")]
    pub session_id: Option<Uuid4>,
}

/// Per-step state of one vehicle.
#[derive(Clone, PartialEq, Message)]
pub struct VehicleState {
    #[prost(int64, tag = "1")]
    pub vehicle_id: i64,
    #[prost(enumeration = "AgentType", tag = "2")]
    pub vehicle_type: i32,
    #[prost(int64, tag = "3")]
    pub speed: i64,
    #[prost(double, tag = "4")]
    pub bearing: f64,
    /// The cell the vehicle head occupies.
    #[prost(int64, tag = "5")]
    pub cell: i64,
    /// Lookahead cells the vehicle occupies or is about to traverse.
    #[prost(int64, repeated, tag = "6")]
    pub intermediate_cells: Vec<i64>,
    #[prost(message, optional, tag = "7")]
    pub point: Option<Point>,
    #[prost(double, tag = "8")]
    pub travel_time: f64,
    /// The trip generator that produced this vehicle.
    #[prost(int64, tag = "9")]
    pub trip_id: i64,
    /// Trailing cells occupied by multi-cell vehicles.
    #[prost(int64, repeated, tag = "10")]
    pub tail_cells: Vec<i64>,
}

impl VehicleState {
    /// Decoded agent kind; unknown values read as `Undefined`.
    pub fn agent(&self) -> AgentType {
        AgentType::try_from(self.vehicle_type).unwrap_or(AgentType::Undefined)
    }
}

/// Per-step state of one signal group.
#[derive(Clone, PartialEq, Message)]
pub struct TlsGroupState {
    #[prost(int64, tag = "1")]
    pub id: i64,
    /// Currently active signal symbol.
    #[prost(string, tag = "2")]
    pub signal: String,
}

/// Per-step state of one traffic light.
#[derive(Clone, PartialEq, Message)]
pub struct TlsState {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(message, repeated, tag = "2")]
    pub groups: Vec<TlsGroupState>,
}

/// One simulation step's results.
#[derive(Clone, PartialEq, Message)]
pub struct SessionStepResponse {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub text: String,
    /// Logical step index assigned by the server; non-decreasing across a
    /// stream.
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
    #[prost(message, repeated, tag = "4")]
    pub vehicle_data: Vec<VehicleState>,
    #[prost(message, repeated, tag = "5")]
    pub tls_data: Vec<TlsState>,
}

// ============================================================================
// Acknowledgement Trait
// ============================================================================

/// Common view of the `(code, text)` pair every acknowledgement carries.
///
/// Lets the loader drain any push-response stream with one generic routine.
pub trait Ack {
    fn ack_code(&self) -> u32;
    fn ack_text(&self) -> &str;

    fn is_ok(&self) -> bool {
        self.ack_code() == CODE_OK
    }
}

macro_rules! impl_ack {
    ($($ty:ty),* $(,)?) => {
        $(impl Ack for $ty {
            fn ack_code(&self) -> u32 {
                self.code
            }
            fn ack_text(&self) -> &str {
                &self.text
            }
        })*
    };
}

impl_ack!(
    SessionGridResponse,
    SessionConflictZonesResponse,
    SessionTlsResponse,
    SessionTripResponse,
    SessionStepResponse,
);

// ============================================================================
// Conversions from Scenario Types
// ============================================================================

impl From<gridflow_scenario::ZoneType> for ZoneType {
    fn from(zone: gridflow_scenario::ZoneType) -> Self {
        use gridflow_scenario::ZoneType as Z;
        match zone {
            Z::Undefined => Self::Undefined,
            Z::Birth => Self::Birth,
            Z::Death => Self::Death,
            Z::Coordination => Self::Coordination,
            Z::Common => Self::Common,
            Z::Isolated => Self::Isolated,
            Z::BusLane => Self::LaneForBus,
            Z::Transit => Self::Transit,
            Z::Crosswalk => Self::Crosswalk,
        }
    }
}

impl From<ZoneType> for gridflow_scenario::ZoneType {
    fn from(zone: ZoneType) -> Self {
        match zone {
            ZoneType::Undefined => Self::Undefined,
            ZoneType::Birth => Self::Birth,
            ZoneType::Death => Self::Death,
            ZoneType::Coordination => Self::Coordination,
            ZoneType::Common => Self::Common,
            ZoneType::Isolated => Self::Isolated,
            ZoneType::LaneForBus => Self::BusLane,
            ZoneType::Transit => Self::Transit,
            ZoneType::Crosswalk => Self::Crosswalk,
        }
    }
}

impl From<gridflow_scenario::AgentType> for AgentType {
    fn from(agent: gridflow_scenario::AgentType) -> Self {
        use gridflow_scenario::AgentType as A;
        match agent {
            A::Undefined => Self::Undefined,
            A::Car => Self::Car,
            A::Bus => Self::Bus,
            A::Taxi => Self::Taxi,
            A::Pedestrian => Self::Pedestrian,
        }
    }
}

impl From<AgentType> for gridflow_scenario::AgentType {
    fn from(agent: AgentType) -> Self {
        match agent {
            AgentType::Undefined => Self::Undefined,
            AgentType::Car => Self::Car,
            AgentType::Bus => Self::Bus,
            AgentType::Taxi => Self::Taxi,
            AgentType::Pedestrian => Self::Pedestrian,
        }
    }
}

impl From<gridflow_scenario::ConflictWinner> for ConflictWinner {
    fn from(winner: gridflow_scenario::ConflictWinner) -> Self {
        use gridflow_scenario::ConflictWinner as W;
        match winner {
            W::Undefined => Self::Undefined,
            W::Equal => Self::Equal,
            W::First => Self::First,
            W::Second => Self::Second,
        }
    }
}

impl From<gridflow_scenario::ConflictKind> for ConflictZoneType {
    fn from(kind: gridflow_scenario::ConflictKind) -> Self {
        match kind {
            gridflow_scenario::ConflictKind::Undefined => Self::Undefined,
        }
    }
}

impl From<gridflow_scenario::TripKind> for TripType {
    fn from(kind: gridflow_scenario::TripKind) -> Self {
        use gridflow_scenario::TripKind as K;
        match kind {
            K::Undefined => Self::Undefined,
            K::Scheduled => Self::Scheduled,
            K::Random => Self::Random,
        }
    }
}

impl From<gridflow_scenario::Behaviour> for BehaviourType {
    fn from(behaviour: gridflow_scenario::Behaviour) -> Self {
        use gridflow_scenario::Behaviour as B;
        match behaviour {
            B::Undefined => Self::Undefined,
            B::Aggressive => Self::Aggressive,
            B::Regular => Self::Regular,
            B::Cooperative => Self::Cooperative,
        }
    }
}

impl From<gridflow_scenario::GroupKind> for GroupType {
    fn from(kind: gridflow_scenario::GroupKind) -> Self {
        use gridflow_scenario::GroupKind as K;
        match kind {
            K::Undefined => Self::Undefined,
            K::Vehicle => Self::Vehicle,
            K::Pedestrian => Self::Pedestrian,
        }
    }
}

impl From<[f64; 2]> for Point {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl From<&gridflow_scenario::Cell> for Cell {
    fn from(cell: &gridflow_scenario::Cell) -> Self {
        Self {
            id: cell.id,
            geom: Some(cell.position.into()),
            zone_type: ZoneType::from(cell.zone) as i32,
            speed_limit: cell.speed_limit,
            left_node: cell.left.unwrap_or(NO_CELL),
            forward_node: cell.forward.unwrap_or(NO_CELL),
            right_node: cell.right.unwrap_or(NO_CELL),
            meso_link_id: cell.meso_link,
        }
    }
}

impl From<&gridflow_scenario::ConflictZone> for ConflictZone {
    fn from(zone: &gridflow_scenario::ConflictZone) -> Self {
        Self {
            id: zone.id,
            source_x: zone.first.from,
            target_x: zone.first.to,
            source_y: zone.second.from,
            target_y: zone.second.to,
            conflict_winner: ConflictWinner::from(zone.winner) as i32,
            conflict_type: ConflictZoneType::from(zone.kind) as i32,
        }
    }
}

impl From<&gridflow_scenario::SignalGroup> for Group {
    fn from(group: &gridflow_scenario::SignalGroup) -> Self {
        Self {
            id: group.id,
            label: group.label.clone(),
            geom: Vec::new(),
            cells: group.cells.clone(),
            signals: group
                .signals
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            movements: Vec::new(),
            crosswalk_length: group.crosswalk_length,
            group_type: GroupType::from(group.kind) as i32,
        }
    }
}

impl From<&gridflow_scenario::TrafficLight> for TrafficLight {
    fn from(light: &gridflow_scenario::TrafficLight) -> Self {
        Self {
            id: light.id,
            geom: Some(light.position.into()),
            groups: light.groups.iter().map(Into::into).collect(),
            times: light.phase_times.clone(),
            signals_kinds: Vec::new(),
        }
    }
}

impl From<&gridflow_scenario::Trip> for Trip {
    fn from(trip: &gridflow_scenario::Trip) -> Self {
        Self {
            id: trip.id,
            trip_type: TripType::from(trip.kind) as i32,
            from_node: trip.from,
            to_node: trip.to,
            initial_speed: trip.initial_speed,
            probability: trip.probability,
            agent_type: AgentType::from(trip.agent) as i32,
            behaviour_type: BehaviourType::from(trip.behaviour) as i32,
            time: 0,
            start_time: 0,
            end_time: 0,
            relax_time: 0,
            transits: Vec::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
