//! Gridflow Scenario Core
//!
//! This crate contains the pure, deterministic scenario model: the static
//! road network (cells and their directed links), conflict zones, traffic
//! lights with their signal groups, and trip generators. It is the local
//! source of truth for everything the client pushes into a simulation
//! session.
//!
//! # Architecture Constraints
//!
//! The scenario core MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Depend on the wire encoding or the transport
//! - Use ambient randomness
//!
//! Wire conversion lives in `gridflow-wire`; all structural invariants are
//! checked here, before anything leaves the process.

#![deny(unsafe_code)]

pub mod crossing;

use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Identifier of a cell, unique within one scenario (and one session).
pub type CellId = i64;

// ============================================================================
// Closed Enumerations
// ============================================================================

/// Classification of a cell's role in the network.
///
/// `Undefined` exists so that decoding never has to invent a meaning for an
/// unknown value; it is not a legal zone for a constructed scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneType {
    Undefined,
    /// Vehicles enter the network here.
    Birth,
    /// Vehicles leave the network here.
    Death,
    Coordination,
    Common,
    Isolated,
    BusLane,
    Transit,
    Crosswalk,
}

impl ZoneType {
    /// Lowercase label used in reporting output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Birth => "birth",
            Self::Death => "death",
            Self::Coordination => "coordination",
            Self::Common => "common",
            Self::Isolated => "isolated",
            Self::BusLane => "lane_for_bus",
            Self::Transit => "transit",
            Self::Crosswalk => "crosswalk",
        }
    }
}

/// Kind of agent a trip produces (or a vehicle state reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentType {
    Undefined,
    Car,
    Bus,
    Taxi,
    Pedestrian,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Car => "car",
            Self::Bus => "bus",
            Self::Taxi => "taxi",
            Self::Pedestrian => "pedestrian",
        }
    }
}

/// Declared priority between the two streams of a conflict zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictWinner {
    Undefined,
    /// Neither stream has declared priority.
    Equal,
    /// The first stream has priority.
    First,
    /// The second (crossing) stream has priority.
    Second,
}

/// Tag describing the geometry class of a conflict zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    Undefined,
}

/// Vehicle-generation policy of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripKind {
    Undefined,
    /// A single departure at a fixed time.
    Scheduled,
    /// Independent random arrivals with a per-step probability.
    Random,
}

/// Driving behaviour of agents generated by a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behaviour {
    Undefined,
    Aggressive,
    Regular,
    Cooperative,
}

/// Kind of a signal group within a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Undefined,
    Vehicle,
    Pedestrian,
}

/// A single signal symbol within a group's cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Green,
    Amber,
    Red,
}

impl Signal {
    /// Wire symbol for this signal.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "g",
            Self::Amber => "y",
            Self::Red => "r",
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Atomic road segment.
///
/// Links are `None` where no successor exists; the wire sentinel `-1` appears
/// only at the encoding boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub position: [f64; 2],
    pub zone: ZoneType,
    pub speed_limit: i64,
    pub forward: Option<CellId>,
    pub left: Option<CellId>,
    pub right: Option<CellId>,
    /// Mesoscopic-link grouping id; 0 when unused.
    pub meso_link: i64,
}

/// A directed cell-to-cell transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CellId,
    pub to: CellId,
}

/// Spatial overlap of two transitions on different roads, with a declared
/// priority resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictZone {
    pub id: i64,
    pub first: Transition,
    pub second: Transition,
    pub winner: ConflictWinner,
    pub kind: ConflictKind,
}

/// A signal-controlled subset of cells within a traffic light.
///
/// `signals` is this group's cycle; its length must equal the owning light's
/// `phase_times` length.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalGroup {
    pub id: i64,
    pub label: String,
    pub cells: Vec<CellId>,
    pub signals: Vec<Signal>,
    pub kind: GroupKind,
    /// Physical length of the crossing; only meaningful for pedestrian groups.
    pub crosswalk_length: f64,
}

/// A physical signal installation.
///
/// `phase_times` holds one duration per position in the signal cycle and is
/// shared across all groups of the light.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLight {
    pub id: i64,
    pub position: [f64; 2],
    pub groups: Vec<SignalGroup>,
    pub phase_times: Vec<i64>,
}

/// A vehicle-generation rule: spawn agents at a birth cell, route them toward
/// a death cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: i64,
    pub kind: TripKind,
    pub from: CellId,
    pub to: CellId,
    pub initial_speed: i64,
    /// Per-step spawn probability in [0, 1].
    pub probability: f64,
    pub agent: AgentType,
    pub behaviour: Behaviour,
}

// ============================================================================
// Validation
// ============================================================================

/// Which directed link of a cell a validation finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Forward,
    Left,
    Right,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural defects a scenario can carry.
///
/// These mirror the invariants the server enforces; checking them locally
/// keeps a broken scenario from ever reaching the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("cell id {id} appears more than once")]
    DuplicateCell { id: CellId },

    #[error("cell {cell} has a {link} link to unknown cell {target}")]
    DanglingLink {
        cell: CellId,
        link: LinkKind,
        target: CellId,
    },

    #[error("conflict zone {zone} references unknown cell {cell}")]
    ConflictReference { zone: i64, cell: CellId },

    #[error(
        "traffic light {light} group {group} has {signals} signals but the light has {phases} phase times"
    )]
    PhaseMismatch {
        light: i64,
        group: i64,
        signals: usize,
        phases: usize,
    },

    #[error("traffic light {light} group {group} controls unknown cell {cell}")]
    GroupCellMissing { light: i64, group: i64, cell: CellId },

    #[error("trip {trip} does not originate at a birth cell (from {cell})")]
    TripOrigin { trip: i64, cell: CellId },

    #[error("trip {trip} does not terminate at a death cell (to {cell})")]
    TripDestination { trip: i64, cell: CellId },

    #[error("trip {trip} has spawn probability {value} outside [0, 1]")]
    Probability { trip: i64, value: f64 },
}

// ============================================================================
// Scenario
// ============================================================================

/// The complete static description of one session's road network and demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenario {
    pub cells: Vec<Cell>,
    pub conflict_zones: Vec<ConflictZone>,
    pub traffic_lights: Vec<TrafficLight>,
    pub trips: Vec<Trip>,
}

impl Scenario {
    /// Look up a cell by id.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    fn has_cell(&self, id: CellId) -> bool {
        self.cell(id).is_some()
    }

    fn zone_of(&self, id: CellId) -> ZoneType {
        self.cell(id).map_or(ZoneType::Undefined, |c| c.zone)
    }

    /// Check every structural invariant, returning the first defect found.
    ///
    /// The order of checks follows the load order: cells first, then the
    /// entities that reference them.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        // Cell ids must be unique.
        for (i, cell) in self.cells.iter().enumerate() {
            if self.cells[..i].iter().any(|c| c.id == cell.id) {
                return Err(ScenarioError::DuplicateCell { id: cell.id });
            }
        }

        // Every link target must resolve.
        for cell in &self.cells {
            let links = [
                (LinkKind::Forward, cell.forward),
                (LinkKind::Left, cell.left),
                (LinkKind::Right, cell.right),
            ];
            for (link, target) in links {
                if let Some(target) = target {
                    if !self.has_cell(target) {
                        return Err(ScenarioError::DanglingLink {
                            cell: cell.id,
                            link,
                            target,
                        });
                    }
                }
            }
        }

        // Conflict zones reference four existing cells.
        for zone in &self.conflict_zones {
            for cell in [
                zone.first.from,
                zone.first.to,
                zone.second.from,
                zone.second.to,
            ] {
                if !self.has_cell(cell) {
                    return Err(ScenarioError::ConflictReference {
                        zone: zone.id,
                        cell,
                    });
                }
            }
        }

        // Signal cycles line up with phase durations, controlled cells exist.
        for light in &self.traffic_lights {
            for group in &light.groups {
                if group.signals.len() != light.phase_times.len() {
                    return Err(ScenarioError::PhaseMismatch {
                        light: light.id,
                        group: group.id,
                        signals: group.signals.len(),
                        phases: light.phase_times.len(),
                    });
                }
                for &cell in &group.cells {
                    if !self.has_cell(cell) {
                        return Err(ScenarioError::GroupCellMissing {
                            light: light.id,
                            group: group.id,
                            cell,
                        });
                    }
                }
            }
        }

        // Trips start at birth cells, end at death cells, with a sane
        // probability.
        for trip in &self.trips {
            if self.zone_of(trip.from) != ZoneType::Birth {
                return Err(ScenarioError::TripOrigin {
                    trip: trip.id,
                    cell: trip.from,
                });
            }
            if self.zone_of(trip.to) != ZoneType::Death {
                return Err(ScenarioError::TripDestination {
                    trip: trip.id,
                    cell: trip.to,
                });
            }
            if !(0.0..=1.0).contains(&trip.probability) {
                return Err(ScenarioError::Probability {
                    trip: trip.id,
                    value: trip.probability,
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_cell(id: CellId, zone: ZoneType) -> Cell {
        Cell {
            id,
            position: [id as f64, 0.0],
            zone,
            speed_limit: 1,
            forward: None,
            left: None,
            right: None,
            meso_link: 0,
        }
    }

    fn two_cell_scenario() -> Scenario {
        let mut birth = plain_cell(0, ZoneType::Birth);
        birth.forward = Some(1);
        Scenario {
            cells: vec![birth, plain_cell(1, ZoneType::Death)],
            ..Default::default()
        }
    }

    #[test]
    fn minimal_scenario_validates() {
        assert_eq!(two_cell_scenario().validate(), Ok(()));
    }

    #[test]
    fn duplicate_cell_id_rejected() {
        let mut scenario = two_cell_scenario();
        scenario.cells.push(plain_cell(0, ZoneType::Common));
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::DuplicateCell { id: 0 })
        );
    }

    #[test]
    fn dangling_forward_link_rejected() {
        let mut scenario = two_cell_scenario();
        scenario.cells[1].forward = Some(99);
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::DanglingLink {
                cell: 1,
                link: LinkKind::Forward,
                target: 99,
            })
        );
    }

    #[test]
    fn conflict_zone_must_reference_grid_cells() {
        let mut scenario = two_cell_scenario();
        scenario.conflict_zones.push(ConflictZone {
            id: 7,
            first: Transition { from: 0, to: 1 },
            second: Transition { from: 5, to: 6 },
            winner: ConflictWinner::First,
            kind: ConflictKind::Undefined,
        });
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::ConflictReference { zone: 7, cell: 5 })
        );
    }

    #[test]
    fn signal_cycle_must_match_phase_times() {
        let mut scenario = two_cell_scenario();
        scenario.traffic_lights.push(TrafficLight {
            id: 1,
            position: [0.0, 0.0],
            groups: vec![SignalGroup {
                id: 100,
                label: "lone group".to_string(),
                cells: vec![1],
                signals: vec![Signal::Green, Signal::Red],
                kind: GroupKind::Vehicle,
                crosswalk_length: 0.0,
            }],
            phase_times: vec![5, 5, 5],
        });
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::PhaseMismatch {
                light: 1,
                group: 100,
                signals: 2,
                phases: 3,
            })
        );
    }

    #[test]
    fn trip_must_start_at_birth_cell() {
        let mut scenario = two_cell_scenario();
        scenario.trips.push(Trip {
            id: 1,
            kind: TripKind::Random,
            from: 1, // death cell
            to: 1,
            initial_speed: 1,
            probability: 0.5,
            agent: AgentType::Car,
            behaviour: Behaviour::Cooperative,
        });
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::TripOrigin { trip: 1, cell: 1 })
        );
    }

    #[test]
    fn trip_probability_is_bounded() {
        let mut scenario = two_cell_scenario();
        scenario.trips.push(Trip {
            id: 3,
            kind: TripKind::Random,
            from: 0,
            to: 1,
            initial_speed: 1,
            probability: 1.5,
            agent: AgentType::Car,
            behaviour: Behaviour::Cooperative,
        });
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::Probability { trip: 3, value: 1.5 })
        );
    }

    #[test]
    fn zone_labels_are_stable() {
        assert_eq!(ZoneType::Birth.as_str(), "birth");
        assert_eq!(ZoneType::BusLane.as_str(), "lane_for_bus");
        assert_eq!(Signal::Green.as_str(), "g");
        assert_eq!(Signal::Red.as_str(), "r");
    }
}
