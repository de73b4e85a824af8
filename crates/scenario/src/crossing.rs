//! The fixed demonstration topology: three one-lane roads meeting at two
//! intersections.
//!
//! ```text
//!        V1 (x = 3.5)       V2 (x = 6.5)
//!          |                  |
//!    H ----+------------------+---- H (y = 3.5)
//!          |                  |
//! ```
//!
//! Cell ids are assigned in contiguous ranges per road: horizontal 0–9,
//! vertical 1 10–19, vertical 2 20–29. The first cell of each road is a
//! birth zone, the last a death zone, everything in between common. Lateral
//! links exist only at the two intersections, one conflict zone covers the
//! H × V1 crossing, and a single two-group traffic light gates the H × V2
//! crossing with complementary phases.

use crate::{
    AgentType, Behaviour, Cell, CellId, ConflictKind, ConflictWinner, ConflictZone, GroupKind,
    Scenario, Signal, SignalGroup, TrafficLight, Transition, Trip, TripKind, ZoneType,
};

/// Cells per road.
pub const ROAD_CELLS: i64 = 10;

/// First ids of the three roads.
pub const H_FIRST: CellId = 0;
pub const V1_FIRST: CellId = 10;
pub const V2_FIRST: CellId = 20;

const H_Y: f64 = 3.5;
const V1_X: f64 = 3.5;
const V2_X: f64 = 6.5;

/// Uniform speed limit of the demonstration network.
const SPEED_LIMIT: i64 = 1;

/// Build one straight road of [`ROAD_CELLS`] cells starting at `first`, with
/// the position of the i-th cell given by `position`.
fn road(first: CellId, position: impl Fn(i64) -> [f64; 2]) -> Vec<Cell> {
    (0..ROAD_CELLS)
        .map(|i| {
            let zone = if i == 0 {
                ZoneType::Birth
            } else if i == ROAD_CELLS - 1 {
                ZoneType::Death
            } else {
                ZoneType::Common
            };
            Cell {
                id: first + i,
                position: position(i),
                zone,
                speed_limit: SPEED_LIMIT,
                forward: (i < ROAD_CELLS - 1).then_some(first + i + 1),
                left: None,
                right: None,
                meso_link: 0,
            }
        })
        .collect()
}

fn random_car_trip(id: i64, from: CellId, to: CellId, probability: f64) -> Trip {
    Trip {
        id,
        kind: TripKind::Random,
        from,
        to,
        initial_speed: 1,
        probability,
        agent: AgentType::Car,
        behaviour: Behaviour::Cooperative,
    }
}

/// Build the three-road crossing scenario.
///
/// Purely declarative: the returned value is the same on every call and
/// passes [`Scenario::validate`].
pub fn three_road_crossing() -> Scenario {
    let mut cells = Vec::with_capacity((3 * ROAD_CELLS) as usize);
    cells.extend(road(H_FIRST, |i| [i as f64, H_Y]));
    cells.extend(road(V1_FIRST, |i| [V1_X, i as f64]));
    cells.extend(road(V2_FIRST, |i| [V2_X, i as f64]));

    // Turning movements exist only at the two intersections: the horizontal
    // road can turn left onto each vertical road, and each vertical road can
    // turn right onto the horizontal one.
    for cell in &mut cells {
        match cell.id {
            3 => cell.left = Some(14),  // H → V1
            6 => cell.left = Some(24),  // H → V2
            13 => cell.right = Some(4), // V1 → H
            23 => cell.right = Some(7), // V2 → H
            _ => {}
        }
    }

    // The H × V1 crossing: the straight-ahead transitions overlap, and the
    // vertical stream has priority.
    let conflict_zones = vec![ConflictZone {
        id: 1,
        first: Transition { from: 3, to: 4 },
        second: Transition { from: 13, to: 14 },
        winner: ConflictWinner::Second,
        kind: ConflictKind::Undefined,
    }];

    // One light at the H × V2 crossing, two vehicle groups with complementary
    // cycles over equal phase durations.
    let traffic_lights = vec![TrafficLight {
        id: 1,
        position: [7.0, 4.0],
        groups: vec![
            SignalGroup {
                id: 100,
                label: "Group block H".to_string(),
                cells: vec![6],
                signals: vec![Signal::Green, Signal::Red],
                kind: GroupKind::Vehicle,
                crosswalk_length: 0.0,
            },
            SignalGroup {
                id: 200,
                label: "Group block V2".to_string(),
                cells: vec![23],
                signals: vec![Signal::Red, Signal::Green],
                kind: GroupKind::Vehicle,
                crosswalk_length: 0.0,
            },
        ],
        phase_times: vec![5, 5],
    }];

    // Random arrivals at each road's birth cell, routed to its death cell.
    let trips = vec![
        random_car_trip(1, H_FIRST, H_FIRST + ROAD_CELLS - 1, 0.2),
        random_car_trip(2, V1_FIRST, V1_FIRST + ROAD_CELLS - 1, 0.3),
        random_car_trip(3, V2_FIRST, V2_FIRST + ROAD_CELLS - 1, 0.1),
    ];

    Scenario {
        cells,
        conflict_zones,
        traffic_lights,
        trips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_passes_validation() {
        assert_eq!(three_road_crossing().validate(), Ok(()));
    }

    #[test]
    fn crossing_is_deterministic() {
        assert_eq!(three_road_crossing(), three_road_crossing());
    }

    #[test]
    fn birth_and_death_zones_are_road_endpoints_only() {
        let scenario = three_road_crossing();
        for first in [H_FIRST, V1_FIRST, V2_FIRST] {
            for i in 0..ROAD_CELLS {
                let cell = scenario.cell(first + i).unwrap();
                let expected = if i == 0 {
                    ZoneType::Birth
                } else if i == ROAD_CELLS - 1 {
                    ZoneType::Death
                } else {
                    ZoneType::Common
                };
                assert_eq!(cell.zone, expected, "cell {}", cell.id);
            }
        }
    }

    #[test]
    fn every_link_resolves_to_a_grid_cell() {
        let scenario = three_road_crossing();
        for cell in &scenario.cells {
            for target in [cell.forward, cell.left, cell.right].into_iter().flatten() {
                assert!(
                    scenario.cell(target).is_some(),
                    "cell {} links to missing cell {}",
                    cell.id,
                    target
                );
            }
        }
    }

    #[test]
    fn laterals_exist_only_at_intersections() {
        let scenario = three_road_crossing();
        for cell in &scenario.cells {
            match cell.id {
                3 => assert_eq!(cell.left, Some(14)),
                6 => assert_eq!(cell.left, Some(24)),
                13 => assert_eq!(cell.right, Some(4)),
                23 => assert_eq!(cell.right, Some(7)),
                _ => {
                    assert_eq!(cell.left, None, "cell {}", cell.id);
                    assert_eq!(cell.right, None, "cell {}", cell.id);
                }
            }
        }
    }

    #[test]
    fn road_ends_have_no_forward_link() {
        let scenario = three_road_crossing();
        for last in [9, 19, 29] {
            assert_eq!(scenario.cell(last).unwrap().forward, None);
        }
    }

    #[test]
    fn conflict_zone_covers_the_first_crossing() {
        let scenario = three_road_crossing();
        let zone = &scenario.conflict_zones[0];
        assert_eq!(zone.first, Transition { from: 3, to: 4 });
        assert_eq!(zone.second, Transition { from: 13, to: 14 });
        assert_eq!(zone.winner, ConflictWinner::Second);
    }

    #[test]
    fn light_phases_are_complementary() {
        let scenario = three_road_crossing();
        let light = &scenario.traffic_lights[0];
        assert_eq!(light.phase_times, vec![5, 5]);
        assert_eq!(light.groups.len(), 2);
        let h = &light.groups[0];
        let v2 = &light.groups[1];
        assert_eq!(h.signals, vec![Signal::Green, Signal::Red]);
        assert_eq!(v2.signals, vec![Signal::Red, Signal::Green]);
        // At every phase exactly one approach is green.
        for (a, b) in h.signals.iter().zip(&v2.signals) {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn trips_cover_each_road_from_birth_to_death() {
        let scenario = three_road_crossing();
        let endpoints: Vec<(i64, CellId, CellId)> = scenario
            .trips
            .iter()
            .map(|t| (t.id, t.from, t.to))
            .collect();
        assert_eq!(endpoints, vec![(1, 0, 9), (2, 10, 19), (3, 20, 29)]);
        for trip in &scenario.trips {
            assert_eq!(trip.kind, TripKind::Random);
            assert_eq!(trip.agent, AgentType::Car);
            assert_eq!(trip.behaviour, Behaviour::Cooperative);
        }
    }
}
