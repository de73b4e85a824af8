//! Gridflow Reporting
//!
//! Pure post-processing of per-step simulation state into semicolon-delimited
//! tables suitable for plotting tools.
//!
//! Two lookup structures are built once from the locally constructed
//! scenario, right after the load phase, and stay immutable for the rest of
//! the run:
//! - [`GroupCellIndex`]: (traffic-light id, group id) → controlled cells
//! - [`CellPositions`]: cell id → world position
//!
//! Everything else is a function of the step responses and those two
//! indexes, so running the reporter twice over identical input yields
//! byte-identical tables.
//!
//! Coordinates print with five decimals; derived kinematic values (bearing,
//! vehicle position) with two.

#![deny(unsafe_code)]

use std::collections::HashMap;

use gridflow_scenario::{AgentType, CellId, Scenario, TrafficLight};
use gridflow_wire::SessionStepResponse;

// ============================================================================
// Indexes
// ============================================================================

/// Immutable (traffic-light id, group id) → controlled-cells index.
///
/// Built from the scenario that was pushed, not from server responses; a
/// group id the server reports but this index does not know indicates a
/// client/server desynchronization.
#[derive(Debug, Clone, Default)]
pub struct GroupCellIndex {
    cells: HashMap<(i64, i64), Vec<CellId>>,
}

impl GroupCellIndex {
    /// Index every group of every light.
    pub fn build(lights: &[TrafficLight]) -> Self {
        let mut cells = HashMap::new();
        for light in lights {
            for group in &light.groups {
                cells.insert((light.id, group.id), group.cells.clone());
            }
        }
        Self { cells }
    }

    /// Cells controlled by `group` of `light`, if known.
    pub fn cells(&self, light: i64, group: i64) -> Option<&[CellId]> {
        self.cells.get(&(light, group)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Immutable cell id → world position index.
#[derive(Debug, Clone, Default)]
pub struct CellPositions {
    positions: HashMap<CellId, [f64; 2]>,
}

impl CellPositions {
    pub fn build(scenario: &Scenario) -> Self {
        let positions = scenario
            .cells
            .iter()
            .map(|c| (c.id, c.position))
            .collect();
        Self { positions }
    }

    pub fn get(&self, cell: CellId) -> Option<[f64; 2]> {
        self.positions.get(&cell).copied()
    }
}

// ============================================================================
// Static Tables
// ============================================================================

/// `tl_id;x;y` — one row per traffic light.
pub fn light_positions_table(lights: &[TrafficLight]) -> String {
    let mut out = String::from("tl_id;x;y\n");
    for light in lights {
        out.push_str(&format!(
            "{};{:.5};{:.5}\n",
            light.id, light.position[0], light.position[1]
        ));
    }
    out
}

/// `tl_id;controlled_cell;x;y` — one row per controlled cell per group.
pub fn controlled_cells_table(lights: &[TrafficLight], positions: &CellPositions) -> String {
    let mut out = String::from("tl_id;controlled_cell;x;y\n");
    for light in lights {
        for group in &light.groups {
            for &cell in &group.cells {
                let Some([x, y]) = positions.get(cell) else {
                    tracing::warn!(
                        light = light.id,
                        group = group.id,
                        cell,
                        "controlled cell has no position in the grid"
                    );
                    continue;
                };
                out.push_str(&format!("{};{};{:.5};{:.5}\n", light.id, cell, x, y));
            }
        }
    }
    out
}

/// `cell_id;x;y;forward_x;forward_y;connection_type;zone` — the static grid:
/// first one `cell` row per cell (so plots show isolated cells too), then one
/// row per directed connection.
pub fn grid_table(scenario: &Scenario) -> String {
    let positions = CellPositions::build(scenario);
    let mut out = String::from("cell_id;x;y;forward_x;forward_y;connection_type;zone\n");
    for cell in &scenario.cells {
        let [x, y] = cell.position;
        out.push_str(&format!(
            "{};{:.5};{:.5};{:.5};{:.5};cell;{}\n",
            cell.id,
            x,
            y,
            x,
            y,
            cell.zone.as_str()
        ));
    }
    for cell in &scenario.cells {
        let [x, y] = cell.position;
        let links = [
            ("forward", cell.forward),
            ("left", cell.left),
            ("right", cell.right),
        ];
        for (connection, target) in links {
            let Some(target) = target else { continue };
            let Some([tx, ty]) = positions.get(target) else {
                tracing::warn!(cell = cell.id, target, connection, "link target has no position");
                continue;
            };
            out.push_str(&format!(
                "{};{:.5};{:.5};{:.5};{:.5};{};common\n",
                cell.id, x, y, tx, ty, connection
            ));
        }
    }
    out
}

// ============================================================================
// Per-Step Tables
// ============================================================================

fn join_cells(cells: &[i64]) -> String {
    cells
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// `step;vehicle_id;vehicle_type;speed;bearing;intermediate_cells;cell;x;y;tail_cells;trip_id`
/// — one row per vehicle per step.
pub fn vehicle_table(steps: &[SessionStepResponse]) -> String {
    let mut out = String::from(
        "step;vehicle_id;vehicle_type;speed;bearing;intermediate_cells;cell;x;y;tail_cells;trip_id\n",
    );
    for step in steps {
        for vehicle in &step.vehicle_data {
            let (x, y) = vehicle
                .point
                .as_ref()
                .map_or((f64::NAN, f64::NAN), |p| (p.x, p.y));
            out.push_str(&format!(
                "{};{};{};{};{:.2};{};{};{:.2};{:.2};{};{}\n",
                step.timestamp,
                vehicle.vehicle_id,
                AgentType::from(vehicle.agent()).as_str(),
                vehicle.speed,
                vehicle.bearing,
                join_cells(&vehicle.intermediate_cells),
                vehicle.cell,
                x,
                y,
                join_cells(&vehicle.tail_cells),
                vehicle.trip_id
            ));
        }
    }
    out
}

/// `tl_step;tl_id;group_id;cell_id;x;y;signal` — one row per controlled cell
/// per group per step.
///
/// A (light, group) pair the server reports but the local index does not
/// contain is a consistency warning: the server and the client disagree
/// about the pushed scenario. Such entries are skipped after logging.
pub fn signal_table(
    steps: &[SessionStepResponse],
    index: &GroupCellIndex,
    positions: &CellPositions,
) -> String {
    let mut out = String::from("tl_step;tl_id;group_id;cell_id;x;y;signal\n");
    for step in steps {
        for tls in &step.tls_data {
            for group in &tls.groups {
                let Some(cells) = index.cells(tls.id, group.id) else {
                    tracing::warn!(
                        light = tls.id,
                        group = group.id,
                        "server reported a signal group unknown to the pushed scenario"
                    );
                    continue;
                };
                for &cell in cells {
                    let [x, y] = positions.get(cell).unwrap_or([0.0, 0.0]);
                    out.push_str(&format!(
                        "{};{};{};{};{:.5};{:.5};{}\n",
                        step.timestamp, tls.id, group.id, cell, x, y, group.signal
                    ));
                }
            }
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gridflow_scenario::crossing::three_road_crossing;
    use gridflow_wire as wire;

    fn step_response(timestamp: i64) -> SessionStepResponse {
        SessionStepResponse {
            code: wire::CODE_OK,
            text: "OK".to_string(),
            timestamp,
            vehicle_data: vec![wire::VehicleState {
                vehicle_id: 1,
                vehicle_type: wire::AgentType::Car as i32,
                speed: 1,
                bearing: 90.0,
                cell: 4,
                intermediate_cells: vec![5, 6],
                point: Some(wire::Point { x: 4.0, y: 3.5 }),
                travel_time: 3.0,
                trip_id: 1,
                tail_cells: vec![3],
            }],
            tls_data: vec![wire::TlsState {
                id: 1,
                groups: vec![
                    wire::TlsGroupState {
                        id: 100,
                        signal: "g".to_string(),
                    },
                    wire::TlsGroupState {
                        id: 200,
                        signal: "r".to_string(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn group_index_covers_every_group() {
        let scenario = three_road_crossing();
        let index = GroupCellIndex::build(&scenario.traffic_lights);
        assert_eq!(index.len(), 2);
        assert_eq!(index.cells(1, 100), Some(&[6][..]));
        assert_eq!(index.cells(1, 200), Some(&[23][..]));
        assert_eq!(index.cells(1, 999), None);
    }

    #[test]
    fn light_positions_use_five_decimals() {
        let scenario = three_road_crossing();
        let table = light_positions_table(&scenario.traffic_lights);
        assert_eq!(table, "tl_id;x;y\n1;7.00000;4.00000\n");
    }

    #[test]
    fn controlled_cells_resolve_positions() {
        let scenario = three_road_crossing();
        let positions = CellPositions::build(&scenario);
        let table = controlled_cells_table(&scenario.traffic_lights, &positions);
        assert_eq!(
            table,
            "tl_id;controlled_cell;x;y\n1;6;6.00000;3.50000\n1;23;6.50000;3.00000\n"
        );
    }

    #[test]
    fn grid_table_lists_cells_before_connections() {
        let scenario = three_road_crossing();
        let table = grid_table(&scenario);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "cell_id;x;y;forward_x;forward_y;connection_type;zone");
        // 30 cell rows follow the header.
        assert!(lines[1..=30].iter().all(|l| l.contains(";cell;")));
        assert_eq!(lines[1], "0;0.00000;3.50000;0.00000;3.50000;cell;birth");
        // 9 forward links per road plus 4 laterals.
        assert_eq!(lines.len(), 1 + 30 + 27 + 4);
        assert!(table.contains("3;3.00000;3.50000;3.50000;4.00000;left;common"));
        assert!(table.contains("13;3.50000;3.00000;4.00000;3.50000;right;common"));
    }

    #[test]
    fn vehicle_rows_flatten_cell_lists() {
        let table = vehicle_table(&[step_response(0)]);
        assert_eq!(
            table,
            "step;vehicle_id;vehicle_type;speed;bearing;intermediate_cells;cell;x;y;tail_cells;trip_id\n\
             0;1;car;1;90.00;5,6;4;4.00;3.50;3;1\n"
        );
    }

    #[test]
    fn vehicle_without_point_prints_nan() {
        let mut step = step_response(0);
        step.vehicle_data[0].point = None;
        let table = vehicle_table(&[step]);
        assert!(table.lines().nth(1).unwrap().contains(";NaN;NaN;"));
    }

    #[test]
    fn signal_rows_expand_to_controlled_cells() {
        let scenario = three_road_crossing();
        let index = GroupCellIndex::build(&scenario.traffic_lights);
        let positions = CellPositions::build(&scenario);
        let table = signal_table(&[step_response(7)], &index, &positions);
        assert_eq!(
            table,
            "tl_step;tl_id;group_id;cell_id;x;y;signal\n\
             7;1;100;6;6.00000;3.50000;g\n\
             7;1;200;23;6.50000;3.00000;r\n"
        );
    }

    #[test]
    fn unknown_group_is_skipped_not_fabricated() {
        let scenario = three_road_crossing();
        let index = GroupCellIndex::build(&scenario.traffic_lights);
        let positions = CellPositions::build(&scenario);
        let mut step = step_response(0);
        step.tls_data[0].groups.push(wire::TlsGroupState {
            id: 999,
            signal: "g".to_string(),
        });
        let table = signal_table(&[step], &index, &positions);
        assert_eq!(table.lines().count(), 1 + 2, "unknown group adds no rows");
    }

    #[test]
    fn reporting_is_idempotent() {
        let scenario = three_road_crossing();
        let index = GroupCellIndex::build(&scenario.traffic_lights);
        let positions = CellPositions::build(&scenario);
        let steps: Vec<SessionStepResponse> = (0..50).map(step_response).collect();

        assert_eq!(vehicle_table(&steps), vehicle_table(&steps));
        assert_eq!(
            signal_table(&steps, &index, &positions),
            signal_table(&steps, &index, &positions)
        );
        assert_eq!(grid_table(&scenario), grid_table(&scenario));
    }

    #[test]
    fn fifty_steps_yield_fifty_vehicle_rows() {
        let scenario = three_road_crossing();
        let steps: Vec<SessionStepResponse> = (0..50).map(step_response).collect();
        let table = vehicle_table(&steps);
        assert_eq!(table.lines().count(), 1 + 50);

        // Every reported cell is a grid cell and every trip id a pushed trip.
        let trip_ids: Vec<i64> = scenario.trips.iter().map(|t| t.id).collect();
        for step in &steps {
            for vehicle in &step.vehicle_data {
                assert!(scenario.cell(vehicle.cell).is_some());
                assert!(trip_ids.contains(&vehicle.trip_id));
            }
        }
    }
}
