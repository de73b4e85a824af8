//! Demonstration client for the Gridflow simulation service.
//!
//! Fabricates the three-road crossing scenario, pushes it into a fresh
//! session, runs a fixed number of simulation steps, and prints the
//! metadata, grid, and per-step tables to stdout.

use anyhow::Context;
use clap::Parser;

use gridflow_client::config::DEFAULT_ADDR;
use gridflow_client::load::MAX_CHUNK_ENTITIES;
use gridflow_client::{
    ClientConfig, LoadAck, LoadOptions, SimulationClient, Srid, load_scenario, run_steps, session,
};
use gridflow_report as report;
use gridflow_scenario::crossing::three_road_crossing;

#[derive(Parser)]
#[command(name = "gridflow")]
#[command(about = "Push a demo crossing scenario and run simulation steps")]
struct Cli {
    /// Server address; an http:// or https:// prefix is accepted and stripped
    #[arg(long, env = "GRIDFLOW_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,

    /// Number of simulation steps to request
    #[arg(long, default_value = "50")]
    steps: u64,

    /// Entities per chunk for bulk loads
    #[arg(long, default_value_t = MAX_CHUNK_ENTITIES)]
    chunk_size: usize,
}

fn print_acks(label: &str, acks: &[LoadAck]) {
    for ack in acks {
        println!("{label} push response: code={} text={}", ack.code, ack.text);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(&cli.addr);

    tracing::info!(target = %config.target, "connecting");
    let mut client = SimulationClient::connect(config.endpoint_uri())
        .await
        .with_context(|| format!("failed to connect to {}", config.target))?;

    // Session first; nothing may be pushed without a valid id.
    let session = session::open(&mut client, Srid::Euclidean, config.call_timeout).await?;
    println!("Session created: {session}");

    // The scenario is pure data; validate it locally before pushing.
    let scenario = three_road_crossing();
    scenario
        .validate()
        .context("demo scenario failed validation")?;

    let opts = LoadOptions {
        chunk_size: cli.chunk_size,
        call_timeout: config.call_timeout,
    };
    let load = load_scenario(&mut client, session, &scenario, &opts).await?;
    print_acks("Grid", &load.grid);
    print_acks("Conflict zones", &load.conflict_zones);
    print_acks("TLS", &load.traffic_lights);
    print_acks("Trip", &load.trips);

    // Both lookup structures are built once, right after the load phase, and
    // stay untouched for the rest of the run.
    let index = report::GroupCellIndex::build(&scenario.traffic_lights);
    let positions = report::CellPositions::build(&scenario);

    print!("{}", report::light_positions_table(&scenario.traffic_lights));
    print!(
        "{}",
        report::controlled_cells_table(&scenario.traffic_lights, &positions)
    );
    print!("{}", report::grid_table(&scenario));

    println!("\n=== Running {} simulation steps ===\n", cli.steps);
    let steps = run_steps(&mut client, session, cli.steps, config.call_timeout).await?;

    print!("{}", report::vehicle_table(&steps));
    print!("{}", report::signal_table(&steps, &index, &positions));

    println!("\nSimulation complete!");
    Ok(())
}
