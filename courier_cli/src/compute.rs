use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::Context;
use clap::Args;
use comfy_table::Table;
use courier_planner::{
    planner::orchestrator::RouteAssignmentOrchestrator, problem::assignment::AssignmentResult,
};
use tracing::{info, warn};

use crate::{
    oracle_args::{OracleArgs, read_request},
    parsers::{self, to_std_duration},
};

#[derive(Args)]
pub struct ComputeArgs {
    /// Route request in JSON, see `courier schema`
    #[arg(short, long)]
    input: PathBuf,

    /// Writes the full result as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overrides the deadline of the request file
    #[arg(long, value_parser = parsers::parse_duration, env = "COURIER_DEADLINE")]
    deadline: Option<jiff::SignedDuration>,

    #[command(flatten)]
    oracle: OracleArgs,
}

pub async fn run(args: ComputeArgs) -> anyhow::Result<()> {
    let request = read_request(&args.input)?;
    let problem = request.build_problem()?;
    let mut params = request.planner_params()?;
    if let Some(deadline) = args.deadline {
        params.deadline = Some(to_std_duration(deadline)?);
    }

    info!(
        "Computing routes for {} stops and {} vehicles",
        problem.stops().len(),
        problem.vehicles().len()
    );

    let oracle = args.oracle.build_oracle(&request)?;
    let result = RouteAssignmentOrchestrator::new(oracle)
        .compute(&problem, &params)
        .await?;

    print_result(&result);

    if let Some(output) = args.output {
        let file = File::create(&output)
            .with_context(|| format!("cannot create {}", output.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &result)?;
        info!("Result written to {}", output.display());
    }

    Ok(())
}

fn print_result(result: &AssignmentResult) {
    let mut routes = Table::new();
    routes.set_header(vec!["Vehicle", "Stops", "Weight", "Distance", "Best cluster"]);
    for route in &result.routes {
        let stops = route
            .stops()
            .iter()
            .map(|stop| stop.address())
            .collect::<Vec<_>>()
            .join("\n");
        let best_cluster = route
            .best_cluster()
            .map(|cluster| {
                let addresses = cluster
                    .stops
                    .iter()
                    .map(|stop| stop.address())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                format!("{addresses} ({})", cluster.total_distance)
            })
            .unwrap_or_default();

        routes.add_row(vec![
            route.vehicle().name().to_owned(),
            stops,
            format!("{} / {}", route.total_weight(), route.vehicle().capacity()),
            route.total_distance().to_string(),
            best_cluster,
        ]);
    }
    println!("{routes}");

    if !result.unassigned.is_empty() {
        let mut unassigned = Table::new();
        unassigned.set_header(vec!["Unassigned stop", "Weight", "Reason"]);
        for entry in &result.unassigned {
            unassigned.add_row(vec![
                entry.stop.address().to_owned(),
                entry.stop.weight().to_string(),
                format!("{:?}", entry.reason),
            ]);
        }
        println!("{unassigned}");
    }

    for warning in &result.warnings {
        warn!(
            "{} -> {}: {}",
            warning.origin, warning.destination, warning.message
        );
    }

    if result.partial {
        warn!("Deadline exceeded, the result is partial");
    }

    info!(
        "{} stops assigned, total distance {}",
        result.assigned_count(),
        result.total_distance()
    );
}
