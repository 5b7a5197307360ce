use std::path::PathBuf;

use clap::Args;
use comfy_table::Table;
use courier_planner::planner::{
    orchestrator::RouteAssignmentOrchestrator, planner_params::ClusterStrategy,
};
use tracing::{info, warn};

use crate::oracle_args::{OracleArgs, read_request};

#[derive(Args)]
pub struct ClusterArgs {
    /// Route request in JSON, only its depot and stops are used
    #[arg(short, long)]
    input: PathBuf,

    /// Stops per cluster, the number of evaluated clusters grows as C(n, size)
    #[arg(short, long, default_value_t = 3, env = "COURIER_CLUSTER_SIZE")]
    size: usize,

    /// Also tries every visiting order inside a cluster
    #[arg(long)]
    permutations: bool,

    #[command(flatten)]
    oracle: OracleArgs,
}

pub async fn run(args: ClusterArgs) -> anyhow::Result<()> {
    let request = read_request(&args.input)?;
    let stops = request.stops();

    let mut params = request.planner_params()?;
    params.cluster_size = Some(args.size);
    if args.permutations {
        params.cluster_strategy = ClusterStrategy::Permutations;
    }
    params.validate()?;

    let oracle = args.oracle.build_oracle(&request)?;
    let search = RouteAssignmentOrchestrator::new(oracle)
        .best_cluster(&stops, &params)
        .await?;

    for warning in &search.warnings {
        warn!(
            "{} -> {}: {}",
            warning.origin, warning.destination, warning.message
        );
    }

    let Some(best) = search.best else {
        info!(
            "No cluster of {} stops with a known distance among {} stops",
            args.size,
            stops.len()
        );
        return Ok(());
    };

    let mut table = Table::new();
    table.set_header(vec!["#", "Address", "Weight"]);
    for (index, stop) in best.stops.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            stop.address().to_owned(),
            stop.weight().to_string(),
        ]);
    }
    println!("{table}");

    info!(
        "Best cluster out of {} evaluated: {}",
        search.evaluated, best.total_distance
    );

    Ok(())
}
