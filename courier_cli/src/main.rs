use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{cluster::ClusterArgs, compute::ComputeArgs};

mod cluster;
mod compute;
mod oracle_args;
mod parsers;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assigns the stops of a request to its vehicles
    #[command(visible_alias = "c")]
    Compute {
        #[command(flatten)]
        args: ComputeArgs,
    },
    /// Finds the cheapest cluster among the stops of a request
    Cluster {
        #[command(flatten)]
        args: ClusterArgs,
    },
    /// Prints the JSON schema of route requests
    Schema,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Compute { args } => compute::run(args).await?,
        Commands::Cluster { args } => cluster::run(args).await?,
        Commands::Schema => {
            println!(
                "{}",
                courier_planner::json::schema::generate_json_schema()?
            );
        }
    }

    Ok(())
}
