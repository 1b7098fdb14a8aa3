use clap::{Parser, Subcommand};
use uuid::Uuid;

use queue_breaker::incident::store::IncidentStore;
use queue_breaker::observability::logging;

#[derive(Parser)]
#[command(name = "breaker-cli")]
#[command(about = "Inspect queue-breaker incident checkpoints", long_about = None)]
struct Cli {
    /// Incident checkpoint directory.
    #[arg(short, long, default_value = "state/incidents")]
    state_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all incident snapshots
    List,
    /// Show one incident as JSON
    Show { id: Uuid },
    /// Delete terminal (restored/failed) snapshots
    Purge,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("info");

    let cli = Cli::parse();
    let store = IncidentStore::open(&cli.state_dir)?;

    match cli.command {
        Commands::List => {
            let mut incidents = store.load_all()?;
            incidents.sort_by(|a, b| a.consumer_id.cmp(&b.consumer_id));

            if incidents.is_empty() {
                println!("No incident snapshots in {}", cli.state_dir);
                return Ok(());
            }

            println!(
                "{:<38} {:<20} {:<12} {:>7} {:>13}",
                "INCIDENT", "CONSUMER", "PHASE", "ATTEMPT", "INTERVAL(S)"
            );
            for incident in incidents {
                println!(
                    "{:<38} {:<20} {:<12} {:>7} {:>13}",
                    incident.id,
                    incident.consumer_id,
                    incident.phase.to_string(),
                    incident.attempt,
                    incident.retry_interval_secs,
                );
            }
        }
        Commands::Show { id } => {
            let incident = store.load(id)?;
            println!("{}", serde_json::to_string_pretty(&incident)?);
        }
        Commands::Purge => {
            let removed = store.purge_terminal()?;
            println!("Removed {} terminal snapshot(s)", removed);
        }
    }

    Ok(())
}
