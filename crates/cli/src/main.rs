//! Seatdraft CLI - ranked seat allocation over a shared store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use seatdraft_core::{Participant, ParticipantRow, School, SchoolRow, Term};
use seatdraft_engine::{roster, turn, Coordinator};
use seatdraft_storage::{JsonStore, SqliteStore, Store};
use seatdraft_sync::SyncClient;

#[derive(Parser)]
#[command(name = "seatdraft")]
#[command(about = "Ranked turn-based seat allocation", long_about = None)]
struct Cli {
    /// JSON store file (ignored when --db is given)
    #[arg(long, default_value = ".seatdraft/state.json")]
    store: PathBuf,

    /// SQLite database URL, e.g. sqlite://seatdraft.db?mode=rwc
    #[arg(long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the roster and seat pool (clears all picks, forces round 1)
    Reset {
        /// Participants file (.csv or .json)
        #[arg(long)]
        participants: PathBuf,
        /// Schools file (.csv or .json)
        #[arg(long)]
        schools: PathBuf,
    },
    /// Show the roster, seat pool, round and active rank
    Status,
    /// Take a seat for a participant
    Pick {
        /// Participant id
        participant: i64,
        /// School id
        school: i64,
        /// Term: fall or spring
        term: Term,
    },
    /// Skip a participant's turn (skipping round 1 forfeits round 2)
    Skip {
        /// Participant id
        participant: i64,
    },
    /// Recompute statuses after manual store edits
    Refresh,
    /// Export the current roster or seat pool as CSV
    Export {
        /// Write participants CSV here
        #[arg(long)]
        participants: Option<PathBuf>,
        /// Write schools CSV here
        #[arg(long)]
        schools: Option<PathBuf>,
    },
    /// Follow store changes and print the state as it evolves
    Watch {
        /// Polling interval in milliseconds
        #[arg(long, default_value_t = seatdraft_sync::DEFAULT_POLL_INTERVAL.as_millis() as u64)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let store: Arc<dyn Store> = match &cli.db {
        Some(url) => Arc::new(SqliteStore::new(url).await?),
        None => Arc::new(JsonStore::new(&cli.store).await?),
    };
    let coordinator = Coordinator::new(Arc::clone(&store));

    match cli.command {
        Commands::Reset {
            participants,
            schools,
        } => {
            let participant_rows = read_participant_rows(&participants).await?;
            let school_rows = read_school_rows(&schools).await?;
            let snapshot = coordinator.reset(&participant_rows, &school_rows).await?;
            println!(
                "Reset: {} participants, {} schools, round {}",
                snapshot.participants.len(),
                snapshot.schools.len(),
                snapshot.round,
            );
            print_state(&snapshot.participants, &snapshot.schools);
        }
        Commands::Status => {
            let state = coordinator.snapshot().await?;
            let active = turn::active_rank(&state.snapshot.participants, state.snapshot.round);
            println!("Round {} (version {})", state.snapshot.round, state.version);
            match active {
                Some(rank) => println!("Active rank: {rank}"),
                None if turn::is_finished(&state.snapshot) => println!("Allocation finished"),
                None => println!("No active rank"),
            }
            print_state(&state.snapshot.participants, &state.snapshot.schools);
        }
        Commands::Pick {
            participant,
            school,
            term,
        } => {
            let snapshot = coordinator.submit_pick(participant, school, term).await?;
            let record = snapshot
                .participant(participant)
                .and_then(|p| p.pick_for(snapshot.round).or(p.round1_pick.as_ref()));
            match record {
                Some(pick) if pick.used_flexible_slot => {
                    println!("Picked school {school} for {term} (flexible seat)")
                }
                _ => println!("Picked school {school} for {term}"),
            }
        }
        Commands::Skip { participant } => {
            let snapshot = coordinator.skip_turn(participant).await?;
            println!("Skipped participant {participant}");
            if turn::is_finished(&snapshot) {
                println!("Allocation finished");
            }
        }
        Commands::Refresh => {
            let snapshot = coordinator.refresh().await?;
            println!("Statuses recomputed (round {})", snapshot.round);
        }
        Commands::Export {
            participants,
            schools,
        } => {
            let state = coordinator.snapshot().await?;
            if let Some(path) = participants {
                let rows: Vec<ParticipantRow> = state
                    .snapshot
                    .participants
                    .iter()
                    .map(participant_to_row)
                    .collect();
                tokio::fs::write(&path, seatdraft_csv::write_participants(&rows)?).await?;
                println!("Wrote {}", path.display());
            }
            if let Some(path) = schools {
                let rows: Vec<SchoolRow> =
                    state.snapshot.schools.iter().map(school_to_row).collect();
                tokio::fs::write(&path, seatdraft_csv::write_schools(&rows)?).await?;
                println!("Wrote {}", path.display());
            }
        }
        Commands::Watch { interval_ms } => {
            let mut changes =
                seatdraft_sync::changes(Arc::clone(&store), Duration::from_millis(interval_ms))
                    .await;
            let mut client = SyncClient::connect(store).await?;
            loop {
                if client.reconcile().await.is_ok() {
                    println!(
                        "version {} | round {} | active rank {}",
                        client.version(),
                        client.round(),
                        client
                            .active_rank()
                            .map(|r| r.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn read_participant_rows(path: &Path) -> Result<Vec<ParticipantRow>> {
    let text = tokio::fs::read_to_string(path).await?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => Ok(seatdraft_csv::parse_participants(&text)?),
        _ => Ok(roster::participant_rows_from_json(&text)?),
    }
}

async fn read_school_rows(path: &Path) -> Result<Vec<SchoolRow>> {
    let text = tokio::fs::read_to_string(path).await?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => Ok(seatdraft_csv::parse_schools(&text)?),
        _ => Ok(roster::school_rows_from_json(&text)?),
    }
}

fn participant_to_row(p: &Participant) -> ParticipantRow {
    ParticipantRow {
        id: p.id,
        name: p.name.clone(),
        rank: p.rank,
        needs_double_semester: p.needs_double_semester,
    }
}

fn school_to_row(s: &School) -> SchoolRow {
    SchoolRow {
        id: s.id,
        name: s.name.clone(),
        country: s.country.clone(),
        slots_fall: s.slots_fall,
        slots_spring: s.slots_spring,
        slots_flexible: s.slots_flexible,
    }
}

fn print_state(participants: &[Participant], schools: &[School]) {
    println!("Participants ({})", participants.len());
    for p in participants {
        let picks = [p.round1_pick.as_ref(), p.round2_pick.as_ref()]
            .into_iter()
            .flatten()
            .map(|pick| format!("school {} {}", pick.school_id, pick.term))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  #{:<3} | rank {:<3} | {:<9} | {}{}",
            p.id,
            p.rank,
            p.status.to_string(),
            p.name,
            if picks.is_empty() {
                String::new()
            } else {
                format!(" -> {picks}")
            },
        );
    }

    println!("Schools ({})", schools.len());
    for s in schools {
        println!(
            "  #{:<3} | fall {:<2} spring {:<2} flex {:<2} | {} ({})",
            s.id, s.slots_fall, s.slots_spring, s.slots_flexible, s.name, s.country,
        );
    }
}
