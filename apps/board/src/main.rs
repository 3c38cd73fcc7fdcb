use std::{process::ExitCode, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    BoardController, BoardError, BoardView, ClientConfig, HttpCandidateStore, LoadState,
    TransitionOutcome,
};
use shared::domain::{CandidateForm, CandidateId, CandidateStatus};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "board", about = "Hiring pipeline board")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the board columns or the analytics dashboard.
    Show {
        #[arg(long, value_enum, default_value_t = ViewArg::Board)]
        view: ViewArg,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        status: Option<CandidateStatus>,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        experience: f64,
        #[arg(long)]
        resume_link: Option<String>,
        #[arg(long)]
        status: Option<CandidateStatus>,
    },
    Move {
        id: String,
        status: CandidateStatus,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// List the roles available to the role filter.
    Roles,
    Refresh,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewArg {
    Board,
    Analytics,
}

impl From<ViewArg> for BoardView {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Board => BoardView::Board,
            ViewArg::Analytics => BoardView::Analytics,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config = ClientConfig::load()?;
    info!(store_url = %config.store_url, "connecting to candidate store");
    let board = BoardController::new(Arc::new(HttpCandidateStore::new(&config)));

    if let Err(err) = board.refresh().await {
        error!(error = %err, "initial refresh failed");
        println!("{}", render::connection_error(&err.to_string()));
        return Ok(ExitCode::FAILURE);
    }

    match cli.command {
        Command::Show {
            view,
            search,
            role,
            status,
        } => {
            board.set_search(search.unwrap_or_default()).await;
            board.set_role_filter(role).await;
            board.set_status_filter(status).await;
            board.set_view(view.into()).await;

            let snapshot = board.snapshot().await;
            match snapshot.view {
                BoardView::Board => {
                    if !snapshot.filter.is_empty() {
                        println!(
                            "Showing {} of {} candidates\n",
                            snapshot.visible.len(),
                            snapshot.candidates.len()
                        );
                    }
                    print!("{}", render::board(&board.columns().await));
                }
                BoardView::Analytics => print!("{}", render::analytics(&snapshot.analytics)),
            }
        }
        Command::Add {
            name,
            role,
            experience,
            resume_link,
            status,
        } => {
            let form = CandidateForm {
                name,
                role,
                experience,
                resume_link,
                status,
            };
            match board.create(form).await {
                Ok(created) => println!("Added {} [{}]", created.name, created.id),
                Err(BoardError::Validation(err)) => {
                    info!(fields = err.errors.len(), "candidate form rejected");
                    println!("Candidate not added:");
                    print!("{}", render::field_errors(&err));
                    return Ok(ExitCode::FAILURE);
                }
                Err(BoardError::Store(err)) => return Err(err.into()),
            }
        }
        Command::Move { id, status } => {
            match board.move_candidate(&CandidateId(id), status).await? {
                TransitionOutcome::Applied(candidate) => {
                    println!("Moved {} to {}", candidate.name, candidate.status.title())
                }
                TransitionOutcome::Unchanged => println!("Already in {}", status.title()),
                TransitionOutcome::Ignored { pending } => println!(
                    "Ignored: update for {} is still in flight",
                    pending.candidate_id
                ),
            }
        }
        Command::Delete { id, yes } => {
            let confirmation = board.request_delete(&CandidateId(id)).await?;
            if !yes && !confirm(&confirmation.prompt()).await? {
                info!(id = %confirmation.candidate_id(), "delete cancelled");
                println!("Cancelled");
                return Ok(ExitCode::SUCCESS);
            }
            let name = confirmation.name().to_string();
            board.confirm_delete(confirmation).await?;
            println!("Deleted {name}");
        }
        Command::Roles => {
            for role in board.role_options().await {
                println!("{role}");
            }
        }
        Command::Refresh => {
            let analytics = board.analytics().await;
            println!("Loaded {} candidates", analytics.total_candidates);
            for entry in &analytics.status_breakdown {
                println!("  {:<10} {}", entry.status.title(), entry.count);
            }
        }
    }

    if let LoadState::ConnectionError(message) = board.load_state().await {
        error!(%message, "store became unreachable after the command");
        println!("{}", render::connection_error(&message));
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn confirm(prompt: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{prompt} [y/N] ").as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
