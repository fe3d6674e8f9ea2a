use crate::infra::SnapshotSummary;
use crate::server;
use clap::{Args, Parser, Subcommand};
use course_registrar::error::AppError;
use course_registrar::registration::RegistrarSnapshot;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Course Registrar",
    about = "Run the course registration service or inspect registrar snapshots",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with registrar snapshot files
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SnapshotCommand {
    /// Parse a snapshot and print what it contains
    Check(SnapshotCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the registrar from a JSON snapshot before serving
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SnapshotCheckArgs {
    /// Path to the snapshot file
    pub(crate) path: PathBuf,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Snapshot {
            command: SnapshotCommand::Check(args),
        } => check_snapshot(args),
    }
}

fn check_snapshot(args: SnapshotCheckArgs) -> Result<(), AppError> {
    let snapshot = RegistrarSnapshot::from_path(&args.path)?;
    let summary = SnapshotSummary::from_snapshot(&snapshot);

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("snapshot summary unavailable: {err}"),
    }
    Ok(())
}
