use crate::leaderboard::{run_leaderboard, LeaderboardArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use clearview::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Clear View",
    about = "Run the pollution reporting service or inspect exported report data",
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
    /// Print the contributor leaderboard for exported reports and users
    Leaderboard(LeaderboardArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the report store from a JSON export
    #[arg(long)]
    pub(crate) reports: Option<PathBuf>,
    /// Seed the user directory from a JSON export
    #[arg(long)]
    pub(crate) users: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Leaderboard(args) => run_leaderboard(args),
    }
}
