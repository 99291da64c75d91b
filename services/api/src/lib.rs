mod cli;
mod infra;
mod leaderboard;
mod routes;
mod server;

use clearview::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
