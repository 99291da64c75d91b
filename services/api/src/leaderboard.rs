use crate::infra::{load_reports, load_users, InMemoryReportStore, InMemoryUserDirectory};
use clap::Args;
use clearview::error::AppError;
use clearview::workflows::reports::{LeaderboardEntry, Report, ReportAggregator, UserProfile};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct LeaderboardArgs {
    /// JSON array of exported report documents
    #[arg(long)]
    pub(crate) reports: PathBuf,
    /// JSON array of exported user records
    #[arg(long)]
    pub(crate) users: PathBuf,
    /// Only print the top N contributors
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Emit the ranking as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_leaderboard(args: LeaderboardArgs) -> Result<(), AppError> {
    let reports = load_reports(&args.reports)?;
    let users = load_users(&args.users)?;
    let report_count = reports.len();

    let mut entries = rank(reports, users);
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Clear View leaderboard ({report_count} reports scanned)");
    if entries.is_empty() {
        println!("  No approved reports from registered users");
        return Ok(());
    }
    for line in render_table(&entries) {
        println!("{line}");
    }
    Ok(())
}

fn rank(reports: Vec<Report>, users: Vec<UserProfile>) -> Vec<LeaderboardEntry> {
    let aggregator = ReportAggregator::new(
        Arc::new(InMemoryReportStore::with_reports(reports)),
        Arc::new(InMemoryUserDirectory::with_users(users)),
    );
    aggregator.compute_leaderboard()
}

fn render_table(entries: &[LeaderboardEntry]) -> Vec<String> {
    let name_width = entries
        .iter()
        .map(|entry| entry.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!(
        "  {:>4}  {:<name_width$}  {:>8}  {:>8}",
        "Rank", "Name", "Points", "Approved"
    ));
    for (index, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "  {:>4}  {:<name_width$}  {:>8}  {:>8}",
            index + 1,
            entry.name,
            entry.points,
            entry.approved_report_count
        ));
    }
    lines
}
