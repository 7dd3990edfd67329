//! JSON result files for downstream analysis.
//!
//! Every run writes a fresh, timestamped set of files rather than
//! overwriting the previous one, so the network-analysis consumers can diff
//! runs against each other.

use chrono::Local;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::{PlayerDossier, ScrapeStats, TeamSquad};

/// Write roster data, market dossiers, and the run summary.
///
/// Returns the computed [`ScrapeStats`] so the caller can log them.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_outputs(
    teams: &[TeamSquad],
    players: &[PlayerDossier],
    output_dir: &str,
) -> Result<ScrapeStats, Box<dyn Error>> {
    fs::create_dir_all(output_dir).await?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

    let teams_path = format!("{output_dir}/fbref_data_{timestamp}.json");
    fs::write(&teams_path, serde_json::to_string_pretty(teams)?).await?;
    info!(path = %teams_path, teams = teams.len(), "Wrote roster data");

    let players_path = format!("{output_dir}/transfermarkt_data_{timestamp}.json");
    fs::write(&players_path, serde_json::to_string_pretty(players)?).await?;
    info!(path = %players_path, players = players.len(), "Wrote market data");

    let stats = ScrapeStats {
        scrape_date: timestamp.clone(),
        total_teams: teams.len(),
        total_players: teams.iter().map(|t| t.player_count).sum(),
        tm_profiles_found: players.iter().filter(|p| p.profile.is_some()).count(),
    };

    let stats_path = format!("{output_dir}/scrape_stats_{timestamp}.json");
    fs::write(&stats_path, serde_json::to_string_pretty(&stats)?).await?;
    info!(path = %stats_path, "Wrote run statistics");

    Ok(stats)
}
