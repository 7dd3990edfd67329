//! FBref roster scraper.
//!
//! Two page shapes matter here:
//!
//! 1. The **league page**, whose standings table links every squad.
//! 2. A **squad page**, whose standard-stats table has one row per
//!    player, each cell tagged with a `data-stat` attribute.
//!
//! The league table id is season-specific, so both lookups fall back to
//! the generic `stats_table` class when the exact id is missing.
//!
//! FBref fingerprints plain HTTP clients, which is why its host is
//! routed through the driven-browser strategy first (see the fetch
//! module); the functions here only interpret whatever document the
//! fetcher produced.

use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument, warn};
use url::Url;

use crate::fetch::{FetchError, FetchStrategy, PageCache, ResilientFetcher};
use crate::models::{PlayerRecord, TeamSquad};

pub const FBREF_BASE_URL: &str = "https://fbref.com";
pub const DEFAULT_LEAGUE_URL: &str = "https://fbref.com/en/comps/9/Premier-League-Stats";

const LEAGUE_CACHE_KEY: &str = "_league_premier-league.html";

/// Crawl the league page and every linked squad page into roster records.
///
/// Transient fetch failures skip the one team and keep going; an empty
/// result means the league page itself could not be fetched.
#[instrument(level = "info", skip_all, fields(%league_url))]
pub async fn scrape_squads<B, H>(
    fetcher: &ResilientFetcher<B, H>,
    cache: &PageCache,
    league_url: &str,
    force_refresh: bool,
) -> Result<Vec<TeamSquad>, FetchError>
where
    B: FetchStrategy,
    H: FetchStrategy,
{
    info!("Starting squad scrape");

    let Some(league_html) = fetcher
        .resolve(league_url, cache, LEAGUE_CACHE_KEY, force_refresh)
        .await?
    else {
        warn!("Failed to fetch the league page");
        return Ok(Vec::new());
    };

    let links = parse_squad_links(&league_html);
    info!(count = links.len(), "Indexed team links");

    let base = Url::parse(FBREF_BASE_URL).expect("base URL is valid");
    let mut squads = Vec::new();

    for (idx, link) in links.iter().enumerate() {
        let Ok(squad_url) = base.join(link) else {
            warn!(%link, "Unusable squad link; skipping");
            continue;
        };
        let (team_id, team_name, slug) = squad_identity(link, idx);

        info!(
            team = %team_name,
            index = idx + 1,
            total = links.len(),
            "Processing team"
        );

        let key = format!("squad_{slug}.html");
        let Some(html) = fetcher
            .resolve(squad_url.as_str(), cache, &key, force_refresh)
            .await?
        else {
            continue;
        };

        let players = parse_team_page(&html, &team_name);
        info!(team = %team_name, player_count = players.len(), "Parsed roster");
        squads.push(TeamSquad {
            team_name,
            team_id,
            team_url: squad_url.to_string(),
            player_count: players.len(),
            players,
        });
    }

    info!(teams = squads.len(), "Squad scrape complete");
    Ok(squads)
}

/// Derive (id, display name, cache slug) from a squad href like
/// `/en/squads/18bb7c10/Arsenal-Stats`.
fn squad_identity(link: &str, idx: usize) -> (String, String, String) {
    let parts: Vec<&str> = link.split('/').collect();
    let id = parts
        .get(3)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("team_{}", idx + 1));
    let slug = parts
        .get(4)
        .map(|s| s.to_string())
        .unwrap_or_else(|| id.clone());
    let name = slug.trim_end_matches("-Stats").replace('-', " ");
    (id, name, slug)
}

/// Extract squad hrefs from the league standings table.
pub fn parse_squad_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let standings = Selector::parse("table#results2024-202591_overall").unwrap();
    let fallback = Selector::parse("table.stats_table").unwrap();
    let team_link = Selector::parse("td[data-stat=\"team\"] a[href]").unwrap();

    let Some(table) = document
        .select(&standings)
        .next()
        .or_else(|| document.select(&fallback).next())
    else {
        warn!("No standings table found on league page");
        return Vec::new();
    };

    table
        .select(&team_link)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Extract roster rows from a squad page's standard-stats table.
///
/// Rows without a player name are dropped; any other missing cell just
/// leaves its field absent.
pub fn parse_team_page(html: &str, team_name: &str) -> Vec<PlayerRecord> {
    let document = Html::parse_document(html);
    let standard = Selector::parse("table#stats_standard_9").unwrap();
    let fallback = Selector::parse("table.stats_table").unwrap();
    let rows = Selector::parse("tbody tr").unwrap();
    let player_cell = Selector::parse("th[data-stat=\"player\"]").unwrap();
    let link = Selector::parse("a[href]").unwrap();

    let Some(table) = document
        .select(&standard)
        .next()
        .or_else(|| document.select(&fallback).next())
    else {
        warn!(team = %team_name, "No player table found");
        return Vec::new();
    };

    let base = Url::parse(FBREF_BASE_URL).expect("base URL is valid");
    let mut players = Vec::new();

    for row in table.select(&rows) {
        // Repeated header rows inside the body carry the `thead` class.
        if row.value().classes().any(|c| c == "thead") {
            continue;
        }

        let mut player = PlayerRecord::default();

        if let Some(cell) = row.select(&player_cell).next() {
            if let Some(a) = cell.select(&link).next() {
                player.name = cell_text(&a);
                if let Some(href) = a.value().attr("href") {
                    if let Ok(resolved) = base.join(href) {
                        player.fbref_url = Some(resolved.to_string());
                    }
                    player.fbref_id = href.split('/').nth(3).map(str::to_string);
                }
            }
        }
        if player.name.is_empty() {
            continue;
        }

        player.nationality = stat_text(&row, "nationality")
            .map(|t| t.split_whitespace().last().unwrap_or("").to_string());
        player.position = stat_text(&row, "position");
        player.age = stat_text(&row, "age");
        player.games = stat_text(&row, "games");
        player.starts = stat_text(&row, "games_starts");
        player.goals = stat_text(&row, "goals");
        player.assists = stat_text(&row, "assists");
        player.team = Some(team_name.to_string());

        players.push(player);
    }

    players
}

fn stat_text(row: &ElementRef, stat: &str) -> Option<String> {
    let selector = Selector::parse(&format!("td[data-stat=\"{stat}\"]")).unwrap();
    row.select(&selector).next().map(|cell| cell_text(&cell))
}

fn cell_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEAGUE_PAGE: &str = r#"
        <table id="results2024-202591_overall"><tbody>
            <tr><td data-stat="team"><a href="/en/squads/18bb7c10/Arsenal-Stats">Arsenal</a></td></tr>
            <tr><td data-stat="team"><a href="/en/squads/b8fd03ef/Manchester-City-Stats">Manchester City</a></td></tr>
            <tr><td data-stat="team">No link here</td></tr>
        </tbody></table>
    "#;

    const SQUAD_PAGE: &str = r#"
        <table id="stats_standard_9"><tbody>
            <tr>
                <th data-stat="player"><a href="/en/players/bc7dc64d/Bukayo-Saka">Bukayo Saka</a></th>
                <td data-stat="nationality">eng ENG</td>
                <td data-stat="position">FW</td>
                <td data-stat="age">23-300</td>
                <td data-stat="games">38</td>
                <td data-stat="games_starts">37</td>
                <td data-stat="goals">16</td>
                <td data-stat="assists">9</td>
            </tr>
            <tr class="thead"><th data-stat="player">Player</th></tr>
            <tr><th data-stat="player">Squad Total</th></tr>
            <tr>
                <th data-stat="player"><a href="/en/players/98ea5115/David-Raya">David Raya</a></th>
                <td data-stat="position">GK</td>
            </tr>
        </tbody></table>
    "#;

    #[test]
    fn test_parse_squad_links() {
        let links = parse_squad_links(LEAGUE_PAGE);
        assert_eq!(
            links,
            vec![
                "/en/squads/18bb7c10/Arsenal-Stats",
                "/en/squads/b8fd03ef/Manchester-City-Stats"
            ]
        );
    }

    #[test]
    fn test_parse_squad_links_without_table() {
        assert!(parse_squad_links("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_parse_team_page_extracts_roster_rows() {
        let players = parse_team_page(SQUAD_PAGE, "Arsenal");

        // The repeated-header row and the linkless total row are dropped.
        assert_eq!(players.len(), 2);

        let saka = &players[0];
        assert_eq!(saka.name, "Bukayo Saka");
        assert_eq!(
            saka.fbref_url.as_deref(),
            Some("https://fbref.com/en/players/bc7dc64d/Bukayo-Saka")
        );
        assert_eq!(saka.fbref_id.as_deref(), Some("bc7dc64d"));
        assert_eq!(saka.nationality.as_deref(), Some("ENG"));
        assert_eq!(saka.position.as_deref(), Some("FW"));
        assert_eq!(saka.games.as_deref(), Some("38"));
        assert_eq!(saka.starts.as_deref(), Some("37"));
        assert_eq!(saka.goals.as_deref(), Some("16"));
        assert_eq!(saka.assists.as_deref(), Some("9"));
        assert_eq!(saka.team.as_deref(), Some("Arsenal"));
    }

    #[test]
    fn test_missing_cells_leave_fields_absent() {
        let players = parse_team_page(SQUAD_PAGE, "Arsenal");
        let raya = &players[1];
        assert_eq!(raya.name, "David Raya");
        assert_eq!(raya.position.as_deref(), Some("GK"));
        assert!(raya.goals.is_none());
        assert!(raya.nationality.is_none());
    }

    #[test]
    fn test_fallback_table_class() {
        let html = r#"
            <table class="stats_table"><tbody>
                <tr><th data-stat="player"><a href="/en/players/x/Y">Y</a></th></tr>
            </tbody></table>
        "#;
        assert_eq!(parse_team_page(html, "Club").len(), 1);
    }

    #[test]
    fn test_squad_identity() {
        let (id, name, slug) = squad_identity("/en/squads/18bb7c10/Arsenal-Stats", 0);
        assert_eq!(id, "18bb7c10");
        assert_eq!(name, "Arsenal");
        assert_eq!(slug, "Arsenal-Stats");

        let (id, name, slug) = squad_identity("/en/squads/b8fd03ef/Manchester-City-Stats", 0);
        assert_eq!(id, "b8fd03ef");
        assert_eq!(name, "Manchester City");
        assert_eq!(slug, "Manchester-City-Stats");

        let (id, _, _) = squad_identity("bogus", 4);
        assert_eq!(id, "team_5");
    }
}
