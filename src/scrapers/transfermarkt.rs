//! Transfermarkt market-data scraper.
//!
//! Cross-referencing a roster name takes two pages:
//!
//! 1. The **quick-search page**, whose first hit yields the player's
//!    canonical name, profile URL, current club, and market value.
//! 2. The **profile page**, whose transfers box yields the raw transfer
//!    history (from which the career timeline is reconstructed) and its
//!    honours box the trophy list.
//!
//! The site serves box ids and column classes inconsistently across
//! layouts, so boxes are located by id fragment first and header text
//! second, and every cell is optional: a row with missing cells still
//! yields a partial event.

use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument, warn};
use url::Url;

use crate::fetch::{FetchError, FetchStrategy, PageCache, ResilientFetcher};
use crate::models::{Honour, PlayerDossier, PlayerProfile, SearchHit, TransferEvent};
use crate::{dates, timeline};

pub const TM_BASE_URL: &str = "https://www.transfermarkt.com";

/// Cross-reference each roster name against the market site.
///
/// The crawl stops at `limit` players: market sites block long
/// uninterrupted crawls, and the cap keeps a run within what the
/// pacing window allows. Players whose search page cannot be fetched are
/// skipped; players found without a reachable profile keep their search
/// hit only.
#[instrument(level = "info", skip_all, fields(players = names.len(), limit))]
pub async fn scrape_profiles<B, H>(
    fetcher: &ResilientFetcher<B, H>,
    cache: &PageCache,
    names: &[String],
    limit: usize,
    force_refresh: bool,
) -> Result<Vec<PlayerDossier>, FetchError>
where
    B: FetchStrategy,
    H: FetchStrategy,
{
    info!("Starting market-site scrape");
    let mut dossiers = Vec::new();

    for (idx, name) in names.iter().enumerate() {
        if idx >= limit {
            info!(limit, "Player limit reached; stopping market-site crawl");
            break;
        }

        let query = urlencoding::encode(name);
        let search_url = format!("{TM_BASE_URL}/schnellsuche/ergebnis/schnellsuche?query={query}");
        let search_key = format!("search_{query}.html");

        info!(player = %name, index = idx + 1, "Searching for player");
        let Some(search_html) = fetcher
            .resolve(&search_url, cache, &search_key, force_refresh)
            .await?
        else {
            continue;
        };

        let hit = parse_search(&search_html, name);

        let profile = match hit.tm_profile_url.as_deref() {
            Some(profile_url) => {
                let player_id = hit
                    .tm_player_id
                    .clone()
                    .unwrap_or_else(|| query.to_string());
                let profile_key = format!("profile_{player_id}.html");

                info!(player = %hit.tm_name.as_deref().unwrap_or(name), "Fetching profile page");
                match fetcher
                    .resolve(profile_url, cache, &profile_key, force_refresh)
                    .await?
                {
                    Some(profile_html) => {
                        let profile = parse_profile(&profile_html, name);
                        info!(
                            player = %name,
                            transfers = profile.transfer_history.len(),
                            tenures = profile.career_history.len(),
                            honours = profile.honours.len(),
                            "Parsed profile"
                        );
                        Some(profile)
                    }
                    None => None,
                }
            }
            None => {
                warn!(player = %name, "No profile URL in search results");
                None
            }
        };

        dossiers.push(PlayerDossier {
            original_name: name.clone(),
            search: hit,
            profile,
        });
    }

    info!(count = dossiers.len(), "Market-site scrape complete");
    Ok(dossiers)
}

/// Interpret a quick-search results page: the first player hit, or an
/// empty hit when the search found nothing.
pub fn parse_search(html: &str, player_name: &str) -> SearchHit {
    let document = Html::parse_document(html);
    let search_box = Selector::parse("div#schnellsuche").unwrap();
    let items_row = Selector::parse("table.items tbody tr").unwrap();
    let name_cell = Selector::parse("td.hauptlink").unwrap();
    let club_cell = Selector::parse("td.zentriert").unwrap();
    let value_cell = Selector::parse("td.rechts.hauptlink").unwrap();
    let link = Selector::parse("a[href]").unwrap();
    let img = Selector::parse("img").unwrap();

    let mut hit = SearchHit {
        search_name: player_name.to_string(),
        ..Default::default()
    };

    let Some(first_row) = document
        .select(&search_box)
        .next()
        .and_then(|b| b.select(&items_row).next())
    else {
        return hit;
    };

    if let Some(a) = first_row
        .select(&name_cell)
        .next()
        .and_then(|cell| cell.select(&link).next())
    {
        hit.tm_name = non_empty(cell_text(&a));
        if let Some(href) = a.value().attr("href") {
            if let Ok(base) = Url::parse(TM_BASE_URL) {
                if let Ok(resolved) = base.join(href) {
                    hit.tm_profile_url = Some(resolved.to_string());
                }
            }
            if href.contains("/profil/spieler/") {
                hit.tm_player_id = href.rsplit('/').next().map(str::to_string);
            }
        }
    }

    hit.tm_club = first_row
        .select(&club_cell)
        .next()
        .and_then(|cell| cell.select(&img).next())
        .and_then(|i| i.value().attr("alt"))
        .map(str::to_string);

    hit.market_value = first_row
        .select(&value_cell)
        .next()
        .and_then(|cell| non_empty(cell_text(&cell)));

    hit
}

/// Interpret a profile page: raw transfer history, the career timeline
/// reconstructed from it, and honours.
pub fn parse_profile(html: &str, player_name: &str) -> PlayerProfile {
    let document = Html::parse_document(html);

    let transfer_history = find_box(&document, "transfers", &["Transfer"])
        .map(|b| parse_transfer_rows(&b))
        .unwrap_or_default();

    let honours = find_box(&document, "erfolge", &["Success", "Honour", "Award"])
        .map(|b| parse_honour_rows(&b))
        .unwrap_or_default();

    let career_history = timeline::build_career_timeline(&transfer_history);

    PlayerProfile {
        player_name: player_name.to_string(),
        transfer_history,
        career_history,
        honours,
    }
}

/// Locate a content box by id fragment, falling back to header text.
fn find_box<'a>(
    document: &'a Html,
    id_fragment: &str,
    header_needles: &[&str],
) -> Option<ElementRef<'a>> {
    let boxes = Selector::parse("div.box").unwrap();
    let header = Selector::parse("h2").unwrap();

    let all: Vec<ElementRef<'a>> = document.select(&boxes).collect();
    all.iter()
        .find(|b| {
            b.value()
                .id()
                .is_some_and(|id| id.to_lowercase().contains(id_fragment))
        })
        .or_else(|| {
            all.iter().find(|b| {
                b.select(&header).next().is_some_and(|h| {
                    let text = h.text().collect::<String>();
                    header_needles.iter().any(|needle| text.contains(needle))
                })
            })
        })
        .copied()
}

fn parse_transfer_rows(transfer_box: &ElementRef) -> Vec<TransferEvent> {
    let rows = Selector::parse("table.items tbody tr").unwrap();
    let centered = Selector::parse("td.zentriert").unwrap();
    let main_link = Selector::parse("td.hauptlink").unwrap();
    let right = Selector::parse("td.rechts").unwrap();
    let fee_cell = Selector::parse("td.rechts.hauptlink").unwrap();
    let link = Selector::parse("a").unwrap();

    let mut events = Vec::new();

    for row in transfer_box.select(&rows) {
        // Season subheaders share the table body with real rows.
        if row.value().classes().any(|c| c == "subhead") {
            continue;
        }

        let mut event = TransferEvent::default();

        let centered_cells: Vec<ElementRef> = row.select(&centered).collect();
        if let Some(cell) = centered_cells.first() {
            event.season = non_empty(cell_text(cell));
        }
        if let Some(cell) = centered_cells.get(1) {
            let raw = cell_text(cell);
            event.date_parsed = dates::normalize_transfer_date(&raw);
            event.date = non_empty(raw);
        }

        let club_cells: Vec<ElementRef> = row.select(&main_link).collect();
        if let Some(a) = club_cells.first().and_then(|cell| cell.select(&link).next()) {
            event.from_club = club_name(&a);
        }
        if let Some(a) = club_cells.get(1).and_then(|cell| cell.select(&link).next()) {
            event.to_club = club_name(&a);
        }

        event.market_value_at_transfer = row
            .select(&right)
            .next()
            .and_then(|cell| non_empty(cell_text(&cell)));
        event.transfer_fee = row
            .select(&fee_cell)
            .next()
            .and_then(|cell| non_empty(cell_text(&cell)));

        if !event.is_empty() {
            events.push(event);
        }
    }

    events
}

fn parse_honour_rows(honours_box: &ElementRef) -> Vec<Honour> {
    let rows = Selector::parse("table.items tbody tr").unwrap();
    let centered = Selector::parse("td.zentriert").unwrap();
    let main_link = Selector::parse("td.hauptlink").unwrap();
    let any_cell = Selector::parse("td").unwrap();

    let mut honours = Vec::new();

    for row in honours_box.select(&rows) {
        let honour = Honour {
            year: row
                .select(&centered)
                .next()
                .and_then(|cell| non_empty(cell_text(&cell))),
            title: row
                .select(&main_link)
                .next()
                .and_then(|cell| non_empty(cell_text(&cell))),
            club: row
                .select(&any_cell)
                .nth(2)
                .and_then(|cell| non_empty(cell_text(&cell))),
        };
        if !honour.is_empty() {
            honours.push(honour);
        }
    }

    honours
}

/// Prefer the link's `title` attribute: the visible text is often an
/// abbreviation ("Bor. Dortmund") while the title carries the full name.
fn club_name(a: &ElementRef) -> Option<String> {
    match a.value().attr("title") {
        Some(title) if !title.trim().is_empty() => Some(title.trim().to_string()),
        _ => non_empty(cell_text(a)),
    }
}

fn cell_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchConfig;
    use crate::models::TenureEnd;
    use chrono::NaiveDate;
    use std::time::Duration;

    const SEARCH_PAGE: &str = r#"
        <div id="schnellsuche">
            <table class="items"><tbody>
                <tr>
                    <td class="hauptlink"><a href="/bukayo-saka/profil/spieler/433177">Bukayo Saka</a></td>
                    <td class="zentriert"><img alt="Arsenal FC" src="x.png"></td>
                    <td class="rechts hauptlink">€150.00m</td>
                </tr>
                <tr>
                    <td class="hauptlink"><a href="/other/profil/spieler/999">Other Saka</a></td>
                </tr>
            </tbody></table>
        </div>
    "#;

    const PROFILE_PAGE: &str = r#"
        <div class="box" id="transferhistorie-transfers">
            <h2>Transfer history</h2>
            <table class="items"><tbody>
                <tr class="subhead"><td>Season 19/20</td></tr>
                <tr>
                    <td class="zentriert">19/20</td>
                    <td class="zentriert">Jul 1, 2019</td>
                    <td class="hauptlink"><a title="Arsenal U18">Arsenal U18</a></td>
                    <td class="hauptlink"><a title="Arsenal FC">Arsenal</a></td>
                    <td class="rechts">€5.00m</td>
                    <td class="rechts hauptlink">-</td>
                </tr>
                <tr>
                    <td class="zentriert">21/22</td>
                    <td class="zentriert">Jul 1, 2021</td>
                    <td class="hauptlink"><a title="Arsenal FC">Arsenal</a></td>
                    <td class="hauptlink"><a title="Chelsea FC">Chelsea</a></td>
                    <td class="rechts">€65.00m</td>
                    <td class="rechts hauptlink">€50.00m</td>
                </tr>
            </tbody></table>
        </div>
        <div class="box" id="erfolge-box">
            <table class="items"><tbody>
                <tr>
                    <td class="zentriert">2020</td>
                    <td class="hauptlink">FA Cup winner</td>
                    <td>Arsenal FC</td>
                </tr>
            </tbody></table>
        </div>
    "#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_search_first_hit() {
        let hit = parse_search(SEARCH_PAGE, "Bukayo Saka");
        assert_eq!(hit.search_name, "Bukayo Saka");
        assert_eq!(hit.tm_name.as_deref(), Some("Bukayo Saka"));
        assert_eq!(
            hit.tm_profile_url.as_deref(),
            Some("https://www.transfermarkt.com/bukayo-saka/profil/spieler/433177")
        );
        assert_eq!(hit.tm_player_id.as_deref(), Some("433177"));
        assert_eq!(hit.tm_club.as_deref(), Some("Arsenal FC"));
        assert_eq!(hit.market_value.as_deref(), Some("€150.00m"));
    }

    #[test]
    fn test_parse_search_without_results() {
        let hit = parse_search("<html><body></body></html>", "Nobody");
        assert_eq!(hit.search_name, "Nobody");
        assert!(hit.tm_profile_url.is_none());
        assert!(hit.tm_player_id.is_none());
    }

    #[test]
    fn test_parse_profile_transfers_and_honours() {
        let profile = parse_profile(PROFILE_PAGE, "Bukayo Saka");

        // The subhead row is skipped.
        assert_eq!(profile.transfer_history.len(), 2);

        let first = &profile.transfer_history[0];
        assert_eq!(first.season.as_deref(), Some("19/20"));
        assert_eq!(first.date.as_deref(), Some("Jul 1, 2019"));
        assert_eq!(first.date_parsed, Some(date(2019, 7, 1)));
        assert_eq!(first.from_club.as_deref(), Some("Arsenal U18"));
        assert_eq!(first.to_club.as_deref(), Some("Arsenal FC"));
        assert_eq!(first.market_value_at_transfer.as_deref(), Some("€5.00m"));
        assert_eq!(first.transfer_fee.as_deref(), Some("-"));

        assert_eq!(profile.honours.len(), 1);
        let honour = &profile.honours[0];
        assert_eq!(honour.year.as_deref(), Some("2020"));
        assert_eq!(honour.title.as_deref(), Some("FA Cup winner"));
        assert_eq!(honour.club.as_deref(), Some("Arsenal FC"));
    }

    #[test]
    fn test_profile_career_is_reconstructed() {
        let profile = parse_profile(PROFILE_PAGE, "Bukayo Saka");

        assert_eq!(profile.career_history.len(), 2);
        assert_eq!(profile.career_history[0].club, "Arsenal FC");
        assert_eq!(
            profile.career_history[0].end_date,
            TenureEnd::Date(date(2021, 7, 1))
        );
        assert_eq!(profile.career_history[1].club, "Chelsea FC");
        assert_eq!(profile.career_history[1].end_date, TenureEnd::Present);
    }

    #[test]
    fn test_box_found_by_header_text_fallback() {
        let html = r#"
            <div class="box">
                <h2>Transfer history</h2>
                <table class="items"><tbody>
                    <tr>
                        <td class="zentriert">22/23</td>
                        <td class="zentriert">Sep 1, 2022</td>
                    </tr>
                </tbody></table>
            </div>
        "#;
        let profile = parse_profile(html, "Someone");
        assert_eq!(profile.transfer_history.len(), 1);
        assert_eq!(
            profile.transfer_history[0].date_parsed,
            Some(date(2022, 9, 1))
        );
    }

    /// Strategy returning an empty page for every URL.
    struct CannedHtml;

    impl FetchStrategy for CannedHtml {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Ok("<html><body></body></html>".to_string())
        }
    }

    #[tokio::test]
    async fn test_player_limit_caps_the_crawl() {
        let root = std::env::temp_dir().join(format!("squadnet_tm_test_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let cache = PageCache::new(&root);

        let fetcher = ResilientFetcher::new(
            None::<CannedHtml>,
            CannedHtml,
            FetchConfig::new(Duration::ZERO, Duration::ZERO, vec![]),
        );
        let names: Vec<String> = ["Saka", "Raya", "Rice"].iter().map(|s| s.to_string()).collect();

        let dossiers = scrape_profiles(&fetcher, &cache, &names, 2, false)
            .await
            .unwrap();

        assert_eq!(dossiers.len(), 2);
        assert_eq!(dossiers[0].original_name, "Saka");
        // The empty search page yields no profile URL, so no profile.
        assert!(dossiers.iter().all(|d| d.profile.is_none()));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_partial_transfer_row_still_yields_an_event() {
        let html = r#"
            <div class="box" id="transfers">
                <table class="items"><tbody>
                    <tr><td class="zentriert">19/20</td></tr>
                </tbody></table>
            </div>
        "#;
        let profile = parse_profile(html, "Someone");
        assert_eq!(profile.transfer_history.len(), 1);
        let event = &profile.transfer_history[0];
        assert_eq!(event.season.as_deref(), Some("19/20"));
        assert!(event.date.is_none());
        assert!(event.to_club.is_none());
        // And an event that anchors nothing builds no tenure.
        assert!(profile.career_history.is_empty());
    }
}
