//! # squadnet
//!
//! A scraper that collects football roster statistics from FBref,
//! cross-references each player against Transfermarkt to recover market
//! value and transfer history, and reconstructs a continuous club-tenure
//! timeline per player. The output feeds downstream relationship-network
//! analysis.
//!
//! ## Usage
//!
//! ```sh
//! squadnet --output-dir ./output
//! ```
//!
//! ## Architecture
//!
//! The run is a strictly sequential pipeline:
//! 1. **Rosters**: league page → squad pages → player records
//! 2. **Cross-reference**: per player, market-site search → profile page
//! 3. **Timelines**: transfer events → club-tenure sequences
//! 4. **Output**: timestamped JSON files plus a run summary
//!
//! Every page goes through the resilient fetcher (`fetch` module): disk
//! cache first, randomized pacing, driven-browser strategy with direct
//! HTTP fallback. A block or rate-limit signal from either host aborts
//! the whole run rather than deepening the block.

use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod dates;
mod fetch;
mod models;
mod outputs;
mod scrapers;
mod timeline;
mod utils;

use cli::Cli;
use fetch::{BrowserFetcher, DirectHttpFetcher, FetchConfig, FetchError, PageCache, ResilientFetcher};
use scrapers::{fbref, transfermarkt};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("squadnet starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.league_url, ?args.player_limit, "Parsed CLI arguments");

    if args.min_delay > args.max_delay {
        error!(
            min_delay = args.min_delay,
            max_delay = args.max_delay,
            "Pacing window is inverted"
        );
        return Err("pacing window is inverted (--min-delay > --max-delay)".into());
    }

    // Early check: surface directory problems before an hour of paced fetching.
    for dir in [&args.output_dir, &args.fbref_cache_dir, &args.tm_cache_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Directory is not writable (fix perms or choose a different path)");
            return Err(e);
        }
    }

    let fbref_cache = PageCache::new(&args.fbref_cache_dir);
    let tm_cache = PageCache::new(&args.tm_cache_dir);

    // --- Assemble the fetch strategies ---
    let browser: Option<BrowserFetcher> = if args.no_browser {
        info!("Browser strategy disabled by flag; using direct HTTP only");
        None
    } else {
        let candidate = BrowserFetcher::new(args.webdriver_url.clone());
        match candidate.probe().await {
            Ok(()) => {
                info!(endpoint = %args.webdriver_url, "WebDriver reachable; browser strategy enabled");
                Some(candidate)
            }
            Err(e) => {
                warn!(endpoint = %args.webdriver_url, error = %e, "WebDriver not reachable; falling back to direct HTTP");
                warn!("The statistics host blocks plain clients aggressively; expect 403s without a browser");
                None
            }
        }
    };

    let config = FetchConfig::new(
        Duration::from_secs(args.min_delay),
        Duration::from_secs(args.max_delay),
        vec!["fbref.com".to_string()],
    );
    let fetcher = ResilientFetcher::new(browser, DirectHttpFetcher::new()?, config);

    // ---- Roster crawl ----
    let teams = match fbref::scrape_squads(&fetcher, &fbref_cache, &args.league_url, args.force_refresh).await
    {
        Ok(teams) => teams,
        Err(e) => return Err(fatal(e)),
    };
    if teams.is_empty() {
        error!("No team data collected; nothing to cross-reference");
        return Err("no team data collected".into());
    }

    // ---- Collect player names across all rosters ----
    let player_names: Vec<String> = teams
        .iter()
        .flat_map(|team| team.players.iter().map(|p| p.name.clone()))
        .unique()
        .collect();
    info!(count = player_names.len(), "Collected player names");

    // ---- Market-site cross-reference ----
    let dossiers = match transfermarkt::scrape_profiles(
        &fetcher,
        &tm_cache,
        &player_names,
        args.player_limit,
        args.force_refresh,
    )
    .await
    {
        Ok(dossiers) => dossiers,
        Err(e) => return Err(fatal(e)),
    };

    // ---- Output ----
    let stats = outputs::json::write_outputs(&teams, &dossiers, &args.output_dir).await?;

    let elapsed = start_time.elapsed();
    info!(
        teams = stats.total_teams,
        players = stats.total_players,
        profiles = stats.tm_profiles_found,
        secs = elapsed.as_secs(),
        "Scrape complete"
    );

    Ok(())
}

/// Log remediation hints for a terminal failure before surfacing it.
fn fatal(e: FetchError) -> Box<dyn Error> {
    match &e {
        FetchError::Blocked => {
            error!("The host is blocking automated requests (HTTP 403); aborting the run");
            error!("Remediation: wait several hours before retrying; run with a reachable WebDriver endpoint; change network egress; or seed the cache directories with manually saved pages");
        }
        FetchError::RateLimited => {
            error!("The host rate-limited the crawl (HTTP 429); aborting the run");
            error!("Remediation: wait before retrying, and widen --min-delay/--max-delay");
        }
        _ => error!(error = %e, "Fatal fetch error"),
    }
    Box::new(e)
}
