//! Command-line interface definitions for squadnet.
//!
//! All options have defaults that match a normal crawl; the pacing and
//! WebDriver options exist so a blocked run can be slowed down or
//! rerouted without a rebuild.

use clap::Parser;

use crate::scrapers::fbref;

/// Command-line arguments for the squadnet scraper.
///
/// # Examples
///
/// ```sh
/// # Default crawl: cache under ./cache, results under ./output
/// squadnet
///
/// # Slower pacing after a rate-limit warning
/// squadnet --min-delay 20 --max-delay 40
///
/// # Plain-HTTP only, refreshing every cached page
/// squadnet --no-browser --force-refresh
/// ```
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Output directory for the JSON result files
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Cache directory for statistics-site pages
    #[arg(long, default_value = "cache/fbref")]
    pub fbref_cache_dir: String,

    /// Cache directory for market-site pages
    #[arg(long, default_value = "cache/transfermarkt")]
    pub tm_cache_dir: String,

    /// League page that seeds the crawl
    #[arg(long, default_value = fbref::DEFAULT_LEAGUE_URL)]
    pub league_url: String,

    /// Minimum pacing delay before each network fetch, in seconds
    #[arg(long, default_value_t = 8)]
    pub min_delay: u64,

    /// Maximum pacing delay before each network fetch, in seconds
    #[arg(long, default_value_t = 15)]
    pub max_delay: u64,

    /// WebDriver endpoint for the driven-browser strategy
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// Disable the driven-browser strategy even if a WebDriver is reachable
    #[arg(long)]
    pub no_browser: bool,

    /// Refetch pages even when they are already cached
    #[arg(long)]
    pub force_refresh: bool,

    /// Maximum number of players to cross-reference on the market site
    #[arg(long, default_value_t = 50)]
    pub player_limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["squadnet"]);
        assert_eq!(cli.output_dir, "output");
        assert_eq!(cli.fbref_cache_dir, "cache/fbref");
        assert_eq!(cli.tm_cache_dir, "cache/transfermarkt");
        assert_eq!(cli.min_delay, 8);
        assert_eq!(cli.max_delay, 15);
        assert_eq!(cli.player_limit, 50);
        assert!(!cli.no_browser);
        assert!(!cli.force_refresh);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "squadnet",
            "--output-dir",
            "/tmp/results",
            "--min-delay",
            "20",
            "--max-delay",
            "40",
            "--no-browser",
            "--force-refresh",
            "--player-limit",
            "10",
        ]);
        assert_eq!(cli.output_dir, "/tmp/results");
        assert_eq!(cli.min_delay, 20);
        assert_eq!(cli.max_delay, 40);
        assert!(cli.no_browser);
        assert!(cli.force_refresh);
        assert_eq!(cli.player_limit, 10);
    }
}
