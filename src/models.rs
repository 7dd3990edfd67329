//! Domain records for teams, players, transfers, and career timelines.
//!
//! Records are flat field mappings extracted by the page interpreters.
//! Fields the source page did not provide stay `None` and are omitted
//! from the JSON output, matching the loose shape downstream network
//! analysis expects; only a missing primary key (a player name) drops a
//! record entirely.
//!
//! [`TransferEvent`] and [`ClubTenure`] are derived data: they are
//! recomputed on every run from fetched (or cached) documents and never
//! stored independently.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// One roster row from the statistics site.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerRecord {
    /// Player name, the primary key; rows without one are dropped.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbref_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbref_id: Option<String>,
    /// Country code, the last whitespace token of the nationality cell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub games: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assists: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

/// A team and its scraped roster.
#[derive(Debug, Clone, Serialize)]
pub struct TeamSquad {
    pub team_name: String,
    pub team_id: String,
    pub team_url: String,
    pub players: Vec<PlayerRecord>,
    pub player_count: usize,
}

/// First hit of a market-site player search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchHit {
    /// The name the search was issued for.
    pub search_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tm_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tm_profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tm_player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tm_club: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_value: Option<String>,
}

/// One row of a player's transfer table.
///
/// Fee and market value stay opaque display strings; the sites mix
/// currencies, "free transfer", "loan", and "-" in the same column.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    /// Raw date text as shown on the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Normalized ISO date; null when the raw text was unparseable.
    pub date_parsed: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_club: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_club: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_value_at_transfer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_fee: Option<String>,
}

impl TransferEvent {
    /// A row with no recognizable cell at all is noise, not an event.
    pub fn is_empty(&self) -> bool {
        self.season.is_none()
            && self.date.is_none()
            && self.from_club.is_none()
            && self.to_club.is_none()
            && self.market_value_at_transfer.is_none()
            && self.transfer_fee.is_none()
    }
}

/// End of a club tenure.
///
/// Ordering: an unresolvable end sorts below every date, and `Present`
/// above every date, so "extend only to a strictly later end" works as
/// a plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TenureEnd {
    /// No departure date could be recovered; serialized as null.
    Unknown,
    /// The player left on this date.
    Date(NaiveDate),
    /// The tenure is still open; serialized as `"present"`.
    Present,
}

impl Serialize for TenureEnd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TenureEnd::Unknown => serializer.serialize_none(),
            TenureEnd::Date(date) => date.serialize(serializer),
            TenureEnd::Present => serializer.serialize_str("present"),
        }
    }
}

/// A contiguous span during which a player was registered with a club.
#[derive(Debug, Clone, Serialize)]
pub struct ClubTenure {
    pub club: String,
    pub start_date: NaiveDate,
    pub end_date: TenureEnd,
    /// Season labels of the transfer events contributing to this tenure.
    pub seasons: Vec<String>,
    /// Fee paid when the club acquired the player.
    pub transfer_fee: String,
}

/// One row of a player's honours table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Honour {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
}

impl Honour {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.title.is_none() && self.club.is_none()
    }
}

/// Everything extracted from a player's market-site profile page.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerProfile {
    pub player_name: String,
    pub transfer_history: Vec<TransferEvent>,
    /// Reconstructed, non-overlapping club-tenure sequence.
    pub career_history: Vec<ClubTenure>,
    pub honours: Vec<Honour>,
}

/// Combined search and profile data for one player, serialized flat.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerDossier {
    /// Roster name the cross-reference started from.
    pub original_name: String,
    #[serde(flatten)]
    pub search: SearchHit,
    #[serde(flatten)]
    pub profile: Option<PlayerProfile>,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeStats {
    pub scrape_date: String,
    pub total_teams: usize,
    pub total_players: usize,
    pub tm_profiles_found: usize,
}
