//! Career-timeline reconstruction.
//!
//! A player's transfer table is an unordered list of noisy events:
//! partial dates, missing destinations, loan departures and returns.
//! [`build_career_timeline`] turns it into an ordered, non-overlapping
//! sequence of club tenures.
//!
//! The algorithm:
//!
//! 1. Events lacking both a destination club and a normalized date are
//!    dropped; they cannot anchor a tenure. Undated events still sort
//!    (as 1900-01-01) and still count as "the next transaction" when an
//!    end date has to be defaulted.
//! 2. For each event in date order, the destination club opens a tenure.
//!    Its end is the date of the first later event departing *from* that
//!    club; failing that, the date of the very next event in the full
//!    sequence, on the assumption that continuous service ends when
//!    the player's next transaction happens. The last event opens a
//!    tenure that is still running (`present`).
//! 3. A destination club that already has a tenure record (a loan
//!    return) extends that record instead of duplicating it, but only to
//!    a strictly later end, and collects the new event's season label as
//!    evidence.
//!
//! Output order is the order tenures were first created, not date order.

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{ClubTenure, TenureEnd, TransferEvent};

/// Sort key for events whose date never parsed: before everything real.
fn undated_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
}

/// Reconstruct the club-tenure sequence from a player's transfer events.
pub fn build_career_timeline(events: &[TransferEvent]) -> Vec<ClubTenure> {
    if events.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&TransferEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.date_parsed.unwrap_or_else(undated_floor));

    let mut career: Vec<ClubTenure> = Vec::new();

    for (i, event) in sorted.iter().enumerate() {
        let (Some(club), Some(start_date)) = (event.to_club.as_deref(), event.date_parsed) else {
            debug!(?event.date, "Event cannot anchor a tenure; skipped");
            continue;
        };

        let end_date = if i + 1 < sorted.len() {
            // Explicit departure: the first later event leaving this club.
            let departure = sorted[i + 1..]
                .iter()
                .find(|next| next.from_club.as_deref() == Some(club))
                .and_then(|next| next.date_parsed);
            match departure.or(sorted[i + 1].date_parsed) {
                Some(date) => TenureEnd::Date(date),
                None => TenureEnd::Unknown,
            }
        } else {
            TenureEnd::Present
        };

        if let Some(existing) = career.iter_mut().find(|t| t.club == club) {
            // Loan return: extend the record, never duplicate it.
            if end_date == TenureEnd::Present
                || (existing.end_date != TenureEnd::Present && end_date > existing.end_date)
            {
                existing.end_date = end_date;
                if let Some(season) = &event.season {
                    existing.seasons.push(season.clone());
                }
            }
        } else {
            career.push(ClubTenure {
                club: club.to_string(),
                start_date,
                end_date,
                seasons: event.season.iter().cloned().collect(),
                transfer_fee: event
                    .transfer_fee
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
            });
        }
    }

    career
}
