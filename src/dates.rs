//! Transfer-date normalization.
//!
//! Market-site transfer tables mix date formats: `"Jul 1, 2019"` on the
//! English pages, `"01.07.2019"` on the German ones, and sometimes just
//! a season year. Everything is normalized to an ISO calendar date; a
//! bare year defaults to July 1, the conventional mid-year transfer
//! window date.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());

/// Normalize raw transfer-date text to an ISO calendar date.
///
/// Recognized forms, tried in order:
/// 1. Month-name format: `"Jul 1, 2019"`
/// 2. Dot format: `"01.07.2019"` (day.month.year)
/// 3. A bare 4-digit year anywhere in the text, defaulted to July 1
///
/// Returns `None` when no date can be recovered (including the
/// placeholder `"-"` the site uses for unknown dates).
pub fn normalize_transfer_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() || text == "-" {
        return None;
    }

    if text.contains(',') {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%b %d, %Y") {
            return Some(date);
        }
    } else if text.contains('.') {
        if let Some(date) = parse_dotted(text) {
            return Some(date);
        }
    }

    let year: i32 = YEAR_TOKEN.find(text)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, 7, 1)
}

/// `day.month.year` with any zero padding.
fn parse_dotted(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split('.');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
