//! Output generation.
//!
//! A run produces three timestamped JSON files in the output directory:
//!
//! ```text
//! output/
//! ├── fbref_data_20260806_143000.json         # teams and rosters
//! ├── transfermarkt_data_20260806_143000.json # per-player dossiers
//! └── scrape_stats_20260806_143000.json       # run summary
//! ```

pub mod json;
