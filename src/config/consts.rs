// src/config/consts.rs

// Site
pub const BASE_URL: &str = "https://www.dotabuff.com";
pub const HERO_PREFIX: &str = "/heroes/";
pub const COUNTERS_SUFFIX: &str = "/counters";
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Path segments under the hero prefix that are site sections, not heroes.
pub const NON_HERO_SEGMENTS: &[&str] = &[
    "meta", "trends", "lanes", "played", "winning", "damage", "economy", "clips",
    "players", "guides", "items", "abilities", "builds", "overview",
];

// Table location
pub const MATCHUPS_HEADER: &str = "matchups";
pub const WINRATE_MARKER: &str = "win rate";
pub const MATCHES_MARKER: &str = "matches";
/// A counters page is considered loaded once a marked table has this many rows.
pub const MIN_READY_ROWS: usize = 10;
/// Cells per matchup row: icon, opponent, disadvantage, win rate, matches.
pub const MIN_ROW_CELLS: usize = 5;

// Local store
pub const STORE_DIR: &str = ".store";
pub const LOG_FILE: &str = ".store/debug.log";
pub const DEFAULT_OUT_ROOT: &str = "content/matchups";
pub const DEFAULT_PATCH: &str = "7.39D";
pub const METADATA_FILE: &str = "metadata.json";

// Scrape
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_SLEEP_MS: u64 = 5_000;
pub const DEFAULT_PACING_MIN_MS: u64 = 800;
pub const DEFAULT_PACING_MAX_MS: u64 = 1_600;
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 25;
pub const POLL_INTERVAL_MS: u64 = 500;
/// Extra GETs allowed while waiting for a marker; the delay doubles each time.
pub const MAX_MARKER_REPOLLS: u32 = 2;
pub const FAILURE_ALERT_RATIO: f64 = 0.10;

// Recommend
pub const MAX_ENEMIES: usize = 5;
pub const DEFAULT_TOP_K: usize = 10;
pub const LOGODDS_CLAMP_LO: f64 = 0.005;
pub const LOGODDS_CLAMP_HI: f64 = 0.995;
