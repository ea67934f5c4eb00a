// src/freshness.rs
//! Freshness policy: decides whether a stored hero record can be reused.
//!
//! Date-based, in UTC: a record written on or after `today` is fresh. Any
//! record that cannot be read, or whose timestamp does not parse, is stale.
//! Ingestion is never blocked by a corrupt prior record.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::core::sanitize::nonfinite_to_null;
use crate::model::{parse_timestamp, HeroSnapshot};

pub fn is_fresh(existing: Option<&HeroSnapshot>, today: NaiveDate) -> bool {
    match existing {
        Some(snap) => snap.updated_at.date_naive() >= today,
        None => false,
    }
}

/// Same rule applied to a bare stored timestamp string.
pub fn is_fresh_stamp(updated_at: Option<&str>, today: NaiveDate) -> bool {
    updated_at
        .and_then(parse_timestamp)
        .is_some_and(|ts| ts.date_naive() >= today)
}

/// Top-level `updated_at`, or the older `metadata.updated_at` layout.
/// Read loosely so a record that no longer matches [`HeroSnapshot`] still
/// yields its timestamp.
pub fn stored_updated_at(path: &Path) -> Option<DateTime<Utc>> {
    let text = fs::read_to_string(path).ok()?;
    let value: Value = match serde_json::from_str(&nonfinite_to_null(&text)) {
        Ok(v) => v,
        Err(e) => {
            logw!("could not read existing record {} ({e}); will refresh", path.display());
            return None;
        }
    };
    let raw = value
        .get("updated_at")
        .and_then(Value::as_str)
        .or_else(|| value.get("metadata")?.get("updated_at")?.as_str())?;
    parse_timestamp(raw)
}

/// Skip check for one record path. `force` bypasses it unconditionally.
pub fn needs_refresh(path: &Path, today: NaiveDate, force: bool) -> bool {
    if force {
        return true;
    }
    match stored_updated_at(path) {
        Some(ts) => ts.date_naive() < today,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HeroSlug;
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 28).unwrap()
    }

    fn snap_at(ts: DateTime<Utc>) -> HeroSnapshot {
        HeroSnapshot::new(HeroSlug::parse("axe").unwrap(), "7.39D", ts, Vec::new())
    }

    #[test]
    fn absent_is_stale() {
        assert!(!is_fresh(None, today()));
    }

    #[test]
    fn same_utc_day_is_fresh_regardless_of_time() {
        let early = Utc.with_ymd_and_hms(2025, 8, 28, 0, 0, 1).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 8, 28, 23, 59, 59).unwrap();
        assert!(is_fresh(Some(&snap_at(early)), today()));
        assert!(is_fresh(Some(&snap_at(late)), today()));
    }

    #[test]
    fn yesterday_is_stale_even_minutes_ago() {
        let y = Utc.with_ymd_and_hms(2025, 8, 27, 23, 59, 59).unwrap();
        assert!(!is_fresh(Some(&snap_at(y)), today()));
    }

    #[test]
    fn future_dates_count_as_fresh() {
        let t = Utc.with_ymd_and_hms(2025, 8, 29, 1, 0, 0).unwrap();
        assert!(is_fresh(Some(&snap_at(t)), today()));
    }

    #[test]
    fn bad_stamps_are_stale() {
        assert!(!is_fresh_stamp(Some("not a date"), today()));
        assert!(!is_fresh_stamp(None, today()));
        assert!(is_fresh_stamp(Some("2025-08-28T10:00:00Z"), today()));
    }

    #[test]
    fn reads_legacy_metadata_stamp_and_force_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("axe.json");
        fs::write(&legacy, r#"{"hero":"axe","metadata":{"updated_at":"2025-08-28T09:00:00Z"}}"#).unwrap();
        assert!(!needs_refresh(&legacy, today(), false));
        assert!(needs_refresh(&legacy, today(), true));

        let corrupt = dir.path().join("lina.json");
        fs::write(&corrupt, "{ truncated").unwrap();
        assert!(needs_refresh(&corrupt, today(), false));

        let missing = dir.path().join("zeus.json");
        assert!(needs_refresh(&missing, today(), false));
    }

    #[test]
    fn python_written_record_still_has_a_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("io.json");
        fs::write(&path, r#"{"updated_at": "2025-08-28T08:00:00Z", "matchups": [{"winrate": NaN}]}"#).unwrap();
        assert!(!needs_refresh(&path, today(), false));
    }
}
