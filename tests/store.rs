// tests/store.rs
//
// Atomic replacement and crash behaviour of the record store.
//
use std::fs;

use chrono::{TimeZone, Utc};
use hero_counters::freshness;
use hero_counters::model::{HeroSlug, HeroSnapshot, MatchupRecord, PatchMetadata};
use hero_counters::store;

fn slug(s: &str) -> HeroSlug {
    HeroSlug::parse(s).unwrap()
}

fn snapshot(hero: &str, day: u32, winrate: f64) -> HeroSnapshot {
    let ts = Utc.with_ymd_and_hms(2025, 8, day, 9, 30, 0).unwrap();
    HeroSnapshot::new(slug(hero), "7.39D", ts, vec![MatchupRecord {
        opponent: slug("axe"),
        winrate,
        disadvantage: -1.0,
        matches: 500,
    }])
}

#[test]
fn crash_between_stage_and_commit_keeps_old_record() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("7.39D");
    let path = store::write_snapshot(&dir, &snapshot("pudge", 1, 51.0)).unwrap();
    let before = fs::read(&path).unwrap();

    // Temp file written and synced, process "dies" before the rename.
    let staged = store::stage(&path, b"{\"hero\":\"pudge\",\"matchups\":[").unwrap();
    let tmp = staged.temp_path().to_path_buf();
    std::mem::forget(staged);
    assert!(tmp.exists());

    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(store::read_snapshot(&path).unwrap().matchups[0].winrate, 51.0);

    // The leftover temp is not a record, and the next write goes through.
    assert_eq!(store::list_heroes(root.path(), "7.39D").unwrap(), vec![slug("pudge")]);
    store::write_snapshot(&dir, &snapshot("pudge", 2, 53.5)).unwrap();
    assert_eq!(store::read_snapshot(&path).unwrap().matchups[0].winrate, 53.5);
}

#[test]
fn overwrite_replaces_whole_record() {
    let dir = tempfile::tempdir().unwrap();
    store::write_snapshot(dir.path(), &snapshot("lina", 1, 40.0)).unwrap();
    let path = store::write_snapshot(dir.path(), &snapshot("lina", 3, 60.0)).unwrap();

    let back = store::read_snapshot(&path).unwrap();
    assert_eq!(back.updated_at.format("%Y-%m-%d").to_string(), "2025-08-03");
    assert_eq!(back.matchups.len(), 1);
    assert_eq!(back.matchups[0].winrate, 60.0);
}

#[test]
fn nan_winrate_is_written_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let path = store::write_snapshot(dir.path(), &snapshot("io", 1, f64::NAN)).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"winrate\": null"));
    assert!(text.contains("\"updated_at\": \"2025-08-01T09:30:00Z\""));
    assert!(store::read_snapshot(&path).unwrap().matchups[0].winrate.is_nan());
}

#[test]
fn metadata_round_trip_and_trailing_newline() {
    let dir = tempfile::tempdir().unwrap();
    let meta = PatchMetadata {
        updated_at: Utc.with_ymd_and_hms(2025, 8, 28, 0, 0, 0).unwrap(),
        patch: "7.39D".into(),
    };
    let path = store::write_metadata(dir.path(), &meta).unwrap();
    assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));
    assert_eq!(store::read_metadata(dir.path()).unwrap(), meta);
}

#[test]
fn legacy_metadata_timestamp_counts_for_freshness() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("axe.json");
    fs::write(&path, r#"{"metadata":{"updated_at":"2025-08-28T23:59:59+00:00"},"matchups":[]}"#).unwrap();

    let same_day = chrono::NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();
    let next_day = chrono::NaiveDate::from_ymd_opt(2025, 8, 29).unwrap();
    assert!(!freshness::needs_refresh(&path, same_day, false));
    assert!(freshness::needs_refresh(&path, next_day, false));
    assert!(freshness::needs_refresh(&path, same_day, true));
}
