// src/pipeline.rs
//! Fetch → parse → persist, one hero at a time.
//!
//! Per hero:
//!
//! ```text
//! PENDING ─ fresh ──────────────────────────────▶ SKIPPED
//!    └─▶ FETCHING ─▶ PARSING ─▶ SAVED
//!           ▲           │  └──▶ FAILED (persist error, or retries exhausted)
//!           └─ retry ◀──┘       (transient: fetch/marker/table-not-found)
//! ```
//!
//! The skip check runs before any network activity. Transient failures burn
//! one attempt and sleep `retry_sleep`; a persistence failure fails the hero
//! at once. A failed hero never stops the run. Between heroes that touched
//! the network the pipeline sleeps a random duration in
//! `[pacing_min, pacing_max]`.
//!
//! Strictly sequential: one fetcher, one hero in flight.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::config::Config;
use crate::core::HttpFetcher;
use crate::error::{FetchError, HeroError, RunError};
use crate::fetch::{self, Marker, PageFetcher, Session};
use crate::freshness;
use crate::model::{HeroSlug, HeroSnapshot, PatchMetadata};
use crate::progress::Progress;
use crate::specs::{counters, heroes};
use crate::store;

#[derive(Debug)]
pub enum HeroOutcome {
    Saved(PathBuf),
    Skipped,
    Failed(HeroError),
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// Heroes considered this run (after any `only` filter).
    pub total: usize,
    pub saved: Vec<HeroSlug>,
    pub skipped: Vec<HeroSlug>,
    pub failed: Vec<(HeroSlug, String)>,
    pub metadata_path: Option<PathBuf>,
    /// More than the configured share of heroes failed; likely rate-limited
    /// or blocked rather than a few pages changing shape.
    pub elevated_failure: bool,
}

impl RunSummary {
    pub fn failure_ratio(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.failed.len() as f64 / self.total as f64 }
    }

    fn close(&mut self, alert_ratio: f64) {
        self.elevated_failure = self.total > 0 && self.failure_ratio() > alert_ratio;
    }
}

/// Full ingestion with the default HTTP fetcher.
pub fn ingest(config: &Config, progress: Option<&mut dyn Progress>) -> Result<RunSummary, RunError> {
    let fetcher = HttpFetcher::new(&config.site, config.ingest.page_timeout).map_err(RunError::Acquire)?;
    run(config, Session::open(fetcher), progress)
}

/// Same as [`ingest`] but the fetcher is acquired by the caller's closure.
pub fn ingest_with<F, A>(
    config: &Config,
    acquire: A,
    progress: Option<&mut dyn Progress>,
) -> Result<RunSummary, RunError>
where
    F: PageFetcher,
    A: FnOnce() -> Result<F, FetchError>,
{
    let fetcher = acquire().map_err(RunError::Acquire)?;
    run(config, Session::open(fetcher), progress)
}

/// Run the pipeline with an already-open session. The session is consumed
/// and closed before this returns, on success and on error.
pub fn run<F: PageFetcher>(
    config: &Config,
    mut session: Session<F>,
    mut progress: Option<&mut dyn Progress>,
) -> Result<RunSummary, RunError> {
    config.validate()?;
    let opts = &config.ingest;
    let patch_dir = opts.patch_dir();
    store::ensure_directory(&patch_dir)?;
    logf!("ingest: patch {} into {}", opts.patch, patch_dir.display());
    say(&mut progress, &format!("Output directory: {}", patch_dir.display()));

    let mut slugs = heroes::discover(&mut *session, &config.site, opts.page_timeout)?;
    say(&mut progress, &format!("Discovered {} heroes", slugs.len()));
    if let Some(only) = &opts.only {
        slugs.retain(|s| only.contains(s));
        say(&mut progress, &format!("Restricted to {} heroes", slugs.len()));
    }

    let mut summary = RunSummary { total: slugs.len(), ..RunSummary::default() };
    if let Some(p) = progress.as_deref_mut() {
        p.begin(slugs.len());
    }

    let count = slugs.len();
    for (i, slug) in slugs.into_iter().enumerate() {
        let idx = i + 1;
        logf!("[{idx}/{count}] {slug}");

        let outcome = process_hero(&mut *session, config, &slug, &patch_dir);
        let touched_network = !matches!(outcome, HeroOutcome::Skipped);

        match outcome {
            HeroOutcome::Saved(path) => {
                if let Some(p) = progress.as_deref_mut() {
                    p.item_done(idx, &slug, &path);
                }
                summary.saved.push(slug);
            }
            HeroOutcome::Skipped => {
                if let Some(p) = progress.as_deref_mut() {
                    p.item_skipped(idx, &slug);
                }
                summary.skipped.push(slug);
            }
            HeroOutcome::Failed(err) => {
                let reason = err.to_string();
                loge!("{slug}: giving up: {reason}");
                if let Some(p) = progress.as_deref_mut() {
                    p.item_failed(idx, &slug, &reason);
                }
                summary.failed.push((slug, reason));
            }
        }

        if touched_network && idx < count {
            pace(opts.pacing_min, opts.pacing_max);
        }
    }
    drop(session);

    summary.metadata_path = finish_patch(&patch_dir, &opts.patch);
    summary.close(opts.failure_ratio_alert);
    report(&summary);
    if let Some(p) = progress.as_deref_mut() {
        p.finish(&summary);
    }
    Ok(summary)
}

/// One hero through the state machine.
pub fn process_hero<F: PageFetcher + ?Sized>(
    fetcher: &mut F,
    config: &Config,
    slug: &HeroSlug,
    patch_dir: &Path,
) -> HeroOutcome {
    let opts = &config.ingest;
    let path = store::snapshot_path(patch_dir, slug);
    let today = Utc::now().date_naive();

    if !freshness::needs_refresh(&path, today, opts.force) {
        logf!("{slug}: up to date, skipping");
        return HeroOutcome::Skipped;
    }

    let url = config.site.counters_url(slug);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        logd!("{slug}: attempt {attempt}/{}", opts.retries);

        match attempt_once(fetcher, config, slug, &url, patch_dir) {
            Ok(saved) => {
                logf!("{slug}: saved {}", saved.display());
                return HeroOutcome::Saved(saved);
            }
            Err(err) if err.is_transient() && attempt < opts.retries => {
                logw!("{slug}: attempt {attempt}/{} failed: {err}; retrying in {:?}", opts.retries, opts.retry_sleep);
                thread::sleep(opts.retry_sleep);
            }
            Err(err) => return HeroOutcome::Failed(err),
        }
    }
}

fn attempt_once<F: PageFetcher + ?Sized>(
    fetcher: &mut F,
    config: &Config,
    slug: &HeroSlug,
    url: &str,
    patch_dir: &Path,
) -> Result<PathBuf, HeroError> {
    let markup = fetch::fetch_page(fetcher, url, &Marker::MatchupTable, config.ingest.page_timeout)?;
    let extraction = counters::extract_with_prefix(&markup, &config.site.hero_prefix)?;
    if extraction.matchups.is_empty() {
        logw!("{slug}: matchup table located ({:?}) but no rows parsed", extraction.located);
    }
    let snap = HeroSnapshot::new(slug.clone(), config.ingest.patch.as_str(), Utc::now(), extraction.matchups);
    Ok(store::write_snapshot(patch_dir, &snap)?)
}

/// Offline mode: parse saved `<slug>.<ext>` pages from `input_dir` into
/// records under the configured patch directory. Fail-open per file.
pub fn parse_saved_pages(
    config: &Config,
    input_dir: &Path,
    ext: &str,
    mut progress: Option<&mut dyn Progress>,
) -> Result<RunSummary, RunError> {
    config.validate()?;
    if !input_dir.is_dir() {
        return Err(RunError::NotADirectory(input_dir.to_path_buf()));
    }
    let mut pages: Vec<(HeroSlug, PathBuf)> = fs::read_dir(input_dir)
        .map_err(|e| crate::error::PersistenceError::io(input_dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some(ext))
        .filter_map(|p| {
            let slug = p.file_stem().and_then(|s| s.to_str()).and_then(HeroSlug::parse)?;
            Some((slug, p))
        })
        .collect();
    pages.sort();
    if pages.is_empty() {
        return Err(RunError::NoPages { dir: input_dir.to_path_buf(), ext: s!(ext) });
    }

    let patch_dir = config.ingest.patch_dir();
    store::ensure_directory(&patch_dir)?;
    say(&mut progress, &format!("Output directory: {}", patch_dir.display()));

    let mut summary = RunSummary { total: pages.len(), ..RunSummary::default() };
    if let Some(p) = progress.as_deref_mut() {
        p.begin(pages.len());
    }

    for (i, (slug, page)) in pages.into_iter().enumerate() {
        let idx = i + 1;
        match parse_one_page(config, &slug, &page, &patch_dir) {
            Ok(path) => {
                if let Some(p) = progress.as_deref_mut() {
                    p.item_done(idx, &slug, &path);
                }
                summary.saved.push(slug);
            }
            Err(err) => {
                let reason = err.to_string();
                loge!("{}: {reason}", page.display());
                if let Some(p) = progress.as_deref_mut() {
                    p.item_failed(idx, &slug, &reason);
                }
                summary.failed.push((slug, reason));
            }
        }
    }

    summary.metadata_path = finish_patch(&patch_dir, &config.ingest.patch);
    summary.close(config.ingest.failure_ratio_alert);
    report(&summary);
    if let Some(p) = progress.as_deref_mut() {
        p.finish(&summary);
    }
    Ok(summary)
}

fn parse_one_page(
    config: &Config,
    slug: &HeroSlug,
    page: &Path,
    patch_dir: &Path,
) -> Result<PathBuf, HeroError> {
    let bytes = fs::read(page).map_err(|e| crate::error::PersistenceError::io(page, e))?;
    let markup = String::from_utf8_lossy(&bytes);
    let extraction = counters::extract_with_prefix(&markup, &config.site.hero_prefix)?;
    let snap = HeroSnapshot::new(slug.clone(), config.ingest.patch.as_str(), Utc::now(), extraction.matchups);
    Ok(store::write_snapshot(patch_dir, &snap)?)
}

/// Written after every hero was attempted, whatever the outcome.
fn finish_patch(patch_dir: &Path, patch: &str) -> Option<PathBuf> {
    let meta = PatchMetadata { updated_at: crate::model::truncate_to_seconds(Utc::now()), patch: s!(patch) };
    match store::write_metadata(patch_dir, &meta) {
        Ok(path) => Some(path),
        Err(e) => {
            loge!("could not write patch metadata: {e}");
            None
        }
    }
}

fn say(progress: &mut Option<&mut dyn Progress>, msg: &str) {
    if let Some(p) = progress.as_deref_mut() {
        p.log(msg);
    }
}

fn report(summary: &RunSummary) {
    logf!(
        "summary: saved {}, skipped {}, failed {} of {}",
        summary.saved.len(),
        summary.skipped.len(),
        summary.failed.len(),
        summary.total
    );
    if summary.elevated_failure {
        loge!(
            "elevated failure rate {:.0}%: possible rate limiting or bot blocking",
            summary.failure_ratio() * 100.0
        );
    }
}

fn pace(min: Duration, max: Duration) {
    let (lo, hi) = (min.as_millis() as u64, max.as_millis() as u64);
    if hi == 0 {
        return;
    }
    let ms = rand::thread_rng().gen_range(lo..=hi);
    thread::sleep(Duration::from_millis(ms));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevated_failure_needs_more_than_ratio() {
        let slug = HeroSlug::parse("axe").unwrap();
        let mut s = RunSummary { total: 10, ..RunSummary::default() };
        s.failed.push((slug.clone(), s!("x")));
        s.close(0.10);
        assert!(!s.elevated_failure, "exactly 10% is not elevated");

        s.failed.push((slug, s!("y")));
        s.close(0.10);
        assert!(s.elevated_failure);
    }

    #[test]
    fn empty_run_is_not_elevated() {
        let mut s = RunSummary::default();
        s.close(0.10);
        assert!(!s.elevated_failure);
        assert_eq!(s.failure_ratio(), 0.0);
    }
}
