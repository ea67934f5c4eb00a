// src/progress.rs
use std::path::Path;

use crate::model::HeroSlug;
use crate::pipeline::RunSummary;

/// Lightweight progress reporting for ingestion runs.
/// Frontends implement this to surface status; `idx` is 1-based.
pub trait Progress {
    /// Called once the hero list is known.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    fn item_done(&mut self, _idx: usize, _hero: &HeroSlug, _path: &Path) {}

    /// Existing record was fresh; nothing was fetched.
    fn item_skipped(&mut self, _idx: usize, _hero: &HeroSlug) {}

    fn item_failed(&mut self, _idx: usize, _hero: &HeroSlug, _reason: &str) {}

    /// Called at the end, with whatever was achieved.
    fn finish(&mut self, _summary: &RunSummary) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
