// src/store.rs
//! On-disk dataset: `<out_root>/<patch>/<hero>.json` plus `metadata.json`.
//!
//! Writers go through [`atomic_write`]: bytes land in a sibling temp file,
//! are synced, then renamed over the target. A reader sees the old record or
//! the new one, never a torn write.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::consts::METADATA_FILE;
use crate::core::sanitize::nonfinite_to_null;
use crate::error::PersistenceError;
use crate::model::{HeroSlug, HeroSnapshot, PatchMetadata};
use crate::recommend::Dataset;

pub fn ensure_directory(dir: &Path) -> Result<(), PersistenceError> {
    if dir.exists() && !dir.is_dir() {
        let err = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path exists but is not a directory");
        return Err(PersistenceError::io(dir, err));
    }
    fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))
}

pub fn snapshot_path(patch_dir: &Path, hero: &HeroSlug) -> PathBuf {
    patch_dir.join(format!("{hero}.json"))
}

pub fn metadata_path(patch_dir: &Path) -> PathBuf {
    patch_dir.join(METADATA_FILE)
}

/// Bytes staged next to their final path, not yet visible there.
/// Dropping without [`StagedWrite::commit`] removes the temp file.
pub struct StagedWrite {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        &self.tmp
    }

    /// Atomically replace the target with the staged bytes.
    pub fn commit(mut self) -> Result<PathBuf, PersistenceError> {
        fs::rename(&self.tmp, &self.target).map_err(|e| PersistenceError::io(&self.target, e))?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Write and fsync `bytes` to a temp sibling of `path`.
pub fn stage(path: &Path, bytes: &[u8]) -> Result<StagedWrite, PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".tmp.{}", std::process::id()));
    let tmp = PathBuf::from(tmp);

    // Owns the temp file from here on so an early return cleans it up.
    let staged = StagedWrite { tmp, target: path.to_path_buf(), committed: false };

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&staged.tmp)
        .map_err(|e| PersistenceError::io(&staged.tmp, e))?;
    file.write_all(bytes).map_err(|e| PersistenceError::io(&staged.tmp, e))?;
    file.sync_all().map_err(|e| PersistenceError::io(&staged.tmp, e))?;
    Ok(staged)
}

pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<PathBuf, PersistenceError> {
    stage(path, bytes)?.commit()
}

pub fn write_snapshot(patch_dir: &Path, snap: &HeroSnapshot) -> Result<PathBuf, PersistenceError> {
    let path = snapshot_path(patch_dir, &snap.hero);
    let json = serde_json::to_vec_pretty(snap).map_err(|e| PersistenceError::json(&path, e))?;
    atomic_write(&path, &json)
}

pub fn read_snapshot(path: &Path) -> Result<HeroSnapshot, PersistenceError> {
    let text = fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
    serde_json::from_str(&nonfinite_to_null(&text)).map_err(|e| PersistenceError::json(path, e))
}

pub fn write_metadata(patch_dir: &Path, meta: &PatchMetadata) -> Result<PathBuf, PersistenceError> {
    let path = metadata_path(patch_dir);
    let mut json = serde_json::to_vec_pretty(meta).map_err(|e| PersistenceError::json(&path, e))?;
    json.push(b'\n');
    atomic_write(&path, &json)
}

pub fn read_metadata(patch_dir: &Path) -> Result<PatchMetadata, PersistenceError> {
    let path = metadata_path(patch_dir);
    let text = fs::read_to_string(&path).map_err(|e| PersistenceError::io(&path, e))?;
    serde_json::from_str(&text).map_err(|e| PersistenceError::json(&path, e))
}

/// Patch labels with a directory under `out_root`, sorted.
pub fn list_patches(out_root: &Path) -> Result<Vec<String>, PersistenceError> {
    if !out_root.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(out_root).map_err(|e| PersistenceError::io(out_root, e))? {
        let path = entry.map_err(|e| PersistenceError::io(out_root, e))?.path();
        if !path.is_dir() { continue; }
        if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
            out.push(s!(name));
        }
    }
    out.sort();
    Ok(out)
}

/// `<hero>.json` files in a patch directory, excluding metadata, sorted by slug.
pub fn record_paths(patch_dir: &Path) -> Result<Vec<(HeroSlug, PathBuf)>, PersistenceError> {
    let mut out = Vec::new();
    for entry in fs::read_dir(patch_dir).map_err(|e| PersistenceError::io(patch_dir, e))? {
        let path = entry.map_err(|e| PersistenceError::io(patch_dir, e))?.path();
        if !path.is_file() { continue; }
        if path.file_name().and_then(|s| s.to_str()) == Some(METADATA_FILE) { continue; }
        if path.extension().and_then(|s| s.to_str()) != Some("json") { continue; }
        let Some(slug) = path.file_stem().and_then(|s| s.to_str()).and_then(HeroSlug::parse) else {
            continue;
        };
        out.push((slug, path));
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

pub fn list_heroes(out_root: &Path, patch: &str) -> Result<Vec<HeroSlug>, PersistenceError> {
    let dir = crate::config::options::patch_dir(out_root, patch);
    Ok(record_paths(&dir)?.into_iter().map(|(s, _)| s).collect())
}

#[derive(Deserialize)]
struct LooseRecord {
    hero: Option<String>,
    #[serde(default)]
    matchups: Vec<LooseMatchup>,
}

#[derive(Deserialize)]
struct LooseMatchup {
    #[serde(default)]
    opponent: String,
    #[serde(default)]
    winrate: Option<f64>,
}

/// Build `hero -> opponent -> winrate` for one patch directory.
///
/// Tolerant by construction: unreadable files are logged and skipped, NaN or
/// missing win rates (including Python's bare `NaN` token) are dropped (absent, not 0%), and heroes with nothing
/// usable are left out. Older records without `patch`/`updated_at` load too.
pub fn load_dataset(out_root: &Path, patch: &str) -> Result<Dataset, PersistenceError> {
    let dir = crate::config::options::patch_dir(out_root, patch);
    let mut data: Dataset = BTreeMap::new();

    for (stem, path) in record_paths(&dir)? {
        let rec: LooseRecord = match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|t| serde_json::from_str(&nonfinite_to_null(&t)).map_err(|e| e.to_string()))
        {
            Ok(r) => r,
            Err(e) => {
                logw!("skipping unreadable record {}: {e}", path.display());
                continue;
            }
        };

        let hero = rec.hero.as_deref().and_then(HeroSlug::parse).unwrap_or(stem);
        let opp_map: BTreeMap<HeroSlug, f64> = rec
            .matchups
            .into_iter()
            .filter_map(|m| {
                let wr = m.winrate.filter(|w| w.is_finite())?;
                Some((HeroSlug::parse(&m.opponent)?, wr))
            })
            .collect();

        if !opp_map.is_empty() {
            data.insert(hero, opp_map);
        }
    }

    logd!("loaded {} heroes from {}", data.len(), dir.display());
    Ok(data)
}
