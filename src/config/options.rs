// src/config/options.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::consts::*;
use crate::error::ConfigError;
use crate::model::HeroSlug;

/// Everything a run or a query needs, built once and passed by reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub site: SiteOptions,
    pub ingest: IngestOptions,
    pub recommend: RecommendOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteOptions::default(),
            ingest: IngestOptions::default(),
            recommend: RecommendOptions::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ingest.validate()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteOptions {
    pub base_url: String,
    pub hero_prefix: String,
    pub counters_suffix: String,
    pub user_agent: String,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            base_url: s!(BASE_URL),
            hero_prefix: s!(HERO_PREFIX),
            counters_suffix: s!(COUNTERS_SUFFIX),
            user_agent: s!(USER_AGENT),
        }
    }
}

impl SiteOptions {
    /// `https://host/heroes`
    pub fn index_url(&self) -> String {
        join!(&self.base_url, self.hero_prefix.trim_end_matches('/'))
    }

    /// `https://host/heroes/<slug>/counters`
    pub fn counters_url(&self, slug: &HeroSlug) -> String {
        join!(&self.base_url, &self.hero_prefix, slug.as_str(), &self.counters_suffix)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IngestOptions {
    pub patch: String,
    pub out_root: PathBuf,
    pub retries: u32,
    pub retry_sleep: Duration,
    pub pacing_min: Duration,
    pub pacing_max: Duration,
    pub page_timeout: Duration,
    pub force: bool,
    pub only: Option<Vec<HeroSlug>>,
    pub failure_ratio_alert: f64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            patch: s!(DEFAULT_PATCH),
            out_root: PathBuf::from(DEFAULT_OUT_ROOT),
            retries: DEFAULT_RETRIES,
            retry_sleep: Duration::from_millis(DEFAULT_RETRY_SLEEP_MS),
            pacing_min: Duration::from_millis(DEFAULT_PACING_MIN_MS),
            pacing_max: Duration::from_millis(DEFAULT_PACING_MAX_MS),
            page_timeout: Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS),
            force: false,
            only: None,
            failure_ratio_alert: FAILURE_ALERT_RATIO,
        }
    }
}

impl IngestOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        if self.pacing_min > self.pacing_max {
            return Err(ConfigError::InvertedPacing { min: self.pacing_min, max: self.pacing_max });
        }
        if self.patch.trim().is_empty() {
            return Err(ConfigError::EmptyPatch);
        }
        if !is_plain_dir_name(&self.patch) {
            return Err(ConfigError::BadPatch(self.patch.clone()));
        }
        if !(0.0..=1.0).contains(&self.failure_ratio_alert) {
            return Err(ConfigError::BadFailureRatio(self.failure_ratio_alert));
        }
        Ok(())
    }

    /// `<out_root>/<patch>`
    pub fn patch_dir(&self) -> PathBuf {
        patch_dir(&self.out_root, &self.patch)
    }
}

pub fn patch_dir(out_root: &Path, patch: &str) -> PathBuf {
    out_root.join(patch)
}

/// One path component that stays under its parent: no separators, no `.`/`..`.
fn is_plain_dir_name(label: &str) -> bool {
    !label.contains(['/', '\\', ':']) && !label.contains("..") && label != "."
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendOptions {
    pub max_enemies: usize,
    pub top_k: usize,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self { max_enemies: MAX_ENEMIES, top_k: DEFAULT_TOP_K }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_ingest_values() {
        let mut o = IngestOptions::default();
        o.retries = 0;
        assert_eq!(o.validate(), Err(ConfigError::ZeroRetries));

        let mut o = IngestOptions::default();
        o.pacing_min = Duration::from_secs(3);
        o.pacing_max = Duration::from_secs(1);
        assert!(matches!(o.validate(), Err(ConfigError::InvertedPacing { .. })));

        let mut o = IngestOptions::default();
        o.patch = s!("  ");
        assert_eq!(o.validate(), Err(ConfigError::EmptyPatch));
    }

    #[test]
    fn patch_label_cannot_leave_out_root() {
        for bad in ["../x", "..", ".", "a/b", "a\\b", "/abs", "c:x"] {
            let mut o = IngestOptions::default();
            o.patch = s!(bad);
            assert_eq!(o.validate(), Err(ConfigError::BadPatch(s!(bad))), "{bad}");
        }
        let mut o = IngestOptions::default();
        o.patch = s!("7.39D");
        assert_eq!(o.validate(), Ok(()));
    }

    #[test]
    fn urls_are_built_from_site_parts() {
        let site = SiteOptions::default();
        assert_eq!(site.index_url(), "https://www.dotabuff.com/heroes");
        let slug = HeroSlug::parse("anti-mage").unwrap();
        assert_eq!(site.counters_url(&slug), "https://www.dotabuff.com/heroes/anti-mage/counters");
    }
}
