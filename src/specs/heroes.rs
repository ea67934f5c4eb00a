// src/specs/heroes.rs
//! Slug registry: the hero index page → canonical hero slugs.
//!
//! Every `<a href>` under the hero prefix is a candidate. Section pages that
//! share the prefix (`/heroes/meta`, `/heroes/guides`, …) are dropped via
//! [`NON_HERO_SEGMENTS`], as is anything that does not survive
//! [`HeroSlug::parse`]. The result is sorted so ordinal indices in logs and
//! progress output are stable from run to run.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::consts::NON_HERO_SEGMENTS;
use crate::config::SiteOptions;
use crate::core::html::{self, selector};
use crate::error::DiscoveryError;
use crate::fetch::{self, Marker, PageFetcher};
use crate::model::HeroSlug;

use super::hero_segment;

/// Fetch the index page and read slugs off it.
pub fn discover<F: PageFetcher + ?Sized>(
    fetcher: &mut F,
    site: &SiteOptions,
    timeout: Duration,
) -> Result<Vec<HeroSlug>, DiscoveryError> {
    let url = site.index_url();
    let marker = Marker::HeroLinks { prefix: site.hero_prefix.clone() };
    let markup = fetch::fetch_page(fetcher, &url, &marker, timeout)?;
    let slugs = slugs_from_index(&markup, &site.hero_prefix)?;
    logf!("discovered {} heroes from {url}", slugs.len());
    Ok(slugs)
}

/// Pure half of [`discover`].
pub fn slugs_from_index(markup: &str, prefix: &str) -> Result<Vec<HeroSlug>, DiscoveryError> {
    let doc = html::parse(markup);
    let anchors = selector("a[href]");

    let mut saw_link = false;
    let mut out: BTreeSet<HeroSlug> = BTreeSet::new();

    for a in doc.select(&anchors) {
        let Some(href) = a.value().attr("href") else { continue };
        let Some(segment) = hero_segment(href, prefix) else { continue };
        saw_link = true;

        let Some(slug) = HeroSlug::parse(segment) else {
            logd!("dropping malformed hero link {href:?}");
            continue;
        };
        if NON_HERO_SEGMENTS.contains(&slug.as_str()) {
            continue;
        }
        out.insert(slug);
    }

    if !saw_link {
        return Err(DiscoveryError::MarkerMissing { prefix: s!(prefix) });
    }
    if out.is_empty() {
        return Err(DiscoveryError::Empty);
    }
    Ok(out.into_iter().collect())
}

/// Structural marker for the index page.
pub fn has_hero_links(markup: &str, prefix: &str) -> bool {
    let doc = html::parse(markup);
    let anchors = selector("a[href]");
    doc.select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .any(|href| hero_segment(href, prefix).is_some())
}
