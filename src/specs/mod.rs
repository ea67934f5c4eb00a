// src/specs/mod.rs
//! # Page readers
//!
//! Each module reads one kind of remote page and nothing else:
//!
//! - `heroes` – the hero index page → sorted, deduplicated [`HeroSlug`]s.
//! - `counters` – one hero's counters page → [`MatchupRecord`] rows.
//!
//! ## What does **not** live here
//! - Fetching, retries, pacing (`pipeline`).
//! - Persistence and freshness (`store`, `freshness`).
//!
//! These are pure functions over markup so they can be tested offline against
//! captured or hand-written fixtures.
//!
//! [`HeroSlug`]: crate::model::HeroSlug
//! [`MatchupRecord`]: crate::model::MatchupRecord

pub mod counters;
pub mod heroes;

/// First path segment after `prefix` in a link target, for both relative
/// (`/heroes/axe/counters`) and absolute (`https://host/heroes/axe`) hrefs.
/// Returns the raw segment; callers normalize it.
pub fn hero_segment<'a>(href: &'a str, prefix: &str) -> Option<&'a str> {
    let href = href.trim();
    let path = match href.find("://") {
        Some(i) => {
            let after = &href[i + 3..];
            &after[after.find('/')?..]
        }
        None => href,
    };
    let tail = path.strip_prefix(prefix)?;
    tail.split('/').find(|p| !p.is_empty())
}
