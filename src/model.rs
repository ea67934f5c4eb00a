// src/model.rs
//! Persisted record shapes.
//!
//! One [`HeroSnapshot`] per hero per patch directory, plus one
//! [`PatchMetadata`] per directory. NaN win rates are written as JSON `null`
//! and read back as NaN, so "no usable data" never turns into 0%.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Normalized hero identifier: lowercase, trimmed, filename-safe.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HeroSlug(String);

impl HeroSlug {
    /// Normalize and validate. Rejects empty input and anything carrying
    /// query/fragment or path characters.
    pub fn parse(raw: &str) -> Option<HeroSlug> {
        let s = raw.trim().to_lowercase();
        if s.is_empty() || s == "." || s == ".." {
            return None;
        }
        let malformed = s
            .chars()
            .any(|c| matches!(c, '?' | '#' | '&' | '=' | '/' | '\\') || c.is_whitespace());
        if malformed { None } else { Some(HeroSlug(s)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HeroSlug {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HeroSlug::parse(&value).ok_or_else(|| format!("invalid hero slug {value:?}"))
    }
}

impl From<HeroSlug> for String {
    fn from(slug: HeroSlug) -> String {
        slug.0
    }
}

impl Borrow<str> for HeroSlug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeroSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a counters table, from the page hero's perspective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchupRecord {
    pub opponent: HeroSlug,
    #[serde(with = "nan_as_null")]
    pub winrate: f64,
    #[serde(with = "nan_as_null")]
    pub disadvantage: f64,
    pub matches: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeroSnapshot {
    pub hero: HeroSlug,
    pub patch: String,
    #[serde(with = "utc_seconds")]
    pub updated_at: DateTime<Utc>,
    pub matchups: Vec<MatchupRecord>,
}

impl HeroSnapshot {
    /// Matchups are stored sorted by opponent slug.
    pub fn new(
        hero: HeroSlug,
        patch: impl Into<String>,
        updated_at: DateTime<Utc>,
        mut matchups: Vec<MatchupRecord>,
    ) -> Self {
        matchups.sort_by(|a, b| a.opponent.cmp(&b.opponent));
        Self { hero, patch: patch.into(), updated_at: truncate_to_seconds(updated_at), matchups }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchMetadata {
    #[serde(with = "utc_seconds")]
    pub updated_at: DateTime<Utc>,
    pub patch: String,
}

/// `2025-08-28T13:04:05Z`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Accepts any RFC 3339 offset and converts to UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok().map(|dt| dt.with_timezone(&Utc))
}

pub fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.timestamp(), 0).unwrap_or(ts)
}

mod utc_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("not an RFC 3339 timestamp: {raw:?}")))
    }
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() { s.serialize_f64(*v) } else { s.serialize_none() }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
    }
}
