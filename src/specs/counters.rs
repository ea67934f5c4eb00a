// src/specs/counters.rs
//! Table extractor for a hero's counters page.
//!
//! Locating the table is an ordered list of strategies; the first hit wins
//! and results are never merged:
//!
//! 1. `LabeledSection` – a `<header>` whose text is "Matchups", then the next
//!    table in document order.
//! 2. `SortableWinRate` – the first `table.sortable` whose header text
//!    mentions "win rate".
//! 3. `FirstTable` – the first table anywhere.
//!
//! Expected columns: `[icon] [opponent] [disadvantage] [win rate] [matches]`.
//! Rows with fewer than five cells are skipped. Numbers prefer the cell's
//! `data-value` attribute and fall back to the first number in the visible
//! text; an unreadable win rate or disadvantage is NaN, never 0.

use scraper::{ElementRef, Html};

use crate::config::consts::{
    HERO_PREFIX, MATCHES_MARKER, MATCHUPS_HEADER, MIN_READY_ROWS, MIN_ROW_CELLS, WINRATE_MARKER,
};
use crate::core::html::{self, attr, has_class, selector, text_lc, text_of};
use crate::core::sanitize::{digits_to_u64, first_number, parse_float, slugify};
use crate::error::ExtractError;
use crate::model::{HeroSlug, MatchupRecord};

use super::hero_segment;

/// Which strategy found the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Located {
    LabeledSection,
    SortableWinRate,
    FirstTable,
}

type Strategy = for<'a> fn(&'a Html) -> Option<ElementRef<'a>>;

const STRATEGIES: &[(Located, Strategy)] = &[
    (Located::LabeledSection, by_labeled_section),
    (Located::SortableWinRate, by_sortable_winrate),
    (Located::FirstTable, by_first_table),
];

#[derive(Clone, Debug)]
pub struct Extraction {
    pub located: Located,
    pub matchups: Vec<MatchupRecord>,
    /// Rows dropped as malformed (too few cells or no resolvable opponent).
    pub skipped_rows: usize,
}

/// Extract with the default hero path prefix.
pub fn extract(markup: &str) -> Result<Extraction, ExtractError> {
    extract_with_prefix(markup, HERO_PREFIX)
}

pub fn extract_with_prefix(markup: &str, prefix: &str) -> Result<Extraction, ExtractError> {
    let doc = html::parse(markup);
    let (located, table) = locate_table(&doc).ok_or(ExtractError::TableNotFound)?;

    let mut matchups = Vec::new();
    let mut skipped_rows = 0usize;
    for tr in body_rows(&table) {
        match parse_row(&tr, prefix) {
            Some(rec) => matchups.push(rec),
            None => skipped_rows += 1,
        }
    }

    logd!("table via {located:?}: {} rows, {} skipped", matchups.len(), skipped_rows);
    Ok(Extraction { located, matchups, skipped_rows })
}

pub fn locate_table(doc: &Html) -> Option<(Located, ElementRef<'_>)> {
    STRATEGIES
        .iter()
        .find_map(|(located, strategy)| strategy(doc).map(|t| (*located, t)))
}

fn by_labeled_section(doc: &Html) -> Option<ElementRef<'_>> {
    let mut armed = false;
    for el in doc.select(&selector("header, table")) {
        if el.value().name() == "header" {
            if text_lc(&el) == MATCHUPS_HEADER {
                armed = true;
            }
        } else if armed {
            return Some(el);
        }
    }
    None
}

fn by_sortable_winrate(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&selector("table"))
        .filter(|t| has_class(t, "sortable"))
        .find(|t| header_text(t).contains(WINRATE_MARKER))
}

fn by_first_table(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&selector("table")).next()
}

/// Lowercased `<thead>` text, or the table's `<th>` cells when there is no thead.
fn header_text(table: &ElementRef) -> String {
    if let Some(thead) = table.select(&selector("thead")).next() {
        return text_lc(&thead);
    }
    table
        .select(&selector("th"))
        .map(|th| text_lc(&th))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rows of the first `<tbody>`, or of the whole table when there is none.
fn body_rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let scope = table.select(&selector("tbody")).next().unwrap_or(*table);
    scope.select(&selector("tr")).collect()
}

fn parse_row(tr: &ElementRef, prefix: &str) -> Option<MatchupRecord> {
    let tds: Vec<ElementRef> = tr.select(&selector("td")).collect();
    if tds.len() < MIN_ROW_CELLS {
        return None;
    }

    let opponent = opponent_slug(&tds[1], prefix)?;
    let disadvantage = float_cell(&tds[2]);
    let winrate = float_cell(&tds[3]);
    let matches = match attr(&tds[4], "data-value") {
        Some(raw) => digits_to_u64(raw),
        None => digits_to_u64(&text_of(&tds[4])),
    };

    Some(MatchupRecord { opponent, winrate, disadvantage, matches })
}

/// Link target under the hero prefix wins; visible text is the fallback.
fn opponent_slug(cell: &ElementRef, prefix: &str) -> Option<HeroSlug> {
    let from_link = cell
        .select(&selector("a[href]"))
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| hero_segment(href, prefix))
        .find_map(HeroSlug::parse);

    from_link.or_else(|| HeroSlug::parse(&slugify(&text_of(cell))))
}

fn float_cell(cell: &ElementRef) -> f64 {
    match attr(cell, "data-value") {
        Some(raw) => parse_float(raw),
        None => first_number(&text_of(cell)),
    }
}

/// Structural marker: a table headed with "win rate" or "matches" that has
/// enough rows to be the real thing rather than a loading skeleton.
pub fn has_ready_table(markup: &str) -> bool {
    let doc = html::parse(markup);
    doc.select(&selector("table")).any(|t| {
        let head = header_text(&t);
        (head.contains(WINRATE_MARKER) || head.contains(MATCHES_MARKER))
            && t.select(&selector("tr")).count() >= MIN_READY_ROWS
    })
}
