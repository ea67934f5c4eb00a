// src/recommend.rs
//! Counter-pick recommendation engine.
//!
//! For each candidate hero `H` that is not itself an enemy:
//!
//! ```text
//! combined = logistic( Σ w_i · logit(wr(H vs e_i)) / Σ w_i )
//! ```
//!
//! summed only over enemies `H` has data against. Win rates are clamped to
//! [0.5%, 99.5%] before the logit so a 0% or 100% small-sample row cannot
//! produce an infinity. Candidates with zero available weight are dropped.
//!
//! Results are sorted by `combined`, descending, with a stable sort over
//! candidates visited in slug order; exact ties therefore come out in slug
//! order, which callers should treat as implementation-defined.
//!
//! Pure over an immutable [`Dataset`]: safe to call repeatedly and from many
//! threads at once.

use std::collections::{BTreeMap, HashSet};

use crate::config::consts::{LOGODDS_CLAMP_HI, LOGODDS_CLAMP_LO, MAX_ENEMIES};
use crate::error::SelectionError;
use crate::model::HeroSlug;

/// `hero -> opponent -> winrate (0..100)` from `hero`'s perspective.
pub type Dataset = BTreeMap<HeroSlug, BTreeMap<HeroSlug, f64>>;

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub hero: HeroSlug,
    pub weight: f64,
}

/// Validated, ordered enemy picks.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySelection {
    enemies: Vec<Enemy>,
}

impl EnemySelection {
    /// `weight: None` means 1.0.
    pub fn new<S: AsRef<str>>(picks: &[(S, Option<f64>)]) -> Result<Self, SelectionError> {
        Self::with_limit(picks, MAX_ENEMIES)
    }

    pub fn with_limit<S: AsRef<str>>(
        picks: &[(S, Option<f64>)],
        max: usize,
    ) -> Result<Self, SelectionError> {
        if picks.is_empty() {
            return Err(SelectionError::Empty);
        }
        if picks.len() > max {
            return Err(SelectionError::TooMany { max, got: picks.len() });
        }

        let mut seen = HashSet::new();
        let mut enemies = Vec::with_capacity(picks.len());
        for (raw, weight) in picks {
            let raw = raw.as_ref();
            let hero = HeroSlug::parse(raw).ok_or_else(|| SelectionError::BadSlug(s!(raw)))?;
            let weight = weight.unwrap_or(1.0);
            if !(0.0..=1.0).contains(&weight) {
                return Err(SelectionError::BadWeight { hero: hero.to_string(), weight });
            }
            if !seen.insert(hero.clone()) {
                return Err(SelectionError::Duplicate(hero.to_string()));
            }
            enemies.push(Enemy { hero, weight });
        }
        Ok(Self { enemies })
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn contains(&self, hero: &HeroSlug) -> bool {
        self.enemies.iter().any(|e| &e.hero == hero)
    }

    /// Every enemy must be one of `known` (the heroes recorded for a patch).
    pub fn require_known(&self, known: &[HeroSlug]) -> Result<(), SelectionError> {
        match self.enemies.iter().find(|e| !known.contains(&e.hero)) {
            Some(e) => Err(SelectionError::Unknown(e.hero.to_string())),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnemyWinrate {
    pub enemy: HeroSlug,
    /// `None` when the candidate has no usable data against this enemy.
    pub winrate: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate {
    pub hero: HeroSlug,
    pub combined: f64,
    pub per_enemy: Vec<EnemyWinrate>,
}

/// Percentage (0..100) → log-odds, clamped to [0.5%, 99.5%] first.
pub fn pct_to_logodds(pct: f64) -> f64 {
    let p = (pct / 100.0).clamp(LOGODDS_CLAMP_LO, LOGODDS_CLAMP_HI);
    (p / (1.0 - p)).ln()
}

/// Log-odds → percentage (0..100).
pub fn logodds_to_pct(lo: f64) -> f64 {
    100.0 / (1.0 + (-lo).exp())
}

pub fn score(dataset: &Dataset, selection: &EnemySelection) -> Vec<ScoredCandidate> {
    let mut results: Vec<ScoredCandidate> = dataset
        .iter()
        .filter(|(hero, _)| !selection.contains(hero))
        .filter_map(|(hero, opp_map)| score_one(hero, opp_map, selection))
        .collect();

    results.sort_by(|a, b| b.combined.total_cmp(&a.combined));
    results
}

fn score_one(
    hero: &HeroSlug,
    opp_map: &BTreeMap<HeroSlug, f64>,
    selection: &EnemySelection,
) -> Option<ScoredCandidate> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut per_enemy = Vec::with_capacity(selection.enemies().len());

    for Enemy { hero: enemy, weight } in selection.enemies() {
        // NaN is "no data", same as a missing row.
        let wr = opp_map.get(enemy).copied().filter(|w| w.is_finite());
        if let Some(wr) = wr {
            weighted_sum += weight * pct_to_logodds(wr);
            weight_total += weight;
        }
        per_enemy.push(EnemyWinrate { enemy: enemy.clone(), winrate: wr });
    }

    if weight_total <= 0.0 {
        return None;
    }
    Some(ScoredCandidate {
        hero: hero.clone(),
        combined: logodds_to_pct(weighted_sum / weight_total),
        per_enemy,
    })
}

/// Fixed-width text table of the top `top_k` results.
pub fn render_table(results: &[ScoredCandidate], selection: &EnemySelection, top_k: usize) -> String {
    let shown = results.len().min(top_k);
    let headers: Vec<String> = selection
        .enemies()
        .iter()
        .map(|e| format!("{} (w={})", e.hero, e.weight))
        .collect();

    let mut out = format!("=== Recommendations (Top {shown}) ===\n");
    out.push_str(&format!(
        "{:24} {:>8}  {}\n",
        "Hero",
        "Combined",
        headers.iter().map(|h| format!("{h:>18}")).collect::<Vec<_>>().join(" | ")
    ));
    out.push_str(&"-".repeat(26 + 10 + 3 + headers.len() * 21));
    out.push('\n');

    for r in &results[..shown] {
        let cols: Vec<String> = r
            .per_enemy
            .iter()
            .map(|pe| match pe.winrate {
                Some(wr) => format!("{:>18}", format!("{wr:.2}%")),
                None => format!("{:>18}", "—"),
            })
            .collect();
        out.push_str(&format!(
            "{:24} {:>8}  {}\n",
            r.hero.as_str(),
            format!("{:.2}%", r.combined),
            cols.join(" | ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(s: &str) -> HeroSlug {
        HeroSlug::parse(s).unwrap()
    }

    fn dataset(rows: &[(&str, &[(&str, f64)])]) -> Dataset {
        rows.iter()
            .map(|(h, opps)| (slug(h), opps.iter().map(|(o, w)| (slug(o), *w)).collect()))
            .collect()
    }

    fn pick(enemies: &[(&str, f64)]) -> EnemySelection {
        let v: Vec<(&str, Option<f64>)> = enemies.iter().map(|(e, w)| (*e, Some(*w))).collect();
        EnemySelection::new(&v).unwrap()
    }

    #[test]
    fn logodds_round_trip_inside_clamp() {
        let mut p = 0.5;
        while p <= 99.5 {
            let back = logodds_to_pct(pct_to_logodds(p));
            assert!((back - p).abs() < 1e-9, "p={p} back={back}");
            p += 0.25;
        }
    }

    #[test]
    fn logodds_saturates_outside_clamp() {
        assert_eq!(pct_to_logodds(100.0), pct_to_logodds(99.5));
        assert_eq!(pct_to_logodds(0.0), pct_to_logodds(0.5));
        assert_eq!(pct_to_logodds(250.0), pct_to_logodds(99.5));
        assert!(pct_to_logodds(100.0).is_finite());
        assert!(pct_to_logodds(-5.0).is_finite());
    }

    #[test]
    fn higher_winrate_ranks_first() {
        let data = dataset(&[("a", &[("b", 60.0)]), ("c", &[("b", 40.0)])]);
        let res = score(&data, &pick(&[("b", 1.0)]));
        let order: Vec<&str> = res.iter().map(|r| r.hero.as_str()).collect();
        assert_eq!(order, vec!["a", "c"]);
        assert!((res[0].combined - 60.0).abs() < 1e-9);
    }

    #[test]
    fn hundred_percent_is_clamped_and_still_wins() {
        let data = dataset(&[("x", &[("b", 100.0)]), ("y", &[("b", 90.0)])]);
        let res = score(&data, &pick(&[("b", 1.0)]));
        assert_eq!(res[0].hero.as_str(), "x");
        assert!((res[0].combined - 99.5).abs() < 1e-9);
        assert!(res.iter().all(|r| r.combined.is_finite()));
    }

    #[test]
    fn enemies_are_not_candidates_and_no_data_is_excluded() {
        let data = dataset(&[
            ("b", &[("a", 70.0)]),
            ("a", &[("b", 55.0)]),
            ("z", &[("q", 55.0)]),
        ]);
        let res = score(&data, &pick(&[("b", 1.0)]));
        let order: Vec<&str> = res.iter().map(|r| r.hero.as_str()).collect();
        assert_eq!(order, vec!["a"]);
    }

    #[test]
    fn nan_matchup_is_ignored_but_others_still_count() {
        let data = dataset(&[("h", &[("b", f64::NAN), ("c", 58.0)]), ("only-nan", &[("b", f64::NAN)])]);
        let res = score(&data, &pick(&[("b", 1.0), ("c", 0.5)]));
        assert_eq!(res.len(), 1);
        let h = &res[0];
        assert_eq!(h.hero.as_str(), "h");
        assert!((h.combined - 58.0).abs() < 1e-9);
        assert_eq!(h.per_enemy[0].winrate, None);
        assert_eq!(h.per_enemy[1].winrate, Some(58.0));
    }

    #[test]
    fn zero_weight_everywhere_excludes_candidate() {
        let data = dataset(&[("h", &[("b", 60.0)])]);
        let res = score(&data, &pick(&[("b", 0.0)]));
        assert!(res.is_empty());
    }

    #[test]
    fn weights_pull_toward_heavier_enemy() {
        let data = dataset(&[("h", &[("b", 70.0), ("c", 30.0)])]);
        let even = score(&data, &pick(&[("b", 1.0), ("c", 1.0)]));
        assert!((even[0].combined - 50.0).abs() < 1e-9);
        let skewed = score(&data, &pick(&[("b", 1.0), ("c", 0.25)]));
        assert!(skewed[0].combined > 50.0);
    }

    #[test]
    fn selection_validation() {
        let six: Vec<(&str, Option<f64>)> =
            ["a", "b", "c", "d", "e", "f"].iter().map(|s| (*s, None)).collect();
        assert_eq!(
            EnemySelection::new(&six).unwrap_err(),
            SelectionError::TooMany { max: 5, got: 6 }
        );
        assert!(matches!(
            EnemySelection::new(&[("a", Some(1.5))]).unwrap_err(),
            SelectionError::BadWeight { .. }
        ));
        assert_eq!(
            EnemySelection::new(&[("a", None), ("A", None)]).unwrap_err(),
            SelectionError::Duplicate(s!("a"))
        );
        let empty: [(&str, Option<f64>); 0] = [];
        assert_eq!(EnemySelection::new(&empty).unwrap_err(), SelectionError::Empty);

        let sel = EnemySelection::new(&[("Axe", None)]).unwrap();
        assert_eq!(sel.enemies()[0].weight, 1.0);
        assert_eq!(sel.enemies()[0].hero.as_str(), "axe");
    }

    #[test]
    fn enemies_must_be_recorded_heroes() {
        let known = vec![slug("axe"), slug("lina")];
        let sel = EnemySelection::new(&[("axe", None), ("lina", Some(0.5))]).unwrap();
        assert_eq!(sel.require_known(&known), Ok(()));

        let typo = EnemySelection::new(&[("axe", None), ("lnia", None)]).unwrap();
        assert_eq!(typo.require_known(&known), Err(SelectionError::Unknown(s!("lnia"))));
    }

    #[test]
    fn render_table_marks_missing_data() {
        let data = dataset(&[("h", &[("b", 60.0)])]);
        let sel = pick(&[("b", 1.0), ("c", 1.0)]);
        let text = render_table(&score(&data, &sel), &sel, 10);
        assert!(text.contains("Top 1"));
        assert!(text.contains("60.00%"));
        assert!(text.contains("—"));
    }
}
