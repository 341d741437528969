//! Multi-level security: sensitivities, categories, levels, and ranges
//! (spec §3, §4.3).

use crate::identity::{CatId, SensId};
use crate::idset::IdSet;
use crate::symbol::SymbolTable;
use bitflags::bitflags;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Sensitivity {
    pub name: String,
    /// Position in the total order; higher is more sensitive.
    pub order: u32,
    /// Categories this sensitivity's `level` declaration permits pairing
    /// with (the set `enumerate_levels` intersects against).
    pub legal_cats: IdSet<CatId>,
}

pub type SensStore = SymbolTable<SensId, Sensitivity>;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Category {
    pub name: String,
}

pub type CatStore = SymbolTable<CatId, Category>;

/// An MLS level: one sensitivity paired with a set of categories.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Level {
    pub sens: SensId,
    pub cats: IdSet<CatId>,
}

impl Level {
    pub fn new(sens: SensId, cats: IdSet<CatId>) -> Self {
        Self { sens, cats }
    }
}

/// Dominance relation between two levels (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    Equal,
    Dominates,
    DominatedBy,
    Incomparable,
}

fn cats_superset(a: &IdSet<CatId>, b: &IdSet<CatId>) -> bool {
    b.iter().all(|c| a.contains(c))
}

fn cats_equal(a: &IdSet<CatId>, b: &IdSet<CatId>) -> bool {
    a.len() == b.len() && cats_superset(a, b)
}

/// Compare two levels under the sensitivity total order, per the
/// definitions in spec §4.3.
pub fn compare_levels(a: &Level, b: &Level, sens: &SensStore) -> Dominance {
    let order_a = sens.get(a.sens).map(|s| s.order).unwrap_or(0);
    let order_b = sens.get(b.sens).map(|s| s.order).unwrap_or(0);

    let equal = a.sens == b.sens && cats_equal(&a.cats, &b.cats);
    if equal {
        return Dominance::Equal;
    }
    if order_a >= order_b && cats_superset(&a.cats, &b.cats) {
        return Dominance::Dominates;
    }
    if order_b >= order_a && cats_superset(&b.cats, &a.cats) {
        return Dominance::DominatedBy;
    }
    Dominance::Incomparable
}

fn dominates_or_equal(a: &Level, b: &Level, sens: &SensStore) -> bool {
    matches!(
        compare_levels(a, b, sens),
        Dominance::Dominates | Dominance::Equal
    )
}

bitflags! {
    /// Range comparison mode bitmask (spec §4.3). `EXACT` subsumes `SUB`
    /// and `SUPER`'s bits and must be checked first — a caller who passes
    /// `SUB | SUPER` without `EXACT` intentionally excludes the equal case.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompareMode: u8 {
        const EXACT     = 0b0001;
        const SUB       = 0b0010;
        const SUPER     = 0b0100;
        const INTERSECT = 0b1000;
    }
}

/// An MLS range `[low, high]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Range {
    pub low: Level,
    pub high: Level,
}

impl Range {
    pub fn single(level: Level) -> Self {
        Self {
            low: level.clone(),
            high: level,
        }
    }

    /// True iff `low <= level <= high` in the dominance lattice.
    pub fn contains(&self, level: &Level, sens: &SensStore) -> bool {
        dominates_or_equal(level, &self.low, sens) && dominates_or_equal(&self.high, level, sens)
    }

    /// True iff this range contains `sub`'s low and high endpoints.
    pub fn contains_range(&self, sub: &Range, sens: &SensStore) -> bool {
        self.contains(&sub.low, sens) && self.contains(&sub.high, sens)
    }

    /// Evaluate `self` against `other` under the requested comparison
    /// mode(s). Resolved per `original_source/libapol/src/mls_range.c`:
    /// `ans1 = self.contains_range(other)`, `ans2 = other.contains_range(self)`;
    /// EXACT = ans1 && ans2, SUB = ans1, SUPER = ans2, INTERSECT = ans1 || ans2.
    pub fn compare(&self, other: &Range, mode: CompareMode, sens: &SensStore) -> bool {
        let ans1 = self.contains_range(other, sens);
        let ans2 = other.contains_range(self, sens);

        if mode.contains(CompareMode::EXACT) && ans1 && ans2 {
            return true;
        }
        if mode.contains(CompareMode::SUB) && ans1 {
            return true;
        }
        if mode.contains(CompareMode::SUPER) && ans2 {
            return true;
        }
        if mode.contains(CompareMode::INTERSECT) && (ans1 || ans2) {
            return true;
        }
        false
    }

    /// The ordered finite list of levels between `low` and `high`: one per
    /// sensitivity in the total order from `low.sens` to `high.sens`
    /// inclusive, each carrying `high`'s categories intersected with that
    /// sensitivity's legal category set (spec §4.3).
    pub fn enumerate_levels(&self, sens_store: &SensStore) -> Vec<Level> {
        let low_order = sens_store.get(self.low.sens).map(|s| s.order).unwrap_or(0);
        let high_order = sens_store.get(self.high.sens).map(|s| s.order).unwrap_or(0);

        let mut result = Vec::new();
        for (id, sensitivity) in sens_store.iter() {
            if sensitivity.order < low_order || sensitivity.order > high_order {
                continue;
            }
            let cats: IdSet<CatId> = self
                .high
                .cats
                .iter()
                .filter(|c| sensitivity.legal_cats.contains(*c))
                .collect();
            result.push(Level::new(id, cats));
        }
        result.sort_by_key(|level| sens_store.get(level.sens).map(|s| s.order).unwrap_or(0));
        result
    }
}
