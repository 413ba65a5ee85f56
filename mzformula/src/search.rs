/*!
Search an observed m/z against candidate formulas.

An observed ion is converted into one neutral-mass hypothesis per charge state
and adduct, each hypothesis is handed to a [`FormulaEnumerator`], and the
per-hypothesis hits are capped, tagged with the hypothesis that produced them,
and ranked together.
*/
use std::collections::HashSet;

use tracing::{debug, trace};

use crate::adducts::{Adduct, AdductTable, IonMode};
use crate::coarseness::{CoarsenessLevel, CoarsenessParams};
use crate::composition::BlockCounts;
use crate::enumerate::{sort_by_abs_ppm, CountBounds, FormulaEnumerator, Hit};
use crate::masses::Metal;

/// A [`Hit`] found under a specific (charge, adduct) hypothesis for an observed m/z
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    pub mz: f64,
    /// The signed charge state of the hypothesis
    pub charge: i32,
    pub adduct: String,
    /// The neutral mass the observed m/z implies under this hypothesis
    pub neutral_mass: f64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub hit: Hit,
}

impl SearchResult {
    pub fn new(mz: f64, charge: i32, adduct: &Adduct, neutral_mass: f64, hit: Hit) -> Self {
        Self {
            mz,
            charge,
            adduct: adduct.label.to_string(),
            neutral_mass,
            hit,
        }
    }

    #[inline]
    pub fn formula(&self) -> &str {
        &self.hit.formula
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.hit.mass
    }

    #[inline]
    pub fn ppm_error(&self) -> f64 {
        self.hit.ppm_error
    }

    #[inline]
    pub fn counts(&self) -> &BlockCounts {
        self.hit.counts()
    }

    #[inline]
    pub fn metal(&self) -> Metal {
        self.hit.metal()
    }
}

/// The parameters controlling a search, with defaults for a routine
/// negative mode yttrium search.
///
/// Charges and adducts follow the [`IonMode`] unless they are set explicitly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchParameters {
    pub ppm: f64,
    pub mode: IonMode,
    pub charges: Option<Vec<i32>>,
    pub adducts: Option<AdductTable>,
    pub metal: Metal,
    pub coarseness: CoarsenessLevel,
    pub bounds: CountBounds,
    pub max_hits_per_combination: usize,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            ppm: 10.0,
            mode: IonMode::Negative,
            charges: None,
            adducts: None,
            metal: Metal::Yttrium,
            coarseness: CoarsenessLevel::Moderate,
            bounds: CountBounds::default(),
            max_hits_per_combination: 30,
        }
    }
}

impl SearchParameters {
    pub fn new(mode: IonMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn negative() -> Self {
        Self::new(IonMode::Negative)
    }

    pub fn positive() -> Self {
        Self::new(IonMode::Positive)
    }

    pub fn with_ppm(mut self, ppm: f64) -> Self {
        self.ppm = ppm;
        self
    }

    pub fn with_mode(mut self, mode: IonMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_charges(mut self, charges: Vec<i32>) -> Self {
        self.charges = Some(charges);
        self
    }

    pub fn with_adducts(mut self, adducts: AdductTable) -> Self {
        self.adducts = Some(adducts);
        self
    }

    pub fn with_metal(mut self, metal: Metal) -> Self {
        self.metal = metal;
        self
    }

    pub fn with_coarseness(mut self, coarseness: CoarsenessLevel) -> Self {
        self.coarseness = coarseness;
        self
    }

    pub fn with_bounds(mut self, bounds: CountBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_max_hits_per_combination(mut self, max_hits: usize) -> Self {
        self.max_hits_per_combination = max_hits;
        self
    }

    /// The charge states to search, falling back to the mode's default
    pub fn charges(&self) -> Vec<i32> {
        self.charges
            .clone()
            .unwrap_or_else(|| self.mode.default_charges())
    }

    /// The adducts to search, falling back to the mode's default table
    pub fn adducts(&self) -> AdductTable {
        self.adducts
            .clone()
            .unwrap_or_else(|| self.mode.default_adducts())
    }

    pub fn enumerator(&self) -> FormulaEnumerator {
        FormulaEnumerator::from_bounds(self.metal, &self.bounds, self.coarseness)
    }

    /// Search `mz` under every (charge, adduct) hypothesis these parameters describe
    pub fn search(&self, mz: f64) -> Vec<SearchResult> {
        search_mz(
            mz,
            self.ppm,
            self.mode,
            &self.charges(),
            &self.adducts(),
            &self.enumerator(),
            self.max_hits_per_combination,
        )
    }
}

/// Search `mz` against the formulas `enumerator` generates.
///
/// Charges are visited in the order given and adducts in table order. Each
/// hypothesis keeps at most `max_hits_per_combination` of its best hits, and
/// the merged list is ranked by absolute ppm error with ties kept in
/// hypothesis order.
pub fn search_mz(
    mz: f64,
    ppm: f64,
    mode: IonMode,
    charges: &[i32],
    adducts: &AdductTable,
    enumerator: &FormulaEnumerator,
    max_hits_per_combination: usize,
) -> Vec<SearchResult> {
    let mut results = Vec::new();
    for charge in charges.iter().copied() {
        for adduct in adducts {
            let neutral_mass = mode.neutral_mass(mz, charge, adduct.mass);
            if neutral_mass <= 0.0 {
                trace!(
                    "Skipping {} at charge {charge} for m/z {mz}, neutral mass {neutral_mass} is not positive",
                    adduct.label
                );
                continue;
            }
            let hits = enumerator.enumerate(neutral_mass, ppm);
            let n_found = hits.len();
            let kept: Vec<_> = hits
                .into_iter()
                .take(max_hits_per_combination)
                .map(|hit| SearchResult::new(mz, charge, adduct, neutral_mass, hit))
                .collect();
            debug!(
                "m/z {mz} charge {charge} {} -> neutral mass {neutral_mass:.6}: {n_found} hits, kept {}",
                adduct.label,
                kept.len()
            );
            results.extend(kept);
        }
    }
    sort_by_abs_ppm(&mut results, |r| r.ppm_error());
    results
}

/// Search a negative mode `mz` with the default adducts and charge
pub fn search_mz_negative(
    mz: f64,
    ppm: f64,
    coarseness: CoarsenessLevel,
    metal: Metal,
) -> Vec<SearchResult> {
    SearchParameters::negative()
        .with_ppm(ppm)
        .with_coarseness(coarseness)
        .with_metal(metal)
        .search(mz)
}

/// Search a positive mode `mz` with the default adducts and charge
pub fn search_mz_positive(
    mz: f64,
    ppm: f64,
    coarseness: CoarsenessLevel,
    metal: Metal,
) -> Vec<SearchResult> {
    SearchParameters::positive()
        .with_ppm(ppm)
        .with_coarseness(coarseness)
        .with_metal(metal)
        .search(mz)
}

/// The outcome of searching one coarseness level as part of [`scan_levels`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelScan {
    pub level: CoarsenessLevel,
    pub params: CoarsenessParams,
    /// Results whose formula was not reported at any stricter level
    pub new_results: Vec<SearchResult>,
    /// The number of results at this level, including previously reported formulas
    pub total: usize,
}

/// Search `mz` at every coarseness level, strictest first, reporting each
/// formula only at the first level that finds it.
///
/// The coarseness of `params` is ignored, everything else is used as given.
pub fn scan_levels(mz: f64, params: &SearchParameters) -> Vec<LevelScan> {
    let mut seen: HashSet<String> = HashSet::new();
    CoarsenessLevel::ALL
        .into_iter()
        .map(|level| {
            let results = params.clone().with_coarseness(level).search(mz);
            let total = results.len();
            let new_results: Vec<_> = results
                .into_iter()
                .filter(|r| !seen.contains(r.formula()))
                .collect();
            seen.extend(new_results.iter().map(|r| r.formula().to_string()));
            debug!(
                "Level {level} found {total} results for m/z {mz}, {} new",
                new_results.len()
            );
            LevelScan {
                level,
                params: level.params(),
                new_results,
                total,
            }
        })
        .collect()
}
