/*! Bounded enumeration of candidate formulas within a mass tolerance window */
use tracing::trace;

use crate::coarseness::CoarsenessLevel;
use crate::composition::{has_donor, has_metal, is_donor_balanced, BlockCounts, CandidateFormula};
use crate::masses::{block_masses, BuildingBlock, Metal};

const N_BLOCKS: usize = BuildingBlock::ALL.len();

/// Test whether `mass` lies within `ppm` parts-per-million of `target`.
/// The window is relative to `target` and includes its edges.
#[inline]
pub fn within_ppm(mass: f64, target: f64, ppm: f64) -> bool {
    (mass - target).abs() <= target * ppm * 1e-6
}

/// The signed error of `mass` relative to `target` in parts-per-million
#[inline]
pub fn ppm_error(mass: f64, target: f64) -> f64 {
    (mass - target) / target * 1e6
}

/// The maximum count of each building block to consider.
///
/// Hydrogen, carbon, fluorine and nitrogen default to the maxima of the
/// [`CoarsenessLevel`] the bounds are resolved against, but an explicit value
/// always wins. The oxygen maximum is a base value that the level's
/// `additional_o` is added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CountBounds {
    pub metal: u32,
    pub manganese: u32,
    pub ligand: u32,
    pub oxygen: u32,
    pub hydrogen: Option<u32>,
    pub carbon: Option<u32>,
    pub fluorine: Option<u32>,
    pub nitrogen: Option<u32>,
}

impl Default for CountBounds {
    fn default() -> Self {
        Self {
            metal: 2,
            manganese: 5,
            ligand: 11,
            oxygen: 5,
            hydrogen: None,
            carbon: None,
            fluorine: None,
            nitrogen: None,
        }
    }
}

impl CountBounds {
    pub fn with_metal(mut self, value: u32) -> Self {
        self.metal = value;
        self
    }

    pub fn with_manganese(mut self, value: u32) -> Self {
        self.manganese = value;
        self
    }

    pub fn with_ligand(mut self, value: u32) -> Self {
        self.ligand = value;
        self
    }

    pub fn with_oxygen(mut self, value: u32) -> Self {
        self.oxygen = value;
        self
    }

    pub fn with_hydrogen(mut self, value: u32) -> Self {
        self.hydrogen = Some(value);
        self
    }

    pub fn with_carbon(mut self, value: u32) -> Self {
        self.carbon = Some(value);
        self
    }

    pub fn with_fluorine(mut self, value: u32) -> Self {
        self.fluorine = Some(value);
        self
    }

    pub fn with_nitrogen(mut self, value: u32) -> Self {
        self.nitrogen = Some(value);
        self
    }

    /// Combine these bounds with a coarseness preset to get one explicit
    /// maximum per [`BuildingBlock`]
    pub fn resolve(&self, level: CoarsenessLevel) -> BlockCounts {
        let params = level.params();
        [
            self.metal,
            self.manganese,
            self.ligand,
            self.oxygen.saturating_add(params.additional_o),
            self.hydrogen.unwrap_or(params.h_max),
            self.carbon.unwrap_or(params.c_max),
            self.fluorine.unwrap_or(params.f_max),
            self.nitrogen.unwrap_or(params.n_max),
        ]
    }
}

/// A candidate formula whose exact mass matched a target mass
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hit {
    /// The canonical formula string
    pub formula: String,
    /// The exact neutral mass of the formula
    pub mass: f64,
    /// The signed error relative to the target mass, in parts-per-million
    pub ppm_error: f64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub composition: CandidateFormula,
}

impl Hit {
    pub fn new(composition: CandidateFormula, mass: f64, target_mass: f64) -> Self {
        Self {
            formula: composition.formula(),
            mass,
            ppm_error: ppm_error(mass, target_mass),
            composition,
        }
    }

    #[inline]
    pub fn abs_ppm_error(&self) -> f64 {
        self.ppm_error.abs()
    }

    #[inline]
    pub fn counts(&self) -> &BlockCounts {
        &self.composition.counts
    }

    #[inline]
    pub fn metal(&self) -> Metal {
        self.composition.metal
    }
}

/// Sort hits by ascending absolute ppm error. The sort is stable, so exact
/// ties keep the order the hits were produced in.
pub fn sort_by_abs_ppm<T, F: Fn(&T) -> f64>(hits: &mut [T], key: F) {
    hits.sort_by(|a, b| key(a).abs().total_cmp(&key(b).abs()));
}

/// Walks the cartesian product of per-block count ranges for one metal.
///
/// The walk visits tuples in nested order, metal outermost and nitrogen
/// innermost, and skips whole sub-products that cannot contain a valid
/// formula inside the window. Skipping never reorders the tuples that are
/// visited, so the output order of equal-error hits is the nested order.
#[derive(Debug, Clone)]
pub struct FormulaEnumerator {
    metal: Metal,
    maxima: BlockCounts,
    masses: [f64; N_BLOCKS],
    /// `headroom[i]` is the largest mass blocks `i..` can still add
    headroom: [f64; N_BLOCKS + 1],
}

impl FormulaEnumerator {
    pub fn new(metal: Metal, maxima: BlockCounts) -> Self {
        let masses = block_masses(metal);
        let mut headroom = [0.0; N_BLOCKS + 1];
        for i in (0..N_BLOCKS).rev() {
            headroom[i] = headroom[i + 1] + maxima[i] as f64 * masses[i];
        }
        Self {
            metal,
            maxima,
            masses,
            headroom,
        }
    }

    pub fn from_bounds(metal: Metal, bounds: &CountBounds, level: CoarsenessLevel) -> Self {
        Self::new(metal, bounds.resolve(level))
    }

    pub fn metal(&self) -> Metal {
        self.metal
    }

    pub fn maxima(&self) -> &BlockCounts {
        &self.maxima
    }

    /// The number of tuples in the full cartesian product, saturating at [`u64::MAX`]
    pub fn search_space_size(&self) -> u64 {
        self.maxima
            .iter()
            .fold(1u64, |acc, m| acc.saturating_mul(*m as u64 + 1))
    }

    /// Find every valid formula within `ppm` of `target_mass`, ranked by
    /// absolute ppm error.
    ///
    /// A non-positive target or an unreachable window gives an empty list.
    #[tracing::instrument(level = "trace", skip(self), fields(metal = %self.metal))]
    pub fn enumerate(&self, target_mass: f64, ppm: f64) -> Vec<Hit> {
        if !(target_mass > 0.0 && target_mass.is_finite()) || !(ppm >= 0.0 && ppm.is_finite()) {
            return Vec::new();
        }
        let tolerance = target_mass * ppm * 1e-6;
        let mut walker = Walker {
            masses: &self.masses,
            maxima: &self.maxima,
            headroom: &self.headroom,
            target: target_mass,
            tolerance,
            slack: tolerance * 1e-6 + 1e-9,
            counts: [0; N_BLOCKS],
            accepted: Vec::new(),
            visited: 0,
        };
        walker.descend(0, 0.0);

        let Walker {
            accepted, visited, ..
        } = walker;
        trace!(
            "Visited {visited} of {} candidates, accepted {}",
            self.search_space_size(),
            accepted.len()
        );

        let mut hits: Vec<Hit> = accepted
            .into_iter()
            .map(|(counts, mass)| Hit::new(CandidateFormula::new(self.metal, counts), mass, target_mass))
            .collect();
        sort_by_abs_ppm(&mut hits, |h| h.ppm_error);
        hits
    }
}

struct Walker<'a> {
    masses: &'a [f64; N_BLOCKS],
    maxima: &'a BlockCounts,
    headroom: &'a [f64; N_BLOCKS + 1],
    target: f64,
    tolerance: f64,
    slack: f64,
    counts: BlockCounts,
    accepted: Vec<(BlockCounts, f64)>,
    visited: usize,
}

impl Walker<'_> {
    /// Whether the prefix `counts[..=depth]` can still lead to a valid formula
    #[inline]
    fn prefix_is_valid(&self, depth: usize) -> bool {
        let c = &self.counts;
        match depth {
            1 => has_metal(c[0], c[1]),
            3 => has_donor(c[2], c[3]) && is_donor_balanced(c[0], c[1], c[2], c[3]),
            _ => true,
        }
    }

    fn descend(&mut self, depth: usize, partial: f64) {
        if depth == N_BLOCKS {
            self.visited += 1;
            if (partial - self.target).abs() <= self.tolerance {
                self.accepted.push((self.counts, partial));
            }
            return;
        }
        let mass = self.masses[depth];
        for k in 0..=self.maxima[depth] {
            let next = partial + k as f64 * mass;
            // Masses only grow with more atoms, so neither this count nor any
            // larger one can come back down into the window.
            if next - self.target > self.tolerance {
                break;
            }
            if next + self.headroom[depth + 1] + self.slack < self.target - self.tolerance {
                continue;
            }
            self.counts[depth] = k;
            if !self.prefix_is_valid(depth) {
                continue;
            }
            self.descend(depth + 1, next);
        }
        self.counts[depth] = 0;
    }
}

/// Enumerate formulas for `metal` within `ppm` of `target_mass`, resolving
/// `bounds` against the `coarseness` preset.
pub fn enumerate_formulas(
    target_mass: f64,
    ppm: f64,
    bounds: &CountBounds,
    coarseness: CoarsenessLevel,
    metal: Metal,
) -> Vec<Hit> {
    FormulaEnumerator::from_bounds(metal, bounds, coarseness).enumerate(target_mass, ppm)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::masses::{MANGANESE, OXYGEN, TBUCOO, YTTRIUM};

    use std::collections::HashSet;

    /// Every tuple of the full product, in nested order, without pruning
    fn brute_force(target: f64, ppm: f64, metal: Metal, maxima: BlockCounts) -> Vec<Hit> {
        let mut hits = Vec::new();
        let mut counts = [0u32; N_BLOCKS];
        'outer: loop {
            let formula = CandidateFormula::new(metal, counts);
            if formula.is_valid() {
                let mass = formula.mass();
                if within_ppm(mass, target, ppm) {
                    hits.push(Hit::new(formula, mass, target));
                }
            }
            let mut i = N_BLOCKS;
            loop {
                if i == 0 {
                    break 'outer;
                }
                i -= 1;
                if counts[i] < maxima[i] {
                    counts[i] += 1;
                    break;
                }
                counts[i] = 0;
            }
        }
        sort_by_abs_ppm(&mut hits, |h| h.ppm_error);
        hits
    }

    #[test]
    fn test_within_ppm() {
        assert!(within_ppm(100.0, 100.0, 1.0));
        assert!(within_ppm(1000.005, 1000.0, 10.0));
        assert!(within_ppm(999.995, 1000.0, 10.0));
        assert!(!within_ppm(1000.02, 1000.0, 10.0));
        assert!(!within_ppm(999.98, 1000.0, 10.0));
        assert!(within_ppm(100.0005, 100.0, 10.0));
        assert!(!within_ppm(100.002, 100.0, 10.0));
        assert!(within_ppm(10000.05, 10000.0, 10.0));
        assert!(!within_ppm(10000.2, 10000.0, 10.0));
    }

    #[test]
    fn test_ppm_error_sign() {
        assert!((ppm_error(1000.001, 1000.0) - 1.0).abs() < 1e-6);
        assert!((ppm_error(999.999, 1000.0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_bounds() {
        let bounds = CountBounds::default();
        assert_eq!(
            bounds.resolve(CoarsenessLevel::Strict),
            [2, 5, 11, 5, 0, 0, 0, 0]
        );
        assert_eq!(
            bounds.resolve(CoarsenessLevel::Loose),
            [2, 5, 11, 10, 10, 5, 2, 2]
        );
        let bounds = bounds.with_hydrogen(5).with_carbon(3);
        assert_eq!(
            bounds.resolve(CoarsenessLevel::Strict),
            [2, 5, 11, 5, 5, 3, 0, 0]
        );
    }

    #[test]
    fn test_exact_round_trip() {
        let target = YTTRIUM + MANGANESE + 2.0 * TBUCOO + OXYGEN;
        let hits = enumerate_formulas(
            target,
            1.0,
            &CountBounds::default(),
            CoarsenessLevel::Strict,
            Metal::Yttrium,
        );
        let hit = hits
            .iter()
            .find(|h| h.counts() == &[1, 1, 2, 1, 0, 0, 0, 0])
            .expect("Y1Mn1(tBuCOO)2O1 should be found");
        assert!(hit.abs_ppm_error() < 1e-6);
        assert_eq!(hit.formula, "Y1Mn1(tBuCOO)2O1H0C0F0N0");
    }

    #[test]
    fn test_known_formulas() {
        let target = 2.0 * YTTRIUM + 3.0 * OXYGEN;
        let hits = enumerate_formulas(
            target,
            1.0,
            &CountBounds::default(),
            CoarsenessLevel::Strict,
            Metal::Yttrium,
        );
        assert!(hits.iter().any(|h| h.counts() == &[2, 0, 0, 3, 0, 0, 0, 0]));

        let target = YTTRIUM + TBUCOO + OXYGEN;
        let hits = enumerate_formulas(
            target,
            1.0,
            &CountBounds::default(),
            CoarsenessLevel::Strict,
            Metal::Yttrium,
        );
        assert!(hits.iter().any(|h| h.counts() == &[1, 0, 1, 1, 0, 0, 0, 0]));
    }

    #[test]
    fn test_unreachable_mass() {
        let hits = enumerate_formulas(
            10.0,
            1.0,
            &CountBounds::default(),
            CoarsenessLevel::Loose,
            Metal::Yttrium,
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn test_non_positive_target() {
        let enumerator = FormulaEnumerator::from_bounds(
            Metal::Yttrium,
            &CountBounds::default(),
            CoarsenessLevel::Loose,
        );
        assert!(enumerator.enumerate(0.0, 10.0).is_empty());
        assert!(enumerator.enumerate(-500.0, 10.0).is_empty());
        assert!(enumerator.enumerate(f64::NAN, 10.0).is_empty());
        assert!(enumerator.enumerate(500.0, -1.0).is_empty());
    }

    #[test_log::test]
    fn test_hits_are_valid_sorted_and_in_window() {
        let target = 500.0;
        let ppm = 50.0;
        let hits = enumerate_formulas(
            target,
            ppm,
            &CountBounds::default(),
            CoarsenessLevel::Loose,
            Metal::Yttrium,
        );
        assert!(!hits.is_empty());
        for hit in hits.iter() {
            assert!(hit.composition.is_valid(), "{} is not valid", hit.formula);
            assert!((hit.mass - target).abs() <= target * ppm * 1e-6);
            assert!(hit.abs_ppm_error() <= ppm);
            assert!((hit.composition.mass() - hit.mass).abs() < 1e-9);
        }
        for pair in hits.windows(2) {
            assert!(pair[0].abs_ppm_error() <= pair[1].abs_ppm_error());
        }
    }

    #[test]
    fn test_matches_full_product() {
        for (target, ppm, level) in [
            (500.0, 50.0, CoarsenessLevel::Moderate),
            (1519.154, 10.0, CoarsenessLevel::Moderate),
            (812.3, 25.0, CoarsenessLevel::Strict),
        ] {
            let maxima = CountBounds::default().resolve(level);
            let expected = brute_force(target, ppm, Metal::Yttrium, maxima);
            let observed = FormulaEnumerator::new(Metal::Yttrium, maxima).enumerate(target, ppm);
            assert_eq!(
                observed.len(),
                expected.len(),
                "Hit count differs at {target} {ppm} {level}"
            );
            for (o, e) in observed.iter().zip(expected.iter()) {
                assert_eq!(o.counts(), e.counts());
                assert_eq!(o.mass, e.mass);
            }
        }
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let formula = CandidateFormula::new(Metal::Yttrium, [1, 0, 0, 1, 0, 0, 0, 0]);
        let mass = formula.mass();
        let enumerator = FormulaEnumerator::new(Metal::Yttrium, [1, 0, 0, 1, 0, 0, 0, 0]);
        let hits = enumerator.enumerate(mass, 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ppm_error, 0.0);
    }

    #[test]
    fn test_parameter_limits() {
        let bounds = CountBounds::default()
            .with_metal(1)
            .with_manganese(2)
            .with_ligand(5)
            .with_oxygen(3);
        let hits = enumerate_formulas(1000.0, 100.0, &bounds, CoarsenessLevel::Loose, Metal::Yttrium);
        for hit in hits.iter() {
            let c = hit.counts();
            assert!(c[0] <= 1);
            assert!(c[1] <= 2);
            assert!(c[2] <= 5);
            assert!(c[3] <= 3 + 5);
            assert!(c[4] <= 10);
            assert!(c[5] <= 5);
            assert!(c[6] <= 2);
            assert!(c[7] <= 2);
        }
    }

    #[test]
    fn test_strict_has_no_secondary_atoms() {
        let hits = enumerate_formulas(
            500.0,
            50.0,
            &CountBounds::default(),
            CoarsenessLevel::Strict,
            Metal::Yttrium,
        );
        for hit in hits {
            assert_eq!(&hit.counts()[4..], &[0, 0, 0, 0]);
        }
    }

    #[test]
    fn test_explicit_override_wins() {
        let target = YTTRIUM + OXYGEN + 2.0 * crate::masses::HYDROGEN;
        let strict = enumerate_formulas(
            target,
            1.0,
            &CountBounds::default(),
            CoarsenessLevel::Strict,
            Metal::Yttrium,
        );
        assert!(!strict.iter().any(|h| h.counts() == &[1, 0, 0, 1, 2, 0, 0, 0]));

        let overridden = enumerate_formulas(
            target,
            1.0,
            &CountBounds::default().with_hydrogen(2),
            CoarsenessLevel::Strict,
            Metal::Yttrium,
        );
        assert!(overridden
            .iter()
            .any(|h| h.counts() == &[1, 0, 0, 1, 2, 0, 0, 0]));

        let suppressed = enumerate_formulas(
            target,
            1.0,
            &CountBounds::default().with_hydrogen(0),
            CoarsenessLevel::Loose,
            Metal::Yttrium,
        );
        assert!(suppressed.iter().all(|h| h.counts()[4] == 0));
    }

    #[test]
    fn test_levels_are_nested() {
        for target in [500.0, 812.3, 1519.154] {
            let mut previous: HashSet<String> = HashSet::new();
            for level in CoarsenessLevel::ALL {
                let current: HashSet<String> = enumerate_formulas(
                    target,
                    20.0,
                    &CountBounds::default(),
                    level,
                    Metal::Yttrium,
                )
                .into_iter()
                .map(|h| h.formula)
                .collect();
                assert!(
                    previous.is_subset(&current),
                    "{level} lost formulas at {target}"
                );
                previous = current;
            }
        }
    }

    #[test]
    fn test_metals_are_distinct() {
        let y: HashSet<_> = enumerate_formulas(
            500.0,
            50.0,
            &CountBounds::default(),
            CoarsenessLevel::Loose,
            Metal::Yttrium,
        )
        .into_iter()
        .map(|h| h.formula)
        .collect();
        let la: HashSet<_> = enumerate_formulas(
            500.0,
            50.0,
            &CountBounds::default(),
            CoarsenessLevel::Loose,
            Metal::Lanthanum,
        )
        .into_iter()
        .inspect(|h| {
            assert_eq!(h.metal(), Metal::Lanthanum);
            assert!(h.formula.starts_with("La"));
        })
        .map(|h| h.formula)
        .collect();
        assert!(y.is_disjoint(&la));
    }

    #[test]
    fn test_search_space_size() {
        let enumerator = FormulaEnumerator::from_bounds(
            Metal::Yttrium,
            &CountBounds::default(),
            CoarsenessLevel::Strict,
        );
        assert_eq!(enumerator.search_space_size(), 3 * 6 * 12 * 6);
    }

    #[test]
    fn test_search_space_size_saturates() {
        let bounds = CountBounds::default()
            .with_oxygen(u32::MAX)
            .with_hydrogen(u32::MAX)
            .with_carbon(u32::MAX)
            .with_fluorine(u32::MAX);
        let enumerator =
            FormulaEnumerator::from_bounds(Metal::Yttrium, &bounds, CoarsenessLevel::Loose);
        assert_eq!(enumerator.maxima()[3], u32::MAX);
        assert_eq!(enumerator.search_space_size(), u64::MAX);
    }

    #[test]
    fn test_sort_keeps_tied_order() {
        let mut hits = vec![
            ("a", 2.0),
            ("b", -2.0),
            ("c", 1.0),
            ("d", -1.0),
            ("e", 2.0),
            ("f", 0.0),
        ];
        sort_by_abs_ppm(&mut hits, |h| h.1);
        let order: Vec<_> = hits.iter().map(|h| h.0).collect();
        assert_eq!(order, vec!["f", "c", "d", "a", "b", "e"]);

        let formula = CandidateFormula::new(Metal::Yttrium, [1, 1, 2, 1, 0, 0, 0, 0]);
        let mut hits = vec![
            Hit::new(formula, 1000.5, 1000.0),
            Hit::new(formula, 999.5, 1000.0),
            Hit::new(formula, 1000.25, 1000.0),
        ];
        assert_eq!(hits[0].ppm_error, -hits[1].ppm_error);
        sort_by_abs_ppm(&mut hits, Hit::abs_ppm_error);
        let masses: Vec<_> = hits.iter().map(|h| h.mass).collect();
        assert_eq!(masses, vec![1000.25, 1000.5, 999.5]);
    }
}
