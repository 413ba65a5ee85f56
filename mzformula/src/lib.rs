//! Match observed m/z values to metal-carboxylate complex formulas.
//!
//! Candidate formulas are built from a metal center, manganese, tert-butyl
//! carboxylate ligands, oxygen, and optional hydrogen, carbon, fluorine and
//! nitrogen, filtered by chemical plausibility and an exact mass tolerance.
pub mod adducts;
pub mod coarseness;
pub mod composition;
pub mod enumerate;
pub mod error;
pub mod masses;
pub mod search;

pub use adducts::{Adduct, AdductTable, IonMode};
pub use coarseness::{get_coarseness_params, CoarsenessLevel, CoarsenessParams};
pub use composition::{BlockCounts, CandidateFormula};
pub use enumerate::{enumerate_formulas, ppm_error, within_ppm, CountBounds, FormulaEnumerator, Hit};
pub use error::FormulaSearchError;
pub use masses::{BuildingBlock, Metal};
pub use search::{
    scan_levels, search_mz, search_mz_negative, search_mz_positive, LevelScan, SearchParameters,
    SearchResult,
};
