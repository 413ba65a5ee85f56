/*! Candidate formulas built from counts of each building block */
use std::fmt::Display;

use crate::masses::{block_masses, BuildingBlock, Metal};

/// The counts of each [`BuildingBlock`], ordered as [`BuildingBlock::ALL`]
pub type BlockCounts = [u32; 8];

/// A formula of the form M<sub>a</sub> Mn<sub>b</sub> (tBuCOO)<sub>c</sub> O<sub>d</sub>
/// H<sub>e</sub> C<sub>f</sub> F<sub>g</sub> N<sub>h</sub> where M is a [`Metal`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateFormula {
    pub metal: Metal,
    pub counts: BlockCounts,
}

impl CandidateFormula {
    pub const fn new(metal: Metal, counts: BlockCounts) -> Self {
        Self { metal, counts }
    }

    #[inline]
    pub const fn count(&self, block: BuildingBlock) -> u32 {
        self.counts[block as usize]
    }

    #[inline]
    pub const fn metal_count(&self) -> u32 {
        self.counts[BuildingBlock::Metal as usize]
    }

    #[inline]
    pub const fn manganese(&self) -> u32 {
        self.counts[BuildingBlock::Manganese as usize]
    }

    #[inline]
    pub const fn ligand(&self) -> u32 {
        self.counts[BuildingBlock::Ligand as usize]
    }

    #[inline]
    pub const fn oxygen(&self) -> u32 {
        self.counts[BuildingBlock::Oxygen as usize]
    }

    /// The exact monoisotopic neutral mass
    pub fn mass(&self) -> f64 {
        self.counts
            .iter()
            .zip(block_masses(self.metal))
            .map(|(c, m)| *c as f64 * m)
            .sum()
    }

    /// Whether the formula passes all of the plausibility constraints
    pub fn is_valid(&self) -> bool {
        has_metal(self.metal_count(), self.manganese())
            && has_donor(self.ligand(), self.oxygen())
            && is_donor_balanced(
                self.metal_count(),
                self.manganese(),
                self.ligand(),
                self.oxygen(),
            )
    }

    /// Render the canonical formula string. Every count is written, including
    /// zeros, so two strings are equal exactly when the formulas are.
    pub fn formula(&self) -> String {
        self.to_string()
    }
}

impl Display for CandidateFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (block, count) in BuildingBlock::ALL.iter().zip(self.counts) {
            write!(f, "{}{}", block.symbol(self.metal), count)?;
        }
        Ok(())
    }
}

/// At least one metal center must be present
#[inline]
pub const fn has_metal(metal: u32, manganese: u32) -> bool {
    metal > 0 || manganese > 0
}

/// At least one oxygen donor, bound or free, must be present
#[inline]
pub const fn has_donor(ligand: u32, oxygen: u32) -> bool {
    ligand > 0 || oxygen > 0
}

/// When carboxylate ligands are present, each contributes two oxygen donors
/// and together with free oxygen they must cover every metal center.
#[inline]
pub const fn is_donor_balanced(metal: u32, manganese: u32, ligand: u32, oxygen: u32) -> bool {
    ligand == 0 || 2 * ligand + oxygen >= manganese + metal
}
