/*! Monoisotopic masses of the building blocks and charge carriers */
use std::fmt::Display;
use std::str::FromStr;

use crate::error::FormulaSearchError;

/// The mass of <sup>89</sup>Y
pub const YTTRIUM: f64 = 88.90584;
/// The mass of <sup>139</sup>La
pub const LANTHANUM: f64 = 138.90547;
pub const MANGANESE: f64 = 54.938044;
pub const OXYGEN: f64 = 15.99491461957;
/// The mass of a neutral hydrogen atom, not a proton
pub const HYDROGEN: f64 = 1.00782503223;
pub const CARBON: f64 = 12.0;
pub const FLUORINE: f64 = 18.998403163;
pub const NITROGEN: f64 = 14.00307400443;

/// The mass of a tert-butyl carboxylate group, C<sub>5</sub>H<sub>9</sub>O<sub>2</sub>
pub const TBUCOO: f64 = 5.0 * CARBON + 9.0 * HYDROGEN + 2.0 * OXYGEN;

/// The mass of H+, a hydrogen atom minus an electron
pub const PROTON: f64 = 1.00727646688;
/// The mass of <sup>35</sup>Cl
pub const CL35: f64 = 34.968852682;
/// The mass of <sup>23</sup>Na
pub const NA23: f64 = 22.98976928;
/// The mass of <sup>39</sup>K
pub const K39: f64 = 38.96370649;
/// The mass of an ammonium group, N + 4H
pub const NH4: f64 = NITROGEN + 4.0 * HYDROGEN;

/// Every symbol the formula search knows a mass for, in display order.
pub const MASS_TABLE: &[(&str, f64)] = &[
    ("Y", YTTRIUM),
    ("La", LANTHANUM),
    ("Mn", MANGANESE),
    ("O", OXYGEN),
    ("H", HYDROGEN),
    ("C", CARBON),
    ("F", FLUORINE),
    ("N", NITROGEN),
    ("tBuCOO", TBUCOO),
];

/// Look up the monoisotopic mass of a symbol in [`MASS_TABLE`]
pub fn mass_of(symbol: &str) -> Option<f64> {
    MASS_TABLE
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, mass)| *mass)
}

/// The metal bases that may occupy the metal-center dimension of a formula
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metal {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "Y"))]
    Yttrium,
    #[cfg_attr(feature = "serde", serde(rename = "La"))]
    Lanthanum,
}

impl Metal {
    pub const ALL: [Metal; 2] = [Metal::Yttrium, Metal::Lanthanum];

    pub const fn symbol(&self) -> &'static str {
        match self {
            Metal::Yttrium => "Y",
            Metal::Lanthanum => "La",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Metal::Yttrium => "Yttrium",
            Metal::Lanthanum => "Lanthanum",
        }
    }

    pub const fn mass(&self) -> f64 {
        match self {
            Metal::Yttrium => YTTRIUM,
            Metal::Lanthanum => LANTHANUM,
        }
    }
}

impl Display for Metal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Metal {
    type Err = FormulaSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Metal::ALL
            .into_iter()
            .find(|m| {
                token.eq_ignore_ascii_case(m.symbol()) || token.eq_ignore_ascii_case(m.name())
            })
            .ok_or_else(|| FormulaSearchError::InvalidMetal(token.to_string()))
    }
}

/// One of the eight count dimensions of a candidate formula, in the order
/// the enumerator nests them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildingBlock {
    Metal,
    Manganese,
    Ligand,
    Oxygen,
    Hydrogen,
    Carbon,
    Fluorine,
    Nitrogen,
}

impl BuildingBlock {
    pub const ALL: [BuildingBlock; 8] = [
        BuildingBlock::Metal,
        BuildingBlock::Manganese,
        BuildingBlock::Ligand,
        BuildingBlock::Oxygen,
        BuildingBlock::Hydrogen,
        BuildingBlock::Carbon,
        BuildingBlock::Fluorine,
        BuildingBlock::Nitrogen,
    ];

    /// The symbol used when rendering a formula. The metal dimension
    /// depends on which metal is in use.
    pub const fn symbol(&self, metal: Metal) -> &'static str {
        match self {
            BuildingBlock::Metal => metal.symbol(),
            BuildingBlock::Manganese => "Mn",
            BuildingBlock::Ligand => "(tBuCOO)",
            BuildingBlock::Oxygen => "O",
            BuildingBlock::Hydrogen => "H",
            BuildingBlock::Carbon => "C",
            BuildingBlock::Fluorine => "F",
            BuildingBlock::Nitrogen => "N",
        }
    }

    pub const fn mass(&self, metal: Metal) -> f64 {
        match self {
            BuildingBlock::Metal => metal.mass(),
            BuildingBlock::Manganese => MANGANESE,
            BuildingBlock::Ligand => TBUCOO,
            BuildingBlock::Oxygen => OXYGEN,
            BuildingBlock::Hydrogen => HYDROGEN,
            BuildingBlock::Carbon => CARBON,
            BuildingBlock::Fluorine => FLUORINE,
            BuildingBlock::Nitrogen => NITROGEN,
        }
    }
}

/// The per-dimension masses for a given metal, ordered as [`BuildingBlock::ALL`]
pub const fn block_masses(metal: Metal) -> [f64; 8] {
    [
        metal.mass(),
        MANGANESE,
        TBUCOO,
        OXYGEN,
        HYDROGEN,
        CARBON,
        FLUORINE,
        NITROGEN,
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ligand_mass() {
        let expected = 5.0 * 12.0 + 9.0 * 1.00782503223 + 2.0 * 15.99491461957;
        assert!((TBUCOO - expected).abs() < 1e-12);
        assert!((TBUCOO - 101.0602544).abs() < 1e-6);
        assert_eq!(mass_of("tBuCOO"), Some(TBUCOO));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(mass_of("Y"), Some(88.90584));
        assert_eq!(mass_of("La"), Some(138.90547));
        assert_eq!(mass_of("Mn"), Some(54.938044));
        assert_eq!(mass_of("Xe"), None);
        assert_eq!(MASS_TABLE.len(), 9);
        for (symbol, mass) in MASS_TABLE {
            assert!(*mass > 0.0, "{symbol} has a non-positive mass");
        }
    }

    #[test]
    fn test_particles() {
        assert!((NH4 - (14.00307400443 + 4.0 * 1.00782503223)).abs() < 1e-12);
        // A proton is a hydrogen atom less one electron
        assert!(HYDROGEN > PROTON);
        assert!((HYDROGEN - PROTON - 0.000548579909).abs() < 1e-7);
    }

    #[test]
    fn test_metal_parse() {
        assert_eq!("Y".parse::<Metal>().unwrap(), Metal::Yttrium);
        assert_eq!("la".parse::<Metal>().unwrap(), Metal::Lanthanum);
        assert_eq!(" Lanthanum ".parse::<Metal>().unwrap(), Metal::Lanthanum);
        assert_eq!(Metal::default(), Metal::Yttrium);
        match "Fe".parse::<Metal>() {
            Err(FormulaSearchError::InvalidMetal(s)) => assert_eq!(s, "Fe"),
            other => panic!("Expected InvalidMetal, got {other:?}"),
        }
    }

    #[test]
    fn test_block_masses() {
        let masses = block_masses(Metal::Lanthanum);
        for (block, mass) in BuildingBlock::ALL.iter().zip(masses) {
            assert_eq!(block.mass(Metal::Lanthanum), mass);
        }
        assert_eq!(BuildingBlock::Metal.symbol(Metal::Yttrium), "Y");
        assert_eq!(BuildingBlock::Ligand.symbol(Metal::Yttrium), "(tBuCOO)");
    }
}
