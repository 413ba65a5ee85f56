/*! Ion polarity and the adducts that relate an observed ion to its neutral molecule */
use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::FormulaSearchError;
use crate::masses::{CL35, K39, NA23, NH4, PROTON};

/// The default adducts considered in negative ion mode, in search order
pub const NEGATIVE_ADDUCTS: &[(&str, f64)] = &[
    ("[M−H]−", PROTON),
    ("[M]−•", 0.0),
    ("[M+Cl]−", CL35),
];

/// The default adducts considered in positive ion mode, in search order
pub const POSITIVE_ADDUCTS: &[(&str, f64)] = &[
    ("[M+H]+", PROTON),
    ("[M]+•", 0.0),
    ("[M+Na]+", NA23),
    ("[M+K]+", K39),
    ("[M+NH4]+", NH4),
];

/// The polarity of the observed ion. This decides the direction in which an
/// adduct's mass offset is applied when recovering the neutral mass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IonMode {
    #[default]
    Negative,
    Positive,
}

impl IonMode {
    /// Convert an observed m/z at `charge` into the neutral mass implied by an
    /// adduct with mass offset `adduct_mass`.
    ///
    /// In negative mode the observed species lost a particle or gained an anion,
    /// so the offset is added back. In positive mode the observed species gained
    /// a cationizing particle, so the offset is removed.
    #[inline]
    pub fn neutral_mass(&self, mz: f64, charge: i32, adduct_mass: f64) -> f64 {
        let mass = mz * charge.unsigned_abs() as f64;
        match self {
            IonMode::Negative => mass + adduct_mass,
            IonMode::Positive => mass - adduct_mass,
        }
    }

    pub fn default_adducts(&self) -> AdductTable {
        match self {
            IonMode::Negative => AdductTable::from_static(NEGATIVE_ADDUCTS),
            IonMode::Positive => AdductTable::from_static(POSITIVE_ADDUCTS),
        }
    }

    /// The charge states searched when none are given
    pub fn default_charges(&self) -> Vec<i32> {
        match self {
            IonMode::Negative => vec![-1],
            IonMode::Positive => vec![1],
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            IonMode::Negative => "negative",
            IonMode::Positive => "positive",
        }
    }
}

impl Display for IonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IonMode {
    type Err = FormulaSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "negative" | "neg" | "-" => Ok(IonMode::Negative),
            "positive" | "pos" | "+" => Ok(IonMode::Positive),
            _ => Err(FormulaSearchError::InvalidIonMode(s.trim().to_string())),
        }
    }
}

/// A named charge-carrying modification and its mass offset in Daltons
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Adduct {
    pub label: Cow<'static, str>,
    pub mass: f64,
}

impl Adduct {
    pub fn new(label: impl Into<Cow<'static, str>>, mass: f64) -> Self {
        Self {
            label: label.into(),
            mass,
        }
    }
}

/// An insertion-ordered collection of [`Adduct`]s. Iteration order is part of
/// the tie-breaking contract of a search, so it is never re-sorted.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdductTable(Vec<Adduct>);

impl AdductTable {
    pub fn new(adducts: Vec<Adduct>) -> Self {
        Self(adducts)
    }

    pub fn from_static(entries: &'static [(&'static str, f64)]) -> Self {
        entries
            .iter()
            .map(|(label, mass)| Adduct::new(*label, *mass))
            .collect()
    }

    pub fn push(&mut self, adduct: Adduct) {
        self.0.push(adduct)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Adduct> {
        self.0.iter()
    }

    pub fn get(&self, label: &str) -> Option<&Adduct> {
        self.0.iter().find(|a| a.label == label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Adduct> for AdductTable {
    fn from_iter<T: IntoIterator<Item = Adduct>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AdductTable {
    type Item = &'a Adduct;
    type IntoIter = std::slice::Iter<'a, Adduct>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
