/*! Named presets bounding how many secondary atoms a formula may carry */
use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;

use crate::error::FormulaSearchError;

/// The upper bounds on the secondary building blocks that a [`CoarsenessLevel`]
/// permits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoarsenessParams {
    pub h_max: u32,
    pub c_max: u32,
    pub f_max: u32,
    pub n_max: u32,
    /// Added on top of the caller's base oxygen maximum
    pub additional_o: u32,
}

impl CoarsenessParams {
    pub const fn new(h_max: u32, c_max: u32, f_max: u32, n_max: u32, additional_o: u32) -> Self {
        Self {
            h_max,
            c_max,
            f_max,
            n_max,
            additional_o,
        }
    }

    /// The bounds as `(name, value)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> {
        [
            ("h_max", self.h_max),
            ("c_max", self.c_max),
            ("f_max", self.f_max),
            ("n_max", self.n_max),
            ("additional_o", self.additional_o),
        ]
        .into_iter()
    }

    /// Whether every bound of `self` is at least as large as the same bound in `other`
    pub fn contains(&self, other: &CoarsenessParams) -> bool {
        self.iter().zip(other.iter()).all(|((_, a), (_, b))| a >= b)
    }
}

impl Display for CoarsenessParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .join(", ");
        f.write_str(&text)
    }
}

/// How broad a formula search is allowed to be. Each level's bounds are
/// no smaller than the previous level's in every dimension, so a looser
/// level always finds a superset of a stricter level's formulas.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(into = "u8"))]
pub enum CoarsenessLevel {
    Strict = 1,
    #[default]
    Moderate = 2,
    Loose = 3,
}

impl CoarsenessLevel {
    /// All levels, strictest first
    pub const ALL: [CoarsenessLevel; 3] = [
        CoarsenessLevel::Strict,
        CoarsenessLevel::Moderate,
        CoarsenessLevel::Loose,
    ];

    pub const fn params(&self) -> CoarsenessParams {
        match self {
            CoarsenessLevel::Strict => CoarsenessParams::new(0, 0, 0, 0, 0),
            CoarsenessLevel::Moderate => CoarsenessParams::new(4, 2, 1, 1, 2),
            CoarsenessLevel::Loose => CoarsenessParams::new(10, 5, 2, 2, 5),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            CoarsenessLevel::Strict => "strict",
            CoarsenessLevel::Moderate => "moderate",
            CoarsenessLevel::Loose => "loose",
        }
    }

    pub const fn level(&self) -> u8 {
        *self as u8
    }
}

impl Display for CoarsenessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for CoarsenessLevel {
    type Error = FormulaSearchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CoarsenessLevel::Strict),
            2 => Ok(CoarsenessLevel::Moderate),
            3 => Ok(CoarsenessLevel::Loose),
            _ => Err(FormulaSearchError::InvalidCoarsenessLevel(value)),
        }
    }
}

impl From<CoarsenessLevel> for u8 {
    fn from(value: CoarsenessLevel) -> Self {
        value.level()
    }
}

/// Accepts either the level number or any spelling [`FromStr`] accepts, so
/// configuration files and environment variables read like the command line.
#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CoarsenessLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum LevelRepr {
            Number(u8),
            Name(String),
        }

        match LevelRepr::deserialize(deserializer)? {
            LevelRepr::Number(value) => CoarsenessLevel::try_from(value).map_err(D::Error::custom),
            LevelRepr::Name(token) => token.parse().map_err(D::Error::custom),
        }
    }
}

impl FromStr for CoarsenessLevel {
    type Err = FormulaSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if let Ok(level) = token.parse::<u8>() {
            return CoarsenessLevel::try_from(level);
        }
        CoarsenessLevel::ALL
            .into_iter()
            .find(|level| token.eq_ignore_ascii_case(level.name()))
            .ok_or_else(|| FormulaSearchError::UnknownCoarsenessLevel(token.to_string()))
    }
}

/// Get the bounds for a numbered coarseness level, 1 (strict) through 3 (loose)
pub fn get_coarseness_params(level: u8) -> Result<CoarsenessParams, FormulaSearchError> {
    CoarsenessLevel::try_from(level).map(|level| level.params())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_presets() {
        let strict = get_coarseness_params(1).unwrap();
        assert_eq!(strict, CoarsenessParams::default());

        let moderate = get_coarseness_params(2).unwrap();
        assert_eq!(moderate.h_max, 4);
        assert_eq!(moderate.c_max, 2);
        assert_eq!(moderate.f_max, 1);
        assert_eq!(moderate.n_max, 1);
        assert_eq!(moderate.additional_o, 2);

        let loose = get_coarseness_params(3).unwrap();
        assert_eq!(loose, CoarsenessParams::new(10, 5, 2, 2, 5));
    }

    #[test]
    fn test_invalid_level() {
        for level in [0u8, 4, 255] {
            assert_eq!(
                get_coarseness_params(level),
                Err(FormulaSearchError::InvalidCoarsenessLevel(level))
            );
        }
    }

    #[test]
    fn test_bounds_are_monotonic() {
        for (lower, higher) in CoarsenessLevel::ALL
            .iter()
            .zip(CoarsenessLevel::ALL.iter().skip(1))
        {
            assert!(
                higher.params().contains(&lower.params()),
                "{higher} does not contain {lower}"
            );
            assert!(higher > lower);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("1".parse::<CoarsenessLevel>(), Ok(CoarsenessLevel::Strict));
        assert_eq!("Loose".parse::<CoarsenessLevel>(), Ok(CoarsenessLevel::Loose));
        assert_eq!(
            "7".parse::<CoarsenessLevel>(),
            Err(FormulaSearchError::InvalidCoarsenessLevel(7))
        );
        assert_eq!(
            "coarse".parse::<CoarsenessLevel>(),
            Err(FormulaSearchError::UnknownCoarsenessLevel("coarse".to_string()))
        );
        assert_eq!(CoarsenessLevel::default().level(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CoarsenessLevel::Moderate.params().to_string(),
            "h_max=4, c_max=2, f_max=1, n_max=1, additional_o=2"
        );
        assert_eq!(CoarsenessLevel::Strict.to_string(), "strict");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_number_or_name() {
        let levels: Vec<CoarsenessLevel> =
            serde_json::from_str(r#"[1, "moderate", "3", "Loose"]"#).unwrap();
        assert_eq!(
            levels,
            vec![
                CoarsenessLevel::Strict,
                CoarsenessLevel::Moderate,
                CoarsenessLevel::Loose,
                CoarsenessLevel::Loose
            ]
        );
        assert!(serde_json::from_str::<CoarsenessLevel>("4").is_err());
        assert!(serde_json::from_str::<CoarsenessLevel>(r#""coarse""#).is_err());
        assert_eq!(serde_json::to_string(&CoarsenessLevel::Loose).unwrap(), "3");
    }
}
