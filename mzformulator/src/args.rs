use std::{error::Error, fmt::Display, num::ParseIntError, str::FromStr};

use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use mzformula::{IonMode, Metal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgIonMode {
    #[default]
    /// Deprotonated, radical and chloride adducts
    Negative,
    /// Protonated, radical, sodium, potassium and ammonium adducts
    Positive,
}

impl From<ArgIonMode> for IonMode {
    fn from(value: ArgIonMode) -> Self {
        match value {
            ArgIonMode::Negative => IonMode::Negative,
            ArgIonMode::Positive => IonMode::Positive,
        }
    }
}

impl Display for ArgIonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", IonMode::from(*self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
pub enum ArgMetal {
    #[default]
    #[value(name = "y", alias = "yttrium")]
    #[serde(rename = "y", alias = "Y", alias = "yttrium")]
    Yttrium,
    #[value(name = "la", alias = "lanthanum")]
    #[serde(rename = "la", alias = "La", alias = "lanthanum")]
    Lanthanum,
}

impl From<ArgMetal> for Metal {
    fn from(value: ArgMetal) -> Self {
        match value {
            ArgMetal::Yttrium => Metal::Yttrium,
            ArgMetal::Lanthanum => Metal::Lanthanum,
        }
    }
}

impl Display for ArgMetal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Metal::from(*self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    /// A fixed-width table
    Text,
    /// A markdown table
    Markdown,
    /// One JSON document
    Json,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A comma separated list of signed, non-zero charge states
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChargeList(pub Vec<i32>);

impl TryFrom<Vec<i32>> for ChargeList {
    type Error = ChargeListParseError;

    fn try_from(charges: Vec<i32>) -> Result<Self, Self::Error> {
        if charges.is_empty() {
            Err(ChargeListParseError::Empty)
        } else if charges.contains(&0) {
            Err(ChargeListParseError::Zero)
        } else {
            Ok(Self(charges))
        }
    }
}

/// A sequence, a single charge, or the same comma separated text the command
/// line takes, since environment variables can only carry text.
impl<'de> Deserialize<'de> for ChargeList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ChargeRepr {
            List(Vec<i32>),
            Single(i32),
            Text(String),
        }

        match ChargeRepr::deserialize(deserializer)? {
            ChargeRepr::List(charges) => ChargeList::try_from(charges),
            ChargeRepr::Single(z) => ChargeList::try_from(vec![z]),
            ChargeRepr::Text(text) => text.parse(),
        }
        .map_err(D::Error::custom)
    }
}

impl ChargeList {
    pub fn new(charges: Vec<i32>) -> Self {
        Self(charges)
    }
}

impl From<ChargeList> for Vec<i32> {
    fn from(value: ChargeList) -> Self {
        value.0
    }
}

#[derive(Debug)]
pub enum ChargeListParseError {
    Empty,
    Malformed(String, ParseIntError),
    Zero,
}

impl Display for ChargeListParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChargeListParseError::Empty => write!(f, "Charge list is empty"),
            ChargeListParseError::Malformed(token, e) => {
                write!(f, "Failed to parse charge state {token:?}: {e}")
            }
            ChargeListParseError::Zero => write!(f, "Charge state cannot be zero"),
        }
    }
}

impl Error for ChargeListParseError {}

impl FromStr for ChargeList {
    type Err = ChargeListParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut charges = Vec::new();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let z: i32 = token
                .parse()
                .map_err(|e| ChargeListParseError::Malformed(token.to_string(), e))?;
            if z == 0 {
                return Err(ChargeListParseError::Zero);
            }
            charges.push(z);
        }
        ChargeList::try_from(charges)
    }
}

impl Display for ChargeList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(","))
    }
}

pub(crate) fn positive_float_f64(s: &str) -> Result<f64, String> {
    let value = s.parse::<f64>().map_err(|e| e.to_string())?;
    if !value.is_finite() || value <= 0.0 {
        Err(format!("`{s}` must be a finite number greater than zero"))
    } else {
        Ok(value)
    }
}
