use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The gender the user selects on the welcome screen.
///
/// A session starts without one; see [`crate::Session::set_gender`] for how
/// the selection is locked in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// The user selected "Male".
    Male,

    /// The user selected "Female".
    Female,
}

impl Gender {
    /// Every selectable gender, in the order the welcome screen lists them.
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Returns the lowercase identifier used in prompts and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    /// Returns the capitalized label used for buttons and titles.
    pub fn title(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an invalid gender string.
#[derive(Debug)]
pub struct GenderParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for GenderParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown gender: {} (expected male or female)",
            self.invalid_value
        )
    }
}

impl std::error::Error for GenderParseError {}

impl FromStr for Gender {
    type Err = GenderParseError;

    /// Accepts the full name, its initial, or the 1-based button number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "1" => Ok(Gender::Male),
            "female" | "f" | "2" => Ok(Gender::Female),
            _ => Err(GenderParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}
