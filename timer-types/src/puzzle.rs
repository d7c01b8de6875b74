//! Puzzle type tags.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// The puzzle a solve or scramble belongs to.
///
/// Serialized with the short tags the remote store uses (`"3x3"`, `"sq1"`, ...).
/// Decoding never fails: a tag this build does not know reads as 3x3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PuzzleType {
    /// 2x2x2 cube
    #[serde(rename = "2x2")]
    TwoByTwo,
    /// 3x3x3 cube (the reference puzzle)
    #[default]
    #[serde(rename = "3x3")]
    ThreeByThree,
    /// 4x4x4 cube
    #[serde(rename = "4x4")]
    FourByFour,
    /// 5x5x5 cube
    #[serde(rename = "5x5")]
    FiveByFive,
    /// 6x6x6 cube
    #[serde(rename = "6x6")]
    SixBySix,
    /// 7x7x7 cube
    #[serde(rename = "7x7")]
    SevenBySeven,
    /// Pyraminx
    #[serde(rename = "pyraminx")]
    Pyraminx,
    /// Megaminx
    #[serde(rename = "megaminx")]
    Megaminx,
    /// Skewb
    #[serde(rename = "skewb")]
    Skewb,
    /// Rubik's Clock
    #[serde(rename = "clock")]
    Clock,
    /// Square-1
    #[serde(rename = "sq1")]
    Square1,
    /// 3x3 one-handed
    #[serde(rename = "oh")]
    OneHanded,
    /// 3x3 blindfolded
    #[serde(rename = "bld")]
    Blindfolded,
}

impl PuzzleType {
    /// Every puzzle type, in selector order.
    pub const ALL: [PuzzleType; 13] = [
        PuzzleType::TwoByTwo,
        PuzzleType::ThreeByThree,
        PuzzleType::FourByFour,
        PuzzleType::FiveByFive,
        PuzzleType::SixBySix,
        PuzzleType::SevenBySeven,
        PuzzleType::Pyraminx,
        PuzzleType::Megaminx,
        PuzzleType::Skewb,
        PuzzleType::Clock,
        PuzzleType::Square1,
        PuzzleType::OneHanded,
        PuzzleType::Blindfolded,
    ];

    /// The wire tag for this puzzle.
    pub fn tag(&self) -> &'static str {
        match self {
            PuzzleType::TwoByTwo => "2x2",
            PuzzleType::ThreeByThree => "3x3",
            PuzzleType::FourByFour => "4x4",
            PuzzleType::FiveByFive => "5x5",
            PuzzleType::SixBySix => "6x6",
            PuzzleType::SevenBySeven => "7x7",
            PuzzleType::Pyraminx => "pyraminx",
            PuzzleType::Megaminx => "megaminx",
            PuzzleType::Skewb => "skewb",
            PuzzleType::Clock => "clock",
            PuzzleType::Square1 => "sq1",
            PuzzleType::OneHanded => "oh",
            PuzzleType::Blindfolded => "bld",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PuzzleType::TwoByTwo => "2x2",
            PuzzleType::ThreeByThree => "3x3",
            PuzzleType::FourByFour => "4x4",
            PuzzleType::FiveByFive => "5x5",
            PuzzleType::SixBySix => "6x6",
            PuzzleType::SevenBySeven => "7x7",
            PuzzleType::Pyraminx => "Pyraminx",
            PuzzleType::Megaminx => "Megaminx",
            PuzzleType::Skewb => "Skewb",
            PuzzleType::Clock => "Clock",
            PuzzleType::Square1 => "Square-1",
            PuzzleType::OneHanded => "3x3 OH",
            PuzzleType::Blindfolded => "3x3 BLD",
        }
    }

    /// Whether this puzzle is scrambled with the 3x3 generator.
    ///
    /// One-handed and blindfolded are 3x3 events with their own statistics.
    pub fn scrambles_as_3x3(&self) -> bool {
        matches!(
            self,
            PuzzleType::ThreeByThree | PuzzleType::OneHanded | PuzzleType::Blindfolded
        )
    }
}

impl fmt::Display for PuzzleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for PuzzleType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .and_then(|tag| tag.parse().ok())
            .unwrap_or_default())
    }
}

impl FromStr for PuzzleType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PuzzleType::ALL
            .iter()
            .copied()
            .find(|p| p.tag() == wanted)
            .ok_or_else(|| TypesError::UnknownPuzzle(s.to_string()))
    }
}
