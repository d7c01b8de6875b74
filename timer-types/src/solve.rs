//! Solve records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PuzzleType, SolveId};

/// Milliseconds added by a +2 penalty.
pub const PLUS_TWO_MS: f64 = 2000.0;

/// A single timed solve.
///
/// `time` is the raw measured duration in milliseconds, exclusive of any
/// penalty. The scored time is derived by [`Solve::effective_time`] and never
/// stored. `plus_two` is only meaningful while `dnf` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solve {
    /// Unique identifier, stable for the lifetime of the solve
    pub id: SolveId,
    /// Raw duration in milliseconds
    pub time: f64,
    /// Scramble the solve was performed on
    pub scramble: String,
    /// When the solve was recorded
    pub date: SolveDate,
    /// Did Not Finish
    pub dnf: bool,
    /// Two-second penalty
    pub plus_two: bool,
    /// Puzzle type; absent on solves recorded before puzzle selection existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puzzle_type: Option<PuzzleType>,
}

/// When a solve was recorded.
///
/// Kept as the string it arrived as, so records written by other clients
/// round-trip unchanged. Local solves are stamped with RFC 3339 at
/// millisecond precision.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolveDate(String);

impl SolveDate {
    /// The current instant.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Wrap a date string as received.
    pub fn from_string(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The date string as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the date. Bare dates and date-times without an offset are
    /// read as UTC; anything else unparseable yields `None`.
    pub fn parsed(&self) -> Option<DateTime<Utc>> {
        let raw = self.0.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Utc));
        }
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(at.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc())
    }
}

impl From<DateTime<Utc>> for SolveDate {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl fmt::Display for SolveDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SolveDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SolveDate({})", self.0)
    }
}

/// Penalty annotation on a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Penalty {
    /// No penalty
    #[default]
    None,
    /// Two seconds added
    PlusTwo,
    /// Did Not Finish
    Dnf,
}

impl Solve {
    /// Record a new solve timestamped now.
    pub fn new(time: f64, scramble: impl Into<String>, puzzle: PuzzleType) -> Self {
        Self {
            id: SolveId::new(),
            time,
            scramble: scramble.into(),
            date: SolveDate::now(),
            dnf: false,
            plus_two: false,
            puzzle_type: Some(puzzle),
        }
    }

    /// The scored time: `+∞` for a DNF, `time + 2000` for a +2, else `time`.
    pub fn effective_time(&self) -> f64 {
        if self.dnf {
            f64::INFINITY
        } else if self.plus_two {
            self.time + PLUS_TWO_MS
        } else {
            self.time
        }
    }

    /// Puzzle this solve counts towards (legacy solves count as 3x3).
    pub fn puzzle(&self) -> PuzzleType {
        self.puzzle_type.unwrap_or_default()
    }

    /// Current penalty.
    pub fn penalty(&self) -> Penalty {
        if self.dnf {
            Penalty::Dnf
        } else if self.plus_two {
            Penalty::PlusTwo
        } else {
            Penalty::None
        }
    }

    /// Replace the penalty. Setting DNF always clears +2.
    pub fn set_penalty(&mut self, penalty: Penalty) {
        self.dnf = penalty == Penalty::Dnf;
        self.plus_two = penalty == Penalty::PlusTwo;
    }

    /// Flip DNF. +2 is cleared either way.
    pub fn toggle_dnf(&mut self) {
        self.dnf = !self.dnf;
        self.plus_two = false;
    }

    /// Flip +2. No-op while the solve is a DNF.
    ///
    /// Returns whether the solve changed.
    pub fn toggle_plus_two(&mut self) -> bool {
        if self.dnf {
            return false;
        }
        self.plus_two = !self.plus_two;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn solve(time: f64) -> Solve {
        Solve::new(time, "R U R' U'", PuzzleType::ThreeByThree)
    }

    #[test]
    fn effective_time_plain() {
        assert_eq!(solve(12_345.0).effective_time(), 12_345.0);
    }

    #[test]
    fn effective_time_plus_two() {
        let mut s = solve(10_000.0);
        s.toggle_plus_two();
        assert_eq!(s.effective_time(), 12_000.0);
    }

    #[test]
    fn dnf_is_infinite_even_with_plus_two_set() {
        let mut s = solve(10_000.0);
        s.plus_two = true;
        s.dnf = true;
        assert!(s.effective_time().is_infinite());
    }

    #[test]
    fn toggle_dnf_clears_plus_two() {
        let mut s = solve(10_000.0);
        s.toggle_plus_two();
        s.toggle_dnf();
        assert!(s.dnf);
        assert!(!s.plus_two);

        s.toggle_dnf();
        assert!(!s.dnf);
        assert!(!s.plus_two, "+2 is not restored when DNF is removed");
    }

    #[test]
    fn plus_two_ignored_while_dnf() {
        let mut s = solve(10_000.0);
        s.toggle_dnf();
        assert!(!s.toggle_plus_two());
        assert!(!s.plus_two);
    }

    #[test]
    fn set_penalty_keeps_flags_exclusive() {
        let mut s = solve(1.0);
        s.set_penalty(Penalty::PlusTwo);
        assert_eq!(s.penalty(), Penalty::PlusTwo);
        s.set_penalty(Penalty::Dnf);
        assert!(s.dnf && !s.plus_two);
        s.set_penalty(Penalty::None);
        assert_eq!(s.penalty(), Penalty::None);
    }

    #[test]
    fn json_uses_camel_case() {
        let s = solve(9_876.5);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["plusTwo"], false);
        assert_eq!(json["puzzleType"], "3x3");
        assert!(json["date"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn legacy_solve_without_puzzle_counts_as_3x3() {
        let json = r#"{
            "id": "legacy-1",
            "time": 15234.5,
            "scramble": "R U",
            "date": "2024-03-01T10:00:00.000Z",
            "dnf": false,
            "plusTwo": true
        }"#;
        let s: Solve = serde_json::from_str(json).unwrap();
        assert_eq!(s.puzzle_type, None);
        assert_eq!(s.puzzle(), PuzzleType::ThreeByThree);
        assert_eq!(s.effective_time(), 17_234.5);
    }

    #[test]
    fn foreign_record_parses_and_keeps_its_date() {
        let json = r#"{
            "id": "web-7",
            "time": 41000,
            "scramble": "R U",
            "date": "2024-03-01",
            "dnf": false,
            "plusTwo": false,
            "puzzleType": "fto"
        }"#;
        let s: Solve = serde_json::from_str(json).unwrap();
        assert_eq!(s.puzzle(), PuzzleType::ThreeByThree);
        assert_eq!(s.date.as_str(), "2024-03-01");

        let back = serde_json::to_value(&s).unwrap();
        assert_eq!(back["date"], "2024-03-01");
    }

    // ===== SolveDate Tests =====

    #[test]
    fn dates_in_common_shapes_parse_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for raw in [
            "2024-03-01",
            "2024-03-01T00:00:00",
            "2024-03-01T00:00:00.000Z",
            "2024-03-01T01:00:00+01:00",
        ] {
            assert_eq!(SolveDate::from_string(raw).parsed(), Some(expected), "{}", raw);
        }
        assert_eq!(SolveDate::from_string("yesterday").parsed(), None);
    }

    #[test]
    fn local_dates_are_millisecond_rfc3339() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let date = SolveDate::from(at);
        assert_eq!(date.as_str(), "2024-05-01T12:00:00.000Z");
        assert_eq!(date.parsed(), Some(at));
    }
}
