//! Statistics over an ordered solve list.
//!
//! Everything here is a total function of its input. Solves are taken in
//! insertion (chronological) order; trailing windows are taken from the end
//! of the slice, never from a sorted copy.

use cubetime_types::{PuzzleType, Solve, VisibleStats};

/// Scored time of a solve. See [`Solve::effective_time`].
pub fn effective_time(solve: &Solve) -> f64 {
    solve.effective_time()
}

/// Trimmed mean of the most recent `n` solves.
///
/// Returns `None` when fewer than `n` solves exist, when `n < 3` (nothing
/// would remain after trimming), or when more than one solve in the window
/// is a DNF.
pub fn trimmed_average(solves: &[Solve], n: usize) -> Option<f64> {
    if n < 3 || solves.len() < n {
        return None;
    }

    let mut window: Vec<f64> = solves[solves.len() - n..]
        .iter()
        .map(Solve::effective_time)
        .collect();

    if window.iter().filter(|t| t.is_infinite()).count() > 1 {
        return None;
    }

    window.sort_by(f64::total_cmp);
    let trimmed = &window[1..n - 1];
    if trimmed.iter().any(|t| t.is_infinite()) {
        return None;
    }

    Some(trimmed.iter().sum::<f64>() / trimmed.len() as f64)
}

/// Average of 5.
pub fn ao5(solves: &[Solve]) -> Option<f64> {
    trimmed_average(solves, 5)
}

/// Average of 12.
pub fn ao12(solves: &[Solve]) -> Option<f64> {
    trimmed_average(solves, 12)
}

fn finished(solves: &[Solve]) -> impl Iterator<Item = f64> + '_ {
    solves.iter().filter(|s| !s.dnf).map(Solve::effective_time)
}

/// Arithmetic mean of effective times over non-DNF solves.
pub fn mean(solves: &[Solve]) -> Option<f64> {
    let (sum, count) = finished(solves).fold((0.0, 0usize), |(s, c), t| (s + t, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Fastest non-DNF effective time.
pub fn best(solves: &[Solve]) -> Option<f64> {
    finished(solves).min_by(f64::total_cmp)
}

/// Slowest non-DNF effective time.
pub fn worst(solves: &[Solve]) -> Option<f64> {
    finished(solves).max_by(f64::total_cmp)
}

/// Summary statistics for one solve set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistics {
    /// Fastest non-DNF time
    pub best: Option<f64>,
    /// Slowest non-DNF time
    pub worst: Option<f64>,
    /// Average of 5
    pub ao5: Option<f64>,
    /// Average of 12
    pub ao12: Option<f64>,
    /// Mean of non-DNF times
    pub mean: Option<f64>,
    /// Number of solves, DNFs included
    pub count: usize,
}

impl Statistics {
    /// Labelled rows for the statistics the user chose to show, in display
    /// order. The count is not a toggle and is never included.
    pub fn visible(&self, flags: &VisibleStats) -> Vec<(&'static str, Option<f64>)> {
        [
            (flags.best, "Best", self.best),
            (flags.worst, "Worst", self.worst),
            (flags.ao5, "Ao5", self.ao5),
            (flags.ao12, "Ao12", self.ao12),
            (flags.mean, "Mean", self.mean),
        ]
        .into_iter()
        .filter(|(shown, _, _)| *shown)
        .map(|(_, label, value)| (label, value))
        .collect()
    }
}

/// Compute statistics over every solve given.
pub fn calculate(solves: &[Solve]) -> Statistics {
    Statistics {
        best: best(solves),
        worst: worst(solves),
        ao5: ao5(solves),
        ao12: ao12(solves),
        mean: mean(solves),
        count: solves.len(),
    }
}

/// Compute statistics over the solves of one puzzle type.
pub fn calculate_for(solves: &[Solve], puzzle: PuzzleType) -> Statistics {
    let filtered: Vec<Solve> = solves
        .iter()
        .filter(|s| s.puzzle() == puzzle)
        .cloned()
        .collect();
    calculate(&filtered)
}

/// Display precision for times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// Three decimals
    #[default]
    Milliseconds,
    /// Two decimals
    Centiseconds,
}

impl Precision {
    /// Map the `showMilliseconds` setting.
    pub fn from_show_milliseconds(show: bool) -> Self {
        if show {
            Precision::Milliseconds
        } else {
            Precision::Centiseconds
        }
    }

    fn decimals(self) -> usize {
        match self {
            Precision::Milliseconds => 3,
            Precision::Centiseconds => 2,
        }
    }
}

/// Format milliseconds as seconds with three decimals.
///
/// `None` is `"-"`, `+∞` is `"DNF"`.
pub fn format_time(value: Option<f64>) -> String {
    format_time_with(value, Precision::Milliseconds)
}

/// Format milliseconds as seconds at the given precision.
pub fn format_time_with(value: Option<f64>, precision: Precision) -> String {
    match value {
        None => "-".to_string(),
        Some(ms) if ms.is_infinite() => "DNF".to_string(),
        Some(ms) => format!("{:.*}", precision.decimals(), ms / 1000.0),
    }
}

/// Format a single solve: `"DNF"`, or the raw time with a trailing `+`
/// when it carries a +2.
pub fn format_solve(solve: &Solve) -> String {
    format_solve_with(solve, Precision::Milliseconds)
}

/// [`format_solve`] at the given precision.
pub fn format_solve_with(solve: &Solve, precision: Precision) -> String {
    if solve.dnf {
        return "DNF".to_string();
    }
    let time = format_time_with(Some(solve.time), precision);
    if solve.plus_two {
        format!("{}+", time)
    } else {
        time
    }
}
