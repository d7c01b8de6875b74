//! Show or change settings.

use anyhow::Result;
use clap::ValueEnum;
use cubetime_types::{PuzzleType, Settings, Theme, VisibleStats};
use std::path::Path;

use super::open_session;

/// On/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    /// Enabled
    On,
    /// Disabled
    Off,
}

/// Display precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrecisionArg {
    /// Three decimals
    Ms,
    /// Two decimals
    Cs,
}

/// Statistics row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatRow {
    /// Best single
    Best,
    /// Worst single
    Worst,
    /// Average of 5
    Ao5,
    /// Average of 12
    Ao12,
    /// Session mean
    Mean,
}

impl StatRow {
    fn flag(self, visible: &mut VisibleStats) -> &mut bool {
        match self {
            StatRow::Best => &mut visible.best,
            StatRow::Worst => &mut visible.worst,
            StatRow::Ao5 => &mut visible.ao5,
            StatRow::Ao12 => &mut visible.ao12,
            StatRow::Mean => &mut visible.mean,
        }
    }
}

/// Requested settings changes. Unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct SettingsChange {
    /// Inspection on or off
    pub inspection: Option<Toggle>,
    /// Inspection ceiling in seconds
    pub inspection_time: Option<u32>,
    /// Selected puzzle
    pub puzzle: Option<PuzzleType>,
    /// Display precision
    pub precision: Option<PrecisionArg>,
    /// Color theme
    pub theme: Option<Theme>,
    /// Rows to show
    pub show: Vec<StatRow>,
    /// Rows to hide
    pub hide: Vec<StatRow>,
}

impl SettingsChange {
    fn is_empty(&self) -> bool {
        self.inspection.is_none()
            && self.inspection_time.is_none()
            && self.puzzle.is_none()
            && self.precision.is_none()
            && self.theme.is_none()
            && self.show.is_empty()
            && self.hide.is_empty()
    }

    /// Apply everything except inspection and puzzle, which go through the
    /// session so the timer and scramble follow.
    fn apply_display(&self, settings: &mut Settings) {
        if let Some(precision) = self.precision {
            settings.show_milliseconds = precision == PrecisionArg::Ms;
        }
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        for row in &self.show {
            *row.flag(&mut settings.visible_stats) = true;
        }
        for row in &self.hide {
            *row.flag(&mut settings.visible_stats) = false;
        }
    }
}

/// Run the settings command.
pub async fn run(data_dir: &Path, change: SettingsChange) -> Result<()> {
    let mut session = open_session(data_dir)?;

    if !change.is_empty() {
        let current = session.settings().get();
        if change.inspection.is_some() || change.inspection_time.is_some() {
            let enabled = change
                .inspection
                .map_or(current.inspection_enabled, |t| t == Toggle::On);
            let secs = change.inspection_time.unwrap_or(current.inspection_time);
            session.set_inspection(enabled, secs);
        }
        if let Some(puzzle) = change.puzzle {
            session.set_puzzle(puzzle);
        }
        session.settings().update(|s| change.apply_display(s));
        tracing::debug!(?change, "settings updated");
    }

    for line in render(&session.settings().get()) {
        println!("{}", line);
    }
    session.shutdown();
    Ok(())
}

fn render(settings: &Settings) -> Vec<String> {
    let on_off = |b: bool| if b { "on" } else { "off" };
    let visible = &settings.visible_stats;
    let rows: Vec<&str> = [
        (visible.best, "best"),
        (visible.worst, "worst"),
        (visible.ao5, "ao5"),
        (visible.ao12, "ao12"),
        (visible.mean, "mean"),
    ]
    .into_iter()
    .filter_map(|(shown, name)| shown.then_some(name))
    .collect();

    vec![
        format!("Puzzle:      {}", settings.cube_type.label()),
        format!(
            "Inspection:  {} ({} s)",
            on_off(settings.inspection_enabled),
            settings.inspection_time
        ),
        format!(
            "Precision:   {}",
            if settings.show_milliseconds { "ms" } else { "cs" }
        ),
        format!("Theme:       {}", settings.theme),
        format!("Statistics:  {}", rows.join(", ")),
    ]
}
