//! Score breakdown and its text explanation

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Every term of the composite score, in explanation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Sectional,
    LateSection,
    Distance,
    Course,
    Style,
    Impost,
    Layoff,
    GradedBonus,
    DebutBoost,
    BigLoss,
    WinStreak,
    CourseRecord,
    Danger,
}

impl Component {
    pub const ORDER: [Component; 13] = [
        Component::Sectional,
        Component::LateSection,
        Component::Distance,
        Component::Course,
        Component::Style,
        Component::Impost,
        Component::Layoff,
        Component::GradedBonus,
        Component::DebutBoost,
        Component::BigLoss,
        Component::WinStreak,
        Component::CourseRecord,
        Component::Danger,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Component::Sectional => "Final 3F (上がり3F)",
            Component::LateSection => "Late 4F (後半4F)",
            Component::Distance => "Distance",
            Component::Course => "Course",
            Component::Style => "Style/pace",
            Component::Impost => "Impost",
            Component::Layoff => "Layoff",
            Component::GradedBonus => "Graded races",
            Component::DebutBoost => "Debut boost",
            Component::BigLoss => "Big losses",
            Component::WinStreak => "Win streak",
            Component::CourseRecord => "Course record",
            Component::Danger => "Danger",
        }
    }

    /// Normalized onto 0-100 and weighted, as opposed to added as-is
    pub fn is_weighted(&self) -> bool {
        matches!(
            self,
            Component::Sectional
                | Component::LateSection
                | Component::Distance
                | Component::Course
                | Component::Style
        )
    }
}

/// One line of the total: raw sub-score and what it adds to the total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub component: Component,
    pub raw: f64,
    /// Rounded to 0.1
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerFlag {
    /// Mostly regional form and the latest start is still regional
    RegionalTransfer,
}

impl DangerFlag {
    pub fn label(&self) -> &'static str {
        match self {
            DangerFlag::RegionalTransfer => "regional horse not yet raced on the central circuit",
        }
    }
}

/// Score of one entrant for one race
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: f64,
    pub sectional: f64,
    pub late_section: f64,
    pub distance: f64,
    pub course: f64,
    pub style_bonus: f64,
    pub impost: f64,
    pub layoff: f64,
    pub graded_bonus: f64,
    pub debut_boost: f64,
    pub big_loss: f64,
    pub win_streak: f64,
    pub course_record: f64,
    pub danger: f64,
    /// Long-distance turf weight preset in use
    pub long_distance: bool,
    pub contributions: Vec<Contribution>,
    pub danger_flags: Vec<DangerFlag>,
    pub notes: Vec<String>,
    pub config_version: String,
}

impl ScoreBreakdown {
    pub fn contribution(&self, component: Component) -> Option<&Contribution> {
        self.contributions.iter().find(|c| c.component == component)
    }

    /// Contributions that change the total
    pub fn nonzero_contributions(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions.iter().filter(|c| c.value != 0.0)
    }

    /// Sum of the listed lines, equal to `total` up to rounding
    pub fn rendered_total(&self) -> f64 {
        self.nonzero_contributions().map(|c| c.value).sum()
    }

    /// Text explanation.
    ///
    /// Compact mode lists every nonzero contribution in fixed order. Verbose
    /// mode adds the raw sub-scores, danger flags and diagnostic notes.
    pub fn explain(&self, verbose: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total: {:.1}", self.total);

        for c in self.nonzero_contributions() {
            let _ = writeln!(out, "  {:<22} {:>+7.1}", c.component.label(), c.value);
            if verbose && c.component.is_weighted() {
                let _ = writeln!(out, "    raw {:.2}", c.raw);
            }
        }

        if verbose {
            if self.nonzero_contributions().next().is_none() {
                let _ = writeln!(out, "    no contributing terms");
            }
            for flag in &self.danger_flags {
                let _ = writeln!(out, "    ! {}", flag.label());
            }
            for note in &self.notes {
                let _ = writeln!(out, "    - {}", note);
            }
            let preset = if self.long_distance {
                "long-distance turf"
            } else {
                "standard"
            };
            let _ = writeln!(
                out,
                "    weights: {} / config {}",
                preset, self.config_version
            );
        }

        out
    }
}
