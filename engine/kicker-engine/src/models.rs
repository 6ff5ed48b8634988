use serde::{Deserialize, Serialize};
use std::fmt;

/// One kicker's game context for a single week, as read from the input table
#[derive(Debug, Clone, PartialEq)]
pub struct KickerRecord {
    /// 1-based data row in the source table (header excluded)
    pub row: usize,
    pub name: String,
    pub team: String,
    pub opponent: String,
    /// Game over/under total
    pub over_under: Option<f64>,
    /// Point spread, negative = favorite
    pub spread: Option<f64>,
    /// 0 = dome/perfect, 1 = good, 2 = neutral, 3 = bad
    pub weather: Option<i64>,
    /// Offense rank, 1 = best
    pub offense_rank: Option<i64>,
    /// Red-zone efficiency in percent
    pub rz_efficiency: Option<f64>,
    /// Opponent red-zone defense allowance in percent
    pub opp_rz_defense: Option<f64>,
    /// Free-text situational tag
    pub boost: Option<String>,
}

impl KickerRecord {
    /// Create a record with identity only; every feature starts out missing
    pub fn new(row: usize, name: impl Into<String>, team: impl Into<String>, opponent: impl Into<String>) -> Self {
        Self {
            row,
            name: name.into(),
            team: team.into(),
            opponent: opponent.into(),
            over_under: None,
            spread: None,
            weather: None,
            offense_rank: None,
            rz_efficiency: None,
            opp_rz_defense: None,
            boost: None,
        }
    }

    /// Human-readable label used in logs and warnings
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("row {}", self.row)
        } else {
            format!("{} ({})", self.name, self.team)
        }
    }
}

/// The scorable game-context features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    GameTotal,
    Spread,
    Weather,
    OffenseRank,
    RedZoneEfficiency,
    RedZoneDefense,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::GameTotal,
        Feature::Spread,
        Feature::Weather,
        Feature::OffenseRank,
        Feature::RedZoneEfficiency,
        Feature::RedZoneDefense,
    ];

    /// Canonical input column for this feature
    pub fn column(self) -> &'static str {
        match self {
            Feature::GameTotal => crate::table::COL_OVER_UNDER,
            Feature::Spread => crate::table::COL_SPREAD,
            Feature::Weather => crate::table::COL_WEATHER,
            Feature::OffenseRank => crate::table::COL_OFF_RANK,
            Feature::RedZoneEfficiency => crate::table::COL_RZ_EFF,
            Feature::RedZoneDefense => crate::table::COL_OPP_RZ_D,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Why a scorer fell back to a default bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Substitution {
    /// The cell was empty or NaN
    Missing,
    /// The value was outside the feature's domain
    OutOfRange(f64),
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Substitution::Missing => f.write_str("missing value"),
            Substitution::OutOfRange(v) => write!(f, "out-of-range value {}", v),
        }
    }
}

/// Notices surfaced to the caller alongside a ranked table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunWarning {
    /// A scorable feature was missing or out of range and a default was applied
    DataQuality {
        row: usize,
        kicker: String,
        feature: Feature,
        substitution: Substitution,
        applied_score: f64,
    },

    /// A historical row was dropped before fitting
    HistoryRowSkipped {
        dataset: String,
        row: usize,
        reason: String,
    },

    /// Too few historical rows to fit a regression
    DegenerateSample { dataset: String, rows: usize },

    /// The statistical projection could not be produced for this run
    ModelOmitted { dataset: String, reason: String },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::DataQuality { row, kicker, feature, substitution, applied_score } => write!(
                f,
                "row {} ({}): {} in '{}', scored as {}",
                row, kicker, substitution, feature, applied_score
            ),
            RunWarning::HistoryRowSkipped { dataset, row, reason } => {
                write!(f, "{} history row {} skipped: {}", dataset, row, reason)
            }
            RunWarning::DegenerateSample { dataset, rows } => write!(
                f,
                "{} history has {} usable row(s); regression not fitted, using smoothed fallback",
                dataset, rows
            ),
            RunWarning::ModelOmitted { dataset, reason } => {
                write!(f, "{} projection omitted: {}", dataset, reason)
            }
        }
    }
}

/// Which projection strategy produced `ProjPoints` for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionStrategy {
    /// Closed-form attempt model, no history supplied or usable
    ClosedForm,
    /// Fitted regression on historical outcomes
    Regression,
    /// Single historical row blended with the closed form
    SingleSampleBlend,
}

impl fmt::Display for ProjectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionStrategy::ClosedForm => f.write_str("closed-form"),
            ProjectionStrategy::Regression => f.write_str("regression"),
            ProjectionStrategy::SingleSampleBlend => f.write_str("single-sample blend"),
        }
    }
}
