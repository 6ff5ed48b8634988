//! # Ranking pipeline
//!
//! normalize → validate → score → project → sort. A run is a pure function of
//! its input tables, the profile and the settings; nothing is kept between
//! runs.

use crate::boost::BoostResolver;
use crate::error::{RankerError, Result};
use crate::models::{KickerRecord, ProjectionStrategy, RunWarning};
use crate::profile::ScoringProfile;
use crate::projection::{
    FitOutcome, HistoryDataset, OutcomeModel, ProjectionEngine, ProjectionSettings,
    DEFAULT_SCORE_TARGET_COLUMN, DEFAULT_TARGET_COLUMN,
};
use crate::rule_score::{RuleScoreBreakdown, RuleScoreEngine};
use crate::table::{
    parse_f64_cell, Table, COL_BOOST, COL_BOOST_NUM, COL_FORMULA_POINTS, COL_ML_PRED, COL_NAME,
    COL_OPPONENT, COL_PROJ_POINTS, COL_RULE_SCORE, COL_SCORE_PRED, COL_TEAM,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns appended by the pipeline; stripped from input before re-ranking
pub const DERIVED_COLUMNS: [&str; 6] = [
    COL_BOOST_NUM,
    COL_RULE_SCORE,
    COL_FORMULA_POINTS,
    COL_PROJ_POINTS,
    COL_ML_PRED,
    COL_SCORE_PRED,
];

/// Primary sort key of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RankBy {
    RuleScore,
    ProjectedPoints,
}

impl std::fmt::Display for RankBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankBy::RuleScore => f.write_str("rule-score"),
            RankBy::ProjectedPoints => f.write_str("projected-points"),
        }
    }
}

/// Per-run pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Primary sort key
    pub rank_by: RankBy,

    /// Realized-points column in the outcome history
    pub target_column: String,

    /// Target column in the score-outcome history
    pub score_target_column: String,

    /// Include RuleScore in the outcome feature vector
    pub include_rule_score: bool,

    /// L2 penalty for the regression estimators
    pub ridge_lambda: f64,

    /// Fixed decimals for exported floats; shortest round-trip form when unset
    pub export_decimals: Option<usize>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let projection = ProjectionSettings::default();
        Self {
            rank_by: RankBy::RuleScore,
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            score_target_column: DEFAULT_SCORE_TARGET_COLUMN.to_string(),
            include_rule_score: projection.include_rule_score,
            ridge_lambda: projection.ridge_lambda,
            export_decimals: None,
        }
    }
}

impl PipelineSettings {
    pub fn projection(&self) -> ProjectionSettings {
        ProjectionSettings {
            include_rule_score: self.include_rule_score,
            ridge_lambda: self.ridge_lambda,
        }
    }
}

/// A scored kicker: the input record plus derived columns
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKicker {
    pub record: KickerRecord,
    /// Passthrough input cells, aligned with [`RankedTable::headers`]
    pub cells: Vec<String>,
    pub breakdown: RuleScoreBreakdown,
    /// Summed-mode boost
    pub boost_num: f64,
    pub rule_score: f64,
    /// Closed-form points
    pub formula_points: f64,
    /// Primary projection
    pub projected_points: f64,
    /// Regression prediction on realized points
    pub ml_projection: Option<f64>,
    /// Secondary score-outcome prediction
    pub score_projection: Option<f64>,
}

/// End-of-run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    pub profile: String,
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub rank_by: RankBy,
    pub strategy: ProjectionStrategy,
    pub warnings: usize,
    pub model_rmse: Option<f64>,
    pub score_model_rmse: Option<f64>,
}

/// Ranked output of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTable {
    /// Input headers after normalization, derived columns removed
    pub headers: Vec<String>,
    pub rows: Vec<ScoredKicker>,
    pub warnings: Vec<RunWarning>,
    pub summary: RankingSummary,
}

/// Machine-readable run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: RankingSummary,
    pub warnings: Vec<RunWarning>,
}

/// One row re-read from an exported ranking
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedRanking {
    pub name: String,
    pub team: String,
    pub opponent: String,
    pub boost_num: f64,
    pub rule_score: f64,
    pub formula_points: f64,
    pub projected_points: f64,
    pub ml_projection: Option<f64>,
    pub score_projection: Option<f64>,
}

impl RankedTable {
    /// Flatten to a table: input columns then derived columns
    pub fn to_table(&self, decimals: Option<usize>) -> Table {
        let with_ml = self.rows.iter().any(|r| r.ml_projection.is_some());
        let with_score = self.rows.iter().any(|r| r.score_projection.is_some());

        let mut headers = self.headers.clone();
        headers.extend(
            [COL_BOOST_NUM, COL_RULE_SCORE, COL_FORMULA_POINTS, COL_PROJ_POINTS]
                .iter()
                .map(|s| s.to_string()),
        );
        if with_ml {
            headers.push(COL_ML_PRED.to_string());
        }
        if with_score {
            headers.push(COL_SCORE_PRED.to_string());
        }

        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut cells = r.cells.clone();
                cells.push(format_float(r.boost_num, decimals));
                cells.push(format_float(r.rule_score, decimals));
                cells.push(format_float(r.formula_points, decimals));
                cells.push(format_float(r.projected_points, decimals));
                if with_ml {
                    cells.push(r.ml_projection.map(|v| format_float(v, decimals)).unwrap_or_default());
                }
                if with_score {
                    cells.push(r.score_projection.map(|v| format_float(v, decimals)).unwrap_or_default());
                }
                cells
            })
            .collect();

        Table::new(headers, rows)
    }

    /// Export as CSV
    pub fn write_csv(&self, path: impl AsRef<Path>, decimals: Option<usize>) -> Result<()> {
        self.to_table(decimals).write_csv(path)
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            summary: self.summary.clone(),
            warnings: self.warnings.clone(),
        }
    }

    /// Write the summary and warnings as pretty JSON
    pub fn write_report(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.report())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Re-read an exported ranking, preserving row order
    pub fn read_export(path: impl AsRef<Path>) -> Result<Vec<ExportedRanking>> {
        let table = Table::read_csv(path)?;
        Self::parse_export(table)
    }

    pub fn parse_export(mut table: Table) -> Result<Vec<ExportedRanking>> {
        table.normalize_headers()?;
        table.require_columns(&[COL_NAME, COL_BOOST_NUM, COL_RULE_SCORE, COL_FORMULA_POINTS, COL_PROJ_POINTS])?;
        let idx = |name: &str| table.column_index(name);
        let required = |i: usize, column: &str| -> Result<f64> {
            parse_f64_cell(table.cell(i, idx(column)), column, i + 1)?.ok_or_else(|| {
                RankerError::MalformedValue {
                    column: column.to_string(),
                    row: i + 1,
                    value: String::new(),
                }
            })
        };

        (0..table.rows.len())
            .map(|i| {
                Ok(ExportedRanking {
                    name: table.cell(i, idx(COL_NAME)).to_string(),
                    team: table.cell(i, idx(COL_TEAM)).to_string(),
                    opponent: table.cell(i, idx(COL_OPPONENT)).to_string(),
                    boost_num: required(i, COL_BOOST_NUM)?,
                    rule_score: required(i, COL_RULE_SCORE)?,
                    formula_points: required(i, COL_FORMULA_POINTS)?,
                    projected_points: required(i, COL_PROJ_POINTS)?,
                    ml_projection: parse_f64_cell(table.cell(i, idx(COL_ML_PRED)), COL_ML_PRED, i + 1)?,
                    score_projection: parse_f64_cell(table.cell(i, idx(COL_SCORE_PRED)), COL_SCORE_PRED, i + 1)?,
                })
            })
            .collect()
    }
}

/// Shortest round-trip text by default, fixed decimals when requested
pub fn format_float(value: f64, decimals: Option<usize>) -> String {
    match decimals {
        Some(d) => format!("{:.*}", d, value),
        None => value.to_string(),
    }
}

/// Orchestrates scoring and projection for one run
#[derive(Debug, Clone)]
pub struct RankingPipeline {
    profile: ScoringProfile,
    settings: PipelineSettings,
}

impl RankingPipeline {
    /// Create a pipeline; the profile is validated up front
    pub fn new(profile: ScoringProfile, settings: PipelineSettings) -> Result<Self> {
        profile.validate()?;
        if !settings.ridge_lambda.is_finite() || settings.ridge_lambda < 0.0 {
            return Err(RankerError::config(format!(
                "ridge_lambda must be non-negative, got {}",
                settings.ridge_lambda
            )));
        }
        Ok(Self { profile, settings })
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Rank a weekly input table, optionally conditioned on history tables
    pub fn run(
        &self,
        mut input: Table,
        history: Option<Table>,
        score_history: Option<Table>,
    ) -> Result<RankedTable> {
        input.normalize_headers()?;
        let records = input.kicker_records()?;
        info!(
            "Scoring {} kickers with profile '{}' (rank by {})",
            records.len(),
            self.profile.name,
            self.settings.rank_by
        );

        let keep: Vec<usize> = (0..input.headers.len())
            .filter(|&i| !DERIVED_COLUMNS.contains(&input.headers[i].as_str()))
            .collect();
        if keep.len() != input.headers.len() {
            debug!("Dropping {} previously derived column(s) from input", input.headers.len() - keep.len());
        }
        let headers: Vec<String> = keep.iter().map(|&i| input.headers[i].clone()).collect();
        let input_has_boost = input.has_column(COL_BOOST);

        let rule_engine = RuleScoreEngine::new(&self.profile);
        let projector = ProjectionEngine::new(&self.profile, self.settings.projection());
        let boost = BoostResolver::new(&self.profile.boost);
        let mut warnings = Vec::new();

        let outcome_model = self.fit_optional(
            history,
            "outcome",
            &self.settings.target_column,
            input_has_boost,
            |dataset| projector.fit_history(dataset),
            &mut warnings,
        );
        let score_model = self.fit_optional(
            score_history,
            "score",
            &self.settings.score_target_column,
            input_has_boost,
            |dataset| projector.fit_score_history(dataset),
            &mut warnings,
        );

        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let breakdown = rule_engine.score(&record);
            for (feature, substitution, applied) in &breakdown.substitutions {
                warn!(
                    "Row {} ({}): {} in '{}', scored as {}",
                    record.row,
                    record.label(),
                    substitution,
                    feature,
                    applied
                );
                warnings.push(RunWarning::DataQuality {
                    row: record.row,
                    kicker: record.label(),
                    feature: *feature,
                    substitution: substitution.clone(),
                    applied_score: *applied,
                });
            }

            let formula_points = projector.closed_form(&record, &breakdown).points;
            let ml_projection = outcome_model.as_ref().map(|model| {
                model
                    .predict(&projector.outcome_features(&record, &breakdown), formula_points)
                    .max(0.0)
            });
            let score_projection = score_model
                .as_ref()
                .map(|model| model.predict(&projector.score_features(&breakdown), breakdown.total));

            rows.push(ScoredKicker {
                cells: keep.iter().map(|&c| input.cell(i, Some(c)).to_string()).collect(),
                boost_num: boost.summed_value(record.boost.as_deref()),
                rule_score: breakdown.total,
                formula_points,
                projected_points: ml_projection.unwrap_or(formula_points),
                ml_projection,
                score_projection,
                breakdown,
                record,
            });
        }

        sort_rows(&mut rows, self.settings.rank_by);

        let strategy = match &outcome_model {
            Some(OutcomeModel::Regression(_)) => ProjectionStrategy::Regression,
            Some(OutcomeModel::SingleSample { .. }) => ProjectionStrategy::SingleSampleBlend,
            None => ProjectionStrategy::ClosedForm,
        };
        let summary = RankingSummary {
            profile: self.profile.name.clone(),
            generated_at: Utc::now(),
            rows: rows.len(),
            rank_by: self.settings.rank_by,
            strategy,
            warnings: warnings.len(),
            model_rmse: outcome_model.as_ref().and_then(OutcomeModel::training_rmse),
            score_model_rmse: score_model.as_ref().and_then(OutcomeModel::training_rmse),
        };
        info!(
            "Ranked {} kickers ({} projection, {} warning(s))",
            summary.rows, summary.strategy, summary.warnings
        );

        Ok(RankedTable { headers, rows, warnings, summary })
    }

    /// Load and fit one optional history table; failures omit the model with a notice
    fn fit_optional<F>(
        &self,
        table: Option<Table>,
        label: &str,
        target_column: &str,
        input_has_boost: bool,
        fit: F,
        warnings: &mut Vec<RunWarning>,
    ) -> Option<OutcomeModel>
    where
        F: FnOnce(&HistoryDataset) -> Result<FitOutcome>,
    {
        let table = table?;
        let fitted = HistoryDataset::from_table(table, label, target_column, input_has_boost)
            .and_then(|(dataset, load_warnings)| {
                warnings.extend(load_warnings);
                fit(&dataset)
            });
        match fitted {
            Ok(outcome) => {
                warnings.extend(outcome.warnings);
                outcome.model
            }
            Err(e) => {
                warn!("{} projection omitted: {}", label, e);
                warnings.push(RunWarning::ModelOmitted {
                    dataset: label.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

/// Stable descending sort by the run's primary key
pub fn sort_rows(rows: &mut [ScoredKicker], rank_by: RankBy) {
    rows.sort_by(|a, b| compare_rows(b, a, rank_by));
}

fn compare_rows(a: &ScoredKicker, b: &ScoredKicker, rank_by: RankBy) -> Ordering {
    match rank_by {
        RankBy::RuleScore => a.rule_score.total_cmp(&b.rule_score),
        RankBy::ProjectedPoints => a
            .projected_points
            .total_cmp(&b.projected_points)
            .then_with(|| a.rule_score.total_cmp(&b.rule_score)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;

    const HEADERS: [&str; 13] = [
        "Rank", "ECR", "Name", "TEAM", "Opponent", "O/U", "Spread", "OPP RZ D", "RZ EFF*", "OFF RNK",
        "Consistency", "Weather", "Boost",
    ];

    fn week() -> Table {
        Table::from_strs(
            &HEADERS,
            &[
                &["1", "3", "Jake Moody", "SF", "LAR", "44", "-2.5", "15", "18", "18", "B", "2", ""],
                &["2", "1", "Wil Lutz", "DEN", "TEN", "51", "-7", "30", "28", "8", "A", "0", "Denver altitude"],
                &["3", "2", "Cairo Santos", "CHI", "GB", "39.5", "6", "8", "9", "27", "C", "3", "division"],
            ],
        )
    }

    #[test]
    fn test_run_ranks_by_rule_score() {
        let pipeline = RankingPipeline::new(ScoringProfile::classic(), PipelineSettings::default()).unwrap();
        let ranked = pipeline.run(week(), None, None).unwrap();

        let names: Vec<&str> = ranked.rows.iter().map(|r| r.record.name.as_str()).collect();
        assert_eq!(names, vec!["Wil Lutz", "Jake Moody", "Cairo Santos"]);
        assert_eq!(ranked.rows[0].rule_score, 24.0);
        assert_eq!(ranked.rows[0].boost_num, 6.0);
        assert!(ranked.warnings.is_empty());
        assert_eq!(ranked.summary.strategy, ProjectionStrategy::ClosedForm);
        assert!(ranked.rows.iter().all(|r| r.ml_projection.is_none()));
        assert!(ranked.rows.iter().all(|r| r.projected_points == r.formula_points));
    }

    #[test]
    fn test_missing_columns_fail_fast() {
        let table = Table::from_strs(&["Name", "TEAM", "O/U"], &[&["A", "B", "44"]]);
        let pipeline = RankingPipeline::new(ScoringProfile::classic(), PipelineSettings::default()).unwrap();
        match pipeline.run(table, None, None) {
            Err(RankerError::MissingColumns { missing }) => assert_eq!(missing.len(), 6),
            other => panic!("expected schema error, got {:?}", other.map(|t| t.rows.len())),
        }
    }

    #[test]
    fn test_missing_feature_warns_and_continues() {
        let mut table = week();
        table.rows[0][5] = "".to_string();
        let pipeline = RankingPipeline::new(ScoringProfile::classic(), PipelineSettings::default()).unwrap();
        let ranked = pipeline.run(table, None, None).unwrap();
        assert_eq!(ranked.rows.len(), 3);
        assert!(ranked.warnings.iter().any(|w| matches!(
            w,
            RunWarning::DataQuality { row: 1, feature: Feature::GameTotal, .. }
        )));
    }

    #[test]
    fn test_incompatible_history_omits_model_but_keeps_ranking() {
        let history = Table::from_strs(&["O/U", "Spread"], &[&["44", "-3"]]);
        let pipeline = RankingPipeline::new(ScoringProfile::classic(), PipelineSettings::default()).unwrap();
        let ranked = pipeline.run(week(), Some(history), None).unwrap();
        assert_eq!(ranked.summary.strategy, ProjectionStrategy::ClosedForm);
        assert!(ranked
            .warnings
            .iter()
            .any(|w| matches!(w, RunWarning::ModelOmitted { dataset, .. } if dataset == "outcome")));
        assert_eq!(ranked.rows[0].record.name, "Wil Lutz");
    }

    #[test]
    fn test_rank_by_projected_points_is_configurable() {
        let settings = PipelineSettings { rank_by: RankBy::ProjectedPoints, ..Default::default() };
        let pipeline = RankingPipeline::new(ScoringProfile::weighted(), settings).unwrap();
        let ranked = pipeline.run(week(), None, None).unwrap();
        for pair in ranked.rows.windows(2) {
            assert!(pair[0].projected_points >= pair[1].projected_points);
        }
        assert_eq!(ranked.summary.rank_by, RankBy::ProjectedPoints);
    }

    #[test]
    fn test_previously_derived_columns_are_replaced() {
        let pipeline = RankingPipeline::new(ScoringProfile::classic(), PipelineSettings::default()).unwrap();
        let first = pipeline.run(week(), None, None).unwrap().to_table(None);
        let second = pipeline.run(first.clone(), None, None).unwrap().to_table(None);
        assert_eq!(first.headers, second.headers);
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(24.0, None), "24");
        assert_eq!(format_float(0.1 + 0.2, None).parse::<f64>().unwrap(), 0.1 + 0.2);
        assert_eq!(format_float(12.3456, Some(1)), "12.3");
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let settings = PipelineSettings { ridge_lambda: -1.0, ..Default::default() };
        assert!(RankingPipeline::new(ScoringProfile::classic(), settings).is_err());
    }
}
