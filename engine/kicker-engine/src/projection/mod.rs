//! # Projection engine
//!
//! Converts rule scores and game context into projected fantasy points.
//!
//! - **Closed form**: deterministic attempt model, always available
//! - **Regression**: ridge estimator fit on historical realized points
//! - **Score estimator**: optional secondary estimator over the rule-score
//!   components, fit on a separate score-outcome dataset
//!
//! With fewer than two usable historical rows no regression is fit. A single
//! row yields a fixed blend of model estimate and observed outcome.

pub mod closed_form;
pub mod history;
pub mod regression;

pub use closed_form::{AttemptEstimate, ClosedFormInputs, ClosedFormProjection};
pub use history::{HistoricalSample, HistoryDataset, DEFAULT_SCORE_TARGET_COLUMN, DEFAULT_TARGET_COLUMN};
pub use regression::RidgeRegression;

use crate::boost::BoostResolver;
use crate::error::Result;
use crate::models::{KickerRecord, RunWarning};
use crate::profile::ScoringProfile;
use crate::rule_score::{RuleScoreBreakdown, RuleScoreEngine};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Weight of the model estimate when only one historical row exists
pub const SINGLE_SAMPLE_MODEL_WEIGHT: f64 = 0.3;

/// Default L2 penalty on standardized features
pub const DEFAULT_RIDGE_LAMBDA: f64 = 1.0;

/// Names of the outcome-model features, in vector order
pub const OUTCOME_FEATURE_NAMES: [&str; 8] = [
    "over_under",
    "spread",
    "offense_rank",
    "rz_efficiency",
    "opp_rz_defense",
    "weather",
    "boost_num",
    "rule_score",
];

/// Statistical model settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSettings {
    /// Append RuleScore to the outcome feature vector
    pub include_rule_score: bool,
    pub ridge_lambda: f64,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            include_rule_score: true,
            ridge_lambda: DEFAULT_RIDGE_LAMBDA,
        }
    }
}

/// A model fit on one historical dataset
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeModel {
    Regression(RidgeRegression),
    /// One usable row: blend its outcome with the current estimate
    SingleSample { outcome: f64 },
}

impl OutcomeModel {
    /// Predict from a feature vector, blending with `estimate` in the single-sample case
    pub fn predict(&self, features: &[Option<f64>], estimate: f64) -> f64 {
        match self {
            OutcomeModel::Regression(model) => model.predict_imputed(features),
            OutcomeModel::SingleSample { outcome } => {
                SINGLE_SAMPLE_MODEL_WEIGHT * estimate + (1.0 - SINGLE_SAMPLE_MODEL_WEIGHT) * outcome
            }
        }
    }

    pub fn training_rmse(&self) -> Option<f64> {
        match self {
            OutcomeModel::Regression(model) => Some(model.training_rmse()),
            OutcomeModel::SingleSample { .. } => None,
        }
    }
}

/// Result of fitting a historical dataset
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// `None` when no usable rows remained
    pub model: Option<OutcomeModel>,
    pub warnings: Vec<RunWarning>,
}

/// Stateless projector borrowing the active profile
#[derive(Debug, Clone, Copy)]
pub struct ProjectionEngine<'a> {
    profile: &'a ScoringProfile,
    settings: ProjectionSettings,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(profile: &'a ScoringProfile, settings: ProjectionSettings) -> Self {
        Self { profile, settings }
    }

    /// Closed-form points for a scored record
    pub fn closed_form(&self, record: &KickerRecord, breakdown: &RuleScoreBreakdown) -> ClosedFormProjection {
        let inputs = ClosedFormInputs {
            rule_score: breakdown.total,
            over_under: record.over_under,
            spread: record.spread,
            rz_efficiency: record.rz_efficiency,
            boost_summed: self.boost_summed(record),
        };
        closed_form::project(&self.profile.attempts, &inputs)
    }

    pub fn boost_summed(&self, record: &KickerRecord) -> f64 {
        BoostResolver::new(&self.profile.boost).summed_value(record.boost.as_deref())
    }

    /// Outcome-model feature vector; substituted features are `None`
    pub fn outcome_features(&self, record: &KickerRecord, breakdown: &RuleScoreBreakdown) -> Vec<Option<f64>> {
        use crate::models::Feature;

        let usable = |feature: Feature, value: Option<f64>| {
            if breakdown.substitutions.iter().any(|(f, _, _)| *f == feature) {
                None
            } else {
                value
            }
        };
        let mut features = vec![
            usable(Feature::GameTotal, record.over_under),
            usable(Feature::Spread, record.spread),
            usable(Feature::OffenseRank, record.offense_rank.map(|r| r as f64)),
            usable(Feature::RedZoneEfficiency, record.rz_efficiency),
            usable(Feature::RedZoneDefense, record.opp_rz_defense),
            usable(Feature::Weather, record.weather.map(|w| w as f64)),
            Some(self.boost_summed(record)),
        ];
        if self.settings.include_rule_score {
            features.push(Some(breakdown.total));
        }
        features
    }

    /// Score-estimator feature vector: the rule-score components
    pub fn score_features(&self, breakdown: &RuleScoreBreakdown) -> Vec<Option<f64>> {
        breakdown.derived_features().iter().map(|v| Some(*v)).collect()
    }

    /// Fit the realized-points model on a historical dataset
    pub fn fit_history(&self, dataset: &HistoryDataset) -> Result<FitOutcome> {
        let rule_engine = RuleScoreEngine::new(self.profile);
        self.fit_with(dataset, |sample| {
            let breakdown = rule_engine.score(&sample.record);
            reject_substituted(&breakdown)?;
            let features = self.outcome_features(&sample.record, &breakdown);
            Ok(features.into_iter().flatten().collect())
        })
    }

    /// Fit the secondary score-outcome estimator.
    ///
    /// Rows whose rule score needed a fallback band are skipped, since the
    /// substituted components would be trained on as if they were observed.
    pub fn fit_score_history(&self, dataset: &HistoryDataset) -> Result<FitOutcome> {
        let rule_engine = RuleScoreEngine::new(self.profile);
        self.fit_with(dataset, |sample| {
            let breakdown = rule_engine.score(&sample.record);
            reject_substituted(&breakdown)?;
            Ok(breakdown.derived_features().to_vec())
        })
    }

    fn fit_with<F>(&self, dataset: &HistoryDataset, mut featurize: F) -> Result<FitOutcome>
    where
        F: FnMut(&HistoricalSample) -> std::result::Result<Vec<f64>, String>,
    {
        let mut warnings = Vec::new();
        let mut rows = Vec::with_capacity(dataset.len());
        let mut targets = Vec::with_capacity(dataset.len());

        for sample in &dataset.samples {
            match featurize(sample) {
                Ok(features) => {
                    rows.push(features);
                    targets.push(sample.outcome);
                }
                Err(reason) => {
                    warn!("{} history row {} skipped: {}", dataset.label, sample.record.row, reason);
                    warnings.push(RunWarning::HistoryRowSkipped {
                        dataset: dataset.label.clone(),
                        row: sample.record.row,
                        reason,
                    });
                }
            }
        }

        let model = match rows.len() {
            0 | 1 => {
                warn!(
                    "{} history has {} usable row(s); using smoothed fallback",
                    dataset.label,
                    rows.len()
                );
                warnings.push(RunWarning::DegenerateSample {
                    dataset: dataset.label.clone(),
                    rows: rows.len(),
                });
                targets.first().map(|&outcome| OutcomeModel::SingleSample { outcome })
            }
            n => {
                let model = RidgeRegression::fit(&rows, &targets, self.settings.ridge_lambda)?;
                info!(
                    "Fitted {} model on {} rows (rmse {:.3}, lambda {})",
                    dataset.label,
                    n,
                    model.training_rmse(),
                    model.lambda()
                );
                Some(OutcomeModel::Regression(model))
            }
        };

        Ok(FitOutcome { model, warnings })
    }
}

fn reject_substituted(breakdown: &RuleScoreBreakdown) -> std::result::Result<(), String> {
    match breakdown.substitutions.first() {
        Some((feature, why, _)) => Err(format!("{} in '{}'", why, feature)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn kicker(ou: f64, rz: f64, rank: i64) -> KickerRecord {
        KickerRecord {
            over_under: Some(ou),
            spread: Some(-3.0),
            weather: Some(1),
            offense_rank: Some(rank),
            rz_efficiency: Some(rz),
            opp_rz_defense: Some(18.0),
            boost: None,
            ..KickerRecord::new(1, "K", "AAA", "BBB")
        }
    }

    fn history(rows: &[(f64, f64, i64, f64)]) -> HistoryDataset {
        let headers = ["O/U", "Spread", "OPP RZ D", "RZ EFF*", "OFF RNK", "Weather", "OutcomePoints"];
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|(ou, rz, rank, out)| {
                vec![
                    ou.to_string(),
                    "-3".to_string(),
                    "18".to_string(),
                    rz.to_string(),
                    rank.to_string(),
                    "1".to_string(),
                    out.to_string(),
                ]
            })
            .collect();
        let table = Table::new(headers.iter().map(|h| h.to_string()).collect(), cells);
        HistoryDataset::from_table(table, "outcome", DEFAULT_TARGET_COLUMN, false).unwrap().0
    }

    #[test]
    fn test_single_row_history_blends_with_closed_form() {
        let profile = ScoringProfile::classic();
        let engine = ProjectionEngine::new(&profile, ProjectionSettings::default());
        let fit = engine.fit_history(&history(&[(47.0, 22.0, 10, 12.0)])).unwrap();

        assert!(matches!(fit.warnings[0], RunWarning::DegenerateSample { rows: 1, .. }));
        let model = fit.model.unwrap();
        assert_eq!(model, OutcomeModel::SingleSample { outcome: 12.0 });

        let record = kicker(50.0, 25.0, 5);
        let breakdown = RuleScoreEngine::new(&profile).score(&record);
        let closed = engine.closed_form(&record, &breakdown).points;
        let predicted = model.predict(&engine.outcome_features(&record, &breakdown), closed);
        assert!((predicted - (0.3 * closed + 0.7 * 12.0)).abs() < 1e-12);
    }

    #[test]
    fn test_empty_history_has_no_model() {
        let profile = ScoringProfile::classic();
        let engine = ProjectionEngine::new(&profile, ProjectionSettings::default());
        let fit = engine.fit_history(&history(&[])).unwrap();
        assert!(fit.model.is_none());
        assert!(matches!(fit.warnings[0], RunWarning::DegenerateSample { rows: 0, .. }));
    }

    #[test]
    fn test_regression_learns_total_effect() {
        let profile = ScoringProfile::classic();
        let engine = ProjectionEngine::new(&profile, ProjectionSettings::default());
        let rows: Vec<(f64, f64, i64, f64)> = (0..12)
            .map(|i| {
                let ou = 38.0 + i as f64 * 1.5;
                (ou, 15.0 + (i % 4) as f64 * 3.0, 1 + (i * 2) % 32, ou * 0.25)
            })
            .collect();
        let fit = engine.fit_history(&history(&rows)).unwrap();
        assert!(fit.warnings.is_empty());
        let model = fit.model.unwrap();
        assert!(matches!(model, OutcomeModel::Regression(_)));

        let low = kicker(40.0, 20.0, 10);
        let high = kicker(52.0, 20.0, 10);
        let engine_rule = RuleScoreEngine::new(&profile);
        let (bl, bh) = (engine_rule.score(&low), engine_rule.score(&high));
        let p_low = model.predict(&engine.outcome_features(&low, &bl), 0.0);
        let p_high = model.predict(&engine.outcome_features(&high, &bh), 0.0);
        assert!(p_high > p_low);
    }

    #[test]
    fn test_outcome_features_drop_substituted_values() {
        let profile = ScoringProfile::classic();
        let engine = ProjectionEngine::new(&profile, ProjectionSettings { include_rule_score: false, ..Default::default() });
        let record = KickerRecord { offense_rank: Some(45), ..kicker(47.0, 20.0, 1) };
        let breakdown = RuleScoreEngine::new(&profile).score(&record);
        let features = engine.outcome_features(&record, &breakdown);
        assert_eq!(features.len(), OUTCOME_FEATURE_NAMES.len() - 1);
        assert_eq!(features[2], None);
        assert_eq!(features[0], Some(47.0));
    }

    #[test]
    fn test_history_rows_with_bad_features_are_skipped_before_fit() {
        let profile = ScoringProfile::classic();
        let engine = ProjectionEngine::new(&profile, ProjectionSettings::default());
        let fit = engine
            .fit_history(&history(&[(47.0, 22.0, 10, 12.0), (45.0, 18.0, 40, 9.0), (50.0, 25.0, 4, 14.0)]))
            .unwrap();
        assert!(matches!(fit.warnings[0], RunWarning::HistoryRowSkipped { row: 2, .. }));
        assert!(matches!(fit.model, Some(OutcomeModel::Regression(ref m)) if m.samples() == 2));
    }

    #[test]
    fn test_score_estimator_uses_rule_components() {
        let profile = ScoringProfile::classic();
        let engine = ProjectionEngine::new(&profile, ProjectionSettings::default());
        let fit = engine
            .fit_score_history(&history(&[(47.0, 22.0, 10, 20.0), (51.0, 25.0, 4, 24.0), (40.0, 8.0, 30, 11.0)]))
            .unwrap();
        let model = fit.model.unwrap();
        match &model {
            OutcomeModel::Regression(m) => assert_eq!(m.feature_count(), 8),
            other => panic!("expected regression, got {:?}", other),
        }
    }

    #[test]
    fn test_score_history_skips_rows_with_missing_features() {
        let profile = ScoringProfile::classic();
        let engine = ProjectionEngine::new(&profile, ProjectionSettings::default());
        let headers = ["O/U", "Spread", "OPP RZ D", "RZ EFF*", "OFF RNK", "Weather", "score_outcome"];
        let table = Table::from_strs(
            &headers,
            &[
                &["", "-3", "18", "22", "10", "1", "20"],
                &["51", "-3", "18", "25", "4", "1", "24"],
                &["40", "-3", "18", "8", "30", "1", "11"],
                &["47", "-3", "18", "14", "16", "1", "17"],
            ],
        );
        let (dataset, parse_warnings) =
            HistoryDataset::from_table(table, "score", DEFAULT_SCORE_TARGET_COLUMN, false).unwrap();
        assert!(parse_warnings.is_empty());
        assert_eq!(dataset.len(), 4);

        let fit = engine.fit_score_history(&dataset).unwrap();
        assert_eq!(fit.warnings.len(), 1);
        match &fit.warnings[0] {
            RunWarning::HistoryRowSkipped { dataset, row, reason } => {
                assert_eq!(dataset, "score");
                assert_eq!(*row, 1);
                assert!(reason.contains("O/U"), "reason: {}", reason);
            }
            other => panic!("expected skipped row, got {:?}", other),
        }
        assert!(matches!(fit.model, Some(OutcomeModel::Regression(ref m)) if m.samples() == 3));
    }
}
