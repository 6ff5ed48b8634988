//! Historical outcome tables
//!
//! A history table carries the same feature columns as a weekly input plus a
//! realized-outcome column whose name depends on the data source.

use crate::error::{RankerError, Result};
use crate::models::{KickerRecord, RunWarning};
use crate::table::{
    normalize_column_name, parse_f64_cell, parse_i64_cell, parse_text_cell, Table, COL_BOOST,
    COL_NAME, COL_OFF_RANK, COL_OPP_RZ_D, COL_OPPONENT, COL_OVER_UNDER, COL_RZ_EFF, COL_SPREAD,
    COL_TEAM, COL_WEATHER, HISTORY_FEATURE_COLUMNS,
};
use tracing::warn;

/// Default realized-points column
pub const DEFAULT_TARGET_COLUMN: &str = "OutcomePoints";

/// Default column of the secondary score-outcome dataset
pub const DEFAULT_SCORE_TARGET_COLUMN: &str = "score_outcome";

/// One historical kicker-week with its realized outcome
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSample {
    pub record: KickerRecord,
    pub outcome: f64,
}

/// Parsed historical dataset
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryDataset {
    /// Label used in warnings ("outcome", "score")
    pub label: String,
    pub target_column: String,
    pub samples: Vec<HistoricalSample>,
    pub has_boost: bool,
}

impl HistoryDataset {
    /// Parse a history table against the current run's schema.
    ///
    /// Missing feature or target columns, or a `Boost` column present in the
    /// current input but absent here, are model-compatibility errors. Rows with
    /// a missing target or an unparsable cell are skipped with a warning.
    pub fn from_table(
        mut table: Table,
        label: &str,
        target_column: &str,
        input_has_boost: bool,
    ) -> Result<(Self, Vec<RunWarning>)> {
        table.normalize_headers().map_err(|e| {
            RankerError::model_compatibility(format!("{} history: {}", label, e))
        })?;
        let target_column = normalize_column_name(target_column);

        let mut missing: Vec<&str> = HISTORY_FEATURE_COLUMNS
            .iter()
            .copied()
            .filter(|c| !table.has_column(c))
            .collect();
        if !table.has_column(&target_column) {
            missing.push(&target_column);
        }
        if input_has_boost && !table.has_column(COL_BOOST) {
            missing.push(COL_BOOST);
        }
        if !missing.is_empty() {
            return Err(RankerError::model_compatibility(format!(
                "{} history lacks column(s): {}",
                label,
                missing.join(", ")
            )));
        }

        let idx = |name: &str| table.column_index(name);
        let target = idx(&target_column);
        let mut samples = Vec::with_capacity(table.rows.len());
        let mut warnings = Vec::new();

        for i in 0..table.rows.len() {
            let row = i + 1;
            let parsed = (|| -> Result<Option<HistoricalSample>> {
                let Some(outcome) = parse_f64_cell(table.cell(i, target), &target_column, row)? else {
                    return Ok(None);
                };
                let mut record = KickerRecord::new(
                    row,
                    table.cell(i, idx(COL_NAME)).trim(),
                    table.cell(i, idx(COL_TEAM)).trim(),
                    table.cell(i, idx(COL_OPPONENT)).trim(),
                );
                record.over_under = parse_f64_cell(table.cell(i, idx(COL_OVER_UNDER)), COL_OVER_UNDER, row)?;
                record.spread = parse_f64_cell(table.cell(i, idx(COL_SPREAD)), COL_SPREAD, row)?;
                record.weather = parse_i64_cell(table.cell(i, idx(COL_WEATHER)), COL_WEATHER, row)?;
                record.offense_rank = parse_i64_cell(table.cell(i, idx(COL_OFF_RANK)), COL_OFF_RANK, row)?;
                record.rz_efficiency = parse_f64_cell(table.cell(i, idx(COL_RZ_EFF)), COL_RZ_EFF, row)?;
                record.opp_rz_defense = parse_f64_cell(table.cell(i, idx(COL_OPP_RZ_D)), COL_OPP_RZ_D, row)?;
                record.boost = parse_text_cell(table.cell(i, idx(COL_BOOST)));
                Ok(Some(HistoricalSample { record, outcome }))
            })();

            let reason = match parsed {
                Ok(Some(sample)) if sample.outcome.is_finite() => {
                    samples.push(sample);
                    continue;
                }
                Ok(_) => format!("missing {}", target_column),
                Err(e) => e.to_string(),
            };
            warn!("{} history row {} skipped: {}", label, row, reason);
            warnings.push(RunWarning::HistoryRowSkipped {
                dataset: label.to_string(),
                row,
                reason,
            });
        }

        let dataset = Self {
            label: label.to_string(),
            target_column,
            samples,
            has_boost: table.has_column(COL_BOOST),
        };
        Ok((dataset, warnings))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
