//! # Tabular input and output
//!
//! A [`Table`] is a header row plus string cells, read from and written to CSV.
//! Column names are normalized on load so the engines can address columns by
//! their canonical names regardless of stray whitespace or known aliases.

use crate::error::{RankerError, Result};
use crate::models::KickerRecord;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

pub const COL_RANK: &str = "Rank";
pub const COL_ECR: &str = "ECR";
pub const COL_NAME: &str = "Name";
pub const COL_TEAM: &str = "TEAM";
pub const COL_OPPONENT: &str = "Opponent";
pub const COL_OVER_UNDER: &str = "O/U";
pub const COL_SPREAD: &str = "Spread";
pub const COL_OPP_RZ_D: &str = "OPP RZ D";
pub const COL_RZ_EFF: &str = "RZ EFF*";
pub const COL_OFF_RANK: &str = "OFF RNK";
pub const COL_CONSISTENCY: &str = "Consistency";
pub const COL_WEATHER: &str = "Weather";
pub const COL_BOOST: &str = "Boost";

pub const COL_BOOST_NUM: &str = "Boost_Num";
pub const COL_RULE_SCORE: &str = "RuleScore";
pub const COL_FORMULA_POINTS: &str = "Formula_Points";
pub const COL_PROJ_POINTS: &str = "ProjPoints";
pub const COL_ML_PRED: &str = "ML_Pred";
pub const COL_SCORE_PRED: &str = "Score_Pred";

/// Columns every weekly input table must carry
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_NAME,
    COL_TEAM,
    COL_OPPONENT,
    COL_OVER_UNDER,
    COL_SPREAD,
    COL_OPP_RZ_D,
    COL_RZ_EFF,
    COL_OFF_RANK,
    COL_WEATHER,
];

/// Numeric feature columns every historical table must carry
pub const HISTORY_FEATURE_COLUMNS: [&str; 6] = [
    COL_OVER_UNDER,
    COL_SPREAD,
    COL_OPP_RZ_D,
    COL_RZ_EFF,
    COL_OFF_RANK,
    COL_WEATHER,
];

const CANONICAL_COLUMNS: [&str; 19] = [
    COL_RANK,
    COL_ECR,
    COL_NAME,
    COL_TEAM,
    COL_OPPONENT,
    COL_OVER_UNDER,
    COL_SPREAD,
    COL_OPP_RZ_D,
    COL_RZ_EFF,
    COL_OFF_RANK,
    COL_CONSISTENCY,
    COL_WEATHER,
    COL_BOOST,
    COL_BOOST_NUM,
    COL_RULE_SCORE,
    COL_FORMULA_POINTS,
    COL_PROJ_POINTS,
    COL_ML_PRED,
    COL_SCORE_PRED,
];

const COLUMN_ALIASES: [(&str, &str); 11] = [
    ("rz eff", COL_RZ_EFF),
    ("rz efficiency", COL_RZ_EFF),
    ("ou", COL_OVER_UNDER),
    ("over/under", COL_OVER_UNDER),
    ("team", COL_TEAM),
    ("opp", COL_OPPONENT),
    ("off rank", COL_OFF_RANK),
    ("opp rz def", COL_OPP_RZ_D),
    ("opp rz d%", COL_OPP_RZ_D),
    ("projected_points", COL_PROJ_POINTS),
    ("rule_score", COL_RULE_SCORE),
];

/// Cell spellings treated as a missing value
const MISSING_TOKENS: [&str; 7] = ["", "nan", "na", "n/a", "null", "none", "-"];

/// Header row plus string cells
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from string slices, mostly for tests and fixtures
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// Read a CSV file with a header row
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading table from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    /// Write the table as CSV
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        self.to_writer(file)?;
        debug!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Trim headers, resolve aliases to canonical names and reject duplicates
    pub fn normalize_headers(&mut self) -> Result<()> {
        let normalized: Vec<String> = self.headers.iter().map(|h| normalize_column_name(h)).collect();
        for (i, name) in normalized.iter().enumerate() {
            if normalized[..i].contains(name) {
                return Err(RankerError::DuplicateColumn(name.clone()));
            }
        }
        self.headers = normalized;
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Fail naming every column in `names` that the table lacks
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RankerError::MissingColumns { missing })
        }
    }

    /// Cell text, empty when the column is absent
    pub fn cell(&self, row: usize, column: Option<usize>) -> &str {
        column
            .and_then(|c| self.rows.get(row).and_then(|r| r.get(c)))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Parse every row into a [`KickerRecord`]; requires normalized headers
    pub fn kicker_records(&self) -> Result<Vec<KickerRecord>> {
        self.require_columns(&REQUIRED_COLUMNS)?;
        let idx = |name: &str| self.column_index(name);
        let (name, team, opponent) = (idx(COL_NAME), idx(COL_TEAM), idx(COL_OPPONENT));
        let (ou, spread, weather) = (idx(COL_OVER_UNDER), idx(COL_SPREAD), idx(COL_WEATHER));
        let (off_rank, rz_eff, opp_rz_d) = (idx(COL_OFF_RANK), idx(COL_RZ_EFF), idx(COL_OPP_RZ_D));
        let boost = idx(COL_BOOST);

        let mut records = Vec::with_capacity(self.rows.len());
        for i in 0..self.rows.len() {
            let row = i + 1;
            let mut record = KickerRecord::new(
                row,
                self.cell(i, name).trim(),
                self.cell(i, team).trim(),
                self.cell(i, opponent).trim(),
            );
            record.over_under = parse_f64_cell(self.cell(i, ou), COL_OVER_UNDER, row)?;
            record.spread = parse_f64_cell(self.cell(i, spread), COL_SPREAD, row)?;
            record.weather = parse_i64_cell(self.cell(i, weather), COL_WEATHER, row)?;
            record.offense_rank = parse_i64_cell(self.cell(i, off_rank), COL_OFF_RANK, row)?;
            record.rz_efficiency = parse_f64_cell(self.cell(i, rz_eff), COL_RZ_EFF, row)?;
            record.opp_rz_defense = parse_f64_cell(self.cell(i, opp_rz_d), COL_OPP_RZ_D, row)?;
            record.boost = parse_text_cell(self.cell(i, boost));
            records.push(record);
        }
        Ok(records)
    }
}

/// Canonical form of a raw header
pub fn normalize_column_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = collapsed.to_lowercase();
    if let Some(canonical) = CANONICAL_COLUMNS.iter().find(|c| c.to_lowercase() == lower) {
        return canonical.to_string();
    }
    if let Some((_, canonical)) = COLUMN_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return canonical.to_string();
    }
    collapsed
}

pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim().to_ascii_lowercase();
    MISSING_TOKENS.contains(&trimmed.as_str())
}

/// Parse a numeric cell; missing tokens are `None`, unparsable text is a schema error
pub fn parse_f64_cell(raw: &str, column: &str, row: usize) -> Result<Option<f64>> {
    if is_missing(raw) {
        return Ok(None);
    }
    let text = raw.trim().trim_end_matches('%').trim();
    text.parse::<f64>()
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .map_err(|_| RankerError::MalformedValue {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        })
}

/// Parse an integer cell, accepting whole floats such as `3.0`
pub fn parse_i64_cell(raw: &str, column: &str, row: usize) -> Result<Option<i64>> {
    let malformed = || RankerError::MalformedValue {
        column: column.to_string(),
        row,
        value: raw.to_string(),
    };
    match parse_f64_cell(raw, column, row)? {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(Some(v as i64)),
        Some(_) => Err(malformed()),
    }
}

pub fn parse_text_cell(raw: &str) -> Option<String> {
    if is_missing(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}
