//! Scoring profiles
//!
//! A [`ScoringProfile`] bundles every threshold, weight and constant the
//! engines read. Engines borrow a profile per call and hold no scoring state of
//! their own, so swapping profiles never touches engine code.

use crate::error::{RankerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Names of the built-in presets, in the order they were introduced
pub const PRESET_NAMES: [&str; 3] = ["classic", "tiebreak", "weighted"];

/// Complete scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    /// Profile name, reported in run summaries
    pub name: String,

    /// Over/under total bands (higher total scores higher)
    pub over_under: BandTable,

    /// Point spread ranges (negative = favorite)
    pub spread: RangeTable,

    /// Weather code scores
    pub weather: WeatherTable,

    /// Offense rank bands (lower rank scores higher)
    pub offense_rank: RankTable,

    /// Red-zone efficiency bands
    pub rz_efficiency: BandTable,

    /// Opponent red-zone defense allowance bands
    pub rz_defense: BandTable,

    /// Priority-ordered boost tiers
    pub boost: BoostTable,

    /// Per-feature weight multipliers
    pub weights: FeatureWeights,

    /// Continuous tie-break constants
    pub tie_break: TieBreak,

    /// Closed-form attempt model constants
    pub attempts: AttemptModel,
}

/// A lower-bound band: values `>= min` score `score`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub score: f64,
}

/// Bands ordered by strictly decreasing lower bound; first match wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTable {
    /// Score for values below every band
    pub fallback: f64,
    pub bands: Vec<Band>,
}

impl BandTable {
    pub fn new(bands: &[(f64, f64)], fallback: f64) -> Self {
        Self {
            fallback,
            bands: bands.iter().map(|&(min, score)| Band { min, score }).collect(),
        }
    }

    /// Score for a value
    pub fn lookup(&self, value: f64) -> f64 {
        self.bands
            .iter()
            .find(|band| value >= band.min)
            .map(|band| band.score)
            .unwrap_or(self.fallback)
    }

    fn validate(&self, label: &str) -> Result<()> {
        if self.bands.is_empty() {
            return Err(RankerError::profile(format!("{}: at least one band is required", label)));
        }
        for pair in self.bands.windows(2) {
            if pair[1].min >= pair[0].min {
                return Err(RankerError::profile(format!(
                    "{}: band lower bounds must be strictly decreasing ({} then {})",
                    label, pair[0].min, pair[1].min
                )));
            }
            if pair[1].score > pair[0].score {
                return Err(RankerError::profile(format!(
                    "{}: a lower band may not outscore a higher one",
                    label
                )));
            }
        }
        if let Some(last) = self.bands.last() {
            if self.fallback > last.score {
                return Err(RankerError::profile(format!(
                    "{}: fallback {} exceeds lowest band score {}",
                    label, self.fallback, last.score
                )));
            }
        }
        check_finite(label, self.bands.iter().flat_map(|b| [b.min, b.score]).chain([self.fallback]))
    }
}

/// An upper-bound band for ranks: ranks `<= max` score `score`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankBand {
    pub max: i64,
    pub score: f64,
}

/// Rank bands ordered by strictly increasing upper bound; first match wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankTable {
    pub fallback: f64,
    pub bands: Vec<RankBand>,
}

impl RankTable {
    pub fn new(bands: &[(i64, f64)], fallback: f64) -> Self {
        Self {
            fallback,
            bands: bands.iter().map(|&(max, score)| RankBand { max, score }).collect(),
        }
    }

    pub fn lookup(&self, rank: i64) -> f64 {
        self.bands
            .iter()
            .find(|band| rank <= band.max)
            .map(|band| band.score)
            .unwrap_or(self.fallback)
    }

    fn validate(&self, label: &str) -> Result<()> {
        if self.bands.is_empty() {
            return Err(RankerError::profile(format!("{}: at least one band is required", label)));
        }
        for pair in self.bands.windows(2) {
            if pair[1].max <= pair[0].max {
                return Err(RankerError::profile(format!(
                    "{}: rank bounds must be strictly increasing ({} then {})",
                    label, pair[0].max, pair[1].max
                )));
            }
            if pair[1].score > pair[0].score {
                return Err(RankerError::profile(format!(
                    "{}: a worse rank band may not outscore a better one",
                    label
                )));
            }
        }
        if let Some(last) = self.bands.last() {
            if self.fallback > last.score {
                return Err(RankerError::profile(format!(
                    "{}: fallback {} exceeds worst band score {}",
                    label, self.fallback, last.score
                )));
            }
        }
        check_finite(label, self.bands.iter().map(|b| b.score).chain([self.fallback]))
    }
}

/// A closed interval `[lo, hi]` scoring `score`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBand {
    pub lo: f64,
    pub hi: f64,
    pub score: f64,
}

/// Non-overlapping closed ranges; values in no range take the fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeTable {
    pub fallback: f64,
    pub ranges: Vec<RangeBand>,
}

impl RangeTable {
    pub fn new(ranges: &[(f64, f64, f64)], fallback: f64) -> Self {
        Self {
            fallback,
            ranges: ranges.iter().map(|&(lo, hi, score)| RangeBand { lo, hi, score }).collect(),
        }
    }

    pub fn lookup(&self, value: f64) -> f64 {
        self.ranges
            .iter()
            .find(|r| value >= r.lo && value <= r.hi)
            .map(|r| r.score)
            .unwrap_or(self.fallback)
    }

    fn validate(&self, label: &str) -> Result<()> {
        for r in &self.ranges {
            if r.lo > r.hi {
                return Err(RankerError::profile(format!(
                    "{}: range [{}, {}] is inverted",
                    label, r.lo, r.hi
                )));
            }
        }
        let mut sorted = self.ranges.clone();
        sorted.sort_by(|a, b| a.lo.total_cmp(&b.lo));
        for pair in sorted.windows(2) {
            if pair[1].lo <= pair[0].hi {
                return Err(RankerError::profile(format!(
                    "{}: ranges [{}, {}] and [{}, {}] overlap",
                    label, pair[0].lo, pair[0].hi, pair[1].lo, pair[1].hi
                )));
            }
        }
        check_finite(
            label,
            self.ranges.iter().flat_map(|r| [r.lo, r.hi, r.score]).chain([self.fallback]),
        )
    }
}

/// Score for one weather code
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherScore {
    pub code: i64,
    pub score: f64,
}

/// Explicit weather code mapping with a neutral default for unknown codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTable {
    /// Score for unrecognized or missing codes (the neutral bucket)
    pub default: f64,
    pub codes: Vec<WeatherScore>,
}

impl WeatherTable {
    pub fn new(codes: &[(i64, f64)], default: f64) -> Self {
        Self {
            default,
            codes: codes.iter().map(|&(code, score)| WeatherScore { code, score }).collect(),
        }
    }

    /// Score for a known code, `None` when the code is not mapped
    pub fn get(&self, code: i64) -> Option<f64> {
        self.codes.iter().find(|w| w.code == code).map(|w| w.score)
    }

    fn validate(&self, label: &str) -> Result<()> {
        let mut sorted = self.codes.clone();
        sorted.sort_by_key(|w| w.code);
        for pair in sorted.windows(2) {
            if pair[0].code == pair[1].code {
                return Err(RankerError::profile(format!(
                    "{}: code {} mapped twice",
                    label, pair[0].code
                )));
            }
            if pair[1].score > pair[0].score {
                return Err(RankerError::profile(format!(
                    "{}: worse weather code {} may not outscore code {}",
                    label, pair[1].code, pair[0].code
                )));
            }
        }
        check_finite(label, self.codes.iter().map(|w| w.score).chain([self.default]))
    }
}

/// One boost tier: any keyword hit selects the tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostTier {
    pub name: String,
    /// Value contributed in tier (ranking) mode
    pub tier_value: f64,
    /// Value contributed per matching keyword in summed (projection) mode
    pub numeric_value: f64,
    /// Lowercase substrings that trigger the tier
    pub keywords: Vec<String>,
}

/// Boost tiers in priority order, highest priority first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostTable {
    pub tiers: Vec<BoostTier>,
}

impl BoostTable {
    fn validate(&self) -> Result<()> {
        for tier in &self.tiers {
            if tier.tier_value < 0.0 || tier.numeric_value < 0.0 {
                return Err(RankerError::profile(format!(
                    "boost tier '{}' has a negative value",
                    tier.name
                )));
            }
            if tier.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(RankerError::profile(format!(
                    "boost tier '{}' has an empty keyword",
                    tier.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for BoostTable {
    fn default() -> Self {
        let tier = |name: &str, value: f64, keywords: &[&str]| BoostTier {
            name: name.to_string(),
            tier_value: value,
            numeric_value: value,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        Self {
            tiers: vec![
                tier("altitude", 3.0, &["denver", "altitude"]),
                tier("rivalry", 2.0, &["division", "slugfest"]),
                tier("manual", 2.0, &["yes"]),
            ],
        }
    }
}

/// Weight multipliers applied to each bucket score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub game_total: f64,
    pub spread: f64,
    pub weather: f64,
    pub offense_rank: f64,
    pub rz_efficiency: f64,
    pub rz_defense: f64,
    pub boost: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            game_total: 1.0,
            spread: 1.0,
            weather: 1.0,
            offense_rank: 1.0,
            rz_efficiency: 1.0,
            rz_defense: 1.0,
            boost: 1.0,
        }
    }
}

/// `clamp((over_under - baseline) / span, -1, 1) * weight`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TieBreak {
    pub baseline: f64,
    pub span: f64,
    pub weight: f64,
}

impl TieBreak {
    /// Disabled tie-break: integer bucket sums only
    pub fn off() -> Self {
        Self { baseline: 45.0, span: 10.0, weight: 0.0 }
    }
}

/// Constants of the closed-form attempt model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptModel {
    /// Share of the spread moved into the implied team total
    pub spread_share: f64,
    /// Extra-point attempts per implied team point
    pub xp_per_implied_point: f64,
    /// Extra-point attempts per RuleScore point
    pub xp_per_rule_point: f64,
    /// Baseline field-goal attempts
    pub fg_base: f64,
    /// Field-goal attempts per implied team point
    pub fg_per_implied_point: f64,
    /// Field-goal attempts per RuleScore point
    pub fg_per_rule_point: f64,
    /// Field-goal attempts per red-zone efficiency percentage point
    pub fg_per_rz_eff_point: f64,
    /// Share of field-goal attempts from short range
    pub short_share: f64,
    pub mid_share: f64,
    pub long_share: f64,
    /// Extra long attempts per unit of summed boost
    pub long_per_boost_unit: f64,
    /// Lower clamp for every attempt estimate
    pub floor: f64,
    /// Over/under substituted when the total is missing
    pub neutral_total: f64,
    /// Red-zone efficiency substituted when missing
    pub neutral_rz_eff: f64,
    pub xp_points: f64,
    pub short_points: f64,
    pub mid_points: f64,
    pub long_points: f64,
}

impl Default for AttemptModel {
    fn default() -> Self {
        Self {
            spread_share: 0.5,
            xp_per_implied_point: 0.1,
            xp_per_rule_point: 0.02,
            fg_base: 0.5,
            fg_per_implied_point: 0.04,
            fg_per_rule_point: 0.03,
            fg_per_rz_eff_point: 0.01,
            short_share: 0.45,
            mid_share: 0.35,
            long_share: 0.20,
            long_per_boost_unit: 0.05,
            floor: 0.0,
            neutral_total: 44.0,
            neutral_rz_eff: 15.0,
            xp_points: 1.0,
            short_points: 3.0,
            mid_points: 4.0,
            long_points: 5.0,
        }
    }
}

impl AttemptModel {
    fn validate(&self) -> Result<()> {
        let named = [
            ("spread_share", self.spread_share),
            ("xp_per_implied_point", self.xp_per_implied_point),
            ("xp_per_rule_point", self.xp_per_rule_point),
            ("fg_base", self.fg_base),
            ("fg_per_implied_point", self.fg_per_implied_point),
            ("fg_per_rule_point", self.fg_per_rule_point),
            ("fg_per_rz_eff_point", self.fg_per_rz_eff_point),
            ("short_share", self.short_share),
            ("mid_share", self.mid_share),
            ("long_share", self.long_share),
            ("long_per_boost_unit", self.long_per_boost_unit),
            ("floor", self.floor),
            ("xp_points", self.xp_points),
            ("short_points", self.short_points),
            ("mid_points", self.mid_points),
            ("long_points", self.long_points),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(RankerError::profile(format!(
                    "attempt model '{}' must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        let shares = self.short_share + self.mid_share + self.long_share;
        if (shares - 1.0).abs() > 1e-6 {
            return Err(RankerError::profile(format!(
                "attempt model distance shares must sum to 1.0, got {}",
                shares
            )));
        }
        Ok(())
    }
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self::tiebreak()
    }
}

impl ScoringProfile {
    /// The first observed rule table: unit weights and no tie-break
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            over_under: BandTable::new(&[(50.0, 5.0), (47.5, 4.0), (45.0, 3.0)], 1.0),
            spread: RangeTable::new(&[(-10.0, -3.0, 4.0), (-2.5, 0.0, 2.0)], 1.0),
            weather: WeatherTable::new(&[(0, 3.0), (1, 2.0), (2, 1.0), (3, 0.0)], 1.0),
            offense_rank: RankTable::new(&[(15, 3.0), (20, 2.0)], 1.0),
            rz_efficiency: BandTable::new(&[(20.0, 3.0), (10.0, 2.0)], 1.0),
            rz_defense: BandTable::new(&[(20.0, 3.0), (10.0, 2.0)], 1.0),
            boost: BoostTable::default(),
            weights: FeatureWeights::default(),
            tie_break: TieBreak::off(),
            attempts: AttemptModel::default(),
        }
    }

    /// Classic tables with the continuous over/under tie-break switched on.
    /// This is the default profile.
    pub fn tiebreak() -> Self {
        Self {
            name: "tiebreak".to_string(),
            tie_break: TieBreak { baseline: 45.0, span: 10.0, weight: 0.45 },
            ..Self::classic()
        }
    }

    /// Finer bands with emphasis on game total and offense
    pub fn weighted() -> Self {
        Self {
            name: "weighted".to_string(),
            over_under: BandTable::new(
                &[(51.0, 5.0), (48.5, 4.0), (46.0, 3.0), (43.5, 2.0)],
                1.0,
            ),
            spread: RangeTable::new(
                &[(-10.0, -7.5, 3.0), (-7.0, -3.0, 4.0), (-2.5, 0.0, 2.0)],
                1.0,
            ),
            weather: WeatherTable::new(&[(0, 3.0), (1, 2.5), (2, 1.5), (3, 0.0)], 1.5),
            offense_rank: RankTable::new(&[(8, 4.0), (15, 3.0), (22, 2.0)], 1.0),
            rz_efficiency: BandTable::new(&[(25.0, 3.0), (15.0, 2.0), (10.0, 1.5)], 1.0),
            rz_defense: BandTable::new(&[(25.0, 3.0), (15.0, 2.0)], 1.0),
            boost: BoostTable::default(),
            weights: FeatureWeights {
                game_total: 1.5,
                offense_rank: 1.25,
                ..FeatureWeights::default()
            },
            tie_break: TieBreak { baseline: 44.0, span: 12.0, weight: 0.1 },
            attempts: AttemptModel::default(),
        }
    }

    /// Look up a built-in preset by name (case-insensitive)
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Self::classic()),
            "tiebreak" => Some(Self::tiebreak()),
            "weighted" => Some(Self::weighted()),
            _ => None,
        }
    }

    /// Resolve a preset name, or failing that a TOML profile path
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        if let Some(profile) = Self::preset(name_or_path) {
            return Ok(profile);
        }
        let path = Path::new(name_or_path);
        if path.exists() {
            return Self::from_file(path);
        }
        Err(RankerError::profile(format!(
            "'{}' is neither a preset ({}) nor a profile file",
            name_or_path,
            PRESET_NAMES.join(", ")
        )))
    }

    /// Load and validate a profile from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let profile: ScoringProfile = toml::from_str(&content).map_err(|e| {
            RankerError::profile(format!("failed to parse {}: {}", path.display(), e))
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Save the profile to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RankerError::profile(format!("failed to serialize profile: {}", e)))
    }

    /// Check table ordering, tie-break bounds and attempt-model constants
    pub fn validate(&self) -> Result<()> {
        self.over_under.validate("over_under")?;
        self.spread.validate("spread")?;
        self.weather.validate("weather")?;
        self.offense_rank.validate("offense_rank")?;
        self.rz_efficiency.validate("rz_efficiency")?;
        self.rz_defense.validate("rz_defense")?;
        self.boost.validate()?;

        let w = &self.weights;
        let weights = [
            w.game_total,
            w.spread,
            w.weather,
            w.offense_rank,
            w.rz_efficiency,
            w.rz_defense,
            w.boost,
        ];
        if weights.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(RankerError::profile("feature weights must be non-negative"));
        }

        if self.tie_break.span.is_nan() || self.tie_break.span <= 0.0 {
            return Err(RankerError::profile(format!(
                "tie_break.span must be positive, got {}",
                self.tie_break.span
            )));
        }
        if !self.tie_break.weight.is_finite() {
            return Err(RankerError::profile(format!(
                "tie_break.weight must be finite, got {}",
                self.tie_break.weight
            )));
        }
        // The tie-break spans [-|w|, |w|] and must stay inside the closest pair of bucket totals
        if let Some(gap) = self.min_bucket_gap() {
            if 2.0 * self.tie_break.weight.abs() >= gap {
                return Err(RankerError::profile(format!(
                    "tie_break.weight {} could reorder bucket totals {} apart; |weight| must be below {}",
                    self.tie_break.weight,
                    gap,
                    gap / 2.0
                )));
            }
        }

        self.attempts.validate()
    }

    /// Smallest positive difference between two reachable bucket totals.
    ///
    /// Every feature contributes one of its weighted band scores or its
    /// fallback, and the boost one of its tier values or zero. `None` when
    /// only one total is reachable.
    pub fn min_bucket_gap(&self) -> Option<f64> {
        let w = &self.weights;
        let components: [(f64, Vec<f64>); 7] = [
            (w.game_total, band_scores(&self.over_under)),
            (
                w.spread,
                self.spread.ranges.iter().map(|r| r.score).chain([self.spread.fallback]).collect(),
            ),
            (
                w.weather,
                self.weather.codes.iter().map(|c| c.score).chain([self.weather.default]).collect(),
            ),
            (
                w.offense_rank,
                self.offense_rank
                    .bands
                    .iter()
                    .map(|b| b.score)
                    .chain([self.offense_rank.fallback])
                    .collect(),
            ),
            (w.rz_efficiency, band_scores(&self.rz_efficiency)),
            (w.rz_defense, band_scores(&self.rz_defense)),
            (w.boost, self.boost.tiers.iter().map(|t| t.tier_value).chain([0.0]).collect()),
        ];

        let mut totals = vec![0.0];
        for (weight, scores) in components {
            let mut next: Vec<f64> = totals
                .iter()
                .flat_map(|t| scores.iter().map(move |s| t + s * weight))
                .collect();
            next.sort_by(f64::total_cmp);
            next.dedup_by(|a, b| (*a - *b).abs() < GAP_EPSILON);
            totals = next;
        }

        totals
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .min_by(f64::total_cmp)
    }
}

/// Totals closer than this are treated as equal
const GAP_EPSILON: f64 = 1e-9;

fn band_scores(table: &BandTable) -> Vec<f64> {
    table.bands.iter().map(|b| b.score).chain([table.fallback]).collect()
}

fn check_finite(label: &str, values: impl IntoIterator<Item = f64>) -> Result<()> {
    if values.into_iter().all(f64::is_finite) {
        Ok(())
    } else {
        Err(RankerError::profile(format!("{}: values must be finite", label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_presets_validate() {
        for name in PRESET_NAMES {
            let profile = ScoringProfile::preset(name).unwrap();
            assert_eq!(profile.name, name);
            profile.validate().unwrap();
        }
    }

    #[test]
    fn test_preset_lookup_is_case_insensitive() {
        assert!(ScoringProfile::preset(" Weighted ").is_some());
        assert!(ScoringProfile::preset("nope").is_none());
    }

    #[test]
    fn test_band_lookup() {
        let table = BandTable::new(&[(50.0, 5.0), (47.5, 4.0), (45.0, 3.0)], 1.0);
        assert_eq!(table.lookup(50.0), 5.0);
        assert_eq!(table.lookup(49.9), 4.0);
        assert_eq!(table.lookup(45.0), 3.0);
        assert_eq!(table.lookup(44.5), 1.0);
    }

    #[test]
    fn test_rank_and_range_lookup() {
        let ranks = RankTable::new(&[(15, 3.0), (20, 2.0)], 1.0);
        assert_eq!(ranks.lookup(1), 3.0);
        assert_eq!(ranks.lookup(16), 2.0);
        assert_eq!(ranks.lookup(32), 1.0);

        let spread = RangeTable::new(&[(-10.0, -3.0, 4.0), (-2.5, 0.0, 2.0)], 1.0);
        assert_eq!(spread.lookup(-7.0), 4.0);
        assert_eq!(spread.lookup(-1.0), 2.0);
        assert_eq!(spread.lookup(-13.5), 1.0);
        assert_eq!(spread.lookup(3.5), 1.0);
    }

    #[test]
    fn test_validate_rejects_unordered_bands() {
        let mut profile = ScoringProfile::classic();
        profile.over_under = BandTable::new(&[(45.0, 3.0), (50.0, 5.0)], 1.0);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overlapping_ranges() {
        let mut profile = ScoringProfile::classic();
        profile.spread = RangeTable::new(&[(-10.0, -3.0, 4.0), (-4.0, 0.0, 2.0)], 1.0);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_tie_break() {
        let mut profile = ScoringProfile::classic();
        profile.tie_break.weight = 0.75;
        assert!(profile.validate().is_err());
        profile.tie_break.weight = 0.5;
        assert!(profile.validate().is_err());
        profile.tie_break.weight = -0.45;
        profile.validate().unwrap();
        profile.tie_break.span = 0.0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_min_bucket_gap_follows_weights() {
        assert_eq!(ScoringProfile::classic().min_bucket_gap(), Some(1.0));
        assert_eq!(ScoringProfile::tiebreak().min_bucket_gap(), Some(1.0));
        assert_eq!(ScoringProfile::weighted().min_bucket_gap(), Some(0.25));

        let mut flat = ScoringProfile::classic();
        flat.weights = FeatureWeights {
            game_total: 0.0,
            spread: 0.0,
            weather: 0.0,
            offense_rank: 0.0,
            rz_efficiency: 0.0,
            rz_defense: 0.0,
            boost: 0.0,
        };
        assert_eq!(flat.min_bucket_gap(), None);
        flat.tie_break.weight = 3.0;
        flat.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_tie_break_wider_than_half_band_gaps() {
        let mut profile = ScoringProfile::weighted();
        profile.tie_break.weight = 0.4;
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("0.25"), "{}", err);
        profile.tie_break.weight = 0.125;
        assert!(profile.validate().is_err());
        profile.tie_break.weight = 0.12;
        profile.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_rank_band_outscoring_better_rank() {
        let mut profile = ScoringProfile::classic();
        profile.offense_rank = RankTable::new(&[(15, 2.0), (20, 3.0)], 1.0);
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("offense_rank"));

        profile.offense_rank = RankTable::new(&[(15, 3.0), (20, 2.0)], 2.5);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_default_profile_is_tiebreak() {
        let profile = ScoringProfile::default();
        assert_eq!(profile.name, "tiebreak");
        assert!(profile.tie_break.weight > 0.0);
    }

    #[test]
    fn test_validate_rejects_negative_attempt_constants() {
        let mut profile = ScoringProfile::classic();
        profile.attempts.fg_per_rule_point = -0.1;
        assert!(profile.validate().is_err());

        let mut profile = ScoringProfile::classic();
        profile.attempts.long_share = 0.5;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_profile_toml_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weighted.toml");
        let profile = ScoringProfile::weighted();
        profile.to_file(&path).unwrap();

        let loaded = ScoringProfile::from_file(&path).unwrap();
        assert_eq!(loaded, profile);

        let resolved = ScoringProfile::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(resolved.name, "weighted");
    }

    #[test]
    fn test_resolve_unknown_profile_fails() {
        let err = ScoringProfile::resolve("no-such-profile").unwrap_err();
        assert!(err.to_string().contains("classic"));
    }
}
