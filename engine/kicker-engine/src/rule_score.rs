//! Rule score engine
//!
//! RuleScore = Σ weight × bucket score + boost weight × boost tier + tie-break.
//! The tie-break turns coarse bucket sums into a dense, orderable score.

use crate::boost::BoostResolver;
use crate::models::{Feature, KickerRecord, Substitution};
use crate::profile::ScoringProfile;
use crate::scorers::score_feature;
use tracing::debug;

/// Weighted components of one record's RuleScore
#[derive(Debug, Clone, PartialEq)]
pub struct RuleScoreBreakdown {
    pub game_total: f64,
    pub spread: f64,
    pub weather: f64,
    pub offense_rank: f64,
    pub rz_efficiency: f64,
    pub rz_defense: f64,
    /// Weighted tier-mode boost
    pub boost: f64,
    /// Sum of the weighted buckets and boost, before the tie-break
    pub buckets: f64,
    pub tie_break: f64,
    pub total: f64,
    /// Features scored with a default, with the score applied
    pub substitutions: Vec<(Feature, Substitution, f64)>,
}

/// Number of values in [`RuleScoreBreakdown::derived_features`]
pub const DERIVED_FEATURE_COUNT: usize = 8;

impl RuleScoreBreakdown {
    /// Score before the continuous tie-break
    pub fn bucket_total(&self) -> f64 {
        self.buckets
    }

    /// Weighted sub-scores, boost bonus and tie-break, in a fixed order
    pub fn derived_features(&self) -> [f64; DERIVED_FEATURE_COUNT] {
        [
            self.game_total,
            self.spread,
            self.weather,
            self.offense_rank,
            self.rz_efficiency,
            self.rz_defense,
            self.boost,
            self.tie_break,
        ]
    }
}

/// Stateless scorer borrowing the active profile
#[derive(Debug, Clone, Copy)]
pub struct RuleScoreEngine<'a> {
    profile: &'a ScoringProfile,
}

impl<'a> RuleScoreEngine<'a> {
    pub fn new(profile: &'a ScoringProfile) -> Self {
        Self { profile }
    }

    pub fn score(&self, record: &KickerRecord) -> RuleScoreBreakdown {
        let weights = &self.profile.weights;
        let mut substitutions = Vec::new();

        let mut weighted = |feature: Feature, weight: f64| {
            let score = score_feature(self.profile, feature, record);
            if let Some(why) = score.substituted {
                substitutions.push((feature, why, score.points));
            }
            score.points * weight
        };

        let game_total = weighted(Feature::GameTotal, weights.game_total);
        let spread = weighted(Feature::Spread, weights.spread);
        let weather = weighted(Feature::Weather, weights.weather);
        let offense_rank = weighted(Feature::OffenseRank, weights.offense_rank);
        let rz_efficiency = weighted(Feature::RedZoneEfficiency, weights.rz_efficiency);
        let rz_defense = weighted(Feature::RedZoneDefense, weights.rz_defense);

        let boost = BoostResolver::new(&self.profile.boost).tier_value(record.boost.as_deref())
            * weights.boost;
        let tie_break = tie_break_term(self.profile, record.over_under);

        let buckets = game_total + spread + weather + offense_rank + rz_efficiency + rz_defense + boost;
        let total = buckets + tie_break;

        debug!(
            kicker = %record.label(),
            game_total, spread, weather, offense_rank, rz_efficiency, rz_defense, boost, tie_break, total,
            "rule score"
        );

        RuleScoreBreakdown {
            game_total,
            spread,
            weather,
            offense_rank,
            rz_efficiency,
            rz_defense,
            boost,
            buckets,
            tie_break,
            total,
            substitutions,
        }
    }
}

/// `clamp((over_under - baseline) / span, -1, 1) * weight`; 0 when the total is missing
pub fn tie_break_term(profile: &ScoringProfile, over_under: Option<f64>) -> f64 {
    let tb = &profile.tie_break;
    match over_under.filter(|v| v.is_finite()) {
        Some(ou) if tb.weight != 0.0 => ((ou - tb.baseline) / tb.span).clamp(-1.0, 1.0) * tb.weight,
        _ => 0.0,
    }
}
