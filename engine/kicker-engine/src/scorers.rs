//! Feature scorers
//!
//! Each scorer maps one raw feature to its bucket score under a profile.
//! Missing or out-of-domain input never fails: it takes the feature's
//! fallback band (the neutral default for weather) and reports the
//! substitution so the caller can surface a data-quality warning.

use crate::models::{Feature, KickerRecord, Substitution};
use crate::profile::ScoringProfile;

/// Highest valid offense rank
pub const MAX_OFFENSE_RANK: i64 = 32;

/// Bucket score for one feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScore {
    pub points: f64,
    /// Set when a default was applied instead of a band lookup
    pub substituted: Option<Substitution>,
}

impl FeatureScore {
    fn scored(points: f64) -> Self {
        Self { points, substituted: None }
    }

    fn defaulted(points: f64, why: Substitution) -> Self {
        Self { points, substituted: Some(why) }
    }
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

pub fn score_game_total(profile: &ScoringProfile, over_under: Option<f64>) -> FeatureScore {
    let table = &profile.over_under;
    match present(over_under) {
        None => FeatureScore::defaulted(table.fallback, Substitution::Missing),
        Some(v) if v < 0.0 || v.is_infinite() => {
            FeatureScore::defaulted(table.fallback, Substitution::OutOfRange(v))
        }
        Some(v) => FeatureScore::scored(table.lookup(v)),
    }
}

pub fn score_spread(profile: &ScoringProfile, spread: Option<f64>) -> FeatureScore {
    let table = &profile.spread;
    match present(spread) {
        None => FeatureScore::defaulted(table.fallback, Substitution::Missing),
        Some(v) if v.is_infinite() => FeatureScore::defaulted(table.fallback, Substitution::OutOfRange(v)),
        Some(v) => FeatureScore::scored(table.lookup(v)),
    }
}

/// Unknown or missing codes take the profile's neutral default
pub fn score_weather(profile: &ScoringProfile, code: Option<i64>) -> FeatureScore {
    let table = &profile.weather;
    match code {
        None => FeatureScore::defaulted(table.default, Substitution::Missing),
        Some(c) => match table.get(c) {
            Some(points) => FeatureScore::scored(points),
            None => FeatureScore::defaulted(table.default, Substitution::OutOfRange(c as f64)),
        },
    }
}

pub fn score_offense_rank(profile: &ScoringProfile, rank: Option<i64>) -> FeatureScore {
    let table = &profile.offense_rank;
    match rank {
        None => FeatureScore::defaulted(table.fallback, Substitution::Missing),
        Some(r) if !(1..=MAX_OFFENSE_RANK).contains(&r) => {
            FeatureScore::defaulted(table.fallback, Substitution::OutOfRange(r as f64))
        }
        Some(r) => FeatureScore::scored(table.lookup(r)),
    }
}

pub fn score_rz_efficiency(profile: &ScoringProfile, pct: Option<f64>) -> FeatureScore {
    score_percentage(&profile.rz_efficiency, pct)
}

pub fn score_rz_defense(profile: &ScoringProfile, pct: Option<f64>) -> FeatureScore {
    score_percentage(&profile.rz_defense, pct)
}

fn score_percentage(table: &crate::profile::BandTable, pct: Option<f64>) -> FeatureScore {
    match present(pct) {
        None => FeatureScore::defaulted(table.fallback, Substitution::Missing),
        Some(v) if !(0.0..=100.0).contains(&v) => {
            FeatureScore::defaulted(table.fallback, Substitution::OutOfRange(v))
        }
        Some(v) => FeatureScore::scored(table.lookup(v)),
    }
}

/// Dispatch to the scorer for `feature`
pub fn score_feature(profile: &ScoringProfile, feature: Feature, record: &KickerRecord) -> FeatureScore {
    match feature {
        Feature::GameTotal => score_game_total(profile, record.over_under),
        Feature::Spread => score_spread(profile, record.spread),
        Feature::Weather => score_weather(profile, record.weather),
        Feature::OffenseRank => score_offense_rank(profile, record.offense_rank),
        Feature::RedZoneEfficiency => score_rz_efficiency(profile, record.rz_efficiency),
        Feature::RedZoneDefense => score_rz_defense(profile, record.opp_rz_defense),
    }
}
