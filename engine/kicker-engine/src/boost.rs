//! Boost tag resolution
//!
//! The boost tag is read twice: once in tier mode for ranking strength and
//! once in summed mode for the long field-goal attempt multiplier. The two
//! modes are separate operations and are never interchangeable.

use crate::profile::BoostTable;

/// Resolves free-text boost tags against a profile's tier table
#[derive(Debug, Clone, Copy)]
pub struct BoostResolver<'a> {
    table: &'a BoostTable,
}

impl<'a> BoostResolver<'a> {
    pub fn new(table: &'a BoostTable) -> Self {
        Self { table }
    }

    /// First matching tier in priority order wins; no match is 0
    pub fn tier_value(&self, tag: Option<&str>) -> f64 {
        let Some(tag) = normalize(tag) else {
            return 0.0;
        };
        self.table
            .tiers
            .iter()
            .find(|tier| tier.keywords.iter().any(|k| tag.contains(&k.to_lowercase())))
            .map(|tier| tier.tier_value)
            .unwrap_or(0.0)
    }

    /// Sum of the numeric value of every matching keyword across all tiers
    pub fn summed_value(&self, tag: Option<&str>) -> f64 {
        let Some(tag) = normalize(tag) else {
            return 0.0;
        };
        self.table
            .tiers
            .iter()
            .flat_map(|tier| {
                tier.keywords
                    .iter()
                    .filter(|k| tag.contains(&k.to_lowercase()))
                    .map(move |_| tier.numeric_value)
            })
            .sum()
    }

    /// Name of the tier selected in tier mode
    pub fn matched_tier(&self, tag: Option<&str>) -> Option<&'a str> {
        let tag = normalize(tag)?;
        self.table
            .tiers
            .iter()
            .find(|tier| tier.keywords.iter().any(|k| tag.contains(&k.to_lowercase())))
            .map(|tier| tier.name.as_str())
    }
}

fn normalize(tag: Option<&str>) -> Option<String> {
    let tag = tag?.trim();
    if tag.is_empty() || tag.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(tag.to_lowercase())
    }
}
