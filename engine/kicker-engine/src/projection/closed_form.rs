//! Closed-form attempt model
//!
//! Estimates attempts per kick-distance bucket from the RuleScore, the
//! implied team total and red-zone efficiency, then prices each bucket.
//! Every coefficient is validated non-negative by the profile, so the
//! projection never decreases as RuleScore, over/under or red-zone
//! efficiency grow, and never drops below zero.

use crate::profile::AttemptModel;

/// Inputs for one kicker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedFormInputs {
    pub rule_score: f64,
    pub over_under: Option<f64>,
    pub spread: Option<f64>,
    pub rz_efficiency: Option<f64>,
    /// Summed-mode boost value
    pub boost_summed: f64,
}

/// Estimated attempts per distance bucket
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttemptEstimate {
    pub extra_points: f64,
    pub short_fg: f64,
    pub mid_fg: f64,
    pub long_fg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedFormProjection {
    pub attempts: AttemptEstimate,
    pub points: f64,
}

pub fn project(model: &AttemptModel, inputs: &ClosedFormInputs) -> ClosedFormProjection {
    let over_under = inputs
        .over_under
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(model.neutral_total);
    let rz_eff = inputs
        .rz_efficiency
        .filter(|v| (0.0..=100.0).contains(v))
        .unwrap_or(model.neutral_rz_eff);
    let spread = inputs.spread.filter(|v| v.is_finite()).unwrap_or(0.0);

    let implied = over_under / 2.0 - spread * model.spread_share;
    let floor = |v: f64| v.max(model.floor);

    let extra_points = floor(
        model.xp_per_implied_point * implied + model.xp_per_rule_point * inputs.rule_score,
    );
    let fg_total = floor(
        model.fg_base
            + model.fg_per_implied_point * implied
            + model.fg_per_rule_point * inputs.rule_score
            + model.fg_per_rz_eff_point * rz_eff,
    );
    let attempts = AttemptEstimate {
        extra_points,
        short_fg: floor(fg_total * model.short_share),
        mid_fg: floor(fg_total * model.mid_share),
        long_fg: floor(fg_total * model.long_share + model.long_per_boost_unit * inputs.boost_summed.max(0.0)),
    };

    let points = attempts.extra_points * model.xp_points
        + attempts.short_fg * model.short_points
        + attempts.mid_fg * model.mid_points
        + attempts.long_fg * model.long_points;

    ClosedFormProjection { attempts, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs(rule_score: f64, over_under: f64, rz: f64) -> ClosedFormInputs {
        ClosedFormInputs {
            rule_score,
            over_under: Some(over_under),
            spread: Some(-3.0),
            rz_efficiency: Some(rz),
            boost_summed: 0.0,
        }
    }

    #[test]
    fn test_point_values_weight_each_bucket() {
        let model = AttemptModel::default();
        let p = project(&model, &inputs(24.0, 51.0, 28.0));
        let a = p.attempts;
        let expected = a.extra_points + a.short_fg * 3.0 + a.mid_fg * 4.0 + a.long_fg * 5.0;
        assert!((p.points - expected).abs() < 1e-12);
        assert!(p.points > 10.0 && p.points < 20.0, "{}", p.points);
    }

    #[test]
    fn test_summed_boost_adds_long_attempts_only() {
        let model = AttemptModel::default();
        let plain = project(&model, &inputs(20.0, 47.0, 20.0));
        let boosted = project(&model, &ClosedFormInputs { boost_summed: 6.0, ..inputs(20.0, 47.0, 20.0) });
        assert!(boosted.attempts.long_fg > plain.attempts.long_fg);
        assert_eq!(boosted.attempts.short_fg, plain.attempts.short_fg);
        assert_eq!(boosted.attempts.extra_points, plain.attempts.extra_points);
    }

    #[test]
    fn test_missing_inputs_use_neutral_constants() {
        let model = AttemptModel::default();
        let missing = ClosedFormInputs {
            rule_score: 12.0,
            over_under: None,
            spread: None,
            rz_efficiency: None,
            boost_summed: 0.0,
        };
        let neutral = ClosedFormInputs {
            rule_score: 12.0,
            over_under: Some(model.neutral_total),
            spread: Some(0.0),
            rz_efficiency: Some(model.neutral_rz_eff),
            boost_summed: 0.0,
        };
        assert_eq!(project(&model, &missing), project(&model, &neutral));
    }

    #[test]
    fn test_attempts_never_negative_for_hostile_inputs() {
        let model = AttemptModel::default();
        let p = project(
            &model,
            &ClosedFormInputs {
                rule_score: -40.0,
                over_under: Some(0.0),
                spread: Some(30.0),
                rz_efficiency: Some(0.0),
                boost_summed: 0.0,
            },
        );
        assert!(p.attempts.extra_points >= 0.0);
        assert!(p.attempts.short_fg >= 0.0);
        assert!(p.attempts.long_fg >= 0.0);
        assert!(p.points >= 0.0);
    }

    proptest! {
        #[test]
        fn prop_projection_non_negative(
            rule in 0.0f64..60.0,
            ou in 0.0f64..80.0,
            spread in 0.0f64..30.0,
            rz in 0.0f64..100.0,
            boost in 0.0f64..10.0,
        ) {
            let model = AttemptModel::default();
            let p = project(&model, &ClosedFormInputs {
                rule_score: rule,
                over_under: Some(ou),
                spread: Some(spread),
                rz_efficiency: Some(rz),
                boost_summed: boost,
            });
            prop_assert!(p.points >= 0.0);
        }

        #[test]
        fn prop_projection_monotone(
            rule in 0.0f64..40.0,
            ou in 30.0f64..60.0,
            rz in 0.0f64..90.0,
            bump in 0.0f64..10.0,
        ) {
            let model = AttemptModel::default();
            let base = project(&model, &inputs(rule, ou, rz)).points;
            prop_assert!(project(&model, &inputs(rule + bump, ou, rz)).points >= base);
            prop_assert!(project(&model, &inputs(rule, ou + bump, rz)).points >= base);
            prop_assert!(project(&model, &inputs(rule, ou, rz + bump)).points >= base);
        }
    }
}
