//! Kicker Ranker
//!
//! Scores weekly fantasy kicker candidates with an interpretable rule system
//! and projects their fantasy points. A run reads a CSV of game-context
//! features, assigns each kicker a RuleScore under a [`ScoringProfile`],
//! estimates points with a closed-form attempt model or a ridge regression fit
//! on historical outcomes, and writes a ranked CSV.

pub mod boost;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod profile;
pub mod projection;
pub mod rule_score;
pub mod scorers;
pub mod table;

pub use boost::BoostResolver;
pub use config::RankerConfig;
pub use error::{RankerError, Result};
pub use models::*;
pub use pipeline::{PipelineSettings, RankBy, RankedTable, RankingPipeline, RankingSummary, ScoredKicker};
pub use profile::ScoringProfile;
pub use projection::{OutcomeModel, ProjectionEngine, ProjectionSettings};
pub use rule_score::{RuleScoreBreakdown, RuleScoreEngine};
pub use table::Table;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
