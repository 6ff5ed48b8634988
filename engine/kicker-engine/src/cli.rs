//! # Command Line Interface
//!
//! Ranks a weekly kicker table and inspects scoring profiles.

use crate::config::RankerConfig;
use crate::pipeline::{RankBy, RankedTable, RankingPipeline};
use crate::profile::{ScoringProfile, PRESET_NAMES};
use crate::table::Table;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Kicker ranking CLI
#[derive(Parser)]
#[command(name = "kicker-rank")]
#[command(about = "Rank fantasy kickers by rule score and projected points")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score, project and rank a weekly input table
    Rank {
        /// Weekly input CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Historical CSV with realized points
        #[arg(long)]
        history: Option<PathBuf>,

        /// Historical CSV for the secondary score-outcome estimator
        #[arg(long)]
        score_history: Option<PathBuf>,

        /// Output CSV (defaults to <input>_ranked.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Preset name or profile TOML path
        #[arg(short, long)]
        profile: Option<String>,

        /// Primary sort key
        #[arg(long, value_enum)]
        rank_by: Option<RankBy>,

        /// Realized-points column in the history table
        #[arg(long)]
        target_column: Option<String>,

        /// Fixed decimals for exported floats
        #[arg(long)]
        decimals: Option<usize>,

        /// Write the run summary and warnings as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Rows to print in the console summary
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// List built-in scoring profiles
    Profiles,
    /// Print a scoring profile as TOML
    ShowProfile {
        /// Preset name or profile TOML path
        name: String,
    },
}

/// CLI handler
pub struct CliHandler {
    config: RankerConfig,
}

impl CliHandler {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Handle CLI commands
    pub fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Rank {
                input,
                history,
                score_history,
                output,
                profile,
                rank_by,
                target_column,
                decimals,
                report,
                top,
            } => {
                let mut config = self.config.clone();
                if let Some(profile) = profile {
                    config.profile = profile;
                }
                if let Some(rank_by) = rank_by {
                    config.pipeline.rank_by = rank_by;
                }
                if let Some(target_column) = target_column {
                    config.pipeline.target_column = target_column;
                }
                if decimals.is_some() {
                    config.pipeline.export_decimals = decimals;
                }
                config.validate()?;

                let output = output.unwrap_or_else(|| default_output_path(&input));
                let ranked = rank_files(&config, &input, history.as_deref(), score_history.as_deref())?;
                ranked
                    .write_csv(&output, config.pipeline.export_decimals)
                    .with_context(|| format!("Failed to write {}", output.display()))?;

                if let Some(report) = report {
                    ranked
                        .write_report(&report)
                        .with_context(|| format!("Failed to write {}", report.display()))?;
                }

                print_summary(&ranked, top);
                println!("\nWrote {} rows to {}", ranked.rows.len(), output.display());
            }
            Commands::Profiles => {
                println!("Built-in scoring profiles:");
                for name in PRESET_NAMES {
                    let marker = if name == self.config.profile { " (configured)" } else { "" };
                    println!("  {}{}", name, marker);
                }
            }
            Commands::ShowProfile { name } => {
                let profile = ScoringProfile::resolve(&name)?;
                print!("{}", profile.to_toml()?);
            }
        }
        Ok(())
    }
}

/// Load the tables named by the arguments and run the pipeline
pub fn rank_files(
    config: &RankerConfig,
    input: &Path,
    history: Option<&Path>,
    score_history: Option<&Path>,
) -> Result<RankedTable> {
    let profile = config.scoring_profile()?;
    let pipeline = RankingPipeline::new(profile, config.pipeline.clone())?;

    let table = Table::read_csv(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let history = history
        .map(|p| Table::read_csv(p).with_context(|| format!("Failed to read {}", p.display())))
        .transpose()?;
    let score_history = score_history
        .map(|p| Table::read_csv(p).with_context(|| format!("Failed to read {}", p.display())))
        .transpose()?;

    Ok(pipeline.run(table, history, score_history)?)
}

/// `<stem>_ranked.csv` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("kickers");
    input.with_file_name(format!("{}_ranked.csv", stem))
}

fn print_summary(ranked: &RankedTable, top: usize) {
    let summary = &ranked.summary;
    println!(
        "Kicker rankings: profile '{}', ranked by {}, {} projection",
        summary.profile, summary.rank_by, summary.strategy
    );
    println!("{}", "=".repeat(72));
    println!(
        "{:>3}  {:<24} {:<5} {:<5} {:>9} {:>9} {:>9}",
        "#", "Name", "Team", "Opp", "RuleScore", "Formula", "ProjPts"
    );
    for (i, row) in ranked.rows.iter().take(top).enumerate() {
        println!(
            "{:>3}  {:<24} {:<5} {:<5} {:>9.2} {:>9.2} {:>9.2}",
            i + 1,
            row.record.name,
            row.record.team,
            row.record.opponent,
            row.rule_score,
            row.formula_points,
            row.projected_points
        );
    }
    if let Some(rmse) = summary.model_rmse {
        println!("\nOutcome model in-sample RMSE: {:.3}", rmse);
    }
    if let Some(rmse) = summary.score_model_rmse {
        println!("Score model in-sample RMSE: {:.3}", rmse);
    }
    if !ranked.warnings.is_empty() {
        println!("\n{} warning(s):", ranked.warnings.len());
        for warning in &ranked.warnings {
            println!("  - {}", warning);
        }
    }
}
