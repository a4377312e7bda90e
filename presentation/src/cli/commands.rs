//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use panel_domain::RiskFactor;
use std::path::PathBuf;

/// Output format for deliberation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Formatted report
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for panel
#[derive(Parser, Debug)]
#[command(name = "panel")]
#[command(author, version, about = "Product panel - role-specialised participants deliberate a decision")]
#[command(long_about = r#"
Panel runs a simulated product team through a phased discussion
(opening, exploration, debate, synthesis, validation) and reports the
outcome with a risk-based approval gate.

Configuration files are loaded from (in priority order):
1. PANEL_* environment variables (PANEL_DELIBERATION__MAX_TOTAL_ROUNDS=6)
2. --config <path>     Explicit config file
3. ./panel.toml        Project-level config
4. ~/.config/panel/config.toml   Global config

Example:
  panel run "Should we migrate the billing service to event sourcing?"
  panel run --phase launch -p qa_engineer -p devops_engineer "Ship the beta on Friday?"
  panel select --phase design "Redesign the checkout UI"
  panel classify -f security=15:"touches auth" -f cost=5
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Write operational logs to daily-rotated files in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a deliberation on a topic
    Run(RunArgs),
    /// Show which participants would be selected for a topic
    Select(SelectArgs),
    /// Measure text against the context budget
    Budget(BudgetArgs),
    /// Classify a decision from risk factors
    Classify(ClassifyArgs),
    /// Show configuration sources and validation issues
    Config,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// The topic to deliberate
    pub topic: String,

    /// Project phase used to pick core participants
    #[arg(long, default_value = "design")]
    pub phase: String,

    /// Participants to use instead of automatic selection (repeatable)
    #[arg(short, long = "participant", value_name = "ID")]
    pub participants: Vec<String>,

    /// Free-text background for the discussion
    #[arg(long)]
    pub context: Option<String>,

    /// Requirement text; checklist lines become tracked obligations
    #[arg(long, conflicts_with = "requirements_file")]
    pub requirements: Option<String>,

    /// Read requirement text from a file
    #[arg(long, value_name = "PATH")]
    pub requirements_file: Option<PathBuf>,

    /// Explicit risk factor `name=score[:justification]` (repeatable)
    #[arg(short = 'f', long = "factor", value_parser = parse_risk_factor)]
    pub factors: Vec<RiskFactor>,

    /// Session id (generated when omitted)
    #[arg(long)]
    pub session_id: Option<String>,

    /// Override the global round ceiling
    #[arg(long)]
    pub max_rounds: Option<usize>,

    /// Output format (defaults to `[output].format`)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Append deliberation events to this JSONL file
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,

    /// Archive the final session snapshot into this directory
    #[arg(long, value_name = "DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Print participant output as it streams
    #[arg(long)]
    pub stream: bool,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    pub topic: String,

    #[arg(long, default_value = "design")]
    pub phase: String,

    #[arg(short, long = "participant", value_name = "ID")]
    pub participants: Vec<String>,

    /// Participant cap (defaults to `[deliberation].max_participants`)
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(Args, Debug)]
pub struct BudgetArgs {
    /// File whose estimated size is measured (stdin when omitted)
    pub file: Option<PathBuf>,

    /// Measure this many units instead of reading input
    #[arg(long, conflicts_with = "file")]
    pub used: Option<usize>,

    /// Budget in units (defaults to `[context_budget].budget_units`)
    #[arg(long)]
    pub budget: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Risk factor `name=score[:justification]` (repeatable)
    #[arg(short = 'f', long = "factor", value_parser = parse_risk_factor, required = true)]
    pub factors: Vec<RiskFactor>,

    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Parse `name=score[:justification]`.
///
/// Range checks are left to the classifier so the error names the factor.
pub fn parse_risk_factor(s: &str) -> Result<RiskFactor, String> {
    let (name, rest) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=score[:justification], got '{}'", s))?;
    let (score, justification) = match rest.split_once(':') {
        Some((score, justification)) => (score, justification.trim()),
        None => (rest, ""),
    };
    let score: u32 = score
        .trim()
        .parse()
        .map_err(|_| format!("score '{}' of factor '{}' is not a number", score.trim(), name))?;
    Ok(RiskFactor::new(name.trim(), score, justification))
}
