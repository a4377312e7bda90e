//! CLI entrypoint for the panel
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use panel_application::{
    CompositeEventSink, EventSink, RunDeliberationError, RunDeliberationInput,
    RunDeliberationUseCase, SessionRecovery,
};
use panel_domain::{
    NoveltyConvergence, ParticipantCatalog, ParticipantSelector, SelectionRequest, Severity,
    classify_risk, util::estimate_tokens,
};
use panel_infrastructure::{
    ConfigLoader, FileConfig, InMemorySessionStore, JsonFileSessionArchive, JsonlEventSink,
    OpenAiCompatibleGateway, OpenAiSettings, ReportFormat,
};
use panel_presentation::{
    BudgetArgs, ClassifyArgs, Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter,
    RunArgs, SelectArgs, StreamingProgress,
};
use std::io::Read;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli)?;

    info!("Starting panel");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!("{}", e))?
    };

    for issue in config.validate() {
        match issue.severity {
            Severity::Error => warn!("config error: {}", issue.message),
            Severity::Warning => warn!("{}", issue.message),
        }
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    match &cli.command {
        Command::Run(args) => run(&cli, &config, args).await,
        Command::Select(args) => select(&config, args),
        Command::Budget(args) => budget(&config, args),
        Command::Classify(args) => classify(args),
        Command::Config => {
            ConfigLoader::print_config_sources(cli.config.as_ref());
            println!();
            print!("{}", ConsoleFormatter::format_config_issues(&config.validate()));
            Ok(())
        }
    }
}

/// Initialize logging based on verbosity level; `RUST_LOG` wins when set.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "panel.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn catalog(config: &FileConfig) -> ParticipantCatalog {
    config.catalog.to_catalog().0
}

async fn run(cli: &Cli, config: &FileConfig, args: &RunArgs) -> Result<()> {
    let (mut params, _) = config.deliberation.to_params();
    if let Some(max) = args.max_rounds {
        params = params.with_max_total_rounds(max);
    }
    let (budget, _) = config.context_budget.to_context_budget();
    let (policy, _) = config.recovery.to_policy();
    let (weights, _) = config.convergence.to_weights();

    // === Dependency Injection ===
    let generation = &config.generation;
    let api_key = generation.resolve_api_key();
    if api_key.is_none() {
        warn!(
            "No API key found in ${}; sending unauthenticated requests",
            generation.api_key_env
        );
    }
    let gateway = Arc::new(
        OpenAiCompatibleGateway::new(
            OpenAiSettings::new(&generation.base_url, &generation.model)
                .with_api_key(api_key)
                .with_timeout(generation.timeout())
                .with_temperature(generation.temperature),
        )
        .context("creating generation gateway")?,
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let mut use_case = RunDeliberationUseCase::new(gateway, Arc::new(catalog(config)))
        .with_params(params)
        .with_budget(budget)
        .with_recovery(SessionRecovery::new(policy))
        .with_convergence(Arc::new(NoveltyConvergence::new(weights)))
        .with_store(Arc::new(InMemorySessionStore::new()))
        .with_cancellation(cancel);
    if let Some(dir) = args.archive_dir.as_ref().or(config.output.archive_dir.as_ref()) {
        use_case = use_case.with_archive(Arc::new(JsonFileSessionArchive::new(dir)));
    }

    let mut sinks = CompositeEventSink::default();
    if !cli.quiet {
        let progress: Arc<dyn EventSink> = if args.stream {
            Arc::new(StreamingProgress::new())
        } else {
            Arc::new(ProgressReporter::new())
        };
        sinks.push(progress);
    }
    if let Some(path) = args.events.as_ref().or(config.output.events_file.as_ref()) {
        let sink = JsonlEventSink::open(path)
            .with_context(|| format!("opening event log {}", path.display()))?;
        sinks.push(Arc::new(sink));
    }

    let mut input = RunDeliberationInput::new(&args.topic, &args.phase);
    if let Some(context) = &args.context {
        input = input.with_context(context);
    }
    if !args.participants.is_empty() {
        input = input.with_participants(args.participants.clone());
    }
    if let Some(text) = &args.requirements {
        input = input.with_requirements(text);
    } else if let Some(path) = &args.requirements_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading requirements from {}", path.display()))?;
        input = input.with_requirements(text);
    }
    if let Some(id) = &args.session_id {
        input = input.with_session_id(id);
    }
    if !args.factors.is_empty() {
        input = input.with_risk_factors(args.factors.clone());
    }

    let format = args.output.unwrap_or(match config.output.parse_format().0 {
        ReportFormat::Text => OutputFormat::Text,
        ReportFormat::Json => OutputFormat::Json,
    });

    match use_case.execute(input, &sinks).await {
        Ok(outcome) => {
            let output = match format {
                OutputFormat::Text => ConsoleFormatter::format_outcome(&outcome),
                OutputFormat::Json => ConsoleFormatter::format_json(&outcome),
            };
            println!("{}", output);
            Ok(())
        }
        Err(RunDeliberationError::Aborted(aborted)) => {
            match format {
                OutputFormat::Text => eprint!("{}", ConsoleFormatter::format_aborted(&aborted)),
                OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&aborted)),
            }
            if let Some(detail) = &aborted.failure.detail {
                info!("Abort detail: {}", detail);
            }
            bail!("{}", aborted.failure.user_message)
        }
        Err(e) => Err(e.into()),
    }
}

fn select(config: &FileConfig, args: &SelectArgs) -> Result<()> {
    let catalog = catalog(config);
    let max = args
        .max
        .unwrap_or_else(|| config.deliberation.to_params().0.max_participants);
    let mut request = SelectionRequest::new(&args.topic, &args.phase).with_max_participants(max);
    if !args.participants.is_empty() {
        request = request.with_explicit(args.participants.clone());
    }
    let selection = ParticipantSelector::new(&catalog).select(&request)?;
    print!("{}", ConsoleFormatter::format_selection(&selection, &catalog));
    Ok(())
}

fn budget(config: &FileConfig, args: &BudgetArgs) -> Result<()> {
    let (mut budget, _) = config.context_budget.to_context_budget();
    if let Some(units) = args.budget {
        budget = panel_domain::ContextBudget::new(units)
            .with_thresholds(*budget.thresholds())
            .with_compact_keep_recent(budget.compact_keep_recent())
            .with_emergency_keep_recent(budget.emergency_keep_recent());
    }

    let used = match (args.used, &args.file) {
        (Some(units), _) => units,
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            estimate_tokens(&text)
        }
        (None, None) => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            estimate_tokens(&text)
        }
    };

    print!("{}", ConsoleFormatter::format_usage(&budget.check(used)));
    Ok(())
}

fn classify(args: &ClassifyArgs) -> Result<()> {
    let classification = classify_risk(&args.factors)?;
    let output = match args.output {
        OutputFormat::Text => ConsoleFormatter::format_classification(&classification),
        OutputFormat::Json => ConsoleFormatter::format_json(&classification),
    };
    println!("{}", output);
    Ok(())
}
