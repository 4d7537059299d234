//! Ripple CLI - SATD detection and impact ripple analysis.

use std::io::stdout;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ripple::cli::{AnalyzeArgs, Cli, Command, OutputFormat, ScenarioArgs};
use ripple::config::Config;
use ripple::core::Error;
use ripple::detect::{CommentClassifier, KeywordClassifier, RemoteClassifier};
use ripple::output::{write_json_file, Format};
use ripple::pipeline::{AnalysisRun, RunStage};
use ripple::scenario::{self, ScenarioResult};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ Error::InvalidArgument(_)) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ripple::core::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(&cli.path)?,
    };

    let format = match cli.format {
        OutputFormat::Json => Format::Json,
        OutputFormat::Markdown => Format::Markdown,
        OutputFormat::Text => Format::Text,
    };

    let output = cli.output.clone();
    match cli.command {
        Command::Analyze(args) => {
            run_analyze(&cli.path, output.as_deref(), config, format, args)
        }
        Command::Scenario(args) => run_scenarios(output.as_deref(), config, format, args),
    }
}

fn run_analyze(
    path: &Path,
    output: Option<&Path>,
    config: Config,
    format: Format,
    args: AnalyzeArgs,
) -> ripple::core::Result<()> {
    let classifier: Arc<dyn CommentClassifier> = if config.classifier.endpoint.is_empty() {
        Arc::new(KeywordClassifier::new())
    } else {
        Arc::new(RemoteClassifier::new(
            config.classifier.endpoint.clone(),
            config.classifier.api_key.clone(),
            config.classifier.request_timeout_secs,
        )?)
    };

    let bar = ProgressBar::new_spinner().with_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("valid progress template"),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    let progress = bar.clone();

    let run = AnalysisRun::with_classifier(path, config, classifier)
        .on_stage(move |stage| progress.set_message(stage.to_string()));
    let mut result = run.run()?;
    bar.finish_and_clear();

    if let Some(limit) = args.limit {
        result.items.truncate(limit);
    }

    if let Some(out) = output {
        write_json_file(&result, out)?;
    }
    format.format(&result, &mut stdout())?;

    if result.stage == RunStage::Failed {
        return Err(Error::invariant(
            "pipeline",
            result.error.unwrap_or_else(|| "analysis failed".to_string()),
        ));
    }
    Ok(())
}

fn run_scenarios(
    output: Option<&Path>,
    config: Config,
    format: Format,
    args: ScenarioArgs,
) -> ripple::core::Result<()> {
    let results: Vec<ScenarioResult> = if args.all {
        scenario::run_all(&config)?
    } else {
        let id = args
            .scenario
            .ok_or_else(|| Error::InvalidArgument("pass --scenario N or --all".to_string()))?;
        let scenario = scenario::scenario_by_id(id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown scenario {id}")))?;
        vec![scenario::run_scenario(scenario, &config)?]
    };

    for result in &results {
        let verdict = if result.matches_ground_truth() {
            "ok".green()
        } else {
            "mismatch".red()
        };
        eprintln!(
            "scenario {} ({}): {} [satd {}/{}, chains {}/{}]",
            result.scenario_id,
            result.scenario_name,
            verdict,
            result.ground_truth_comparison.detected_satd,
            result.ground_truth_comparison.expected_satd,
            result.ground_truth_comparison.detected_chains,
            result.ground_truth_comparison.expected_chains,
        );
    }

    if results.len() == 1 {
        if let Some(out) = output {
            write_json_file(&results[0], out)?;
        }
        format.format(&results[0], &mut stdout())?;
    } else {
        if let Some(out) = output {
            write_json_file(&results, out)?;
        }
        format.format(&results, &mut stdout())?;
    }
    Ok(())
}
