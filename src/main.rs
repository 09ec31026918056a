use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autodoc::agents::{Evaluator, Improver, LlmEvaluator, LlmImprover, SessionToken};
use autodoc::improve::{AutoImprover, FsArtifactStore, RunSettings, RunStatus, RunSummary, ScoreScale};
use autodoc::llm::{AnthropicClient, LlmClient};
use autodoc::prompt::PromptLoader;
use autodoc::storage::{CallRecorder, RecordingEvaluator, RecordingImprover, RunStore};
use autodoc::{AutodocError, Document};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autodoc")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("autodoc.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Collaborators and stores shared by every command
struct App {
    client: Arc<AnthropicClient>,
    evaluator: Arc<dyn Evaluator>,
    improver: Arc<dyn Improver>,
    artifacts: Arc<FsArtifactStore>,
    runs: RunStore,
    scale: ScoreScale,
}

impl App {
    fn new(cli: &Cli, config: &Config) -> Result<Self> {
        let output_dir = cli.output_dir.clone().unwrap_or_else(|| config.output.dir.clone());
        let scale = cli.scale.unwrap_or(config.improve.scale);

        let client = Arc::new(
            AnthropicClient::new(config.llm.to_client_config()).context("Failed to create LLM client")?,
        );
        let llm: Arc<dyn LlmClient> = client.clone();
        let prompts = Arc::new(match &config.prompts.dir {
            Some(dir) => PromptLoader::new(dir),
            None => PromptLoader::builtin(),
        });

        let evaluator = LlmEvaluator::new(llm.clone(), prompts.clone(), scale);
        let improver = LlmImprover::new(llm, prompts).with_max_tokens(config.llm.max_tokens);

        let recorder = config
            .output
            .record_calls
            .then(|| Arc::new(CallRecorder::new(&output_dir)));
        let evaluator: Arc<dyn Evaluator> = match &recorder {
            Some(recorder) => Arc::new(RecordingEvaluator::new(evaluator, recorder.clone())),
            None => Arc::new(evaluator),
        };
        let improver: Arc<dyn Improver> = match &recorder {
            Some(recorder) => Arc::new(RecordingImprover::new(improver, recorder.clone())),
            None => Arc::new(improver),
        };

        Ok(Self {
            client,
            evaluator,
            improver,
            artifacts: Arc::new(FsArtifactStore::new(&output_dir)),
            runs: RunStore::new(&output_dir),
            scale,
        })
    }

    fn print_usage(&self) {
        let usage = self.client.total_usage();
        println!(
            "  tokens: {} in / {} out (~${:.4})",
            usage.input_tokens,
            usage.output_tokens,
            usage.cost_usd(self.client.model())
        );
    }
}

fn session_for(document: &Document, session_id: Option<&str>) -> SessionToken {
    match session_id {
        Some(id) => SessionToken::new(id),
        None => SessionToken::generate(&document.id),
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Grade { document, session_id } => {
            let app = App::new(cli, config)?;
            handle_grade_command(&app, document, session_id.as_deref()).await
        }
        Commands::Improve { document, session_id } => {
            let app = App::new(cli, config)?;
            handle_improve_command(&app, document, session_id.as_deref()).await
        }
        Commands::AutoImprove {
            document,
            iterations,
            target,
            session_id,
        } => {
            let app = App::new(cli, config)?;
            let settings = config.improve.settings(*iterations, *target, Some(app.scale));
            handle_auto_improve_command(&app, document, settings, session_id.as_deref(), cli.is_verbose()).await
        }
        Commands::Runs { document } => {
            let output_dir = cli.output_dir.clone().unwrap_or_else(|| config.output.dir.clone());
            handle_runs_command(&RunStore::new(output_dir), document.as_deref())
        }
    }
}

async fn handle_grade_command(app: &App, path: &Path, session_id: Option<&str>) -> Result<()> {
    let document = Document::load(path)?;
    let session = session_for(&document, session_id).for_role("evaluator");
    info!("Grading '{}' with session {}", document.id, session);

    println!("{} {}", "Grading:".cyan(), path.display());
    let evaluation = app.evaluator.evaluate(&document, Some(&session)).await?;

    println!("{} {}", "Score:".green(), app.scale.format(evaluation.score).bold());
    println!("{}", "Feedback:".green());
    println!("{}", evaluation.feedback);
    Ok(())
}

async fn handle_improve_command(app: &App, path: &Path, session_id: Option<&str>) -> Result<()> {
    let document = Document::load(path)?;
    let session = session_for(&document, session_id);
    info!("Improving '{}' once with session {}", document.id, session);

    println!("{} {}", "Improving:".cyan(), path.display());
    let evaluation = app
        .evaluator
        .evaluate(&document, Some(&session.for_role("evaluator")))
        .await?;
    println!("{} {}", "Current score:".green(), app.scale.format(evaluation.score));

    let text = app
        .improver
        .improve(&document, &evaluation.feedback, Some(&session.for_role("improver")))
        .await?;
    let improved = document.revision(text);
    let artifact = app.artifacts.save_improved(&improved)?;

    println!("{}", improved.content);
    println!();
    println!(
        "{} {} ({} words, was {})",
        "Saved:".green(),
        artifact.display(),
        improved.word_count(),
        document.word_count()
    );
    Ok(())
}

async fn handle_auto_improve_command(
    app: &App,
    path: &Path,
    settings: RunSettings,
    session_id: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let document = Document::load(path)?;
    let session = session_for(&document, session_id);

    let runner = AutoImprover::new(
        Arc::new(app.evaluator.clone()),
        Arc::new(app.improver.clone()),
        app.artifacts.clone(),
        settings,
    )?;
    let mut tracker = runner.tracker_for(&document);

    println!(
        "{} {} (target {}, up to {} iterations)",
        "Auto-improving:".cyan(),
        path.display(),
        app.scale.format(settings.target_score),
        settings.max_iterations
    );
    if verbose {
        println!("  launch: {}", tracker.launch_id());
        println!("  session: {}", session);
    }

    let outcome = match runner.run_with_tracker(&document, Some(&session), &mut tracker).await {
        Ok(outcome) => outcome,
        Err(e) => {
            print_history(&tracker.summary(), app.scale);
            println!("{} run aborted after {} record(s)", "Failed:".red(), tracker.len());
            return Err(e).context("Auto-improve run failed");
        }
    };

    print_history(&outcome.summary, app.scale);
    print_status(&outcome.summary, app.scale);

    let tracking = app.runs.save_summary(&outcome.summary)?;
    println!("{} {}", "Tracking:".green(), tracking.display());
    if let Some(artifact) = outcome.summary.final_artifact() {
        println!("{} {}", "Final document:".green(), artifact);
    }
    if verbose {
        app.print_usage();
    }
    Ok(())
}

fn print_history(summary: &RunSummary, scale: ScoreScale) {
    for record in &summary.history {
        let delta = match record.improvement {
            Some(delta) if delta > 0.0 => scale.format_delta(delta).green(),
            Some(delta) if delta < 0.0 => scale.format_delta(delta).red(),
            Some(delta) => scale.format_delta(delta).normal(),
            None => "initial".dimmed(),
        };
        println!(
            "  {} {:>2}: {} ({})",
            "Iteration".bold(),
            record.iteration,
            scale.format(record.score),
            delta
        );
    }
}

fn print_status(summary: &RunSummary, scale: ScoreScale) {
    let final_score = summary.final_score.map(|s| scale.format(s)).unwrap_or_default();
    match summary.status {
        Some(RunStatus::TargetMetOriginal) => {
            println!("{} original already scores {}", "Target met:".green(), final_score)
        }
        Some(RunStatus::TargetReached) => println!(
            "{} {} after {} iteration(s)",
            "Target reached:".green(),
            final_score,
            summary.iterations_used
        ),
        Some(RunStatus::MaxIterationsReached) => println!(
            "{} final score {} below target {}",
            "Max iterations reached:".yellow(),
            final_score,
            scale.format(summary.target_score)
        ),
        None => println!("{}", "Run incomplete".red()),
    }
    if let Some(total) = summary.total_improvement {
        println!("  total improvement: {}", scale.format_delta(total));
    }
}

fn handle_runs_command(store: &RunStore, document: Option<&str>) -> Result<()> {
    let runs = store.list_runs()?;
    let runs: Vec<_> = runs
        .into_iter()
        .filter(|r| document.is_none_or(|d| r.document_id == d))
        .collect();

    if runs.is_empty() {
        println!("{}", "No runs recorded".yellow());
        return Ok(());
    }

    for run in &runs {
        let status = match run.status {
            Some(status) if status.met_target() => status.as_str().green(),
            Some(status) => status.as_str().yellow(),
            None => "incomplete".red(),
        };
        println!(
            "{} {} {} -> {} in {} iteration(s) [{}]",
            run.launch_id.bold(),
            status,
            run.initial_score.map(|s| run.scale.format(s)).unwrap_or_default(),
            run.final_score.map(|s| run.scale.format(s)).unwrap_or_default(),
            run.iterations_used,
            run.timestamp
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging
    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    if let Err(e) = run_application(&cli, &config).await {
        if let Some(err) = e.downcast_ref::<AutodocError>()
            && err.is_collaborator_failure()
        {
            eprintln!(
                "{} the run can be started again from the original document",
                "Agent call failed:".red()
            );
        }
        return Err(e).context("Application failed");
    }

    Ok(())
}
