// Command-line entry point for pli-impact.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use pli_impact::application::{AnalyzeUsecase, ImpactRun};
use pli_impact::config::AnalysisConfig;
use pli_impact::domain::impact::ImpactAnalyzer;
use pli_impact::error::ImpactError;
use pli_impact::infrastructure::concurrency::init_thread_pool;
use pli_impact::infrastructure::diff::{line_stats, unified_diff};
use pli_impact::infrastructure::reviewer::{review_impacts, CommandReviewer, ReviewOutcome};
use pli_impact::infrastructure::{
    ContentHashDetector, JsonExporter, LexicalCallGraphBuilder, TextExporter,
};
use pli_impact::ports::graph_exporter::DotExporter;
use pli_impact::ports::{GraphExporter, GraphView};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source file extension to collect (repeatable, overrides config)
    #[arg(long = "ext", global = true)]
    extensions: Vec<String>,

    /// Extraction worker threads (default: half the cores)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Enable debug output
    #[arg(long, short = 'D', global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and export the call graph of one folder
    Graph {
        /// Source folder
        #[arg(short = 'd', long)]
        folder: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "dot")]
        format: Format,

        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two versions and report which procedures are impacted
    Impact {
        /// Folder with the old version
        #[arg(long)]
        old: PathBuf,

        /// Folder with the new version
        #[arg(long)]
        new: PathBuf,

        /// Output format; dot renders the new graph with highlights
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Append unified diffs of changed files (text format only)
        #[arg(long)]
        diff: bool,

        /// Reviewer command: reads a prompt on stdin, answers on stdout
        #[arg(long)]
        review_cmd: Option<String>,

        /// Seconds before a reviewer call is killed (overrides config)
        #[arg(long)]
        review_timeout: Option<u64>,
    },

    /// List every procedure that transitively calls PROCEDURE
    Callers {
        /// Source folder
        #[arg(short = 'd', long)]
        folder: PathBuf,

        /// Procedure name
        #[arg(short, long)]
        procedure: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Dot,
    Json,
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<ImpactError>()
                .map(ImpactError::exit_code)
                .unwrap_or(ExitCode::FAILURE)
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "pli_impact=debug" } else { "pli_impact=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if !cli.extensions.is_empty() {
        config.extensions = cli.extensions.clone();
    }
    if cli.workers.is_some() {
        config.workers = cli.workers;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    debug!(?config, "configuration");
    if let Err(e) = init_thread_pool(config.workers) {
        warn!(error = %e, "thread pool already initialized");
    }

    let usecase = AnalyzeUsecase {
        callgraph_builder: &LexicalCallGraphBuilder,
        change_detector: &ContentHashDetector,
        config: &config,
    };

    match cli.command {
        Command::Graph { folder, format, output } => {
            let analysis = usecase.analyze_folder(&folder)?;
            let view = GraphView::plain(
                &analysis.graph,
                &analysis.proc_to_file,
                &config.fallback_extension,
            );
            let rendered = exporter(format).render(&view)?;
            emit(&rendered, output.as_deref())
        }
        Command::Impact {
            old,
            new,
            format,
            output,
            diff,
            review_cmd,
            review_timeout,
        } => {
            let impact_run = usecase.run(&old, &new)?;
            let rendered = match format {
                Format::Text => {
                    let mut text = impact_run.report.to_text();
                    if diff {
                        text.push_str(&diffs(&impact_run));
                    }
                    if let Some(cmd) = review_cmd.as_deref() {
                        let timeout = Duration::from_secs(
                            review_timeout.unwrap_or(config.review_timeout_secs),
                        );
                        text.push_str(&reviews(&impact_run, cmd, timeout)?);
                    }
                    text
                }
                Format::Json => serde_json::to_string_pretty(&impact_run.report)?,
                Format::Dot => DotExporter.render(&impact_run.highlighted_view(&config))?,
            };
            emit(&rendered, output.as_deref())
        }
        Command::Callers { folder, procedure } => {
            let analysis = usecase.analyze_folder(&folder)?;
            let analyzer = ImpactAnalyzer::new(&analysis.graph);
            let impacted = analyzer.impacted_by(&procedure);
            let mut text = format!("=== Callers of {} ===\n", procedure);
            if !analysis.graph.contains(&procedure) {
                text.push_str("(not in graph)\n");
            }
            for name in impacted {
                text.push_str(&format!("{}\n", name));
            }
            emit(&text, None)
        }
    }
}

fn exporter(format: Format) -> Box<dyn GraphExporter> {
    match format {
        Format::Dot => Box::new(DotExporter),
        Format::Json => Box::new(JsonExporter),
        Format::Text => Box::new(TextExporter),
    }
}

fn diffs(run: &ImpactRun) -> String {
    let old_files = run.old.snapshot.files_by_name();
    let new_files = run.new.snapshot.files_by_name();
    let mut out = String::new();
    for name in &run.report.changed_files {
        let old_text = old_files.get(name).map(|f| f.text.as_str()).unwrap_or("");
        let new_text = new_files.get(name).map(|f| f.text.as_str()).unwrap_or("");
        let (inserted, deleted) = line_stats(old_text, new_text);
        out.push_str(&format!("\n=== {} (+{} -{}) ===\n", name, inserted, deleted));
        out.push_str(&unified_diff(old_text, new_text, name));
    }
    out
}

fn reviews(run: &ImpactRun, cmd: &str, timeout: Duration) -> Result<String> {
    let reviewer = CommandReviewer::from_command_line(cmd)
        .context("Empty --review-cmd")?
        .with_timeout(timeout);
    let records = review_impacts(&reviewer, &run.report.impact_map, &run.new.snapshot);

    let mut out = String::from("\nReviews\n");
    for record in records {
        let body = match record.outcome {
            ReviewOutcome::Reviewed { commentary } => commentary,
            ReviewOutcome::Failed { message } => format!("review failed: {}", message),
        };
        out.push_str(&format!(
            "  {} -> {}: {}\n",
            record.changed_file, record.impacted_file, body
        ));
    }
    Ok(out)
}

fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Output written to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
