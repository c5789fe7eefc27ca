use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use splitter_cli::{plan_file, run_batch, InputScanner, SplitOptions, SplitSummary, SplitterConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "class-splitter")]
#[command(about = "Split oversized C# types into partial files under a line budget", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML file with default settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split every oversized type found in the given files or directories
    Split(SplitArgs),

    /// Show how one file would be split, without writing
    Plan(PlanArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// Files or directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Maximum lines per output file
    #[arg(short, long)]
    budget: Option<usize>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Glob pattern to leave out (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Files processed concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Plan only; write nothing
    #[arg(long)]
    dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PlanArgs {
    /// File to plan
    path: PathBuf,

    /// Maximum lines per output file
    #[arg(short, long)]
    budget: Option<usize>,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = match &cli.config {
        Some(path) => SplitterConfig::load(path)?,
        None => SplitterConfig::default(),
    };

    match cli.command {
        Commands::Split(args) => run_split(args, config).await,
        Commands::Plan(args) => run_plan(args, config),
    }
}

async fn run_split(args: SplitArgs, mut config: SplitterConfig) -> Result<ExitCode> {
    if let Some(budget) = args.budget {
        config.budget = budget;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    config.recursive |= args.recursive;
    config.exclude.extend(args.exclude);
    config.validate().context("Invalid settings")?;

    let options = SplitOptions {
        budget: config.budget()?,
        dry_run: args.dry_run,
    };
    let inputs = InputScanner::new(&config)?.collect(&args.paths);
    let outcomes = run_batch(inputs, options, config.jobs).await;
    let summary = SplitSummary::from_outcomes(outcomes);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render_text());
    }

    Ok(if summary.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_plan(args: PlanArgs, mut config: SplitterConfig) -> Result<ExitCode> {
    if let Some(budget) = args.budget {
        config.budget = budget;
    }
    config.validate().context("Invalid settings")?;

    let report = plan_file(&args.path, config.budget()?)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(ExitCode::SUCCESS)
}
