//! CLI for portraitgen - WarZones enemy portrait generation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use portraitgen::image::providers::{API_TOKEN_ENV, DEFAULT_MODEL};
use portraitgen::roster;
use portraitgen::{
    AspectRatio, BatchReport, BatchRunner, ItemOutcome, PortraitGenError, ReplicateProvider,
    DEFAULT_OUTPUT_DIR,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "portraitgen")]
#[command(about = "Generate WarZones enemy commander portraits via Replicate")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Flags for the default `generate` run
    #[command(flatten)]
    generate: GenerateArgs,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every missing portrait (default)
    Generate(GenerateArgs),

    /// List the compiled-in portrait roster
    Roster,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Directory portraits are written to
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Replicate model, as owner/name
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Seconds between status polls
    #[arg(long, default_value_t = 2)]
    poll_interval_secs: u64,

    /// Give up on a prediction after this many seconds (default: wait forever)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Aspect ratio of generated portraits
    #[arg(long, value_enum, default_value = "1:1")]
    aspect_ratio: AspectRatioArg,

    /// Only generate the given enemy ids (repeatable)
    #[arg(long = "only", value_name = "ID")]
    only: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "3:4")]
    StandardPortrait,
    #[value(name = "9:16")]
    Portrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portraitgen=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(std::io::stdout().is_terminal()),
        )
        .init();

    match cli.command {
        Some(Commands::Generate(args)) => generate(args, cli.json).await?,
        Some(Commands::Roster) => list_roster(cli.json)?,
        None => generate(cli.generate, cli.json).await?,
    }

    Ok(())
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let mut builder = ReplicateProvider::builder()
        .model(&args.model)
        .poll_interval(Duration::from_secs(args.poll_interval_secs));
    if let Some(secs) = args.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    let provider = match builder.build() {
        Ok(provider) => provider,
        Err(PortraitGenError::Auth(msg)) => {
            eprintln!("ERROR: Set {API_TOKEN_ENV} environment variable ({msg})");
            eprintln!("  {API_TOKEN_ENV}=r8_... portraitgen");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    let items = roster::select(&args.only);
    if items.is_empty() {
        anyhow::bail!("no roster entries match --only {:?}", args.only);
    }

    let report = BatchRunner::with_items(&args.output_dir, items)
        .with_aspect_ratio(args.aspect_ratio.into())
        .run(&provider)
        .await?;

    print_report(&report, json_output)?;
    Ok(())
}

fn print_report(report: &BatchReport, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "\n{} generated, {} skipped, {} failed ({})",
        report.generated(),
        report.skipped(),
        report.failed(),
        report.output_dir.display()
    );
    for item in &report.items {
        if let ItemOutcome::Failed { reason } = &item.outcome {
            println!("  ✗ {}: {}", item.filename, reason);
        }
    }
    Ok(())
}

fn list_roster(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&roster::ENEMY_ROSTER)?);
        return Ok(());
    }

    println!("Portrait roster:\n");
    for item in &roster::ENEMY_ROSTER {
        println!("  {:>2} {}", item.id, item.filename);
        println!("     {}", &item.prompt[roster::STYLE_PREFIX.len()..]);
    }
    Ok(())
}
