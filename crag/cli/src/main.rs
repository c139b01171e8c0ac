//! crag CLI - generate API clients and React Query hooks

use std::error::Error as _;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use colored::Colorize;
use crag_lib::{
    CragConfig, DryRunGenerator, ExternalGenerator, GenerateOptions, GenerationDriver,
    GenerationMode, GenerationReport, InputEntry, InputFailure,
};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "crag", author, version)]
#[command(about = "Generate TypeScript API clients and React Query hooks", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file [default: crag.config.{yaml,yml,json} in the current directory]
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from API descriptions
    Generate {
        #[command(subcommand)]
        target: GenerateTarget,
    },
}

#[derive(Subcommand)]
enum GenerateTarget {
    /// Generate an API client and React hooks for every configured input
    Api(ApiArgs),
}

#[derive(Args)]
struct ApiArgs {
    /// Generate from this OpenAPI spec instead of the configured inputs
    #[arg(short, long, value_name = "SPEC")]
    path: Option<String>,

    /// Output directory [default: `output` from the config]
    #[arg(short, long, value_name = "DIR")]
    destination: Option<PathBuf>,

    /// Generate only the API client
    #[arg(long, conflicts_with = "hooks_only")]
    client_only: bool,

    /// Generate only the React Query hooks
    #[arg(long)]
    hooks_only: bool,

    /// Print the generator command for each input instead of running it
    ///
    /// Postman collections are still converted, so conversion errors surface.
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG wins over -v
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,crag=info,crag_lib=info".to_string(),
            2 => "info,crag=debug,crag_lib=debug".to_string(),
            _ => "debug,crag=trace,crag_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    match cli.command {
        Commands::Generate {
            target: GenerateTarget::Api(args),
        } => {
            let report = generate_api(args, cli.config.as_deref()).await?;
            print_report(&report);
            if !report.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn generate_api(args: ApiArgs, config_path: Option<&Path>) -> Result<GenerationReport> {
    let mode = GenerationMode::from_flags(args.client_only, args.hooks_only)?;
    let cwd = std::env::current_dir().wrap_err("cannot determine the current directory")?;

    // an explicit --path makes the config optional
    let loaded = CragConfig::load(config_path, &cwd, args.path.is_none())
        .wrap_err("failed to load configuration")?;
    tracing::debug!(
        source = ?loaded.source,
        %mode,
        dry_run = args.dry_run,
        "resolved configuration"
    );
    let mut config = loaded.config;
    if let Some(path) = args.path {
        config.input = vec![InputEntry::Shorthand(path)];
    }

    let options = GenerateOptions {
        destination: args.destination,
        mode,
    };
    let settings = config.generator.clone();

    let report = if args.dry_run {
        let driver = GenerationDriver::new(config, DryRunGenerator::new(settings));
        let report = driver.run(&options).await;
        for command in driver.generator().planned() {
            println!("{}", command.join(" "));
        }
        report
    } else {
        GenerationDriver::new(config, ExternalGenerator::new(settings))
            .run(&options)
            .await
    };

    Ok(report)
}

fn print_report(report: &GenerationReport) {
    if report.outcomes.is_empty() {
        println!("{}", "No inputs configured, nothing was generated".yellow());
        return;
    }

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(mode) => println!(
                "🎉 {} {}",
                mode.success_message().green(),
                format!("({} -> {})", outcome.input, outcome.output.display()).dimmed()
            ),
            Err(err) => print_failure(&outcome.input, err),
        }
    }

    let summary = format!("{} succeeded, {} failed", report.succeeded(), report.failed());
    if report.is_success() {
        println!("{}", summary.bold());
    } else {
        println!("{}", summary.bold().red());
    }
}

fn print_failure(input: &str, err: &InputFailure) {
    let mut last = err.to_string();
    eprintln!("{} {}: {}", "✗".red().bold(), input.bold(), last.red());

    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // skip causes the parent message already embeds
        if !last.contains(&text) {
            eprintln!("    caused by: {text}");
        }
        last = text;
        source = cause.source();
    }
}
