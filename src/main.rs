//! MCU CI command-line tool
//!
//! Entry point for the `mcu-ci` binary.

use clap::{Parser, Subcommand};
use mcu_ci::config::DEFAULT_CONFIG_PATH;
use mcu_ci::matrix::{self, OutputSink, GITHUB_OUTPUT_ENV};
use mcu_ci::{Matrix, SdkDescriptor, SystemRunner};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcu-ci")]
#[command(about = "Build matrix and SDK fetcher for multi-MCU CI", version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the build matrix and emit it for the CI orchestrator
    Matrix {
        /// Path to the configuration document (default: .github/mcus.json)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Environment variable naming the output file
        #[arg(long, default_value = GITHUB_OUTPUT_ENV)]
        output_env: String,

        /// Reject duplicate target ids and unrecognized SDK methods
        #[arg(long)]
        strict: bool,

        /// Indent JSON written to stdout
        #[arg(long)]
        pretty: bool,
    },

    /// Fetch the SDK for one target
    FetchSdk {
        /// SDK descriptor as JSON (absent or unparseable means no SDK)
        sdk: Option<String>,

        /// Fail on an unrecognized SDK method instead of skipping the fetch
        #[arg(long)]
        strict: bool,
    },

    /// Verify the configuration and summarize the resolved targets
    Verify {
        /// Path to the configuration document (default: .github/mcus.json)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Reject duplicate target ids and unrecognized SDK methods
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Matrix {
            config,
            output_env,
            strict,
            pretty,
        } => run_matrix(config, &output_env, strict, pretty),
        Commands::FetchSdk { sdk, strict } => run_fetch_sdk(sdk.as_deref(), strict),
        Commands::Verify { config, strict } => run_verify(config, strict),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Report a fatal error as a CI annotation and exit
fn fail(message: impl Display) -> ! {
    error!("{}", message);
    eprintln!("::error::{}", message);
    process::exit(1);
}

fn config_path(config_path: Option<PathBuf>) -> PathBuf {
    config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn run_matrix(config_path_arg: Option<PathBuf>, output_env: &str, strict: bool, pretty: bool) {
    let path = config_path(config_path_arg);
    let sink = OutputSink::from_env(output_env);

    let matrix = matrix::generate(&path, &sink, strict, pretty).unwrap_or_else(|e| fail(e));

    if let OutputSink::File(ref output) = sink {
        tracing::info!("Wrote matrix with {} targets to {}", matrix.len(), output.display());
    }
}

fn run_fetch_sdk(sdk_arg: Option<&str>, strict: bool) {
    let sdk = SdkDescriptor::from_arg(sdk_arg).unwrap_or_else(|e| fail(e));
    let options = mcu_ci::FetchOptions {
        strict,
        ..Default::default()
    };

    if let Err(e) = mcu_ci::fetch(&sdk, &SystemRunner, &options) {
        fail(e);
    }
}

fn run_verify(config_path_arg: Option<PathBuf>, strict: bool) {
    let path = config_path(config_path_arg);
    let matrix = matrix::load(&path, strict).unwrap_or_else(|e| fail(e));

    print_summary(&path, &matrix);
}

fn print_summary(path: &Path, matrix: &Matrix) {
    println!("Configuration valid: {}", path.display());
    println!();
    println!("Targets ({} total):", matrix.len());
    println!();

    for target in &matrix.include {
        println!("  {} ({})", target.id, target.desc);
        if let Some(ref toolchain) = target.toolchain {
            println!("    Toolchain: {}", toolchain);
        }
        if !target.apt.is_empty() {
            println!("    apt: {}", target.apt.join(", "));
        }
        if !target.cmake_args.is_empty() {
            println!("    CMake args: {}", target.cmake_args.len());
        }
        println!("    SDK: {}", target.sdk.method());
        println!();
    }
}
