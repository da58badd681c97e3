//! `check-license`: fail CI when a C/C++ source lacks an SPDX marker

use clap::Parser;
use license_check::{default_roots, Checker, LicenseError};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "check-license")]
#[command(about = "Check C/C++ sources for SPDX license identifiers", version)]
struct Cli {
    /// Repository root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Additional directory to scan (repeatable)
    #[arg(long = "dir", short = 'd')]
    dirs: Vec<PathBuf>,

    /// List every checked file with its detected license
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => println!("License checks passed."),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

fn run(cli: &Cli) -> Result<bool, LicenseError> {
    let mut roots = default_roots(&cli.root)?;
    roots.extend(cli.dirs.iter().cloned());

    let checker = Checker::new()?;
    let report = checker.scan(&roots)?;

    if cli.verbose {
        for file in report.files.iter().filter(|f| f.passed()) {
            println!(
                "[ OK ] {} ({})",
                file.path.display(),
                file.license.as_deref().unwrap_or("?")
            );
        }
    }

    if report.passed() {
        Ok(true)
    } else {
        print!("{}", report.render_failures());
        Ok(false)
    }
}
