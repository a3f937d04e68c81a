//! meshcheck CLI binary entry point.
//! Delegates to the library for config resolution and validation, then
//! prints results.

use clap::Parser;
use meshcheck::cli::{Cli, Commands, RunArgs};
use meshcheck::validations::ValidationReport;
use meshcheck::{config, output, validate};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: Option<&str>) {
    // RUST_LOG wins over --log-level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", output::error_prefix(), message);
    std::process::exit(2);
}

/// Resolve config, load the snapshot and run the engine. Exits 2 on any
/// configuration or input error.
fn run(args: &RunArgs) -> (ValidationReport, String) {
    let eff = config::resolve_effective(
        args.repo_root.as_deref(),
        args.output.as_deref(),
        args.namespace.as_deref(),
        args.concurrency,
    )
    .unwrap_or_else(|e| fail(e));
    if eff.config_file.is_none() && eff.output != "json" {
        eprintln!(
            "{} No meshcheck.toml found; using defaults.",
            output::note_prefix()
        );
    }
    let snapshot_path = validate::resolve_snapshot_path(&eff, &args.snapshot);
    let report = validate::run_validate(&eff, &snapshot_path).unwrap_or_else(|e| fail(e));
    (report, eff.output)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate(args) => {
            let (report, out) = run(&args);
            if let Err(e) = output::print_report(&report, &out) {
                fail(e);
            }
            if report.has_errors() {
                std::process::exit(1);
            }
        }
        Commands::Summary(args) => {
            let (report, out) = run(&args);
            if let Err(e) = output::print_summary(&report, &out) {
                fail(e);
            }
            if report.has_errors() {
                std::process::exit(1);
            }
        }
    }
}
