//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "meshcheck",
    version,
    about = "Validate Istio configuration snapshots",
    long_about = "meshcheck — cross-object validation of Istio routing and security configuration.\n\nConfiguration precedence: CLI > meshcheck.toml > defaults.",
    after_help = "Examples:\n  meshcheck validate --snapshot cluster.yaml\n  meshcheck validate --snapshot cluster.json --namespace bookinfo --output json\n  meshcheck summary --snapshot cluster.yaml",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Log level when RUST_LOG is unset: error|warn|info|debug|trace (default: warn)"
    )]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Debug, Clone)]
/// Options shared by the commands that run a validation.
pub struct RunArgs {
    #[arg(long, help = "Snapshot file: YAML stream, List wrapper or JSON (required)")]
    pub snapshot: String,
    #[arg(long, help = "Repository root used for config discovery (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Only report objects of this namespace")]
    pub namespace: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Worker threads for individual checks (default: available cores)")]
    pub concurrency: Option<usize>,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current meshcheck version.")]
    Version,
    /// Validate every object of a snapshot
    #[command(
        about = "Run validation checks",
        long_about = "Validate every VirtualService, DestinationRule, Gateway, RouteRule, Sidecar, AuthorizationPolicy and Pod of a snapshot. Exits 1 when any error-severity check remains.",
        after_help = "Examples:\n  meshcheck validate --snapshot cluster.yaml\n  meshcheck validate --snapshot cluster.yaml --output json"
    )]
    Validate(RunArgs),
    /// Print per-namespace summaries only
    #[command(
        about = "Summarize validation results",
        long_about = "Run the same checks as `validate` but print only error, warning and object counts per namespace.",
        after_help = "Examples:\n  meshcheck summary --snapshot cluster.yaml --namespace bookinfo"
    )]
    Summary(RunArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate() {
        let cli = Cli::try_parse_from([
            "meshcheck",
            "validate",
            "--snapshot",
            "snap.yaml",
            "--namespace",
            "bookinfo",
            "--concurrency",
            "4",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.cmd {
            Commands::Validate(args) => {
                assert_eq!(args.snapshot, "snap.yaml");
                assert_eq!(args.namespace.as_deref(), Some("bookinfo"));
                assert_eq!(args.concurrency, Some(4));
                assert!(args.output.is_none());
            }
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn test_snapshot_is_required() {
        assert!(Cli::try_parse_from(["meshcheck", "summary"]).is_err());
    }
}
