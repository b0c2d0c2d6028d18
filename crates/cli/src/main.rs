// ordrec CLI - reconcile an order-export CSV against platform reports

mod exit_codes;
mod fetch;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ordrec_recon::engine::{run, ReconInput};
use ordrec_recon::ReconConfig;

use exit_codes::{EXIT_DIFFS, EXIT_IO, EXIT_PARSE, EXIT_PLATFORM, EXIT_SUCCESS, EXIT_USAGE};

// ---------------------------------------------------------------------------
// Error surface
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn usage(message: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: message.into(), hint: None }
    }

    fn io(message: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: message.into(), hint: None }
    }

    fn parse(message: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: message.into(), hint: None }
    }

    pub(crate) fn platform(message: impl Into<String>) -> Self {
        Self { code: EXIT_PLATFORM, message: message.into(), hint: None }
    }

    fn print(&self) {
        if !self.message.is_empty() {
            eprintln!("error: {}", self.message);
        }
        if let Some(ref hint) = self.hint {
            eprintln!("hint: {hint}");
        }
    }
}

// ---------------------------------------------------------------------------
// CLI surface
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "ordrec")]
#[command(about = "Reconcile an order-export CSV against platform reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation per config (exit 0 = reconciled, exit 1 = material diffs)
    #[command(after_help = "\
Exit code 1 indicates material differences: count mismatches, money diffs \
outside tolerance, or order-ID drift. Within-tolerance money diffs are \
reported but do not cause a non-zero exit.

Examples:
  ordrec run --config may.recon.toml
  ordrec run --config may.recon.toml --csv Mayorders-2025-06-03.csv
  ordrec run --config may.recon.toml --json > report.json
  ordrec run --config may.recon.toml --quiet")]
    Run {
        /// Run configuration (TOML)
        #[arg(long, short = 'c', env = "ORDREC_CONFIG")]
        config: PathBuf,

        /// Order export CSV (overrides the config's `csv` path)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Emit the full report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Suppress stderr summary and warnings
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Aggregate and print per-location totals without comparing
    #[command(after_help = "\
Examples:
  ordrec summary Mayorders-2025-06-03.csv
  ordrec summary Mayorders-2025-06-03.csv --config may.recon.toml")]
    Summary {
        /// Order export CSV
        csv: PathBuf,

        /// Optional config for aliases, policies, and amount selection
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Suppress stderr summary and warnings
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            e.print();
            ExitCode::from(e.code)
        }
    }
}

fn real_main() -> Result<u8, CliError> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, csv, json, quiet } => cmd_run(&config, csv.as_deref(), json, quiet),
        Commands::Summary { csv, config, quiet } => cmd_summary(&csv, config.as_deref(), quiet),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_run(
    config_path: &Path,
    csv_override: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<u8, CliError> {
    let config = load_config(config_path)?;
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let csv_path = match csv_override {
        Some(p) => p.to_path_buf(),
        None => config
            .csv
            .as_deref()
            .map(|p| resolve(config_dir, p))
            .ok_or_else(|| {
                CliError::usage("no CSV path: set `csv` in the config or pass --csv")
            })?,
    };
    let csv_text = read_file(&csv_path)?;

    let platform = match config.reference.platform {
        Some(ref p) => fetch::fetch_platform_summary(p, quiet)?,
        None => None,
    };

    let reference_order_ids = match config.reference.order_ids {
        Some(ref ids) => Some(read_id_list(&resolve(config_dir, &ids.file))?),
        None => None,
    };

    let input = ReconInput { csv_text, platform, reference_order_ids };
    let report = run(&config, &input).map_err(|e| CliError::parse(e.to_string()))?;

    if json {
        let body = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::parse(e.to_string()))?;
        println!("{body}");
    } else {
        report::render(&report, &mut std::io::stdout())
            .map_err(|e| CliError::io(e.to_string()))?;
    }

    if !quiet {
        report::stderr_summary(&report);
    }

    Ok(if report.all_matched { EXIT_SUCCESS } else { EXIT_DIFFS })
}

fn cmd_summary(csv_path: &Path, config_path: Option<&Path>, quiet: bool) -> Result<u8, CliError> {
    let mut config = match config_path {
        Some(p) => load_config(p)?,
        None => ReconConfig::default(),
    };
    // Summary never compares; drop any reference sections the config carries.
    config.reference = Default::default();

    let csv_text = read_file(csv_path)?;
    let input = ReconInput { csv_text, ..Default::default() };
    let report = run(&config, &input).map_err(|e| CliError::parse(e.to_string()))?;

    report::render_summary(&report, &mut std::io::stdout())
        .map_err(|e| CliError::io(e.to_string()))?;

    if !quiet {
        report::stderr_summary(&report);
    }

    Ok(EXIT_SUCCESS)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = read_file(path)?;
    ReconConfig::from_toml(&text)
        .map_err(|e| CliError::parse(format!("{}: {e}", path.display())))
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::io(format!("{}: {e}", path.display())))
}

/// One order ID per line; blank lines ignored.
fn read_id_list(path: &Path) -> Result<Vec<String>, CliError> {
    Ok(read_file(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Paths in the config resolve relative to the config file's directory.
fn resolve(base: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
