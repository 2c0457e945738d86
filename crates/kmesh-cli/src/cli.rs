use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use kmesh::engine::config::Strategy;
use serde::Deserialize;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "kmesh - Size balanced k-point sampling grids from crystal cell geometry and a target k-point density.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the k-point grid for one or more cells.
    Solve(SolveArgs),
}

/// Arguments for the `solve` subcommand.
#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("cell_source")
        .required(true)
        .args(["inputs", "lattice", "cell_params"]),
))]
pub struct SolveArgs {
    // --- Cell Source ---
    /// POSCAR/CONTCAR files to read the lattice from.
    #[arg(value_name = "POSCAR")]
    pub inputs: Vec<PathBuf>,

    /// Lattice vectors as nine numbers in Å, row by row (a1x a1y a1z a2x ... a3z).
    #[arg(long, num_args = 9, value_name = "FLOAT", allow_negative_numbers = true)]
    pub lattice: Option<Vec<f64>>,

    /// Cell parameters: a b c in Å followed by alpha beta gamma in degrees.
    #[arg(long = "cell-params", num_args = 6, value_name = "FLOAT")]
    pub cell_params: Option<Vec<f64>>,

    // --- Solver Overrides ---
    /// Target k-point density (points per unit reciprocal volume).
    #[arg(short = 'k', long = "kpd", value_name = "FLOAT")]
    pub kpd: Option<f64>,

    /// Override `solver.only-even` from the config file.
    #[command(flatten)]
    pub parity: Parity,

    /// Override the grid sizing strategy from the config file.
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S solver.only-even=true
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,

    /// Output format for the computed grids.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// A group to handle mutually exclusive flags for the even-only constraint.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = false, multiple = false)]
pub struct Parity {
    /// Force every axis count to be even.
    #[arg(long)]
    pub even: bool,
    /// Allow any positive axis count.
    #[arg(long)]
    pub any_parity: bool,
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyArg {
    /// Round up near-equal axes together, keeping the grid isotropic.
    Balanced,
    /// Pick the all-floor or all-ceil grid with the lower density error.
    FloorCeil,
}

impl From<StrategyArg> for Strategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Balanced => Strategy::Balanced,
            StrategyArg::FloorCeil => Strategy::FloorCeil,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Toml,
}
