use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "sqs - special quasirandom structure generation with the ATAT mcsqs search.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for a special quasirandom structure approximating a disordered input.
    Run(RunArgs),
    /// Read the results of a search that already ran in a directory.
    Collect(CollectArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Path to the disordered input structure (.cif, otherwise ATAT lattice format).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the best structure, written as CIF.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Search Overrides ---
    /// Cluster cutoff in Angstrom for one cluster size. Can be used multiple times.
    /// Example: --cluster 2=5.5 --cluster 3=3.0
    #[arg(long = "cluster", value_name = "SIZE=CUTOFF")]
    pub clusters: Vec<String>,

    #[command(flatten)]
    pub scaling: ScalingArgs,

    /// Time budget for the search, in minutes.
    #[arg(short = 't', long = "time", value_name = "MINUTES")]
    pub search_minutes: Option<f64>,

    /// Directory to run the search in. A temporary directory is used if omitted.
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Number of parallel search instances. Defaults to the number of logical cores.
    #[arg(short = 'n', long, value_name = "INT")]
    pub instances: Option<usize>,

    // --- Weight Overrides ---
    /// Monte Carlo temperature.
    #[arg(long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Weight of the cluster range term.
    #[arg(long, value_name = "FLOAT")]
    pub wr: Option<f64>,

    /// Penalty for cluster size.
    #[arg(long, value_name = "FLOAT")]
    pub wn: Option<f64>,

    /// Decay of the weights with cluster diameter.
    #[arg(long, value_name = "FLOAT")]
    pub wd: Option<f64>,

    /// Tolerance for considering two correlations equal.
    #[arg(long, value_name = "FLOAT")]
    pub tol: Option<f64>,

    // --- Tools ---
    /// Path or name of the mcsqs executable.
    #[arg(long, value_name = "PATH")]
    pub mcsqs: Option<PathBuf>,

    /// Path or name of the str2cif executable.
    #[arg(long, value_name = "PATH")]
    pub str2cif: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S weights.temperature=2.0
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Mutually exclusive ways of sizing the supercell.
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct ScalingArgs {
    /// Multiply the number of atoms by this factor and let mcsqs choose the cell shape.
    #[arg(long, value_name = "INT")]
    pub scaling: Option<f64>,

    /// Expand the cell by these multipliers along the lattice vectors and keep its shape.
    #[arg(long, value_name = "A,B,C")]
    pub supercell: Option<String>,
}

/// Arguments for the `collect` subcommand.
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Directory of a finished or interrupted search.
    #[arg(required = true, value_name = "DIR")]
    pub directory: PathBuf,

    /// Path for the best structure, written as CIF.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path or name of the str2cif executable.
    #[arg(long, value_name = "PATH")]
    pub str2cif: Option<PathBuf>,
}
