use annealyze::core::io::results::SolverBackend;
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
    author = "Annealyze Developers",
    version,
    about = "Annealyze CLI - post-processing of annealer results for molecular unfolding and RNA folding.",
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
    /// Pick the best torsion assignment from annealer samples and write the unfolded structure.
    Unfold(UnfoldArgs),
    /// Score annealer samples as RNA stem selections against a reference structure.
    Fold(FoldArgs),
    /// Report local, task and QPU timings of a result set.
    Timing(TimingArgs),
    /// Convert between base pair lists, CT files and dot-bracket notation.
    DotBracket(DotBracketArgs),
    /// Expand hyperparameter grids and tabulate experiment timings.
    Experiments(ExperimentsArgs),
}

/// Where the solver results are read from.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Solver backend: 'neal-sa', 'dwave-sa' or 'dwave-qa'.
    #[arg(short, long, value_name = "METHOD")]
    pub method: Option<SolverBackend>,

    /// Directory holding '{method}_result.json' for local backends.
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Bucket of a remote quantum annealer result.
    #[arg(long, value_name = "NAME")]
    pub bucket: Option<String>,

    /// Key prefix of a remote quantum annealer result.
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Task identifier of a remote quantum annealer result.
    #[arg(long, value_name = "ID")]
    pub task_id: Option<String>,

    /// Local mirror of the object store, laid out as '{root}/{bucket}/{key}'.
    #[arg(long, value_name = "DIR")]
    pub store_root: Option<PathBuf>,
}

/// Arguments for the `unfold` subcommand.
#[derive(Args, Debug)]
pub struct UnfoldArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the mol2 structure template.
    #[arg(short, long, value_name = "PATH")]
    pub template: Option<PathBuf>,

    #[command(flatten)]
    pub input: InputArgs,

    /// Number of lowest-energy samples to examine.
    #[arg(short = 'n', long, value_name = "INT")]
    pub top_n: Option<usize>,

    /// Override `unfolding.physical-check` from the config file.
    #[command(flatten)]
    pub physical_check: PhysicalCheck,

    /// Directory for the output files. Defaults to the template's directory.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Tag appended to the output file names.
    #[arg(short, long, value_name = "NAME")]
    pub save_name: Option<String>,
}

/// A group to handle mutually exclusive boolean flags for the steric clash check.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct PhysicalCheck {
    /// Reject candidates whose non-bonded atoms overlap.
    #[arg(long)]
    pub physical_check: bool,
    /// Accept candidates without checking for atom overlaps.
    #[arg(long)]
    pub no_physical_check: bool,
}

/// Arguments for the `fold` subcommand.
#[derive(Args, Debug)]
pub struct FoldArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the RNA dataset in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    #[command(flatten)]
    pub input: InputArgs,

    /// Number of lowest-energy samples to score.
    #[arg(short = 'n', long, value_name = "INT")]
    pub top_n: Option<usize>,

    /// Write the full report as JSON to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `timing` subcommand.
#[derive(Args, Debug)]
pub struct TimingArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DotBracketArgs {
    #[command(subcommand)]
    pub command: DotBracketCommands,
}

#[derive(Subcommand, Debug)]
pub enum DotBracketCommands {
    /// Annotate the structure stored in a CT file.
    FromCt {
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Annotate a list of 1-based base pairs.
    FromPairs {
        /// Base pairs as 'LEFT:RIGHT'. Can be used multiple times.
        #[arg(short, long = "pair", value_name = "LEFT:RIGHT", required = true)]
        pairs: Vec<String>,
        /// Sequence length.
        #[arg(short, long, value_name = "INT")]
        length: usize,
    },
    /// List the base pairs encoded by a dot-bracket string.
    ToPairs {
        #[arg(required = true)]
        notation: String,
    },
}

#[derive(Args, Debug)]
pub struct ExperimentsArgs {
    #[command(subcommand)]
    pub command: ExperimentsCommands,
}

#[derive(Subcommand, Debug)]
pub enum ExperimentsCommands {
    /// Group experiment results by device and sort them by problem size.
    Table {
        /// JSON file holding a list of experiment results.
        #[arg(required = true)]
        input: PathBuf,
        /// Write the table as CSV. Prints to stdout when omitted.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print every combination of a hyperparameter grid as JSON lines.
    Grid {
        /// Grid axis as 'NAME=V1,V2,...'. Can be used multiple times.
        #[arg(short, long = "param", value_name = "NAME=VALUES", required = true)]
        params: Vec<String>,
        /// Device name to resolve into an identifier.
        #[arg(long, value_name = "NAME")]
        device: Option<String>,
        /// TOML table mapping device names to identifiers.
        #[arg(long, value_name = "PATH", requires = "device")]
        device_catalog: Option<PathBuf>,
    },
}
