//! gen-wts - detection checkpoint to `.wts` converter
//!
//! Usage:
//!   gen-wts convert -w yolov5s.safetensors             # writes yolov5s.wts
//!   gen-wts convert -w best.safetensors -o engines/    # writes engines/best.wts
//!   gen-wts convert -w p6.safetensors --layer model.33 --strides 8,16,32,64
//!   gen-wts inspect yolov5s.wts                        # list tensor lines
//!   gen-wts inspect yolov5s.wts --json                 # same, as JSON

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

use commands::{convert, inspect};

/// gen-wts - Weight file generator
///
/// Convert trained detection checkpoints into the flat `.wts` text format
/// read by layer-by-layer inference engine builders.
#[derive(Parser)]
#[command(name = "gen-wts")]
#[command(author, about, long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("WTS_GIT_SHA"), ")"))]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a checkpoint to a .wts weight file
    Convert {
        /// Input checkpoint (.safetensors)
        #[arg(short, long, value_name = "FILE")]
        weights: PathBuf,

        /// Output file or directory [default: input with .wts extension]
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Layer prefix of the detection head
        #[arg(long, default_value = wtsgen::anchor::DEFAULT_DETECT_LAYER)]
        layer: String,

        /// Per-scale strides, comma separated [default: 8,16,32]
        #[arg(long, value_delimiter = ',', conflicts_with = "stride_key")]
        strides: Option<Vec<f32>>,

        /// Read strides from this tensor instead
        #[arg(long, value_name = "KEY")]
        stride_key: Option<String>,

        /// Write tensors as-is, without re-deriving the anchor grid
        #[arg(long, conflicts_with_all = ["strides", "stride_key", "layer"])]
        no_anchor_grid: bool,

        /// Render tensor lines in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// List the tensors stored in a .wts file
    Inspect {
        /// Path to .wts file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Limit number of tensors shown
        #[arg(long, default_value = "100")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Install the global subscriber. `RUST_LOG` overrides the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: Failed to initialize logging: {e}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Convert {
            weights,
            output,
            layer,
            strides,
            stride_key,
            no_anchor_grid,
            parallel,
        } => {
            let head = convert::HeadArgs {
                layer,
                strides,
                stride_key,
                disabled: no_anchor_grid,
            };
            convert::run(&weights, output.as_deref(), &head, parallel, cli.quiet)
        }

        Commands::Inspect { file, limit, json } => inspect::run(&file, limit, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
