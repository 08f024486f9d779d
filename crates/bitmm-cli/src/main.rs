//! bitmm - bit-serial matrix-multiply instruction generator
//!
//! # Commands
//!
//! - `generate` - Generate the execute-stage instruction stream for a descriptor file
//! - `check` - Validate a descriptor file and report the stream size
//! - `count` - Report the stream size for descriptor fields given on the command line

use std::path::PathBuf;

use anyhow::Result;
use bitmm_cli::{commands, CliConfig, OutputFormat};
use bitmm_compiler::CompilerOptions;
use bitmm_core::TileJobDescriptor;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// bitmm - instruction streams for bit-serial matrix multiply
#[derive(Parser)]
#[command(name = "bitmm")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the instruction stream for a descriptor file
    ///
    /// Examples:
    ///   bitmm generate job.yaml
    ///   bitmm generate job.json --format json --output job.program.json
    Generate {
        /// Descriptor file (.yaml/.yml for YAML, anything else for JSON)
        #[arg(value_name = "DESCRIPTOR")]
        descriptor: PathBuf,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name recorded in the program metadata
        #[arg(short, long)]
        name: Option<String>,

        /// Extra metadata recorded in the program (repeatable)
        #[arg(short, long = "meta", value_name = "KEY=VALUE", value_parser = commands::parse_key_value)]
        meta: Vec<(String, String)>,

        /// Skip replaying the stream through the protocol validator
        #[arg(long)]
        no_verify: bool,
    },
    /// Validate a descriptor file without generating
    Check {
        /// Descriptor file
        #[arg(value_name = "DESCRIPTOR")]
        descriptor: PathBuf,
    },
    /// Report the stream size for a descriptor given as flags
    Count {
        #[arg(long)]
        tiles_m: u16,
        #[arg(long)]
        tiles_k: u16,
        #[arg(long)]
        tiles_n: u16,
        #[arg(long, default_value = "1")]
        bits_l: u8,
        #[arg(long, default_value = "1")]
        bits_r: u8,
        #[arg(long)]
        signed_l: bool,
        #[arg(long)]
        signed_r: bool,
        #[arg(long, default_value = "1")]
        nbufs_res: u8,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, falling back to defaults once logging is up
    let (config, config_error) = match CliConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (CliConfig::default(), Some(e)),
    };

    // Initialize tracing
    init_tracing(&config)?;
    if let Some(e) = config_error {
        warn!("{}, using default configuration", e);
    }
    info!("Loaded configuration: {:?}", config);

    match cli.command {
        Commands::Generate {
            descriptor,
            format,
            output,
            name,
            meta,
            no_verify,
        } => {
            let format = format.unwrap_or(config.default_format);
            let options = CompilerOptions {
                verify_protocol: config.verify_protocol && !no_verify,
                program_name: name,
                custom_metadata: meta,
            };
            let text = commands::generate(&descriptor, format, options)?;
            commands::emit_output(&text, output.as_deref())?;
        }
        Commands::Check { descriptor } => {
            let text = commands::check(&descriptor)?;
            commands::emit_output(&text, None)?;
        }
        Commands::Count {
            tiles_m,
            tiles_k,
            tiles_n,
            bits_l,
            bits_r,
            signed_l,
            signed_r,
            nbufs_res,
        } => {
            let dscr = TileJobDescriptor::new(tiles_m, tiles_k, tiles_n)
                .with_lhs_bits(bits_l, signed_l)
                .with_rhs_bits(bits_r, signed_r)
                .with_result_buffers(0, nbufs_res);
            let text = commands::count(&dscr)?;
            commands::emit_output(&text, None)?;
        }
    }

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(config: &CliConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.filter_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
