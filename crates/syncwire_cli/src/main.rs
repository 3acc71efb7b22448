//! Syncwire CLI
//!
//! Command-line tools for exercising the syncwire protocol.
//!
//! # Commands
//!
//! - `session` - Run a loopback push or pull session between two threads
//! - `decode` - Decode a hex-encoded control packet
//! - `codes` - List message codes and status flags

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use syncwire_protocol::Flow;
use tracing_subscriber::EnvFilter;

/// Syncwire protocol tools.
#[derive(Parser)]
#[command(name = "syncwire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Flow announced by the initiator.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FlowArg {
    /// The initiator publishes to the responder
    Push,
    /// The initiator subscribes from the responder
    Pull,
}

impl From<FlowArg> for Flow {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::Push => Flow::Push,
            FlowArg::Pull => Flow::Pull,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a loopback session between an initiator and a responder
    Session {
        /// Flow to announce
        #[arg(short, long, value_enum, default_value = "pull")]
        flow: FlowArg,

        /// Number of object packets the publisher streams
        #[arg(short, long, default_value = "4")]
        chunks: usize,

        /// Size in bytes of each object packet
        #[arg(short = 's', long, default_value = "32")]
        chunk_size: usize,

        /// Maximum exchange-data-stream packets per run
        #[arg(short, long)]
        max_stream_packets: Option<u32>,

        /// Make the publisher reject negotiation with this error code
        #[arg(short, long)]
        reject: Option<u16>,
    },

    /// Decode a hex-encoded 12-byte control packet
    Decode {
        /// Packet bytes as hex, whitespace allowed
        hex: String,
    },

    /// List message codes and status flags
    Codes,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Session {
            flow,
            chunks,
            chunk_size,
            max_stream_packets,
            reject,
        } => {
            let options = commands::session::SessionOptions {
                flow: flow.into(),
                chunks,
                chunk_size,
                max_stream_packets,
                reject,
            };
            commands::session::run(&options)?;
        }
        Commands::Decode { hex } => {
            commands::decode::run(&hex)?;
        }
        Commands::Codes => {
            commands::codes::run();
        }
        Commands::Version => {
            println!("Syncwire CLI v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Control packet: {} bytes",
                syncwire_protocol::STATE_PACKET_SIZE
            );
        }
    }

    Ok(())
}
