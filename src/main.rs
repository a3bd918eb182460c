//! tango - personal English study log with daily review digests.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tango::cli;
use tango::mcp;
use tango::Error;

#[derive(Parser)]
#[command(name = "tango")]
#[command(about = "tango - personal English study log with daily review digests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the tango home directory and database
    Init,

    /// Generate today's review digest
    Digest {
        /// Send the digest to the configured chat channel
        #[arg(long)]
        send: bool,

        /// Print the digest as JSON instead of a rendered message
        #[arg(long)]
        json: bool,
    },

    /// Show record counts and storage paths
    Status,

    /// Internal: generate and send the digest (used by the scheduler)
    #[command(hide = true)]
    Notify,

    /// Internal: run MCP server (used by chat clients)
    #[command(hide = true)]
    Mcp,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("tango=info".parse().unwrap()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => {
            // Show help when no command provided
            use clap::CommandFactory;
            Cli::command().print_help().unwrap();
            println!();
        }
        Some(Commands::Init) => {
            cli::init::run()?;
        }
        Some(Commands::Digest { send, json }) => {
            cli::digest::run(send, json).await?;
        }
        Some(Commands::Status) => {
            cli::status::run()?;
        }
        Some(Commands::Notify) => {
            cli::digest::run(true, false).await?;
        }
        Some(Commands::Mcp) => {
            mcp::run()?;
        }
    }

    Ok(())
}
