use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use orderd::Result;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "orderd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Supply chain order tracking daemon", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize orderd in the current directory
    Init {
        /// Overwrite an existing configuration without confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Import orders from a JSON file or scan an import directory
    Import {
        /// Path to an order JSON file or a directory of them
        path: PathBuf,
    },

    /// List orders, optionally filtered by item stage
    Orders {
        /// Only show orders with at least one item in this stage
        #[arg(short, long)]
        status: Option<String>,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Move an item to its next workflow stage
    Advance {
        /// Item ID
        item_id: u64,

        /// Target stage (must be the immediate successor of the current one)
        next_stage: String,

        /// Free-form note recorded in the order history
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            println!("{}", "🚀 Initializing orderd...".cyan());
            orderd::cli::init::run(force)?;
        }

        Commands::Serve { port } => {
            orderd::cli::serve::run(port).await?;
        }

        Commands::Import { path } => {
            orderd::cli::import::run(&path)?;
        }

        Commands::Orders { status, json } => {
            orderd::cli::orders::run(status.as_deref(), json)?;
        }

        Commands::Advance {
            item_id,
            next_stage,
            notes,
        } => {
            orderd::cli::advance::run(item_id, &next_stage, notes.as_deref()).await?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "orderd", &mut io::stdout());
        }
    }

    Ok(())
}
