mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "webscout")]
#[command(about = "Stealth browser tools for LLM-driven web reconnaissance", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage registered tools
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },

    /// Execute a tool directly, bypassing the LLM
    Run {
        /// Tool name (see `webscout tools list`)
        tool: String,

        /// Tool parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },

    /// Show the recon agent definition
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Run environment diagnostics
    Doctor,
}

#[derive(Subcommand)]
enum ToolsCommands {
    /// List all registered tools
    List,
    /// Show detailed info for a specific tool
    Info { name: String },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// Print the agent definition as JSON
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Tools { command } => match command {
            ToolsCommands::List => commands::tools_cmd::list().await,
            ToolsCommands::Info { name } => commands::tools_cmd::info(&name).await,
        },
        Commands::Run { tool, params } => commands::run_cmd::tool(&tool, &params).await,
        Commands::Agent { command } => match command {
            AgentCommands::Show => commands::agent_cmd::show(),
        },
        Commands::Doctor => commands::doctor::run(),
    }
}
