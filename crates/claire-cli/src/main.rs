use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "claire")]
#[command(about = "Claire CLI - talk to Claire and run the background coordinator", long_about = None)]
struct Cli {
    /// Directory holding config.toml and store.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the coordinator answers
    Ping,
    /// Show the signed-in user, or where to sign in
    Whoami,
    /// Sign out of the backend
    Logout,
    /// List projects, optionally switching the current one
    Projects {
        #[arg(long)]
        switch: Option<i64>,
    },
    /// List conversations of the current project
    Sessions,
    /// Send one message in the current conversation
    Ask {
        message: String,
        /// Page text to ask about
        #[arg(long)]
        context: Option<String>,
        /// Page the context came from
        #[arg(long, requires = "context")]
        url: Option<String>,
        /// Start a new conversation first
        #[arg(long)]
        new: bool,
    },
    /// Run the coordinator and its inactivity monitor until Ctrl-C
    Monitor,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let host = commands::Host::open(cli.data_dir)?;

    match cli.command {
        Commands::Ping => commands::coordinator::ping(&host).await?,
        Commands::Whoami => commands::conversation::whoami(&host).await?,
        Commands::Logout => commands::conversation::logout(&host).await?,
        Commands::Projects { switch } => commands::conversation::projects(&host, switch).await?,
        Commands::Sessions => commands::conversation::sessions(&host).await?,
        Commands::Ask {
            message,
            context,
            url,
            new,
        } => commands::conversation::ask(&host, &message, context, url, new).await?,
        Commands::Monitor => commands::coordinator::monitor(&host).await?,
    }

    Ok(())
}
