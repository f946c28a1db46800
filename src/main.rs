use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::{Settings, init_tracing, load_config};

/// The main entry point for the dumpTrac service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; DATABASE_URL may come from the real environment.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Fails fast when DATABASE_URL is missing or a value is out of range.
    let mut settings = load_config().context("Failed to load configuration")?;
    let _log_guard = init_tracing(&settings.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => {
            args.apply(&mut settings);
            settings.validate()?;
            web_server::run_server(&settings).await?;
        }
        Commands::InitDb => init_db(&settings).await?,
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Tracks waste-collection bins and the fullness reports filed against them.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Create the database tables if they are missing, then exit.
    InitDb,
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to bind to; overrides `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on; overrides `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

impl ServeArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.server.host = host;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
    }
}

/// Handles the `init-db` command.
async fn init_db(settings: &Settings) -> anyhow::Result<()> {
    let pool = database::connect(&settings.database).await?;
    database::run_migrations(&pool).await?;
    tracing::info!("Database initialised.");
    Ok(())
}
