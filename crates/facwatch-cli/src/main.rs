use clap::{Parser, Subcommand};

mod run;

#[derive(Debug, Parser)]
#[command(name = "facwatch")]
#[command(about = "Municipal facility availability scanner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Full pipeline: refresh the catalog, acquire a session, scan
    /// availability, write the grouped and detailed documents
    Run(run::RunArgs),
    /// Refresh the facility catalog only (no session, no availability scan)
    Discover,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = facwatch_core::load_app_config_from_env()?;

    match cli.command {
        Commands::Run(args) => run::run(&config, args).await,
        Commands::Discover => run::discover_only(&config).await,
    }
}
