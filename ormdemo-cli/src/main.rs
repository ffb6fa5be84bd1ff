use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use commands::demo::DemoArgs;
use commands::migrate::MigrateArgs;
use commands::serve::ServeArgs;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "ormdemo",
    author,
    version,
    about = "Relational query patterns behind a JSON API",
    long_about = "CRUD, filtering, relation loading, raw SQL, transactions and pagination \
                  over PostgreSQL, served under /api."
)]
struct Cli {
    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (creates the schema first)
    Serve(ServeArgs),
    /// Create the schema and exit
    Migrate(MigrateArgs),
    /// Print one page of stored files as JSON
    Demo(DemoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so .env can feed clap's env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Migrate(args) => commands::run_migrate(args).await,
        Commands::Demo(args) => commands::run_demo(args).await,
    };

    tracing_setup::shutdown_otel();
    result
}
