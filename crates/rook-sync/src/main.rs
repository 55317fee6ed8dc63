use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rook_sync::cli::{commands, CommandContext};
use rook_sync::{FlushPolicy, MetricFamily};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rook-sync")]
#[command(author, version, about = "Ingest ROOK health metrics into a local database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file path
    #[arg(long, global = true, env = "ROOK_DB_PATH")]
    db: Option<PathBuf>,

    /// API root URL
    #[arg(long, global = true, env = "ROOK_API_BASE")]
    api_base: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and store one metric family over a day range
    Ingest {
        /// Metric family
        #[arg(value_enum)]
        family: MetricFamily,
        /// Provider user id
        user_id: String,
        /// First day (YYYY-MM-DD), defaults to the family's lookback
        #[arg(long)]
        from: Option<String>,
        /// Last day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,
        /// When to write records, defaults per family
        #[arg(long, value_enum)]
        flush: Option<FlushPolicy>,
    },
    /// Fetch glucose, steps and heart rate over their trailing windows
    Sync {
        /// Provider user id
        user_id: String,
    },
    /// Print stored records as JSON
    Query {
        /// Metric family
        #[arg(value_enum)]
        family: MetricFamily,
        /// Provider user id
        user_id: String,
        /// Range start (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Range end (RFC 3339 or YYYY-MM-DD), defaults to now
        #[arg(long)]
        end: Option<String>,
    },
    /// Show row counts in the database
    Status,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

#[tokio::main]
async fn main() -> rook_sync::Result<()> {
    // Before parsing, so `.env` can also supply ROOK_DB_PATH and ROOK_API_BASE
    let env_file = rook_sync::config::load_dotenv();

    let Cli {
        command,
        db,
        api_base,
        timeout_secs,
        json_logs,
    } = Cli::parse();
    init_logging(json_logs);
    tracing::debug!(env_file = ?env_file, "environment loaded");

    let ctx = match CommandContext::new(db, api_base, timeout_secs) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", rook_sync::error::format_user_error(&e));
            std::process::exit(1);
        }
    };

    let run = async {
        match command {
            Commands::Ingest {
                family,
                user_id,
                from,
                to,
                flush,
            } => commands::ingest(&ctx, family, &user_id, from, to, flush).await,
            Commands::Sync { user_id } => commands::sync(&ctx, &user_id).await,
            Commands::Query {
                family,
                user_id,
                start,
                end,
            } => commands::query(&ctx, family, &user_id, start, end).await,
            Commands::Status => commands::status(&ctx).await,
        }
    };

    // The losing branch is dropped: an in-flight request is abandoned and an
    // open batch transaction rolls back.
    let outcome = tokio::select! {
        result = run => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(result) = outcome else {
        eprintln!("Interrupted");
        std::process::exit(130);
    };

    if let Err(e) = result {
        eprintln!("Error: {}", rook_sync::error::format_user_error(&e));
        std::process::exit(1);
    }

    Ok(())
}
