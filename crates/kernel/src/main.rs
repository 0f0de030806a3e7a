//! Folio blog server.
//!
//! Serves the site and provides a few administration commands.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use folio_kernel::config::Config;
use folio_kernel::state::AppState;
use folio_kernel::store::PgStore;
use folio_kernel::{build_router, cli, db, session};

/// Folio blog server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Keep all data and sessions in memory instead of PostgreSQL/Redis.
        #[arg(long)]
        in_memory: bool,
    },

    /// Create a staff account.
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Create a post tag.
    CreateTag {
        /// Tag name.
        name: String,
    },

    /// Apply database migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match args.command.unwrap_or(Command::Serve { in_memory: false }) {
        Command::Serve { in_memory } => serve(&config, in_memory).await,
        Command::CreateAdmin {
            email,
            password,
            first_name,
            last_name,
        } => {
            let store = connect_store(&config).await?;
            cli::cmd_create_admin(&store, &email, &password, &first_name, &last_name).await
        }
        Command::CreateTag { name } => {
            let store = connect_store(&config).await?;
            cli::cmd_create_tag(&store, &name).await
        }
        Command::Migrate => {
            connect_store(&config).await?;
            println!("Migrations applied.");
            Ok(())
        }
    }
}

/// Connect to PostgreSQL and bring the schema up to date.
async fn connect_store(config: &Config) -> Result<PgStore> {
    let pool = db::create_pool(config.require_database_url()?, config.database_max_connections)
        .await
        .context("failed to create database pool")?;
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    Ok(PgStore::new(pool))
}

async fn serve(config: &Config, in_memory: bool) -> Result<()> {
    info!(port = config.port, in_memory, "Starting Folio");

    let same_site = session::parse_same_site(&config.cookie_same_site);

    let app = if in_memory {
        let state = AppState::in_memory(config).context("failed to initialize application state")?;
        let store = tower_sessions::MemoryStore::default();
        build_router(state).layer(session::create_session_layer(
            store,
            same_site,
            config.cookie_secure,
        ))
    } else {
        let state = AppState::new(config)
            .await
            .context("failed to initialize application state")?;
        let store = session::create_redis_store(&config.redis_url)
            .await
            .context("failed to create session store")?;
        info!("Database and Redis connections established");
        build_router(state).layer(session::create_session_layer(
            store,
            same_site,
            config.cookie_secure,
        ))
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
