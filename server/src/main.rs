mod config;
mod error;
mod meet_lookup;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use broker::{BrokerPublisher, Hub};
use clap::{Parser, Subcommand};
use engine::tally::VoteTally;
use storage::repository::flight::FlightRepository;
use storage::repository::meet::MeetRepository;
use storage::Database;
use sync::{sync_meet, PgLocalSource, PgRemoteArchive, SyncError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use meet_lookup::StorageMeetLookup;

#[derive(Parser)]
#[command(name = "streetlift-server")]
#[command(about = "Streetlifting meet-day realtime engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs pending schema migrations against DATABASE_URL.
    Initdb,
    /// Seeds the reference lift-format catalog (meet-types and their lift sequences).
    Seed,
    /// Uploads a finished meet into REMOTE_DATABASE_URL, matching identity by logical key only.
    Sync {
        meet_code: String,
        #[arg(long)]
        force: bool,
    },
    /// Runs the WebSocket broker and read-only REST surface.
    Serve,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::state::current_state,
        routes::rankings::meet_rankings,
        routes::catalog::list_meet_types,
        routes::catalog::list_lifts,
    ),
    components(schemas(
        storage::models::CurrentStateRow,
        storage::models::MeetType,
        storage::models::Lift,
        routes::rankings::RankingEntryResponse,
    )),
    tags((name = "state"), (name = "rankings"), (name = "catalog")),
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("server={log_level},broker={log_level},engine={log_level},sync={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env().context("failed to load configuration") {
        Ok(config) => config,
        Err(err) => return fail(err),
    };

    // `sync` owns its own exit code (0/1/2 per spec.md §6); every other
    // subcommand exits 0 on success, 1 on any other failure.
    match cli.command {
        Commands::Sync { meet_code, force } => run_sync(&config, &meet_code, force).await,
        Commands::Initdb => to_exit_code(run_initdb(&config).await),
        Commands::Seed => to_exit_code(run_seed(&config).await),
        Commands::Serve => to_exit_code(run_serve(&config).await),
    }
}

fn to_exit_code(result: anyhow::Result<()>) -> std::process::ExitCode {
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}

fn fail(err: anyhow::Error) -> std::process::ExitCode {
    tracing::error!("{err:#}");
    std::process::ExitCode::FAILURE
}

async fn run_initdb(config: &Config) -> anyhow::Result<()> {
    let db = Database::new(&config.database_url).await.context("failed to connect to database")?;
    db.run_migrations().await.context("failed to run migrations")?;
    tracing::info!("migrations applied");
    Ok(())
}

/// Seeds the baseline streetlifting 4-lift format (muscle-up, squat,
/// pull-up, dip) idempotently, by logical key, exactly as the sync
/// resolver seeds a remote archive's meet-type/lift rows.
async fn run_seed(config: &Config) -> anyhow::Result<()> {
    let db = Database::new(&config.database_url).await.context("failed to connect to database")?;

    let meet_type = MeetRepository::new(db.pool())
        .find_or_create_meet_type("Street Power 4-Lift")
        .await
        .context("failed to seed meet-type")?;

    let mut tx = db.pool().begin().await?;
    for (order_index, code) in ["MU", "SQ", "PU", "DIP"].iter().enumerate() {
        FlightRepository::upsert_lift_in_tx(&mut tx, meet_type.meet_type_id, code, order_index as i16)
            .await
            .with_context(|| format!("failed to seed lift {code}"))?;
    }
    tx.commit().await?;

    tracing::info!(meet_type_id = %meet_type.meet_type_id, "seeded Street Power 4-Lift format");
    Ok(())
}

/// Exit codes follow spec.md §6: `0` on success, `2` specifically for
/// `AlreadySynced` (so callers can distinguish "nothing to do" from a real
/// failure without parsing stderr), `1` for every other error.
async fn run_sync(config: &Config, meet_code: &str, force: bool) -> std::process::ExitCode {
    let remote_url = match config.remote_database_url.as_deref().context("REMOTE_DATABASE_URL must be set to run sync") {
        Ok(url) => url,
        Err(err) => return fail(err),
    };

    let local = match Database::new(&config.database_url).await.context("failed to connect to local database") {
        Ok(db) => db,
        Err(err) => return fail(err),
    };
    let remote = match Database::new(remote_url).await.context("failed to connect to remote database") {
        Ok(db) => db,
        Err(err) => return fail(err),
    };

    let local_source = PgLocalSource::new(&local);
    let remote_archive = PgRemoteArchive::new(&remote);

    match sync_meet(&local_source, &remote_archive, meet_code, force).await {
        Ok(report) => {
            tracing::info!(
                meet_code = %report.meet_code,
                athletes_upserted = report.athletes_upserted,
                records_promoted = report.records_promoted,
                results_written = report.results_written,
                "sync complete"
            );
            std::process::ExitCode::SUCCESS
        }
        Err(SyncError::AlreadySynced(meet_code)) => {
            tracing::error!(meet_code, "meet already synced; pass --force to overwrite");
            std::process::ExitCode::from(2)
        }
        Err(err) => fail(anyhow::anyhow!(err)),
    }
}

async fn run_serve(config: &Config) -> anyhow::Result<()> {
    let db = Database::new(&config.database_url).await.context("failed to connect to database")?;
    db.run_migrations().await.context("failed to run migrations")?;

    let catalog = Arc::new(storage::catalog::StorageCatalog::new(db.clone()));
    let hub = Arc::new(Hub::new());
    let publisher = Arc::new(BrokerPublisher::new(hub.clone()));
    let engine_handle = engine::state_machine::spawn(catalog, publisher);
    let tally = Arc::new(VoteTally::new());
    let meet_lookup = Arc::new(StorageMeetLookup::new(db.clone()));

    let ws_state = Arc::new(broker::AppState {
        hub,
        engine: engine_handle,
        tally,
        meet_lookup,
        judge_token_secret: config.judge_token_secret.clone(),
    });

    let openapi = ApiDoc::openapi();
    let rest_router = routes::router()
        .with_state(db)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    let ws_router = broker::router(ws_state, config.cors_origin.clone());

    let app = Router::new().merge(rest_router).merge(ws_router);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("listening on http://{bind_address}");
    tracing::info!("swagger UI at http://{bind_address}/swagger-ui");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
