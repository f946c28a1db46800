use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use configuration::Settings;
use database::{DbRepository, Repository};
use notifier::Notifier;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub db_repo: Arc<dyn Repository>,
    pub notifier: Arc<dyn Notifier>,
    pub service_name: String,
}

/// Builds the application router.
///
/// CORS is wide open (any origin, method and header), which is only acceptable for
/// local and demo deployments.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/bins", post(handlers::create_bin).get(handlers::get_bins))
        .route("/bins/:bin_id", get(handlers::get_bin))
        .route(
            "/reports",
            post(handlers::create_report).get(handlers::get_reports),
        )
        .route("/reports/:report_id/clear", put(handlers::clear_report));

    Router::new()
        .route("/", get(handlers::health))
        .nest("/api", api)
        .with_state(Arc::new(state))
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024)) // Payloads are tiny; 1MB is plenty.
}

/// Connects to the database, makes sure the schema exists, and serves the API until
/// Ctrl-C is received.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    // Note: Tracing is already initialized in main.rs.
    let db_pool = database::connect(&settings.database).await?;
    database::run_migrations(&db_pool).await?;

    let state = AppState {
        db_repo: Arc::new(DbRepository::new(db_pool)),
        notifier: notifier::from_config(&settings.notifier)?,
        service_name: settings.service.name.clone(),
    };
    let app = router(state);

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server started and listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal.");
}
