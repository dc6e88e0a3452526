use crate::db::Database;
use crate::error::Result;
use axum::{
    Router,
    routing::{get, put},
};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod employees;
mod errors;
mod handlers;
mod publications;

pub use errors::AppError;

/// Shared application state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Lock the database for the duration of one request.
    fn db(&self) -> std::result::Result<MutexGuard<'_, Database>, AppError> {
        self.db
            .lock()
            .map_err(|e| AppError::Internal(format!("database lock poisoned: {e}")))
    }
}

/// Build the axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/api/publications",
            get(publications::list).post(publications::create),
        )
        .route("/api/publications/all", get(publications::get_all))
        .route(
            "/api/publications/all/{publication_id}",
            get(publications::get_by_id),
        )
        .route(
            "/api/publications/{publication_id}",
            put(publications::update).delete(publications::delete),
        )
        .route(
            "/api/employees",
            get(employees::list).post(employees::create),
        )
        .route(
            "/api/employees/{employee_id}",
            get(employees::get_by_id).delete(employees::delete),
        )
        .route(
            "/api/employees/{employee_id}/publications",
            get(publications::of_employee),
        )
        .route("/GetAllAsXml", get(publications::export_xml))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server on `host:port` and run until Ctrl-C.
pub async fn serve(db_path: &std::path::Path, host: &str, port: u16) -> Result<()> {
    let db = Database::open(db_path)?;
    db.migrate()?;
    let app = create_router(AppState::new(db));
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, db = %db_path.display(), "pubtrack API listening");
    println!("pubtrack API: http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
