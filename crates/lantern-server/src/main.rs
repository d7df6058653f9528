use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use lantern_api::auth::{self, AppState, AppStateInner};
use lantern_api::middleware::require_auth;
use lantern_api::{catalog, public, submissions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lantern=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("LANTERN_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("LANTERN_DB_PATH").unwrap_or_else(|_| "lantern.db".into());
    let host = std::env::var("LANTERN_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("LANTERN_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = lantern_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/submissions", post(public::create_submission))
        .with_state(app_state.clone());

    let admin_routes = Router::new()
        .route("/admin/submissions", get(submissions::list))
        .route("/admin/submissions", delete(submissions::permanently_delete))
        .route("/admin/submissions/stats", get(submissions::stats))
        .route("/admin/submissions/status", patch(submissions::bulk_status))
        .route("/admin/submissions/deleted", patch(submissions::set_deleted))
        .route("/admin/submissions/{id}/notes", patch(submissions::update_notes))
        .route("/admin/submissions/{id}/convert", post(submissions::convert))
        .route("/admin/catalog/categories", get(catalog::categories))
        .route("/admin/catalog/categories/{id}/courses", get(catalog::courses))
        .route("/admin/catalog/courses/{id}/days", get(catalog::days))
        .route("/admin/catalog/tracks", get(catalog::tracks))
        .route("/admin/catalog/tracks/{id}/topics", get(catalog::topics))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Lantern server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
