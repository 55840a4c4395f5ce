pub mod ui;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);

    Router::new()
        // Pages
        .route("/", get(ui::handle_home))
        .route("/settings", get(ui::handle_settings))
        .route("/refresh-all", get(ui::handle_refresh_all))
        .route("/watched", get(ui::handle_watched))
        .route("/updates", get(ui::handle_updates))
        .route("/combined", get(ui::handle_combined))
        .route("/pods", get(ui::handle_pods))
        // Form actions
        .route("/workloads/refresh", post(ui::handle_refresh_workload))
        .route("/workloads/upgrade", post(ui::handle_upgrade_workload))
        .route("/workloads/refresh-single", post(ui::handle_refresh_single))
        // Health
        .route("/healthz", get(handle_healthz))
        // Static files
        .nest_service("/static", static_dir)
        .fallback(ui::handle_not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn handle_healthz() -> &'static str {
    "ok\n"
}
