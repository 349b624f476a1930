pub mod plan;
pub mod profile;
pub mod rest;
pub mod saved;
pub mod state;

use crate::error::ApiError;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post, put},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the full application router, including the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| {
            ApiError::Internal(format!(
                "Invalid CORS origin '{}': {}",
                app_state.config.cors_origin, e
            ))
        })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let api_router = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/state", get(rest::state_handler))
        .route(
            "/profile",
            get(profile::get_profile_handler).put(profile::put_profile_handler),
        )
        .route("/profile/metrics", get(profile::get_metrics_handler))
        .route("/plan", get(plan::get_plan_handler).put(plan::put_plan_handler))
        .route("/plan/summary", get(plan::plan_summary_handler))
        .route("/plan/recipes", post(plan::add_recipe_handler))
        .route(
            "/plan/recipes/{id}",
            put(plan::update_recipe_handler).delete(plan::delete_recipe_handler),
        )
        .route("/saved", get(saved::get_saved_handler))
        .route("/saved/toggle", post(saved::toggle_saved_handler))
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
