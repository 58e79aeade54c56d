pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::cleanup::CleanupCoordinator;
use crate::services::registry::FileRegistry;
use crate::services::remote::RemoteCapability;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::awards::upload_image,
        api::handlers::awards::get_image,
        api::handlers::awards::replace_image,
        api::handlers::awards::delete_image,
        api::handlers::awards::image_url,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::UploadResponse,
            models::StorageKind,
            api::handlers::types::ReplaceImageRequest,
            api::handlers::types::ReplaceImageResponse,
            api::handlers::types::ImageUrlResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "awards", description = "Award image upload endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: UploadConfig,
    pub upload_service: Arc<UploadService>,
    pub cleanup: Arc<CleanupCoordinator>,
    pub registry: Arc<FileRegistry>,
    pub remote: Arc<RemoteCapability>,
}

impl AppState {
    /// Wires the subsystem around one process-scoped registry and remote slot.
    pub fn new(config: UploadConfig, remote: Arc<RemoteCapability>) -> Self {
        let registry = Arc::new(FileRegistry::new());
        let upload_service = Arc::new(UploadService::new(
            config.clone(),
            remote.clone(),
            registry.clone(),
        ));
        let cleanup = Arc::new(CleanupCoordinator::new(
            registry.clone(),
            config.permanent_dir(),
        ));

        Self {
            config,
            upload_service,
            cleanup,
            registry,
            remote,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let base = state.config.upload_route.trim_end_matches('/').to_string();

    let awards = Router::new()
        .route(
            &base,
            post(api::handlers::awards::upload_image)
                .get(api::handlers::awards::image_url)
                .delete(api::handlers::awards::delete_image),
        )
        .route(
            &format!("{}/:entity_id", base),
            get(api::handlers::awards::get_image),
        )
        .route(
            &format!("{}/:entity_id/replace", base),
            post(api::handlers::awards::replace_image),
        )
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .merge(awards)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size + 1024 * 1024, // multipart overhead
        ))
        .with_state(state)
}
