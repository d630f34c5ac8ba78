pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog Service API",
        version = "2.0.0",
        description = "Multi-tenant product catalog with per-product image storage"
    ),
    paths(
        handlers::health::healthz,
        handlers::user::create_user,
        handlers::user::get_user,
        handlers::user::update_user,
        handlers::product::create_product,
        handlers::product::get_product,
        handlers::product::replace_product,
        handlers::product::patch_product,
        handlers::product::delete_product,
        handlers::image::upload_image,
        handlers::image::list_images,
        handlers::image::get_image,
        handlers::image::delete_image,
    ),
    components(schemas(
        error::ErrorBody,
        handlers::health::HealthResponse,
        models::user::UserResponse,
        models::product::ProductResponse,
        models::image::ImageResponse,
    )),
    tags(
        (name = "Health", description = "Liveness probing"),
        (name = "Users", description = "Registration and account management"),
        (name = "Products", description = "Product CRUD operations"),
        (name = "Product Images", description = "Image upload and metadata for products"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
        );
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);

    routes::routes()
        .layer(cors)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age))
}
