use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/user", user_routes())
        .nest("/product", product_routes())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::user::create_user))
        .route(
            "/{id}",
            get(handlers::user::get_user).put(handlers::user::update_user),
        )
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::product::create_product))
        .route(
            "/{id}",
            get(handlers::product::get_product)
                .put(handlers::product::replace_product)
                .patch(handlers::product::patch_product)
                .delete(handlers::product::delete_product),
        )
        .nest("/{id}/image", image_routes())
}

fn image_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::image::list_images).post(handlers::image::upload_image),
        )
        .route(
            "/{image_id}",
            get(handlers::image::get_image).delete(handlers::image::delete_image),
        )
        .layer(handlers::image::image_upload_body_limit())
}
