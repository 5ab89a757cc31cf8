//! # ms-api
//!
//! The web routing and orchestration layer for Mediashare.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod views;

pub use handlers::AppState;

use actix_web::web;

/// Configures the routes for the media site.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // Featured media
            .route("/", web::get().to(handlers::home))
            // Browsing and search (?page=N, ?query=...)
            .route("/media", web::get().to(handlers::media_list))
            .route("/search", web::get().to(handlers::media_search))
            .route("/media/{id}", web::get().to(handlers::media_detail))
            // Creator actions
            .route("/upload", web::post().to(handlers::upload_media))
            .route("/media/{id}/active", web::post().to(handlers::set_active))
            // Consumer actions
            .route("/media/{id}/comment", web::post().to(handlers::add_comment))
            .route("/media/{id}/rate", web::post().to(handlers::add_rating))
            // Accounts
            .route("/users", web::post().to(handlers::register_user))
            .route("/users/{id}", web::get().to(handlers::get_user))
            .route("/users/{id}", web::delete().to(handlers::delete_user)),
    );
}
