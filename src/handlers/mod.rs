// HTTP request handlers
pub mod auth;
pub mod callback;
pub mod pages;
pub mod status;


use actix_web::web;

pub use auth::{index, login, logout, oauth_begin};
pub use callback::{callback_query_config, oauth_callback};
pub use status::status;

/// Register every route on an `App`
///
/// Expects `web::Data<AuthGateway>` in the app data.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/status", web::get().to(status))
        .route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout))
        .route("/auth/{provider}", web::get().to(oauth_begin))
        .service(
            web::resource("/auth/{provider}/callback")
                .app_data(callback_query_config())
                .route(web::get().to(oauth_callback)),
        )
        // Versioned aliases
        .route("/api/v1/status", web::get().to(status))
        .route("/api/v1/login", web::post().to(login));
}
