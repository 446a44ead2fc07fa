#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sessiongate::{configure_services, AppSettings, AuthGateway};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let gateway = AuthGateway::from_settings(&settings)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize OAuth providers: {e}")))?;

    start_server(gateway, settings).await
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(gateway: AuthGateway, settings: AppSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &gateway, &settings);

    let gateway = web::Data::new(gateway);
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(gateway.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, gateway: &AuthGateway, settings: &AppSettings) {
    println!(
        "Starting sessiongate {} on http://{bind_address}",
        sessiongate::VERSION
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /status, /api/v1/status  - Health check");
    println!("  POST /login, /api/v1/login    - Basic auth login");
    println!("  POST /logout                  - Clear session");
    println!("  GET  /                        - Session info or sign-in page");
    println!("  GET  /auth/{{provider}}          - Begin OAuth sign-in");
    println!("  GET  /auth/{{provider}}/callback - OAuth callback");
    println!();
    let registry = gateway.registry();
    if registry.is_empty() {
        println!("No OAuth providers enabled");
    } else {
        println!("OAuth callback URLs for identity providers:");
        for name in registry.names() {
            println!("  {}", registry.callback_url(name));
        }
    }
    println!();
    println!(
        "Handshake TTL: {} minutes, provider exchange timeout: {}s",
        settings.session.handshake_ttl_minutes, settings.oauth.exchange_timeout_seconds
    );
}
