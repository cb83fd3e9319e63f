use actix_web::{web, App, HttpServer};
use log::info;

use advantage_chess::config::ServerConfig;
use advantage_chess::models::AppState;
use advantage_chess::routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let bind_address = config.bind_address.clone();
    match config.seed {
        Some(seed) => info!("Advantage assignment seeded with {}", seed),
        None => info!("Advantage assignment seeded from entropy"),
    }
    info!("Starting advantage chess server at http://{}", bind_address);

    // Create shared application state
    let app_state = web::Data::new(AppState::new(config));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(configure_routes)
    })
    .bind(bind_address)?
    .run()
    .await
}
