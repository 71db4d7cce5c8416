use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use mongodb::Client;
use tracing_subscriber::EnvFilter;

use opensplit::config::AppConfig;
use opensplit::routes::{self, AppState};
use opensplit::store::Store;

fn cors(config: &AppConfig) -> Cors {
    match &config.allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header(),
        None => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("opensplit={},actix_web=info", config.log_level).into()
            }),
        )
        .init();

    let client = Client::with_uri_str(&config.mongodb_uri)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    tracing::info!(database = %config.database_name, "connected to MongoDB");

    let bind = (config.bind_address.clone(), config.port);
    let state = web::Data::new(AppState {
        store: Store::new(&client, &config.database_name),
        config,
    });

    tracing::info!(address = %bind.0, port = bind.1, "starting server");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors(&state.config))
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
