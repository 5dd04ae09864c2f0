use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use ta_travel_backend::config::Config;
use ta_travel_backend::db::pg::PgStore;
use ta_travel_backend::service::analytics::GaClient;
use ta_travel_backend::service::log::{init_logger, RequestLogger};
use ta_travel_backend::service::mail::BrevoMailer;
use ta_travel_backend::service::storage::DiskClient;
use ta_travel_backend::state::AppState;
use ta_travel_backend::app_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    init_logger();

    let config = Config::from_env();
    let store = Arc::new(PgStore::connect(&config.database_url).await);
    let mailer = Arc::new(BrevoMailer::new(&config.brevo_api_key));
    let ga = Arc::new(GaClient::new(
        &config.ga_property_id,
        config.ga_access_token.as_deref().unwrap_or_default(),
    ));
    let disk = config
        .yandex_oauth_token
        .as_deref()
        .map(|token| Arc::new(DiskClient::new(token)));

    let port = config.port;
    let state = web::Data::new(AppState {
        store,
        mailer,
        ga,
        disk,
        config,
    });

    info!("server running on port {}", port);
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(RequestLogger)
            .configure(|cfg| app_routes(cfg, &state))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
