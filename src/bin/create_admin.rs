//! Out-of-band admin provisioning:
//! `ADMIN_USERNAME=... ADMIN_EMAIL=... ADMIN_PASSWORD=... cargo run --bin create_admin`

use std::env;

use dotenv::dotenv;

use ta_travel_backend::db::pg::PgStore;
use ta_travel_backend::service::admin;
use ta_travel_backend::service::log::init_logger;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logger();

    let username = env::var("ADMIN_USERNAME").unwrap_or_else(|e| {
        panic!("Failed to get env with name 'ADMIN_USERNAME': {:?}", e);
    });
    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|e| {
        panic!("Failed to get env with name 'ADMIN_EMAIL': {:?}", e);
    });
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|e| {
        panic!("Failed to get env with name 'ADMIN_PASSWORD': {:?}", e);
    });

    let db_url = env::var("DATABASE_URL").unwrap_or_else(|e| {
        panic!("Failed to get env with name 'DATABASE_URL': {:?}", e);
    });
    let store = PgStore::connect(&db_url).await;

    match admin::provision(&username, &email, &password, &store).await {
        Ok(created) => {
            println!("admin '{}' ({}) created: {}", created.username, created.email, created.id);
        }
        Err(err) => {
            eprintln!("failed to create admin: {}", err);
            std::process::exit(1);
        }
    }
}
