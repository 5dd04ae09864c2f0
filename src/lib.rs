pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;
pub mod state;

use actix_web::web;

use service::auth::AdminGuard;
use state::AppState;

/// Mounts every scope onto an `App`. Shared between `main` and the
/// integration tests, which build the exact same route tree around an
/// in-memory store.
pub fn app_routes(cfg: &mut web::ServiceConfig, state: &web::Data<AppState>) {
    let jwt_secret = state.config.jwt_secret.clone();
    cfg.app_data(state.clone())
        .service(
            web::scope("/api/admin")
                .configure(handlers::admin::public_routes)
                .service(
                    web::scope("")
                        .wrap(AdminGuard {
                            jwt_secret: jwt_secret.clone(),
                        })
                        .configure(handlers::admin::guarded_routes),
                ),
        )
        .service(web::scope("/api/reviews").configure(handlers::reviews::init_routes))
        .service(
            web::scope("/api/newsletter")
                .service(handlers::newsletter::subscribe)
                .service(
                    web::scope("/admin")
                        .wrap(AdminGuard { jwt_secret })
                        .service(handlers::newsletter::list)
                        .service(handlers::newsletter::delete),
                ),
        )
        .service(web::scope("/api/forms").configure(handlers::forms::init_routes))
        .service(web::scope("/api/analytics").configure(handlers::analytics::init_routes))
        .service(web::scope("/api/storage").configure(handlers::storage::init_routes));
}
