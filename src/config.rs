use std::env;

/// Process configuration, read once at startup from the environment
/// (`.env` is loaded by `main` before this runs).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub brevo_api_key: String,
    pub admin_email: String,
    pub yandex_oauth_token: Option<String>,
    pub ga_property_id: String,
    pub ga_access_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|e| {
            panic!("Failed to get env with name 'DATABASE_URL': {:?}", e);
        });
        let jwt_secret = env::var("ADMIN_JWT_SECRET").unwrap_or_else(|e| {
            panic!("Failed to get env with name 'ADMIN_JWT_SECRET': {:?}", e);
        });
        Self {
            database_url,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            jwt_secret,
            brevo_api_key: env::var("BREVO_API_KEY").unwrap_or_default(),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_default(),
            yandex_oauth_token: env::var("YANDEX_OAUTH_TOKEN").ok(),
            ga_property_id: env::var("GA_PROPERTY_ID").unwrap_or_default(),
            ga_access_token: env::var("GA_ACCESS_TOKEN").ok(),
        }
    }
}
