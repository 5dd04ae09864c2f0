use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    period: Option<String>,
}

impl PeriodQuery {
    fn period(&self) -> &str {
        self.period.as_deref().unwrap_or("monthly")
    }
}

#[get("/overview")]
pub async fn overview(
    query: web::Query<PeriodQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let overview = state.ga.overview(query.period()).await?;
    Ok(HttpResponse::Ok().json(overview))
}

#[get("/devices")]
pub async fn devices(
    query: web::Query<PeriodQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let devices = state.ga.devices(query.period()).await?;
    Ok(HttpResponse::Ok().json(devices))
}

#[get("/sources")]
pub async fn sources(
    query: web::Query<PeriodQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let sources = state.ga.sources(query.period()).await?;
    Ok(HttpResponse::Ok().json(sources))
}

#[get("/top-pages")]
pub async fn top_pages(
    query: web::Query<PeriodQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let pages = state.ga.top_pages(query.period()).await?;
    Ok(HttpResponse::Ok().json(pages))
}

#[get("/session-duration")]
pub async fn session_duration(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let days = state.ga.session_duration().await?;
    Ok(HttpResponse::Ok().json(days))
}

#[get("/conversions")]
pub async fn conversions(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let events = state.ga.conversions().await?;
    Ok(HttpResponse::Ok().json(events))
}

#[get("/real-time")]
pub async fn real_time(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let snapshot = state.ga.realtime().await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(overview)
        .service(devices)
        .service(sources)
        .service(top_pages)
        .service(session_duration)
        .service(conversions)
        .service(real_time);
}
