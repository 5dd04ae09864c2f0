use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::dto::{CheckTokenQuery, SubmitReviewDto};
use crate::errors::ApiError;
use crate::service::review::{self, TokenStatus};
use crate::state::AppState;

/// Pre-flight token check for the submission form. Read-only; guests
/// get localized messages, never internals.
#[get("/check-token")]
pub async fn check_token(
    query: web::Query<CheckTokenQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let token = match query.token.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => {
            return Ok(HttpResponse::BadRequest()
                .json(json!({ "valid": false, "message": "Токен отсутствует." })))
        }
    };
    match review::check_token(&token, state.store.as_ref()).await {
        Ok(TokenStatus::Valid) => Ok(HttpResponse::Ok().json(json!({ "valid": true }))),
        Ok(TokenStatus::Expired) => Ok(HttpResponse::BadRequest().json(json!({
            "valid": false, "reason": "expired",
            "message": "Срок действия ссылки истек.",
        }))),
        Ok(TokenStatus::AlreadyUsed) => Ok(HttpResponse::BadRequest().json(json!({
            "valid": false, "reason": "already used",
            "message": "Ссылка уже была использована.",
        }))),
        Err(ApiError::NotFound) => Ok(HttpResponse::NotFound()
            .json(json!({ "valid": false, "message": "Ссылка не найдена." }))),
        Err(err) => Err(err),
    }
}

#[post("/submit-review")]
pub async fn submit_review(
    dto: web::Json<SubmitReviewDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    match review::submit(dto.into_inner(), state.store.as_ref()).await {
        Ok(review) => Ok(HttpResponse::Created().json(json!({
            "message": "Отзыв отправлен.",
            "review": review,
        }))),
        Err(ApiError::InvalidLink) => Ok(HttpResponse::BadRequest()
            .json(json!({ "message": "Недействительная ссылка." }))),
        Err(err) => Err(err),
    }
}

/// Homepage teaser: the four newest approved reviews.
#[get("/")]
pub async fn latest_approved(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reviews = review::latest_approved(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

#[get("/approved")]
pub async fn approved(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reviews = review::all_approved(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// Testimonials page: every approved review.
#[get("/all")]
pub async fn all_approved(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reviews = review::all_approved(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(check_token)
        .service(submit_review)
        .service(approved)
        .service(all_approved)
        .service(latest_approved);
}
