use actix_web::{delete, get, patch, post, web, HttpMessage, HttpRequest, HttpResponse};
use log::info;
use serde_json::json;
use uuid::Uuid;

use crate::dto::{ChangePasswordDto, LoginDto, NewLinkDto, RequestResetDto, ResetPasswordDto};
use crate::errors::ApiError;
use crate::service::auth::AdminIdentity;
use crate::service::{admin, review};
use crate::state::AppState;

// auth endpoints, reachable without a credential

#[post("/login")]
pub async fn login(
    dto: web::Json<LoginDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let response = admin::login(
        dto.into_inner(),
        &state.config.jwt_secret,
        state.store.as_ref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/request-reset")]
pub async fn request_reset(
    dto: web::Json<RequestResetDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    admin::request_reset(dto.into_inner(), state.mailer.as_ref(), state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Код отправлен на email" })))
}

#[post("/reset-password")]
pub async fn reset_password(
    dto: web::Json<ResetPasswordDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    admin::reset_password(dto.into_inner(), state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Пароль успешно изменён" })))
}

#[post("/change-password")]
pub async fn change_password(
    dto: web::Json<ChangePasswordDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    admin::change_password(dto.into_inner(), state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Пароль успешно обновлён" })))
}

// moderation endpoints, behind the AdminGuard

#[post("/review-links")]
pub async fn create_link(
    dto: web::Json<NewLinkDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let link = review::create_link(dto.into_inner(), state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(link))
}

#[get("/review-links")]
pub async fn list_links(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let links = review::list_links(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "links": links })))
}

#[delete("/review-links/{id}")]
pub async fn delete_link(
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    review::delete_link(id.into_inner(), state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Ссылка удалена." })))
}

/// Moderation queue: every review regardless of approval state.
#[get("/reviews")]
pub async fn list_reviews(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reviews = review::all_reviews(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

#[patch("/reviews/{id}/approve")]
pub async fn approve_review(
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    review::set_approved(id.into_inner(), true, state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Отзыв одобрен." })))
}

#[patch("/reviews/{id}/unapprove")]
pub async fn unapprove_review(
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    review::set_approved(id.into_inner(), false, state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Отзыв снят с публикации." })))
}

#[delete("/reviews/{id}")]
pub async fn delete_review(
    req: HttpRequest,
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let review_id = id.into_inner();
    review::delete_review(review_id, state.store.as_ref()).await?;
    if let Some(identity) = req.extensions().get::<AdminIdentity>() {
        info!("review {} deleted by admin {}", review_id, identity.admin_id);
    }
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Отзыв удалён." })))
}

pub fn public_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(request_reset)
        .service(reset_password)
        .service(change_password);
}

pub fn guarded_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_link)
        .service(list_links)
        .service(delete_link)
        .service(list_reviews)
        .service(approve_review)
        .service(unapprove_review)
        .service(delete_review);
}
