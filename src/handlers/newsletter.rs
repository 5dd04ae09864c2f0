use actix_web::{delete, get, post, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::dto::SubscribeDto;
use crate::errors::ApiError;
use crate::service::newsletter;
use crate::state::AppState;

#[post("/")]
pub async fn subscribe(
    dto: web::Json<SubscribeDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    match newsletter::subscribe(
        &dto.email,
        &state.config.admin_email,
        state.mailer.as_ref(),
        state.store.as_ref(),
    )
    .await
    {
        Ok(subscriber) => Ok(HttpResponse::Created().json(json!({
            "message": "Подписка успешна, email отправлен.",
            "subscriber": subscriber,
        }))),
        Err(ApiError::Conflict) => {
            Ok(HttpResponse::BadRequest().json(json!({ "message": "Email уже подписан" })))
        }
        Err(err) => Err(err),
    }
}

#[get("")]
pub async fn list(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let subscribers = newsletter::list(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "subscribers": subscribers })))
}

#[delete("/{id}")]
pub async fn delete(
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    newsletter::delete(id.into_inner(), state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Подписчик удалён" })))
}
