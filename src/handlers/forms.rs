use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::dto::OrderFormDto;
use crate::errors::ApiError;
use crate::state::AppState;

/// Contact-form relay: no persistence, just a formatted mail to the
/// operator.
#[post("/order")]
pub async fn order(
    dto: web::Json<OrderFormDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let dto = dto.into_inner();
    if [&dto.name, &dto.phone, &dto.message, &dto.contact_method]
        .iter()
        .any(|f| f.trim().is_empty())
    {
        return Err(ApiError::BadRequest);
    }

    let html = format!(
        "<div style=\"font-family: Arial, sans-serif;\">\
         <h2>Новый заказ с сайта TA-Travel</h2>\
         <p><strong>Имя:</strong> {}</p>\
         <p><strong>Телефон:</strong> {}</p>\
         <p><strong>Предпочтительный способ связи:</strong> {}</p>\
         <p><strong>Сообщение:</strong> {}</p>\
         <p><strong>Согласие на обработку данных:</strong> {}</p>\
         <p>Дата заявки: {}</p></div>",
        dto.name,
        dto.phone,
        dto.contact_method,
        dto.message,
        if dto.agree { "Да" } else { "Нет" },
        Utc::now().format("%d.%m.%Y %H:%M"),
    );
    state
        .mailer
        .send(&state.config.admin_email, "Новый заказ с сайта TA-Travel", &html)
        .await?;

    Ok(HttpResponse::Created().json(json!({ "message": "Заявка успешно отправлена." })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(order);
}
