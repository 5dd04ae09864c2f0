use actix_web::{post, web, HttpResponse};
use log::error;
use serde::Deserialize;
use serde_json::json;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// Read-through proxy to the cloud-storage collaborator: accepts the
/// raw blob, hands back the public retrieval URLs.
#[post("/upload")]
pub async fn upload(
    query: web::Query<UploadQuery>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    if query.filename.trim().is_empty() || body.is_empty() {
        return Err(ApiError::BadRequest);
    }
    let disk = state.disk.as_ref().ok_or_else(|| {
        error!("storage upload requested but YANDEX_OAUTH_TOKEN is not configured");
        ApiError::ServerError
    })?;
    let result = disk.upload(query.filename.trim(), body.to_vec()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Файл успешно загружен!",
        "file_name": result.file_name,
        "public_url": result.public_url,
        "direct_url": result.direct_url,
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload);
}
