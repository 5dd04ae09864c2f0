use actix_web::{
    error,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use derive_more::{Display, Error};

/// Crate-wide error taxonomy. Every handler translates store and
/// collaborator failures into one of these before responding.
#[derive(Debug, Display, Error, serde::Deserialize, serde::Serialize)]
pub enum ApiError {
    #[display(fmt = "bad request")]
    BadRequest,

    #[display(fmt = "unauthorized")]
    Unauthorized,

    #[display(fmt = "not found")]
    NotFound,

    #[display(fmt = "conflict")]
    Conflict,

    // Guest-facing rejection of a review token: unknown, expired or
    // already consumed. Kept apart from NotFound on purpose.
    #[display(fmt = "invalid link")]
    InvalidLink,

    #[display(fmt = "server error")]
    ServerError,
}

impl From<crate::db::StoreError> for ApiError {
    fn from(err: crate::db::StoreError) -> Self {
        match err {
            crate::db::StoreError::Conflict => ApiError::Conflict,
            crate::db::StoreError::Backend => ApiError::ServerError,
        }
    }
}

impl error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(serde_json::json!({ "message": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::InvalidLink => StatusCode::BAD_REQUEST,
            ApiError::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
