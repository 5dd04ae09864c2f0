use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Admin;

#[derive(Debug, Deserialize, Clone)]
pub struct NewLinkDto {
    pub guest_name: Option<String>,
    // caller-supplied, deliberately not checked against "now"
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubmitReviewDto {
    pub token: String,
    pub name: String,
    pub location: String,
    pub date: String,
    pub rating: Option<i32>,
    pub comment: String,
    pub image_url: Option<String>,
}

impl SubmitReviewDto {
    /// Required fields must be non-empty before any store access.
    pub fn has_required_fields(&self) -> bool {
        ![&self.token, &self.name, &self.location, &self.date, &self.comment]
            .iter()
            .any(|f| f.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CheckTokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginDto {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub admin: AdminSummary,
}

#[derive(Debug, Serialize)]
pub struct AdminSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&Admin> for AdminSummary {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            email: admin.email.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RequestResetDto {
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResetPasswordDto {
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChangePasswordDto {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubscribeDto {
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrderFormDto {
    pub name: String,
    pub phone: String,
    pub message: String,
    pub contact_method: String,
    #[serde(default)]
    pub agree: bool,
}

/// JWT payload for the admin credential. `exp` is seconds since epoch,
/// seven days out from issuance.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn new(admin_id: Uuid, role: &str, exp: usize) -> Self {
        Self {
            sub: admin_id,
            role: role.to_string(),
            exp,
        }
    }
}
