use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Single-use, time-limited permission for one guest to submit one review.
/// Usable iff `used == false` and `expires_at` is still in the future;
/// `used` flips to true exactly once, on successful submission.
#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct ReviewLink {
    pub id: Uuid,
    pub token: String,
    pub guest_name: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl ReviewLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// One guest testimonial. `token` records which link authorized it; it is
/// not a live join. Hidden from public reads until an admin approves it.
#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub token: String,
    pub name: String,
    pub location: String,
    // display string, MMM/YYYY
    pub date: String,
    pub image_url: Option<String>,
    pub rating: Option<i32>,
    pub comment: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub reset_code: Option<String>,
    #[serde(skip_serializing)]
    pub reset_code_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
