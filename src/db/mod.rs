pub mod mem;
pub mod pg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use uuid::Uuid;

use crate::models::{Admin, Review, ReviewLink, Subscriber};

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum StoreError {
    #[display(fmt = "uniqueness violation")]
    Conflict,

    // backend detail is logged at the store impl, never carried upward
    #[display(fmt = "store backend failure")]
    Backend,
}

/// Why a token cannot authorize a submission. Shared by the read-only
/// check and the atomic consume path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkIssue {
    NotFound,
    Expired,
    AlreadyUsed,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    Link(LinkIssue),
    Store(StoreError),
}

/// The single shared mutable resource of the system. One long-lived
/// handle is built at startup and reused by every handler; tests bind
/// [`mem::MemStore`] instead of Postgres.
#[async_trait]
pub trait Store: Send + Sync {
    // review links
    async fn create_link(&self, link: ReviewLink) -> Result<ReviewLink, StoreError>;
    async fn find_link_by_token(&self, token: &str) -> Result<Option<ReviewLink>, StoreError>;
    /// Newest first.
    async fn list_links(&self) -> Result<Vec<ReviewLink>, StoreError>;
    /// Returns false when no link had this id.
    async fn delete_link(&self, id: Uuid) -> Result<bool, StoreError>;

    // reviews
    /// The submission gate. Marks the link identified by `review.token`
    /// used and inserts the review as one atomic step, conditional on the
    /// link still being unused and unexpired at `now`. Under concurrent
    /// submissions against one token exactly one call can succeed.
    async fn consume_link_and_create_review(
        &self,
        review: Review,
        now: DateTime<Utc>,
    ) -> Result<Review, SubmitError>;
    /// Newest first; `limit` only meaningful with `only_approved`.
    async fn list_reviews(
        &self,
        only_approved: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Review>, StoreError>;
    /// Idempotent flag set; false when no review had this id.
    async fn set_review_approved(&self, id: Uuid, approved: bool) -> Result<bool, StoreError>;
    async fn delete_review(&self, id: Uuid) -> Result<bool, StoreError>;

    // admins
    async fn create_admin(&self, admin: Admin) -> Result<Admin, StoreError>;
    /// Matches on username or email.
    async fn find_admin_by_login(&self, login: &str) -> Result<Option<Admin>, StoreError>;
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError>;
    /// Only matches while the stored code expiry is still in the future.
    async fn find_admin_by_reset_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Admin>, StoreError>;
    async fn set_reset_code(
        &self,
        id: Uuid,
        code: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), StoreError>;
    /// Replaces the hash and clears the reset code and its expiry in a
    /// single update, so a code can never be replayed.
    async fn reset_password(&self, id: Uuid, hash: &str) -> Result<(), StoreError>;

    // newsletter
    async fn create_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber, StoreError>;
    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError>;
    async fn delete_subscriber(&self, id: Uuid) -> Result<bool, StoreError>;
}
