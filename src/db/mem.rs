use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{LinkIssue, Store, StoreError, SubmitError};
use crate::models::{Admin, Review, ReviewLink, Subscriber};

#[derive(Default)]
struct Inner {
    links: Vec<ReviewLink>,
    reviews: Vec<Review>,
    admins: Vec<Admin>,
    subscribers: Vec<Subscriber>,
}

/// In-memory [`Store`] used by the test suite and local development.
/// The mutex gives the same per-operation atomicity the Postgres store
/// gets from its transactions.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn newest_first<T, F: Fn(&T) -> DateTime<Utc>>(items: &mut Vec<T>, created_at: F) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[async_trait]
impl Store for MemStore {
    async fn create_link(&self, link: ReviewLink) -> Result<ReviewLink, StoreError> {
        let mut inner = self.lock();
        if inner.links.iter().any(|l| l.token == link.token) {
            return Err(StoreError::Conflict);
        }
        inner.links.push(link.clone());
        Ok(link)
    }

    async fn find_link_by_token(&self, token: &str) -> Result<Option<ReviewLink>, StoreError> {
        Ok(self.lock().links.iter().find(|l| l.token == token).cloned())
    }

    async fn list_links(&self) -> Result<Vec<ReviewLink>, StoreError> {
        let mut links = self.lock().links.clone();
        newest_first(&mut links, |l| l.created_at);
        Ok(links)
    }

    async fn delete_link(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.links.len();
        inner.links.retain(|l| l.id != id);
        Ok(inner.links.len() < before)
    }

    async fn consume_link_and_create_review(
        &self,
        review: Review,
        now: DateTime<Utc>,
    ) -> Result<Review, SubmitError> {
        let mut inner = self.lock();
        let link = match inner.links.iter_mut().find(|l| l.token == review.token) {
            None => return Err(SubmitError::Link(LinkIssue::NotFound)),
            Some(link) => link,
        };
        if link.is_expired(now) {
            return Err(SubmitError::Link(LinkIssue::Expired));
        }
        if link.used {
            return Err(SubmitError::Link(LinkIssue::AlreadyUsed));
        }
        link.used = true;
        inner.reviews.push(review.clone());
        Ok(review)
    }

    async fn list_reviews(
        &self,
        only_approved: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = self
            .lock()
            .reviews
            .iter()
            .filter(|r| !only_approved || r.approved)
            .cloned()
            .collect();
        newest_first(&mut reviews, |r| r.created_at);
        if only_approved {
            if let Some(n) = limit {
                reviews.truncate(n as usize);
            }
        }
        Ok(reviews)
    }

    async fn set_review_approved(&self, id: Uuid, approved: bool) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        match inner.reviews.iter_mut().find(|r| r.id == id) {
            Some(review) => {
                review.approved = approved;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.reviews.len();
        inner.reviews.retain(|r| r.id != id);
        Ok(inner.reviews.len() < before)
    }

    async fn create_admin(&self, admin: Admin) -> Result<Admin, StoreError> {
        let mut inner = self.lock();
        if inner
            .admins
            .iter()
            .any(|a| a.username == admin.username || a.email == admin.email)
        {
            return Err(StoreError::Conflict);
        }
        inner.admins.push(admin.clone());
        Ok(admin)
    }

    async fn find_admin_by_login(&self, login: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self
            .lock()
            .admins
            .iter()
            .find(|a| a.username == login || a.email == login)
            .cloned())
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self.lock().admins.iter().find(|a| a.email == email).cloned())
    }

    async fn find_admin_by_reset_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Admin>, StoreError> {
        Ok(self
            .lock()
            .admins
            .iter()
            .find(|a| {
                a.reset_code.as_deref() == Some(code)
                    && a.reset_code_expires.map_or(false, |exp| exp > now)
            })
            .cloned())
    }

    async fn set_reset_code(
        &self,
        id: Uuid,
        code: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(admin) = inner.admins.iter_mut().find(|a| a.id == id) {
            admin.reset_code = Some(code.to_string());
            admin.reset_code_expires = Some(expires);
        }
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(admin) = inner.admins.iter_mut().find(|a| a.id == id) {
            admin.password_hash = hash.to_string();
        }
        Ok(())
    }

    async fn reset_password(&self, id: Uuid, hash: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(admin) = inner.admins.iter_mut().find(|a| a.id == id) {
            admin.password_hash = hash.to_string();
            admin.reset_code = None;
            admin.reset_code_expires = None;
        }
        Ok(())
    }

    async fn create_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber, StoreError> {
        let mut inner = self.lock();
        if inner.subscribers.iter().any(|s| s.email == subscriber.email) {
            return Err(StoreError::Conflict);
        }
        inner.subscribers.push(subscriber.clone());
        Ok(subscriber)
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let mut subscribers = self.lock().subscribers.clone();
        newest_first(&mut subscribers, |s| s.created_at);
        Ok(subscribers)
    }

    async fn delete_subscriber(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id);
        Ok(inner.subscribers.len() < before)
    }
}
