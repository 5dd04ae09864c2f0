use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{LinkIssue, Store, StoreError, SubmitError};
use crate::models::{Admin, Review, ReviewLink, Subscriber};

/// Postgres-backed [`Store`]. One pool for the whole process.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects, runs pending migrations and returns the store. Startup
    /// only; failure to reach the database is fatal.
    pub async fn connect(db_url: &str) -> PgStore {
        let pool: PgPool = PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .unwrap_or_else(|e| {
                panic!("Failed to connect to postgres: {:?}", e);
            });
        sqlx::migrate!()
            .run(&pool)
            .await
            .unwrap_or_else(|e| {
                panic!("Failed to run migrations: {:?}", e);
            });
        info!("connected to postgres");
        PgStore { pool }
    }
}

fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict;
        }
    }
    error!("postgres failure: {:?}", err);
    StoreError::Backend
}

#[async_trait]
impl Store for PgStore {
    async fn create_link(&self, link: ReviewLink) -> Result<ReviewLink, StoreError> {
        sqlx::query(
            "INSERT INTO review_links (id, token, guest_name, expires_at, used, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(link.id)
        .bind(&link.token)
        .bind(&link.guest_name)
        .bind(link.expires_at)
        .bind(link.used)
        .bind(link.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(link)
    }

    async fn find_link_by_token(&self, token: &str) -> Result<Option<ReviewLink>, StoreError> {
        sqlx::query_as::<_, ReviewLink>("SELECT * FROM review_links WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn list_links(&self) -> Result<Vec<ReviewLink>, StoreError> {
        sqlx::query_as::<_, ReviewLink>("SELECT * FROM review_links ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn delete_link(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM review_links WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn consume_link_and_create_review(
        &self,
        review: Review,
        now: DateTime<Utc>,
    ) -> Result<Review, SubmitError> {
        let store_err = |e: sqlx::Error| SubmitError::Store(map_sqlx_err(e));

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        // The gate: flip `used` only if the link is still usable. A
        // second concurrent submission sees zero rows here and is
        // rejected before any review row exists.
        let gate = sqlx::query(
            "UPDATE review_links SET used = TRUE
             WHERE token = $1 AND used = FALSE AND expires_at > $2",
        )
        .bind(&review.token)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if gate.rows_affected() == 0 {
            let link =
                sqlx::query_as::<_, ReviewLink>("SELECT * FROM review_links WHERE token = $1")
                    .bind(&review.token)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(store_err)?;
            let issue = match link {
                None => LinkIssue::NotFound,
                Some(l) if l.is_expired(now) => LinkIssue::Expired,
                Some(_) => LinkIssue::AlreadyUsed,
            };
            return Err(SubmitError::Link(issue));
        }

        sqlx::query(
            "INSERT INTO reviews
               (id, token, name, location, date, image_url, rating, comment, approved, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(review.id)
        .bind(&review.token)
        .bind(&review.name)
        .bind(&review.location)
        .bind(&review.date)
        .bind(&review.image_url)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.approved)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(review)
    }

    async fn list_reviews(
        &self,
        only_approved: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Review>, StoreError> {
        let res = match (only_approved, limit) {
            (true, Some(n)) => {
                sqlx::query_as::<_, Review>(
                    "SELECT * FROM reviews WHERE approved = TRUE
                     ORDER BY created_at DESC LIMIT $1",
                )
                .bind(n)
                .fetch_all(&self.pool)
                .await
            }
            (true, None) => {
                sqlx::query_as::<_, Review>(
                    "SELECT * FROM reviews WHERE approved = TRUE ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
            (false, _) => {
                sqlx::query_as::<_, Review>("SELECT * FROM reviews ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await
            }
        };
        res.map_err(map_sqlx_err)
    }

    async fn set_review_approved(&self, id: Uuid, approved: bool) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE reviews SET approved = $2 WHERE id = $1")
            .bind(id)
            .bind(approved)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn create_admin(&self, admin: Admin) -> Result<Admin, StoreError> {
        sqlx::query(
            "INSERT INTO admins
               (id, username, email, password_hash, role, reset_code, reset_code_expires, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(admin.id)
        .bind(&admin.username)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.role)
        .bind(&admin.reset_code)
        .bind(admin.reset_code_expires)
        .bind(admin.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(admin)
    }

    async fn find_admin_by_login(&self, login: &str) -> Result<Option<Admin>, StoreError> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = $1 OR email = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn find_admin_by_reset_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Admin>, StoreError> {
        sqlx::query_as::<_, Admin>(
            "SELECT * FROM admins WHERE reset_code = $1 AND reset_code_expires > $2",
        )
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)
    }

    async fn set_reset_code(
        &self,
        id: Uuid,
        code: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE admins SET reset_code = $2, reset_code_expires = $3 WHERE id = $1")
            .bind(id)
            .bind(code)
            .bind(expires)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE admins SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn reset_password(&self, id: Uuid, hash: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE admins
             SET password_hash = $2, reset_code = NULL, reset_code_expires = NULL
             WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn create_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber, StoreError> {
        sqlx::query("INSERT INTO newsletter_subscribers (id, email, created_at) VALUES ($1, $2, $3)")
            .bind(subscriber.id)
            .bind(&subscriber.email)
            .bind(subscriber.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(subscriber)
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        sqlx::query_as::<_, Subscriber>(
            "SELECT * FROM newsletter_subscribers ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)
    }

    async fn delete_subscriber(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM newsletter_subscribers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(res.rows_affected() > 0)
    }
}
