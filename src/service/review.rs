use chrono::Utc;
use uuid::Uuid;

use super::crypto;
use crate::db::{Store, SubmitError};
use crate::dto::{NewLinkDto, SubmitReviewDto};
use crate::errors::ApiError;
use crate::models::{Review, ReviewLink};

/// Homepage teaser shows only the newest approved reviews.
pub const TEASER_LIMIT: i64 = 4;

/// Admin-issued invitation. `expires_at` is taken as given; issuing an
/// already-expired link is the caller's mistake and is rejected later,
/// at check/submit time.
pub async fn create_link(dto: NewLinkDto, store: &dyn Store) -> Result<ReviewLink, ApiError> {
    let link = ReviewLink {
        id: Uuid::new_v4(),
        token: crypto::generate_link_token(),
        guest_name: dto.guest_name,
        expires_at: dto.expires_at,
        used: false,
        created_at: Utc::now(),
    };
    store.create_link(link).await.map_err(ApiError::from)
}

pub async fn list_links(store: &dyn Store) -> Result<Vec<ReviewLink>, ApiError> {
    store.list_links().await.map_err(ApiError::from)
}

pub async fn delete_link(id: Uuid, store: &dyn Store) -> Result<(), ApiError> {
    match store.delete_link(id).await.map_err(ApiError::from)? {
        true => Ok(()),
        false => Err(ApiError::NotFound),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Expired,
    AlreadyUsed,
}

/// Pre-flight check before the client renders the submission form.
/// Strictly read-only; it never mutates the link, and it is not
/// sufficient authorization for a submission (the submit path gates
/// again on its own).
pub async fn check_token(token: &str, store: &dyn Store) -> Result<TokenStatus, ApiError> {
    let link = store
        .find_link_by_token(token)
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::NotFound)?;
    if link.is_expired(Utc::now()) {
        return Ok(TokenStatus::Expired);
    }
    if link.used {
        return Ok(TokenStatus::AlreadyUsed);
    }
    Ok(TokenStatus::Valid)
}

/// Guest submission. Field validation happens before any store access;
/// the consume-link-and-insert step is one atomic store operation, so a
/// token can never authorize two reviews even under concurrent requests.
pub async fn submit(dto: SubmitReviewDto, store: &dyn Store) -> Result<Review, ApiError> {
    if !dto.has_required_fields() {
        return Err(ApiError::BadRequest);
    }
    let review = Review {
        id: Uuid::new_v4(),
        token: dto.token,
        name: dto.name,
        location: dto.location,
        date: dto.date,
        image_url: dto.image_url,
        rating: dto.rating,
        comment: dto.comment,
        approved: false,
        created_at: Utc::now(),
    };
    match store.consume_link_and_create_review(review, Utc::now()).await {
        Ok(review) => Ok(review),
        Err(SubmitError::Link(_)) => Err(ApiError::InvalidLink),
        Err(SubmitError::Store(e)) => Err(e.into()),
    }
}

pub async fn latest_approved(store: &dyn Store) -> Result<Vec<Review>, ApiError> {
    store
        .list_reviews(true, Some(TEASER_LIMIT))
        .await
        .map_err(ApiError::from)
}

pub async fn all_approved(store: &dyn Store) -> Result<Vec<Review>, ApiError> {
    store.list_reviews(true, None).await.map_err(ApiError::from)
}

/// Moderation queue: every review, approved or not.
pub async fn all_reviews(store: &dyn Store) -> Result<Vec<Review>, ApiError> {
    store.list_reviews(false, None).await.map_err(ApiError::from)
}

/// Idempotent: approving an approved review (or unapproving an
/// unapproved one) is not an error.
pub async fn set_approved(id: Uuid, approved: bool, store: &dyn Store) -> Result<(), ApiError> {
    match store.set_review_approved(id, approved).await.map_err(ApiError::from)? {
        true => Ok(()),
        false => Err(ApiError::NotFound),
    }
}

pub async fn delete_review(id: Uuid, store: &dyn Store) -> Result<(), ApiError> {
    match store.delete_review(id).await.map_err(ApiError::from)? {
        true => Ok(()),
        false => Err(ApiError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mem::MemStore;
    use chrono::Duration;

    fn submission(token: &str) -> SubmitReviewDto {
        SubmitReviewDto {
            token: token.to_string(),
            name: "Anna".to_string(),
            location: "Moscow".to_string(),
            date: "Jul/2026".to_string(),
            rating: Some(5),
            comment: "Wonderful trip".to_string(),
            image_url: None,
        }
    }

    async fn issue_link(store: &MemStore, ttl_secs: i64) -> ReviewLink {
        create_link(
            NewLinkDto {
                guest_name: Some("Anna".to_string()),
                expires_at: Utc::now() + Duration::seconds(ttl_secs),
            },
            store,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn token_is_single_use() {
        let store = MemStore::new();
        let link = issue_link(&store, 3600).await;

        let review = submit(submission(&link.token), &store).await.unwrap();
        assert!(!review.approved);

        let second = submit(submission(&link.token), &store).await;
        assert!(matches!(second, Err(ApiError::InvalidLink)));
        assert_eq!(all_reviews(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_submissions_spend_the_link_exactly_once() {
        let store = MemStore::new();
        let link = issue_link(&store, 3600).await;

        let (first, second) = tokio::join!(
            submit(submission(&link.token), &store),
            submit(submission(&link.token), &store)
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ApiError::InvalidLink))));
        assert_eq!(all_reviews(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_link_is_rejected_everywhere() {
        let store = MemStore::new();
        let link = issue_link(&store, -1).await;

        assert_eq!(
            check_token(&link.token, &store).await.unwrap(),
            TokenStatus::Expired
        );
        let res = submit(submission(&link.token), &store).await;
        assert!(matches!(res, Err(ApiError::InvalidLink)));
    }

    #[tokio::test]
    async fn used_flag_never_reverts() {
        let store = MemStore::new();
        let link = issue_link(&store, 3600).await;

        assert_eq!(
            check_token(&link.token, &store).await.unwrap(),
            TokenStatus::Valid
        );
        submit(submission(&link.token), &store).await.unwrap();
        assert_eq!(
            check_token(&link.token, &store).await.unwrap(),
            TokenStatus::AlreadyUsed
        );
        // still used on a later read
        assert_eq!(
            check_token(&link.token, &store).await.unwrap(),
            TokenStatus::AlreadyUsed
        );
    }

    #[tokio::test]
    async fn check_token_has_no_side_effect() {
        let store = MemStore::new();
        let link = issue_link(&store, 3600).await;

        for _ in 0..3 {
            assert_eq!(
                check_token(&link.token, &store).await.unwrap(),
                TokenStatus::Valid
            );
        }
        let stored = store.find_link_by_token(&link.token).await.unwrap().unwrap();
        assert!(!stored.used);
    }

    #[tokio::test]
    async fn unknown_token() {
        let store = MemStore::new();
        assert!(matches!(
            check_token("deadbeef", &store).await,
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            submit(submission("deadbeef"), &store).await,
            Err(ApiError::InvalidLink)
        ));
    }

    #[tokio::test]
    async fn missing_required_fields_fail_before_store_access() {
        let store = MemStore::new();
        let link = issue_link(&store, 3600).await;

        let mut dto = submission(&link.token);
        dto.name = "  ".to_string();
        assert!(matches!(submit(dto, &store).await, Err(ApiError::BadRequest)));

        // the link is untouched
        assert_eq!(
            check_token(&link.token, &store).await.unwrap(),
            TokenStatus::Valid
        );
    }

    #[tokio::test]
    async fn approval_is_idempotent_and_reversible() {
        let store = MemStore::new();
        let link = issue_link(&store, 3600).await;
        let review = submit(submission(&link.token), &store).await.unwrap();

        set_approved(review.id, true, &store).await.unwrap();
        set_approved(review.id, true, &store).await.unwrap();
        assert!(all_approved(&store).await.unwrap()[0].approved);

        set_approved(review.id, false, &store).await.unwrap();
        assert!(all_approved(&store).await.unwrap().is_empty());

        set_approved(review.id, true, &store).await.unwrap();
        assert_eq!(all_approved(&store).await.unwrap().len(), 1);

        assert!(matches!(
            set_approved(Uuid::new_v4(), true, &store).await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn public_reads_only_expose_approved_reviews() {
        let store = MemStore::new();
        let mut approved_ids = Vec::new();
        for i in 0..6 {
            let link = issue_link(&store, 3600).await;
            let review = submit(submission(&link.token), &store).await.unwrap();
            if i % 2 == 0 {
                set_approved(review.id, true, &store).await.unwrap();
                approved_ids.push(review.id);
            }
        }

        let teaser = latest_approved(&store).await.unwrap();
        assert!(teaser.len() <= TEASER_LIMIT as usize);
        assert!(teaser.iter().all(|r| r.approved));

        let all = all_approved(&store).await.unwrap();
        assert_eq!(all.len(), approved_ids.len());
        assert!(all.iter().all(|r| r.approved));

        // the moderation queue sees everything
        assert_eq!(all_reviews(&store).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn links_can_be_deleted_regardless_of_use_state() {
        let store = MemStore::new();
        let fresh = issue_link(&store, 3600).await;
        let used = issue_link(&store, 3600).await;
        submit(submission(&used.token), &store).await.unwrap();

        delete_link(fresh.id, &store).await.unwrap();
        delete_link(used.id, &store).await.unwrap();
        assert!(list_links(&store).await.unwrap().is_empty());
        assert!(matches!(
            delete_link(fresh.id, &store).await,
            Err(ApiError::NotFound)
        ));
    }
}
