use chrono::Utc;
use uuid::Uuid;

use super::mail::Mailer;
use crate::db::Store;
use crate::errors::ApiError;
use crate::models::Subscriber;

const WELCOME_HTML: &str = "<div style=\"font-family: Arial, sans-serif;\">\
<h2 style=\"color: #004AAD;\">Спасибо, что с нами!</h2>\
<p>Вы успешно подписались на новости <strong>TA-Travel</strong>.</p></div>";

/// Records the subscription, then welcomes the subscriber and notifies
/// the site operator. A duplicate email is a `Conflict` before any mail
/// goes out.
pub async fn subscribe(
    email: &str,
    admin_email: &str,
    mailer: &dyn Mailer,
    store: &dyn Store,
) -> Result<Subscriber, ApiError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::BadRequest);
    }
    let subscriber = store
        .create_subscriber(Subscriber {
            id: Uuid::new_v4(),
            email: email.clone(),
            created_at: Utc::now(),
        })
        .await
        .map_err(ApiError::from)?;

    mailer
        .send(&email, "Добро пожаловать в TA Travel!", WELCOME_HTML)
        .await?;
    let notice = format!("<p>Новый подписчик: <strong>{}</strong></p>", email);
    mailer
        .send(admin_email, "Новый подписчик на рассылку TA Travel", &notice)
        .await?;

    Ok(subscriber)
}

pub async fn list(store: &dyn Store) -> Result<Vec<Subscriber>, ApiError> {
    store.list_subscribers().await.map_err(ApiError::from)
}

pub async fn delete(id: Uuid, store: &dyn Store) -> Result<(), ApiError> {
    match store.delete_subscriber(id).await.map_err(ApiError::from)? {
        true => Ok(()),
        false => Err(ApiError::NotFound),
    }
}
