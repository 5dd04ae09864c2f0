use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{auth, crypto, mail::Mailer};
use crate::db::Store;
use crate::dto::{
    AdminSummary, ChangePasswordDto, LoginDto, LoginResponse, RequestResetDto, ResetPasswordDto,
};
use crate::errors::ApiError;
use crate::models::Admin;

/// Reset codes stay valid for ten minutes.
const RESET_CODE_TTL_MINS: i64 = 10;

/// Looks the account up by username or email, verifies the password
/// against the stored hash and issues a fresh seven-day credential.
pub async fn login(
    dto: LoginDto,
    jwt_secret: &str,
    store: &dyn Store,
) -> Result<LoginResponse, ApiError> {
    let login = dto
        .username
        .or(dto.email)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ApiError::BadRequest)?;
    let admin = store
        .find_admin_by_login(login.trim())
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::NotFound)?;
    if !crypto::verify_password(&dto.password, &admin.password_hash) {
        return Err(ApiError::Unauthorized);
    }
    let token = auth::jwt::create(admin.id, &admin.role, jwt_secret)?;
    Ok(LoginResponse {
        success: true,
        token,
        admin: AdminSummary::from(&admin),
    })
}

/// Stores a 6-digit code with a short expiry and mails it out. A newer
/// request simply overwrites the previous code.
pub async fn request_reset(
    dto: RequestResetDto,
    mailer: &dyn Mailer,
    store: &dyn Store,
) -> Result<(), ApiError> {
    if dto.email.trim().is_empty() {
        return Err(ApiError::BadRequest);
    }
    let admin = store
        .find_admin_by_email(dto.email.trim())
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::NotFound)?;

    let code = crypto::generate_reset_code();
    let expires = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINS);
    store
        .set_reset_code(admin.id, &code, expires)
        .await
        .map_err(ApiError::from)?;

    let html = format!(
        "<p>Ваш код для сброса пароля: <strong>{}</strong></p><p>Он действителен 10 минут.</p>",
        code
    );
    mailer
        .send(&admin.email, "Сброс пароля для админа", &html)
        .await
}

/// A matching, unexpired code replaces the hash and clears the code in
/// one store update, so it cannot be replayed.
pub async fn reset_password(dto: ResetPasswordDto, store: &dyn Store) -> Result<(), ApiError> {
    if dto.code.trim().is_empty() || dto.new_password.trim().is_empty() {
        return Err(ApiError::BadRequest);
    }
    let admin = store
        .find_admin_by_reset_code(dto.code.trim(), Utc::now())
        .await
        .map_err(ApiError::from)?
        // invalid and expired codes are indistinguishable to the caller
        .ok_or(ApiError::BadRequest)?;

    let hash = crypto::hash_password(&dto.new_password)?;
    store
        .reset_password(admin.id, &hash)
        .await
        .map_err(ApiError::from)
}

pub async fn change_password(dto: ChangePasswordDto, store: &dyn Store) -> Result<(), ApiError> {
    if dto.email.trim().is_empty()
        || dto.old_password.trim().is_empty()
        || dto.new_password.trim().is_empty()
    {
        return Err(ApiError::BadRequest);
    }
    let admin = store
        .find_admin_by_email(dto.email.trim())
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::NotFound)?;
    if !crypto::verify_password(&dto.old_password, &admin.password_hash) {
        return Err(ApiError::Unauthorized);
    }
    let hash = crypto::hash_password(&dto.new_password)?;
    store
        .set_password_hash(admin.id, &hash)
        .await
        .map_err(ApiError::from)
}

/// Out-of-band provisioning, used by the `create-admin` binary.
pub async fn provision(
    username: &str,
    email: &str,
    password: &str,
    store: &dyn Store,
) -> Result<Admin, ApiError> {
    let admin = Admin {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: crypto::hash_password(password)?,
        role: "admin".to_string(),
        reset_code: None,
        reset_code_expires: None,
        created_at: Utc::now(),
    };
    store.create_admin(admin).await.map_err(ApiError::from)
}
