use std::future::{ready, Ready};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::HttpMessage;
use futures_util::future::LocalBoxFuture;
use log::debug;

/// Identity carried through request extensions once the guard has
/// accepted the credential.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub admin_id: uuid::Uuid,
    pub role: String,
}

/// Bearer-credential guard for admin-only scopes. Rejects with 401
/// before the wrapped handler runs.
pub struct AdminGuard {
    pub jwt_secret: String,
}

impl<S, B> Transform<S, ServiceRequest> for AdminGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AdminGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminGuardService {
            service,
            jwt_secret: self.jwt_secret.clone(),
        }))
    }
}

pub struct AdminGuardService<S> {
    service: S,
    jwt_secret: String,
}

impl<S, B> Service<ServiceRequest> for AdminGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verified = jwt::parse_bearer(&req)
            .and_then(|credential| jwt::verify_admin(&credential, &self.jwt_secret));
        match verified {
            Ok(identity) => {
                debug!(
                    "admin {} {} {}",
                    identity.admin_id,
                    req.method(),
                    req.path()
                );
                req.extensions_mut().insert(identity);
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res)
                })
            }
            Err(err) => Box::pin(async move { Err(err.into()) }),
        }
    }
}

pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::Utc;
    use jsonwebtoken::{
        decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
    };

    use super::AdminIdentity;
    use crate::dto::Claims;
    use crate::errors::ApiError;

    /// Admin credentials live for seven days.
    pub const CREDENTIAL_TTL_SECS: usize = 7 * 24 * 60 * 60;

    pub fn create(admin_id: uuid::Uuid, role: &str, secret: &str) -> Result<String, ApiError> {
        let exp = Utc::now().timestamp() as usize + CREDENTIAL_TTL_SECS;
        create_with_exp(admin_id, role, exp, secret)
    }

    pub fn create_with_exp(
        admin_id: uuid::Uuid,
        role: &str,
        exp: usize,
        secret: &str,
    ) -> Result<String, ApiError> {
        let claims = Claims::new(admin_id, role, exp);
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .map_err(|_| ApiError::ServerError)
    }

    pub fn decode_claims(token: &str, secret: &str) -> Result<TokenData<Claims>, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| ApiError::Unauthorized)
    }

    /// Malformed, forged or expired credentials all collapse into
    /// `Unauthorized`; the guarded handler never sees them.
    pub fn verify_admin(credential: &str, secret: &str) -> Result<AdminIdentity, ApiError> {
        let data = decode_claims(credential, secret)?;
        Ok(AdminIdentity {
            admin_id: data.claims.sub,
            role: data.claims.role,
        })
    }

    pub fn parse_bearer(req: &ServiceRequest) -> Result<String, ApiError> {
        if let Some(auth_header) = req.headers().get("Authorization") {
            if let Ok(auth_value) = auth_header.to_str() {
                if let Some(token) = auth_value.strip_prefix("Bearer ") {
                    return Ok(token.trim().to_string());
                }
            }
        }
        Err(ApiError::Unauthorized)
    }
}
