use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    config::AppConfig,
    error::{AppError, AppResult},
    models::{Admin, CreatorStamp},
    repository::RepositoryState,
};

/// Lifetime of every issued bearer token.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Claims
///
/// Payload signed into every admin bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the admin's id.
    pub sub: Uuid,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// TokenService
///
/// Issues and verifies HS256 bearer tokens. Built once at startup from the
/// configured secret and shared through `AppState`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(TOKEN_TTL_DAYS),
        }
    }

    /// Overrides the token lifetime. A negative value produces already-expired tokens.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// issue
    ///
    /// Signs a token for `subject` expiring `ttl` from now.
    pub fn issue(&self, subject: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// verify
    ///
    /// Returns the subject of a well-formed, correctly signed, unexpired token.
    /// Malformed, tampered and expired tokens all collapse to `None`.
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                tracing::debug!(reason = ?e.kind(), "bearer token rejected");
                None
            }
        }
    }
}

/// AdminIdentity
///
/// The minimal projection of an admin attached to a request. Never carries the
/// password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

impl From<&Admin> for AdminIdentity {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            full_name: admin.full_name.clone(),
            email: admin.email.clone(),
        }
    }
}

impl From<&AdminIdentity> for CreatorStamp {
    fn from(identity: &AdminIdentity) -> Self {
        CreatorStamp {
            id: Some(identity.id),
            name: Some(identity.full_name.clone()),
            email: Some(identity.email.clone()),
        }
    }
}

/// Identity
///
/// Who, if anyone, made the current request. Every request carries one: the
/// identity gate never rejects, it only decides between the two variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Authenticated(AdminIdentity),
    Anonymous,
}

impl Identity {
    /// Rejects anonymous callers with a 401. Used by every protected operation.
    pub fn require(&self) -> AppResult<&AdminIdentity> {
        match self {
            Identity::Authenticated(admin) => Ok(admin),
            Identity::Anonymous => Err(AppError::admin_required()),
        }
    }

    /// Creator-lineage snapshot for records written by this caller.
    pub fn creator_stamp(&self) -> CreatorStamp {
        match self {
            Identity::Authenticated(admin) => CreatorStamp::from(admin),
            Identity::Anonymous => CreatorStamp::default(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }
}

/// Handlers read the identity the gate left in the request extensions.
/// A route mounted without the gate sees every caller as anonymous.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Identity>()
            .cloned()
            .unwrap_or(Identity::Anonymous))
    }
}

/// bearer_token
///
/// Extracts `<token>` from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// resolve_identity
///
/// The fail-open authentication contract:
/// 1. No bearer header, or a token that fails verification: `Anonymous`.
/// 2. A valid token whose admin no longer exists: `Anonymous`.
/// 3. Otherwise the admin's `{id, fullName, email}`.
///
/// The admin's activation flag is only consulted when `enforce_active_tokens` is
/// set; by default a deactivated admin's unexpired token keeps authenticating.
pub async fn resolve_identity(
    headers: &HeaderMap,
    tokens: &TokenService,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Identity {
    let Some(token) = bearer_token(headers) else {
        return Identity::Anonymous;
    };
    let Some(admin_id) = tokens.verify(token) else {
        return Identity::Anonymous;
    };

    match repo.find_admin_by_id(admin_id).await {
        Ok(Some(admin)) if config.enforce_active_tokens && !admin.is_active => {
            tracing::debug!(%admin_id, "token belongs to a deactivated admin");
            Identity::Anonymous
        }
        Ok(Some(admin)) => Identity::Authenticated(AdminIdentity::from(&admin)),
        Ok(None) => {
            tracing::debug!(%admin_id, "token subject no longer exists");
            Identity::Anonymous
        }
        Err(e) => {
            tracing::error!(%admin_id, error = %e, "identity lookup failed");
            Identity::Anonymous
        }
    }
}

/// identity_gate
///
/// Middleware applied to the whole router. Resolves the caller and stores the
/// resulting `Identity` in the request extensions, then always calls the next
/// stage.
pub async fn identity_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = resolve_identity(request.headers(), &state.tokens, &state.repo, &state.config).await;
    request.extensions_mut().insert(identity);
    next.run(request).await
}
