//! Caller identity and ownership checks
//!
//! Sessions are issued by the external auth provider as HS256 bearer tokens.
//! Handlers never read the session directly: they take an [`ActorContext`]
//! (or `Option<ActorContext>` for optional auth) and pass it down explicitly.

use axum::{
    Json, async_trait,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{ConnectionTrait, EntityTrait, PrimaryKeyTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::infrastructure::AppState;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id (uuid)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    pub exp: usize,
}

/// The authenticated caller of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct ActorContext {
    pub user_id: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub full_name: Option<String>,
}

impl ActorContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            nickname: None,
            full_name: None,
        }
    }

    /// Best available display name: nickname, then full name, then email, then "user"
    pub fn display_name(&self) -> String {
        [&self.nickname, &self.full_name, &self.email]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("user")
            .to_string()
    }
}

impl From<Claims> for ActorContext {
    fn from(claims: Claims) -> Self {
        let meta = claims.user_metadata;
        Self {
            user_id: claims.sub,
            email: claims.email,
            nickname: meta.nickname,
            full_name: meta.full_name.or(meta.name),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Login required" })),
            ))?;

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid Authorization header format" })),
            ));
        };

        decode_jwt(token, state.jwt_secret())
            .map(ActorContext::from)
            .map_err(|e| {
                tracing::debug!("Rejected bearer token: {}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Invalid or expired session" })),
                )
            })
    }
}

/// Issue a token in the provider's shape. Used by tooling and tests.
pub fn create_jwt(actor: &ActorContext, secret: &str) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| "expiration overflow".to_string())?
        .timestamp();

    let claims = Claims {
        sub: actor.user_id.clone(),
        email: actor.email.clone(),
        user_metadata: UserMetadata {
            nickname: actor.nickname.clone(),
            full_name: actor.full_name.clone(),
            name: None,
        },
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    let mut validation = Validation::default();
    validation.validate_aud = false;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    Uuid::parse_str(&claims.sub).map_err(|e| format!("subject is not a user id: {}", e))?;
    Ok(claims)
}

/// Records with a single owning user
pub trait Owned {
    fn owner_id(&self) -> &str;
}

impl Owned for crate::models::review::Model {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Owned for crate::models::quote::Model {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Owned for crate::models::quote_comment::Model {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

pub fn ensure_owner(actor: &ActorContext, resource: &impl Owned) -> Result<(), DomainError> {
    if resource.owner_id() == actor.user_id {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// Load a record by id for an update/delete: missing → `NotFound`, someone
/// else's → `Forbidden`.
pub async fn load_owned<E, C>(
    db: &C,
    actor: &ActorContext,
    id: i32,
    what: &str,
) -> Result<E::Model, DomainError>
where
    E: EntityTrait,
    E::Model: Owned,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    let model = E::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found(what))?;
    ensure_owner(actor, &model)?;
    Ok(model)
}
