//! Token issuance and verification.
//!
//! One verifier serves both adapters: the REST surface applies the soft
//! policy (anonymous callers reach the handler, which decides), the RPC
//! surface the hard one (reject before any business logic).

use axum::http::{header, HeaderMap};
use config::JwtConfig;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    /// Expiry as a unix timestamp, enforced by the signing scheme.
    pub exp: i64,
}

/// Outcome of inspecting a request's credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated { user_id: Uuid, email: String },
    /// No credential supplied at all.
    Anonymous,
    /// A credential was supplied but is garbled, forged or expired.
    Invalid,
}

#[derive(Clone)]
pub struct JwtService {
    expiration_secs: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            expiration_secs: config.expiration_secs,
            encoding_key: EncodingKey::from_secret(config.secret.as_ref()),
            decoding_key: DecodingKey::from_secret(config.secret.as_ref()),
        }
    }

    pub fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String, ApiError> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            user_id,
            email: email.to_owned(),
            exp: now + self.expiration_secs as i64,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| {
            tracing::error!(error = %err, "token generation failed");
            ApiError::internal("token generation failed")
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
    }

    /// Soft policy: classify the credential, never fail the request here.
    pub fn authenticate(&self, headers: &HeaderMap) -> AuthState {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return AuthState::Anonymous;
        };
        let Ok(raw) = value.to_str() else {
            return AuthState::Invalid;
        };
        let Some(token) = raw.strip_prefix("Bearer ") else {
            return AuthState::Invalid;
        };
        match self.verify_token(token) {
            Ok(claims) => AuthState::Authenticated {
                user_id: claims.user_id,
                email: claims.email,
            },
            Err(_) => AuthState::Invalid,
        }
    }

    /// Hard policy: absence or invalidity fails with 401 immediately.
    pub fn require_user(&self, headers: &HeaderMap) -> Result<Uuid, ApiError> {
        match self.authenticate(headers) {
            AuthState::Authenticated { user_id, .. } => Ok(user_id),
            AuthState::Anonymous | AuthState::Invalid => {
                Err(ApiError::unauthorized("not authenticated"))
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
}
