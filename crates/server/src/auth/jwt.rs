//! Identity validation. Tokens are minted elsewhere (account service or the
//! `issue-token` binary); the match server only checks them.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User name.
    pub sub: String,
    pub exp: i64,
}

pub fn create_token(username: &str, secret: &str, expire_hours: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::hours(expire_hours);
    let claims = Claims {
        sub: username.to_string(),
        exp: expiration.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// The user name bound to `token`, or `None` if the token is malformed,
/// signed with another key, or expired.
pub fn verify_token(token: &str, secret: &str) -> Option<String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.sub)
    .filter(|name| !name.is_empty())
}
