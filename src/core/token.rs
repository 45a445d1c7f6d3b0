use anyhow::{Context, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::core::config;

const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Bearer credential payload: identity id, role, and the verified phone.
/// Merchant identities additionally carry their profile id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub sub: String,
    pub role: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<i32>,
    pub exp: i64,
    pub iat: i64,
}

pub fn issue(user_id: i32, role: &str, phone: &str, merchant_id: Option<i32>) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        id: user_id,
        sub: user_id.to_string(),
        role: role.to_string(),
        phone: phone.to_string(),
        merchant_id,
        exp: now + TOKEN_TTL_SECS,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .context("Failed to sign token")
}

pub fn verify(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config::jwt_secret().as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
