use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ACCESS_TOKEN_MINUTES: i64 = 15;

/// Access token claims. Roles are per organization and looked up on each
/// request, so they are not carried in the token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub sys: bool,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, is_system_admin: bool) -> Self {
        Self {
            sub: user_id,
            sys: is_system_admin,
            exp: (Utc::now() + Duration::minutes(ACCESS_TOKEN_MINUTES)).timestamp(),
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-long-enough-for-hs256";

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = encode_token(&Claims::new(Uuid::now_v7(), false), SECRET).unwrap();
        assert!(decode_token(&token, "another-secret-entirely-different").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = Claims::new(Uuid::now_v7(), false);
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = encode_token(&claims, SECRET).unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn valid_token_carries_user() {
        let user_id = Uuid::now_v7();
        let token = encode_token(&Claims::new(user_id, true), SECRET).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.sys);
    }
}
