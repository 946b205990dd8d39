use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use pulse_types::api::Claims;
use pulse_types::models::Role;

/// Issues and verifies the signed identity claims carried by bearer
/// tokens. Stateless by design: no session store, no revocation list.
/// Rotating the secret silently invalidates every outstanding token.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role, email: &str) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            role,
            email: email.to_string(),
            exp: (Utc::now() + chrono::Duration::from_std(self.ttl)?).timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        // Zero leeway so a TTL of T means exactly T, not T plus a minute
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;

        Ok(data.claims)
    }
}
