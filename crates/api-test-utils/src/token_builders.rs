//! Builder for hand-crafted test JWTs.

use crate::fixtures::TEST_JWT_SECRET;
use chrono::{Duration, Utc};
use common::jwt::UserClaims;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

/// Builder for user JWTs with arbitrary timing.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user_id(1)
///     .issued_at(Utc::now().timestamp() - 10_000)
///     .sign();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    username: String,
    iat: i64,
    exp: i64,
    jti: String,
}

impl TestTokenBuilder {
    /// Defaults: subject "1", issued now, valid for an hour.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "1".to_string(),
            username: "test-user".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn for_user_id(mut self, user_id: i32) -> Self {
        self.sub = user_id.to_string();
        self
    }

    /// Raw subject, for tokens whose `sub` is not a user id.
    pub fn with_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    /// Expiration in seconds from now. Negative values produce expired tokens.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    pub fn build(self) -> UserClaims {
        UserClaims {
            sub: self.sub,
            username: self.username,
            iat: self.iat,
            exp: self.exp,
            jti: self.jti,
        }
    }

    /// Sign with [`TEST_JWT_SECRET`].
    pub fn sign(self) -> String {
        self.sign_with(TEST_JWT_SECRET)
    }

    pub fn sign_with(self, secret: &[u8]) -> String {
        let claims = self.build();
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("HS256 signing should not fail")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
