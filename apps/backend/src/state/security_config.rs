use std::time::Duration;

use jsonwebtoken::Algorithm;

/// Access token lifetime unless overridden.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Signing key and lifetime for backend-issued access tokens.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: Vec<u8>,
    pub algorithm: Algorithm,
    pub access_ttl: Duration,
}

impl SecurityConfig {
    /// HS256 with [`DEFAULT_ACCESS_TTL`].
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            algorithm: Algorithm::HS256,
            access_ttl: DEFAULT_ACCESS_TTL,
        }
    }

    pub fn with_access_ttl(mut self, access_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::new(b"insecure-local-habits-secret".to_vec())
    }
}
