// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: Missing secret generates a random one (tokens won't survive a restart)

use std::time::Duration;

/// Default session token lifetime: 7 days
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Longest accepted token lifetime: 365 days
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWTs
    pub secret: String,
    /// Session token lifetime
    pub token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }
}

/// Login throttling configuration
#[derive(Debug, Clone)]
pub struct LoginLimitConfig {
    /// Failed attempts allowed per source within the window
    pub max_attempts: usize,
    /// Sliding window length
    pub window: Duration,
}

impl Default for LoginLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(15 * 60), // 15 minutes
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Login rate limiting
    pub login_limit: LoginLimitConfig,
}

fn generate_secret() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Parse AUTH_JWT_LIFETIME (seconds). Unparseable or zero falls back to the
/// default; values above MAX_TOKEN_LIFETIME are clamped.
fn token_lifetime(raw: Option<&str>) -> Duration {
    let Some(raw) = raw else {
        return DEFAULT_TOKEN_LIFETIME;
    };

    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => {
            tracing::warn!(value = %raw, "Invalid AUTH_JWT_LIFETIME, using default");
            DEFAULT_TOKEN_LIFETIME
        }
        Ok(secs) if Duration::from_secs(secs) > MAX_TOKEN_LIFETIME => {
            tracing::warn!(
                value = secs,
                max = MAX_TOKEN_LIFETIME.as_secs(),
                "AUTH_JWT_LIFETIME too large, clamping"
            );
            MAX_TOKEN_LIFETIME
        }
        Ok(secs) => Duration::from_secs(secs),
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let secret = std::env::var("AUTH_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!(
                    "AUTH_JWT_SECRET not set, using a random secret; sessions will not survive a restart"
                );
                generate_secret()
            });

        let token_lifetime = token_lifetime(std::env::var("AUTH_JWT_LIFETIME").ok().as_deref());

        let defaults = LoginLimitConfig::default();
        let max_attempts = std::env::var("AUTH_LOGIN_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_attempts);
        let window = std::env::var("AUTH_LOGIN_WINDOW")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.window);

        Self {
            jwt: JwtConfig {
                secret,
                token_lifetime,
            },
            login_limit: LoginLimitConfig {
                max_attempts,
                window,
            },
        }
    }

    /// Configuration with a fixed secret, for tests and tooling
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt: JwtConfig {
                secret: secret.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.jwt.token_lifetime, Duration::from_secs(604_800));
        assert_eq!(config.login_limit.max_attempts, 5);
        assert_eq!(config.login_limit.window, Duration::from_secs(900));
    }

    #[test]
    fn test_with_secret() {
        let config = AuthConfig::with_secret("s3cret");
        assert_eq!(config.jwt.secret, "s3cret");
        assert_eq!(config.jwt.token_lifetime, DEFAULT_TOKEN_LIFETIME);
    }

    #[test]
    fn test_token_lifetime_parsing() {
        assert_eq!(token_lifetime(None), DEFAULT_TOKEN_LIFETIME);
        assert_eq!(token_lifetime(Some("3600")), Duration::from_secs(3600));
        assert_eq!(token_lifetime(Some("0")), DEFAULT_TOKEN_LIFETIME);
        assert_eq!(token_lifetime(Some("soon")), DEFAULT_TOKEN_LIFETIME);
        assert_eq!(token_lifetime(Some("18446744073709551615")), MAX_TOKEN_LIFETIME);
    }

    #[test]
    fn test_generated_secret_is_random_hex() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
