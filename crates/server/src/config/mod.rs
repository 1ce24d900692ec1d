// Server configuration loaded from environment variables
// Decision: DATABASE_URL is optional; without it the server runs on the in-memory store
// Decision: CORS is off unless origins are listed (the mobile client is not a browser)

use axum::http::HeaderValue;

/// Default HTTP port, matching what the mobile client is built against
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind on 0.0.0.0
    pub port: u16,
    /// PostgreSQL connection string; `None` selects the in-memory store
    pub database_url: Option<String>,
    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("PORT").ok(),
            std::env::var("DATABASE_URL").ok(),
            std::env::var("CORS_ALLOWED_ORIGINS").ok(),
        )
    }

    fn from_vars(
        port: Option<String>,
        database_url: Option<String>,
        cors_origins: Option<String>,
    ) -> Self {
        let port = match port {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid PORT, using {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
        let cors_origins = cors_origins
            .filter(|s| !s.is_empty())
            .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
            .unwrap_or_default();

        Self {
            port,
            database_url: database_url.filter(|s| !s.trim().is_empty()),
            cors_origins,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(None, None, None);
        assert_eq!(config.port, 5000);
        assert!(config.database_url.is_none());
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_parses_values() {
        let config = ServerConfig::from_vars(
            Some("8080".to_string()),
            Some("postgres://localhost/fitsync".to_string()),
            Some("https://a.example.com, https://b.example.com".to_string()),
        );
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/fitsync")
        );
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.cors_origins[1], "https://b.example.com");
    }

    #[test]
    fn test_invalid_port_and_blank_database_url() {
        let config = ServerConfig::from_vars(Some("http".to_string()), Some("  ".to_string()), None);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.database_url.is_none());
    }
}
