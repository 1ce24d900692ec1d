// HTTP client wrapper for the FitSync API

use reqwest::{header, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::ClientError;

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            http,
        })
    }

    /// Send a request, attaching `Authorization: Bearer <token>` when a token is given
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, %path, "Sending request");
        let response = request.send().await?;
        self.handle_response(response).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        self.request::<T, ()>(Method::GET, path, token, None).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status, &body, retry_after));
        }

        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(serde_json::Value::Null)
                .map_err(|e| ClientError::Internal(format!("Unexpected empty response: {}", e)));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

/// Run `op`, retrying network errors and timeouts with exponential backoff.
/// Every other error is returned immediately.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(attempt = attempt + 1, ?delay, "Request failed, retrying: {}", e);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsync_core::ErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_retry_stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Timeout)
        })
        .await;

        assert_eq!(result, Err(ClientError::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ClientError::Network("connection reset".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_errors_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Auth {
                code: ErrorCode::ExpiredToken,
                message: "Token has expired".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ClientError::Auth { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/verify"))
            .and(header_eq("authorization", "Bearer t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&ClientConfig::new(server.uri())).unwrap();
        let body: serde_json::Value = client.get("/api/auth/verify", Some("t1")).await.unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_timeout_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/exercises"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let config = ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(50));
        let client = ApiClient::new(&config).unwrap();
        let result: Result<serde_json::Value, _> = client.get("/api/exercises", None).await;
        assert_eq!(result, Err(ClientError::Timeout));
    }

    #[tokio::test]
    async fn test_error_body_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "120")
                    .set_body_json(serde_json::json!({
                        "error": "too_many_attempts",
                        "message": "Too many login attempts"
                    })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&ClientConfig::new(server.uri())).unwrap();
        let result: Result<serde_json::Value, _> = client
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(&serde_json::json!({"email": "a@b.com", "password": "x"})),
            )
            .await;
        assert_eq!(
            result,
            Err(ClientError::RateLimited {
                message: "Too many login attempts".to_string(),
                retry_after_secs: Some(120),
            })
        );
    }
}
