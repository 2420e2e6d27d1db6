//! Login plumbing: request/response types, the HTTP transport seam and the
//! development mock backend.

pub mod mock_backend;
pub mod transport;
pub mod types;

use std::sync::Arc;

use crate::shared::error::{AppError, AppResult};

pub use mock_backend::{MockBackend, MockUser, MOCK_TOKEN, WRONG_CREDENTIALS};
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{ApiRequest, ApiResponse, LoginRequest, LoginResponse, LoginUser};

/// Posts credentials to `<base_url>/login` over any transport.
pub struct LoginClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl LoginClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let url = format!("{}/login", self.base_url.trim_end_matches('/'));
        let body = serde_json::to_value(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;

        let resp = self.transport.send(ApiRequest::post(url, body)).await?;
        if !resp.is_success() {
            return Err(AppError::Network(format!("Login failed with status {}", resp.status)));
        }

        serde_json::from_value(resp.body)
            .map_err(|e| AppError::Validation(format!("Invalid login response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    struct Unreachable;

    #[async_trait]
    impl HttpTransport for Unreachable {
        async fn send(&self, _request: ApiRequest) -> AppResult<ApiResponse> {
            Err(AppError::Network("connection refused".to_string()))
        }
    }

    struct Status(u16);

    #[async_trait]
    impl HttpTransport for Status {
        async fn send(&self, _request: ApiRequest) -> AppResult<ApiResponse> {
            Ok(ApiResponse { status: self.0, body: json!({}) })
        }
    }

    fn mocked() -> LoginClient {
        let backend = MockBackend::new(Unreachable, MockUser::default(), Duration::from_millis(1));
        LoginClient::new(Arc::new(backend), "http://localhost:4200/api/")
    }

    #[tokio::test]
    async fn login_through_mock_backend() {
        let resp = mocked().login("user1", "pass1").await.unwrap();
        assert_eq!(resp.token, MOCK_TOKEN);
        assert_eq!(resp.user, LoginUser {
            full_name: "AlexMaster".to_string(),
            username: "user1".to_string(),
        });
    }

    #[tokio::test]
    async fn bad_password_surfaces_plain_message() {
        let err = mocked().login("user1", "pass2").await.unwrap_err();
        assert_eq!(err.to_string(), WRONG_CREDENTIALS);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let client = LoginClient::new(Arc::new(Status(500)), "http://localhost");
        assert!(matches!(client.login("a", "b").await, Err(AppError::Network(_))));
    }
}
