//! Development stub answering `POST …/login` without a server.
//!
//! The credential and token are fixed and carry no security whatsoever.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::MockBackendSettings;

use super::transport::HttpTransport;
use super::types::{ApiRequest, ApiResponse, LoginRequest, LoginResponse, LoginUser};

pub const MOCK_TOKEN: &str = concat!(
    "eyJhbGciOiJIUzI1NiIsInwefwefMSwiZ3VpZCI6IjQ0MDdmOTNjLWRjM",
    "DEtNDQ2My1hMzhmwefwefLWUxZmJiMWQzMTRmOCIsImV4cCI6MTUxNzU3ODM2",
    "NCwiZW1haWwiOiJuaWVrLmhlZXplbWFuc0Bmcm9udG1lbi5ubCIsImlhdCI6MTUx",
    "NzUwefwef3Mjk2NH0.Ykirzr4b7GdsIPGV6PDjCpFHOAqohKazJl5pWJFw",
);

pub const WRONG_CREDENTIALS: &str = "Username or password is wrong!";

#[derive(Debug, Clone, PartialEq)]
pub struct MockUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
}

impl Default for MockUser {
    fn default() -> Self {
        Self::from(&MockBackendSettings::default())
    }
}

impl From<&MockBackendSettings> for MockUser {
    fn from(settings: &MockBackendSettings) -> Self {
        Self {
            username: settings.username.clone(),
            password: settings.password.clone(),
            full_name: settings.full_name.clone(),
        }
    }
}

/// Wraps a transport and answers login requests locally.
pub struct MockBackend<T> {
    inner: T,
    user: MockUser,
    delay: Duration,
}

impl<T: HttpTransport> MockBackend<T> {
    pub fn new(inner: T, user: MockUser, delay: Duration) -> Self {
        Self { inner, user, delay }
    }

    pub fn from_settings(inner: T, settings: &MockBackendSettings) -> Self {
        Self::new(
            inner,
            MockUser::from(settings),
            Duration::from_millis(settings.login_delay_ms),
        )
    }

    pub fn intercepts(request: &ApiRequest) -> bool {
        request.method == Method::POST && request_path(&request.url).ends_with("/login")
    }

    fn authenticate(&self, request: &ApiRequest) -> AppResult<ApiResponse> {
        let credentials = request
            .body
            .clone()
            .and_then(|body| serde_json::from_value::<LoginRequest>(body).ok());

        match credentials {
            Some(c) if c.username == self.user.username && c.password == self.user.password => {
                let body = LoginResponse {
                    token: MOCK_TOKEN.to_string(),
                    user: LoginUser {
                        full_name: self.user.full_name.clone(),
                        username: self.user.username.clone(),
                    },
                };
                Ok(ApiResponse::ok(serde_json::to_value(body)?))
            }
            _ => Err(AppError::Rejected(WRONG_CREDENTIALS.to_string())),
        }
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for MockBackend<T> {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        if !Self::intercepts(&request) {
            return self.inner.send(request).await;
        }

        log::info!("[MockBackend] Intercepted {} {}", request.method, request.url);
        let outcome = self.authenticate(&request);

        // Success and failure are both delivered after the delay.
        tokio::time::sleep(self.delay).await;

        if let Err(e) = &outcome {
            log::warn!("[MockBackend] Login rejected: {}", e);
        }
        outcome
    }
}

/// Path part of an absolute or relative URL, without query or fragment.
fn request_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    use serde_json::json;

    /// Inner transport that records what reaches it.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait]
    impl HttpTransport for Recorder {
        async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request);
            }
            Ok(ApiResponse { status: 204, body: json!(null) })
        }
    }

    const DELAY: Duration = Duration::from_millis(25);

    fn backend() -> MockBackend<Recorder> {
        MockBackend::new(Recorder::default(), MockUser::default(), DELAY)
    }

    fn login(url: &str, username: &str, password: &str) -> ApiRequest {
        ApiRequest::post(url, json!({ "username": username, "password": password }))
    }

    #[tokio::test]
    async fn valid_credentials_get_token_after_delay() {
        let backend = backend();
        let started = Instant::now();

        let resp = backend
            .send(login("http://localhost:4200/api/login", "user1", "pass1"))
            .await
            .unwrap();

        assert!(started.elapsed() >= DELAY);
        assert_eq!(resp.status, 200);
        let body: LoginResponse = serde_json::from_value(resp.body).unwrap();
        assert_eq!(body.token, MOCK_TOKEN);
        assert_eq!(body.user.username, "user1");
        assert_eq!(body.user.full_name, "AlexMaster");
        assert!(backend.inner.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected_after_delay() {
        let backend = backend();
        let started = Instant::now();

        let err = backend
            .send(login("/api/login", "user1", "nope"))
            .await
            .unwrap_err();

        assert!(started.elapsed() >= DELAY);
        assert_eq!(err, AppError::Rejected(WRONG_CREDENTIALS.to_string()));
        assert_eq!(err.to_string(), "Username or password is wrong!");
    }

    #[tokio::test]
    async fn missing_body_is_rejected() {
        let backend = backend();
        let request = ApiRequest {
            method: Method::POST,
            url: "/login".to_string(),
            body: None,
        };
        assert!(matches!(backend.send(request).await, Err(AppError::Rejected(_))));
    }

    #[tokio::test]
    async fn other_requests_pass_through_unmodified() {
        let backend = backend();
        let get_login = ApiRequest::get("http://localhost/api/login");
        let post_other = ApiRequest::post("http://localhost/api/logins", json!({ "a": 1 }));

        let resp = backend.send(get_login.clone()).await.unwrap();
        assert_eq!(resp.status, 204);
        backend.send(post_other.clone()).await.unwrap();

        let seen = backend.inner.seen.lock().unwrap();
        assert_eq!(*seen, vec![get_login, post_other]);
    }

    #[test]
    fn query_string_does_not_hide_login_path() {
        assert!(MockBackend::<Recorder>::intercepts(&login(
            "http://localhost/api/login?next=/home",
            "a",
            "b"
        )));
        assert!(MockBackend::<Recorder>::intercepts(&login("/login", "a", "b")));
        assert!(!MockBackend::<Recorder>::intercepts(&login("/loginx", "a", "b")));
    }

    #[test]
    fn settings_configure_user_and_delay() {
        let settings = MockBackendSettings {
            login_delay_ms: 5,
            ..MockBackendSettings::default()
        };
        let backend = MockBackend::from_settings(Recorder::default(), &settings);
        assert_eq!(backend.delay, Duration::from_millis(5));
        assert_eq!(backend.user, MockUser::default());
    }
}
