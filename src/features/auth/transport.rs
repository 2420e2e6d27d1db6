use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::shared::error::{AppError, AppResult};

use super::types::{ApiRequest, ApiResponse};

/// Something that can carry an [`ApiRequest`] to a server.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse>;
}

/// Sends requests over the network.
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("currency-converter/auth")
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let mut builder = self.http.request(request.method.clone(), &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ApiResponse { status, body })
    }
}
