//! Remote rate table source.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::shared::error::{AppError, AppResult};

use super::types::RatesResponse;

/// Source of the session rate table. Assumed idempotent and read-only.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self, base_currency: &str) -> AppResult<RatesResponse>;
}

pub struct HttpRateProvider {
    http: Client,
    rates_url: String,
}

impl HttpRateProvider {
    pub fn new(rates_url: impl Into<String>) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("currency-converter/rates")
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self {
            http,
            rates_url: rates_url.into(),
        })
    }

    fn url_for(&self, base_currency: &str) -> String {
        format!(
            "{}/{}",
            self.rates_url.trim_end_matches('/'),
            base_currency.trim().to_uppercase()
        )
    }
}

/// Fail on a non-2xx status or when the body's `result` is not "success".
/// A body without `result` is accepted.
fn check_response(status: StatusCode, body: AppResult<RatesResponse>) -> AppResult<RatesResponse> {
    if !status.is_success() {
        return Err(AppError::Network(format!("Failed to fetch rates: {}", status)));
    }

    let json = body?;
    if let Some(result) = &json.result {
        if result.to_lowercase() != "success" {
            let reason = json.error_type.clone().unwrap_or_else(|| result.clone());
            return Err(AppError::Network(format!("API reported failure: {}", reason)));
        }
    }
    Ok(json)
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_rates(&self, base_currency: &str) -> AppResult<RatesResponse> {
        let url = self.url_for(base_currency);
        log::info!("[Rates] Fetching rates from {}", url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .json::<RatesResponse>()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid response: {}", e)));
        let json = check_response(status, body)?;

        log::info!("[Rates] Received {} rates", json.rates.len());
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_url_from_base() {
        let provider = HttpRateProvider::new("https://open.er-api.com/v6/latest/").unwrap();
        assert_eq!(provider.url_for("usd"), "https://open.er-api.com/v6/latest/USD");
    }

    fn body(raw: &str) -> AppResult<RatesResponse> {
        Ok(serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn accepts_successful_payloads() {
        let ok = check_response(StatusCode::OK, body(r#"{"result":"success","rates":{"EUR":0.9}}"#)).unwrap();
        assert_eq!(ok.rates["EUR"], 0.9);

        // Legacy payloads carry no `result` field.
        let legacy = check_response(StatusCode::OK, body(r#"{"base":"USD","rates":{"GBP":0.8}}"#)).unwrap();
        assert_eq!(legacy.rates.len(), 1);
    }

    #[test]
    fn error_status_wins_over_body() {
        let err = check_response(
            StatusCode::SERVICE_UNAVAILABLE,
            Err(AppError::Validation("Invalid response: eof".to_string())),
        )
        .unwrap_err();
        assert_eq!(err, AppError::Network("Failed to fetch rates: 503 Service Unavailable".to_string()));
    }

    #[test]
    fn reports_api_error_type() {
        let err = check_response(
            StatusCode::OK,
            body(r#"{"result":"error","error-type":"unsupported-code"}"#),
        )
        .unwrap_err();
        assert_eq!(err, AppError::Network("API reported failure: unsupported-code".to_string()));

        let err = check_response(StatusCode::OK, body(r#"{"result":"error"}"#)).unwrap_err();
        assert_eq!(err.message(), "API reported failure: error");
    }

    #[test]
    fn unreadable_body_is_a_validation_error() {
        let err = check_response(
            StatusCode::OK,
            Err(AppError::Validation("Invalid response: expected value".to_string())),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
