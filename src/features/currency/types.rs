use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::shared::error::{AppError, AppResult};

/// One row of the session rate table, relative to the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "converter/")]
pub struct RateEntry {
    pub currency: String,
    pub rate: f64,
}

/// Network payload from the rate endpoint.
///
/// Both the `open.er-api` shape (`result`, `base_code`) and the older
/// `exchangerate-api` shape (`base`) deserialize into this.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default, alias = "base_code")]
    pub base: Option<String>,
    #[serde(default, rename = "error-type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

impl RatesResponse {
    pub fn from_rates(rates: HashMap<String, f64>) -> Self {
        Self {
            result: Some("success".to_string()),
            base: None,
            error_type: None,
            rates,
        }
    }

    /// Rate entries sorted by currency code.
    pub fn into_entries(self) -> Vec<RateEntry> {
        let mut entries: Vec<RateEntry> = self
            .rates
            .into_iter()
            .map(|(currency, rate)| RateEntry { currency: currency.to_uppercase(), rate })
            .collect();
        entries.sort_by(|a, b| a.currency.cmp(&b.currency));
        entries
    }
}

/// A persisted snapshot of one completed conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "converter/")]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[ts(type = "number")]
    pub id: i64,
    /// `DD/MM/YYYY\n@HH:MM`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    /// `FROM → TO\n<rate>`, stored under the browser front end's key.
    #[serde(rename = "exchangeRate")]
    pub display_rate: String,
    /// Non-finite rates are written as `null` and read back as NaN.
    #[serde(deserialize_with = "rate_or_nan")]
    pub pure_exchange_rate: f64,
    /// `DD/MM/YYYY`
    pub creation_date: String,
    pub from_currency: String,
    pub to_currency: String,
    /// Whole units converted.
    pub amount: f64,
}

fn rate_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Outcome of one conversion action. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "converter/")]
#[serde(rename_all = "camelCase")]
pub struct ConversionState {
    pub from_currency: String,
    pub to_currency: String,
    pub from_rate: f64,
    pub to_rate: f64,
    pub amount: f64,
    pub result: String,
}

/// Inputs of the converter form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Amount,
    From,
    To,
}

impl FromStr for FormField {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amount" => Ok(FormField::Amount),
            "from" => Ok(FormField::From),
            "to" => Ok(FormField::To),
            other => Err(AppError::Validation(format!("Unknown field: {}", other))),
        }
    }
}

/// Form values as the user sees them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConverterForm {
    pub amount: Option<f64>,
    pub from: String,
    pub to: String,
    /// Currency inputs stay disabled until a rate table is available.
    pub inputs_enabled: bool,
}

impl ConverterForm {
    pub fn new(amount: Option<f64>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            amount,
            from: from.into(),
            to: to.into(),
            inputs_enabled: false,
        }
    }

    /// JS-style truthiness: present, non-zero and not NaN.
    pub fn has_amount(&self) -> bool {
        matches!(self.amount, Some(v) if v != 0.0 && !v.is_nan())
    }
}

/// Window used to narrow the history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "converter/")]
#[serde(rename_all = "camelCase")]
pub enum TimeInterval {
    Day,
    Week,
    Month,
    #[default]
    AllTime,
}

impl TimeInterval {
    /// Days covered, counting today. `None` means unbounded.
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeInterval::Day => Some(1),
            TimeInterval::Week => Some(7),
            TimeInterval::Month => Some(30),
            TimeInterval::AllTime => None,
        }
    }
}

impl FromStr for TimeInterval {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "today" => Ok(TimeInterval::Day),
            "week" => Ok(TimeInterval::Week),
            "month" => Ok(TimeInterval::Month),
            "all" | "alltime" | "all_time" => Ok(TimeInterval::AllTime),
            other => Err(AppError::Validation(format!("Unknown interval: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_response_accepts_both_shapes() {
        let er_api: RatesResponse = serde_json::from_str(
            r#"{"result":"success","base_code":"USD","rates":{"USD":1,"EUR":0.9}}"#,
        )
        .unwrap();
        assert_eq!(er_api.base.as_deref(), Some("USD"));
        assert_eq!(er_api.rates.len(), 2);

        let legacy: RatesResponse =
            serde_json::from_str(r#"{"base":"USD","date":"2024-01-01","rates":{"GBP":0.8}}"#).unwrap();
        assert_eq!(legacy.base.as_deref(), Some("USD"));
        assert_eq!(legacy.rates["GBP"], 0.8);
    }

    #[test]
    fn entries_are_sorted_and_uppercased() {
        let response = RatesResponse::from_rates(HashMap::from([
            ("jpy".to_string(), 150.0),
            ("EUR".to_string(), 0.9),
            ("USD".to_string(), 1.0),
        ]));
        let codes: Vec<String> = response.into_entries().into_iter().map(|e| e.currency).collect();
        assert_eq!(codes, vec!["EUR", "JPY", "USD"]);
    }

    #[test]
    fn history_record_uses_camel_case_on_disk() {
        let record = HistoryRecord {
            id: 7,
            date: "01/02/2024\n@10:00".to_string(),
            time: "10:00".to_string(),
            display_rate: "USD → EUR\n0.90000".to_string(),
            pure_exchange_rate: 0.9,
            creation_date: "01/02/2024".to_string(),
            from_currency: "USD".to_string(),
            to_currency: "EUR".to_string(),
            amount: 10.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["pureExchangeRate"], 0.9);
        assert_eq!(json["fromCurrency"], "USD");
        assert_eq!(json["exchangeRate"], "USD → EUR\n0.90000");
        assert!(json.get("displayRate").is_none());

        let parsed: HistoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn non_finite_rate_survives_a_snapshot() {
        let mut record: HistoryRecord = serde_json::from_value(serde_json::json!({
            "id": 1,
            "date": "01/02/2024\n@10:00",
            "time": "10:00",
            "exchangeRate": "ZZZ → EUR\ninf",
            "pureExchangeRate": 1.0,
            "creationDate": "01/02/2024",
            "fromCurrency": "ZZZ",
            "toCurrency": "EUR",
            "amount": 1
        }))
        .unwrap();
        record.pure_exchange_rate = f64::INFINITY;

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["pureExchangeRate"].is_null());

        let parsed: HistoryRecord = serde_json::from_value(json).unwrap();
        assert!(parsed.pure_exchange_rate.is_nan());
        assert_eq!(parsed.from_currency, "ZZZ");
    }

    #[test]
    fn amount_truthiness() {
        assert!(!ConverterForm::new(None, "USD", "EUR").has_amount());
        assert!(!ConverterForm::new(Some(0.0), "USD", "EUR").has_amount());
        assert!(!ConverterForm::new(Some(f64::NAN), "USD", "EUR").has_amount());
        assert!(ConverterForm::new(Some(0.5), "USD", "EUR").has_amount());
    }

    #[test]
    fn parses_intervals() {
        assert_eq!("week".parse::<TimeInterval>().unwrap(), TimeInterval::Week);
        assert_eq!("ALL".parse::<TimeInterval>().unwrap(), TimeInterval::AllTime);
        assert!("fortnight".parse::<TimeInterval>().is_err());
    }
}
