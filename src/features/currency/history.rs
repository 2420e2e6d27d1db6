//! Conversion history: most-recent-first list persisted as a whole snapshot.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::shared::error::{AppError, AppResult};
use crate::shared::storage::{Storage, StorageKey};

use super::types::{HistoryRecord, TimeInterval};

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";

/// Decimal places kept for the pure exchange rate and averages.
pub const RATE_PRECISION: u32 = 5;

/// Round the exact binary value half away from zero to `dp` places.
pub fn round_to(value: f64, dp: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Fields of a record that are known once a conversion completes.
pub struct RecordInput<'a> {
    pub id: i64,
    pub from_currency: &'a str,
    pub to_currency: &'a str,
    pub from_rate: f64,
    pub to_rate: f64,
    pub amount: f64,
}

pub fn build_record(input: RecordInput<'_>, now: NaiveDateTime) -> HistoryRecord {
    let pure_exchange_rate = round_to(input.to_rate / input.from_rate, RATE_PRECISION);
    let creation_date = now.format(DATE_FORMAT).to_string();
    let time = now.format(TIME_FORMAT).to_string();

    HistoryRecord {
        id: input.id,
        date: format!("{}\n@{}", creation_date, time),
        time,
        display_rate: format!(
            "{} → {}\n{:.5}",
            input.from_currency, input.to_currency, pure_exchange_rate
        ),
        pure_exchange_rate,
        creation_date,
        from_currency: input.from_currency.to_string(),
        to_currency: input.to_currency.to_string(),
        amount: input.amount,
    }
}

/// Mean of `pure_exchange_rate`, rounded to [`RATE_PRECISION`] places.
pub fn average_rate(records: &[HistoryRecord]) -> AppResult<f64> {
    if records.is_empty() {
        return Err(AppError::EmptyInput(
            "Cannot average an empty set of history records".to_string(),
        ));
    }

    let summary: f64 = records.iter().map(|r| r.pure_exchange_rate).sum();
    Ok(round_to(summary / records.len() as f64, RATE_PRECISION))
}

/// Records whose creation date falls inside `interval`, counting back from `today`.
pub fn filter_by_interval(
    records: &[HistoryRecord],
    interval: TimeInterval,
    today: NaiveDate,
) -> Vec<HistoryRecord> {
    let Some(days) = interval.days() else {
        return records.to_vec();
    };
    let earliest = today - Duration::days(days - 1);

    records
        .iter()
        .filter(|record| {
            NaiveDate::parse_from_str(&record.creation_date, DATE_FORMAT)
                .map(|date| date >= earliest && date <= today)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn parse_records(items: Vec<Value>) -> Vec<HistoryRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("[History] Skipping unreadable record at {}: {}", index, e);
                None
            }
        })
        .collect()
}

/// History list bound to its persistence store.
pub struct ConversionHistory {
    records: Vec<HistoryRecord>,
    selected_interval: TimeInterval,
    storage: Arc<dyn Storage>,
}

impl ConversionHistory {
    /// Load the previous snapshot and interval.
    ///
    /// Records that fail to parse are skipped one by one; a snapshot that is
    /// not a list at all starts empty.
    pub fn restore(storage: Arc<dyn Storage>) -> Self {
        let records = match storage.get_item(StorageKey::ExchangeRates.as_str()) {
            Ok(Some(Value::Array(items))) => parse_records(items),
            Ok(Some(_)) => {
                log::warn!("[History] Stored history is not a list, starting fresh");
                Vec::new()
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                log::error!("[History] Failed to load history: {}", e);
                Vec::new()
            }
        };

        let selected_interval = match storage.get_item(StorageKey::SelectedTimeInterval.as_str()) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
            _ => TimeInterval::default(),
        };

        log::info!("[History] Restored {} records", records.len());
        Self {
            records,
            selected_interval,
            storage,
        }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert at the front and persist the full snapshot.
    ///
    /// The in-memory record is kept even when the write fails.
    pub fn push_front(&mut self, record: HistoryRecord) -> AppResult<()> {
        log::info!("[History] Added record {}", record.id);
        self.records.insert(0, record);
        self.persist()
    }

    fn persist(&self) -> AppResult<()> {
        let snapshot = serde_json::to_value(&self.records)?;
        self.storage
            .set_object(StorageKey::ExchangeRates.as_str(), &snapshot)
    }

    pub fn for_interval(&self, interval: TimeInterval, today: NaiveDate) -> Vec<HistoryRecord> {
        filter_by_interval(&self.records, interval, today)
    }

    pub fn selected_interval(&self) -> TimeInterval {
        self.selected_interval
    }

    pub fn select_interval(&mut self, interval: TimeInterval) -> AppResult<()> {
        self.selected_interval = interval;
        let value = serde_json::to_value(interval)?;
        self.storage
            .set_object(StorageKey::SelectedTimeInterval.as_str(), &value)
    }
}
