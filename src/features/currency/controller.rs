use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::shared::error::{AppError, AppResult};
use crate::shared::notify::Notifier;
use crate::shared::storage::Storage;

use super::history::{self, ConversionHistory, RecordInput};
use super::provider::RateProvider;
use super::symbols::SymbolLookup;
use super::types::{ConversionState, ConverterForm, FormField, HistoryRecord, RateEntry, TimeInterval};

const CURRENCY_CODE_LEN: usize = 3;

/// Case-insensitive substring match; candidate order is preserved.
pub fn filter_currencies(query: &str, candidates: &[String]) -> Vec<String> {
    let filter_value = query.to_lowercase();

    candidates
        .iter()
        .filter(|option| option.to_lowercase().contains(&filter_value))
        .cloned()
        .collect()
}

/// Session-scoped converter state.
///
/// Owned by exactly one controller at a time; hand it back with
/// [`ConverterController::into_session`] to carry the form, rate table
/// and history into the next view.
pub struct ConverterSession {
    pub form: ConverterForm,
    rates: Option<Vec<RateEntry>>,
    from_currencies: Vec<String>,
    to_currencies: Vec<String>,
    history: ConversionHistory,
    is_valid: bool,
    /// Set when the session comes back from another view.
    referral: bool,
}

impl ConverterSession {
    pub fn new(form: ConverterForm, storage: Arc<dyn Storage>) -> Self {
        Self {
            form,
            rates: None,
            from_currencies: Vec::new(),
            to_currencies: Vec::new(),
            history: ConversionHistory::restore(storage),
            is_valid: false,
            referral: false,
        }
    }

    pub fn rates(&self) -> Option<&[RateEntry]> {
        self.rates.as_deref()
    }

    pub fn history(&self) -> &ConversionHistory {
        &self.history
    }
}

/// External collaborators the controller talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub provider: Arc<dyn RateProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub symbols: Arc<dyn SymbolLookup>,
}

pub struct ConverterController {
    session: ConverterSession,
    collaborators: Collaborators,
    base_currency: String,
    /// Record id counter, seeded from the wall clock in milliseconds.
    id: i64,
}

impl ConverterController {
    /// Attach to a session. Currency inputs start disabled until
    /// [`load_rates`](Self::load_rates) runs.
    pub fn new(
        session: ConverterSession,
        collaborators: Collaborators,
        base_currency: impl Into<String>,
    ) -> Self {
        let mut controller = Self {
            session,
            collaborators,
            base_currency: base_currency.into(),
            id: Local::now().timestamp_millis(),
        };
        controller.session.form.inputs_enabled = false;

        if controller.session.referral {
            controller.session.referral = false;
            controller.revalidate_on_load();
        }

        controller
    }

    /// Detach the session so another view can pick it up.
    pub fn into_session(mut self) -> ConverterSession {
        self.session.referral = true;
        self.session
    }

    pub fn form(&self) -> &ConverterForm {
        &self.session.form
    }

    pub fn session(&self) -> &ConverterSession {
        &self.session
    }

    pub fn inputs_enabled(&self) -> bool {
        self.session.form.inputs_enabled
    }

    pub fn rates_loaded(&self) -> bool {
        self.session.rates.is_some()
    }

    /// Last computed validity flag.
    pub fn is_valid(&self) -> bool {
        self.session.is_valid
    }

    /// Fetch the rate table once per session.
    ///
    /// A cached table is reused without refreshing. On failure the error is
    /// reported through the notifier and the inputs stay disabled.
    /// Returns whether the inputs are enabled afterwards.
    pub async fn load_rates(&mut self) -> bool {
        if self.session.rates.is_some() {
            log::info!("[Converter] Rate table cached; skipping fetch");
            self.session.form.inputs_enabled = true;
            self.refresh_validity();
            return true;
        }

        match self.collaborators.provider.fetch_rates(&self.base_currency).await {
            Ok(response) => {
                let entries = response.into_entries();
                log::info!("[Converter] Loaded {} rates for base {}", entries.len(), self.base_currency);
                self.session.rates = Some(entries);
                self.session.from_currencies = self.currency_codes();
                self.session.to_currencies = self.currency_codes();
                self.session.form.inputs_enabled = true;
                self.refresh_validity();
                true
            }
            Err(e) => {
                log::error!("[Converter] Rate fetch failed: {}", e);
                self.collaborators
                    .notifier
                    .report_error(&format!("Error: {}", e.message()));
                false
            }
        }
    }

    /// Sorted codes of the current rate table.
    pub fn currency_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .session
            .rates
            .iter()
            .flatten()
            .map(|entry| entry.currency.clone())
            .collect();
        codes.sort();
        codes
    }

    pub fn filter_currencies(&self, query: &str, candidates: &[String]) -> Vec<String> {
        filter_currencies(query, candidates)
    }

    /// Autocomplete options for the "from" field's current text.
    pub fn from_suggestions(&self) -> Vec<String> {
        filter_currencies(&self.session.form.from, &self.session.from_currencies)
    }

    /// Autocomplete options for the "to" field's current text.
    pub fn to_suggestions(&self) -> Vec<String> {
        filter_currencies(&self.session.form.to, &self.session.to_currencies)
    }

    /// Store the typed amount. Negative values are clamped to zero.
    pub fn set_amount(&mut self, amount: Option<f64>) {
        self.session.form.amount = match amount {
            Some(v) if v < 0.0 => Some(0.0),
            other => other,
        };
        self.refresh_validity();
    }

    /// Raw text entry into a currency field, without auto-fill.
    pub fn type_currency(&mut self, field: FormField, text: &str) {
        self.set_currency_field(field, text.to_string());
        self.refresh_validity();
    }

    /// Option picked from the autocomplete list.
    pub fn select_currency(&mut self, field: FormField, code: &str) {
        self.set_currency_field(field, code.to_string());
        self.refresh_validity();
    }

    /// Auto-fill the field with the first known code containing the typed
    /// text, but only when exactly three characters were typed.
    pub fn validate_typed_currency(&mut self, field: FormField, typed: &str) {
        let written = typed.to_uppercase();
        if let Some(matched) = self.auto_fill_match(&written) {
            self.set_currency_field(field, matched);
        }
        self.refresh_validity();
    }

    fn auto_fill_match(&self, written: &str) -> Option<String> {
        if written.chars().count() != CURRENCY_CODE_LEN {
            return None;
        }
        self.currency_codes()
            .into_iter()
            .find(|code| code.contains(written))
    }

    fn set_currency_field(&mut self, field: FormField, value: String) {
        match field {
            FormField::From => self.session.form.from = value,
            FormField::To => self.session.form.to = value,
            FormField::Amount => {
                log::warn!("[Converter] Ignoring currency text for the amount field");
            }
        }
    }

    /// Amount is truthy and both currency fields name a known code.
    pub fn is_form_valid(&self) -> bool {
        self.session.form.has_amount()
            && self.matches_known_code(&self.session.form.from)
            && self.matches_known_code(&self.session.form.to)
    }

    fn refresh_validity(&mut self) {
        self.session.is_valid = self.is_form_valid();
    }

    fn matches_known_code(&self, value: &str) -> bool {
        let wanted = value.to_uppercase();
        self.session
            .rates
            .iter()
            .flatten()
            .any(|entry| entry.currency == wanted)
    }

    /// Re-run auto-fill on both currency fields for a restored form.
    pub fn revalidate_on_load(&mut self) {
        for field in [FormField::To, FormField::From] {
            let current = match field {
                FormField::From => self.session.form.from.clone(),
                _ => self.session.form.to.clone(),
            };
            if let Some(matched) = self.auto_fill_match(&current.to_uppercase()) {
                self.set_currency_field(field, matched);
            }
        }
        self.refresh_validity();
    }

    fn selected_rate(&self, field: FormField) -> AppResult<RateEntry> {
        let value = match field {
            FormField::From => &self.session.form.from,
            FormField::To => &self.session.form.to,
            FormField::Amount => {
                return Err(AppError::Validation("Amount has no rate".to_string()));
            }
        };
        let wanted = value.to_uppercase();

        self.session
            .rates
            .iter()
            .flatten()
            .find(|entry| entry.currency == wanted)
            .cloned()
            .ok_or_else(|| AppError::Validation(format!("Currency not supported: {}", value)))
    }

    /// Convert the current form, record it in history and persist the history.
    pub fn convert(&mut self) -> AppResult<ConversionState> {
        let from = self.selected_rate(FormField::From)?;
        let to = self.selected_rate(FormField::To)?;
        let amount = self.session.form.amount.unwrap_or(0.0).floor();

        let result = format!("{:.3}", (amount * to.rate) / from.rate);

        let id = self.increment_id();
        let record = history::build_record(
            RecordInput {
                id,
                from_currency: &from.currency,
                to_currency: &to.currency,
                from_rate: from.rate,
                to_rate: to.rate,
                amount,
            },
            Local::now().naive_local(),
        );

        log::info!(
            "[Converter] {} {} -> {} {} (rate={})",
            amount, from.currency, result, to.currency, record.pure_exchange_rate
        );

        if let Err(e) = self.session.history.push_front(record) {
            log::error!("[Converter] Failed to persist history: {}", e);
            self.collaborators
                .notifier
                .report_error(&format!("Error: {}", e.message()));
        }

        Ok(ConversionState {
            from_currency: from.currency,
            to_currency: to.currency,
            from_rate: from.rate,
            to_rate: to.rate,
            amount,
            result,
        })
    }

    /// Exchange the from/to fields, keeping the amount, and re-derive the
    /// autocomplete candidates.
    pub fn swap_currencies(&mut self) {
        let form = &mut self.session.form;
        std::mem::swap(&mut form.from, &mut form.to);

        self.increment_id();

        self.session.from_currencies = self.currency_codes();
        self.session.to_currencies = self.currency_codes();
    }

    fn increment_id(&mut self) -> i64 {
        self.id += 1;
        self.id
    }

    pub fn compute_average(&self, records: &[HistoryRecord]) -> AppResult<f64> {
        history::average_rate(records)
    }

    pub fn currency_symbol(&self, currency_code: &str) -> Option<String> {
        self.collaborators.symbols.symbol(currency_code)
    }

    pub fn history(&self) -> &[HistoryRecord] {
        self.session.history.records()
    }

    pub fn history_for(&self, interval: TimeInterval, today: NaiveDate) -> Vec<HistoryRecord> {
        self.session.history.for_interval(interval, today)
    }

    /// Average over the records of `interval`.
    pub fn average_for(&self, interval: TimeInterval, today: NaiveDate) -> AppResult<f64> {
        self.compute_average(&self.history_for(interval, today))
    }

    pub fn selected_interval(&self) -> TimeInterval {
        self.session.history.selected_interval()
    }

    pub fn select_interval(&mut self, interval: TimeInterval) -> AppResult<()> {
        self.session.history.select_interval(interval)
    }
}
