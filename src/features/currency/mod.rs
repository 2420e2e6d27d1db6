//! Currency converter feature
//!
//! Loads a rate table once per session, drives the converter form
//! (autocomplete, validation, conversion, swap) and keeps a persisted
//! most-recent-first history of conversions.

pub mod controller;
pub mod history;
pub mod provider;
pub mod symbols;
pub mod types;

pub use controller::{filter_currencies, Collaborators, ConverterController, ConverterSession};
pub use history::ConversionHistory;
pub use provider::{HttpRateProvider, RateProvider};
pub use symbols::{StaticSymbolTable, SymbolLookup};
pub use types::{ConversionState, ConverterForm, FormField, HistoryRecord, RateEntry, TimeInterval};
