pub mod error;
pub mod notify;
pub mod settings;
pub mod storage;

#[cfg(test)]
mod types_test;

pub use error::{AppError, AppResult};
