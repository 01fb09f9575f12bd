//! Error types for `coact-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A non-empty date string that is neither a full nor a partial calendar
  /// date.
  #[error("invalid date in {field}: {value:?}")]
  InvalidDate { field: &'static str, value: String },

  #[error("medication record has an empty drug name")]
  EmptyDrugName,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
