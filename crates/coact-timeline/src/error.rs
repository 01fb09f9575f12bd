//! Error type for `coact-timeline`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Input-size sanity cap; a real case lists a few dozen medications.
  #[error("too many medications: {count} exceeds the limit of {max}")]
  TooManyMedications { count: usize, max: usize },

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
