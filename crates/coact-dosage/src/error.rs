//! Error types for the coact-dosage estimator.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("end date out of range: {start} + {days} days")]
  DateOutOfRange { start: NaiveDate, days: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
