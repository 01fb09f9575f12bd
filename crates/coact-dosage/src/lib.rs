//! Dose/frequency parser and duration estimator.
//!
//! Reads the free-text regimen of a prescription ("1/2 viên", "sáng, tối",
//! "2 lần/ngày") and infers how long a dispensed quantity lasts. Pure
//! synchronous; no I/O.
//!
//! # Quick start
//!
//! ```
//! use chrono::NaiveDate;
//! use coact_dosage::estimate;
//!
//! let start = NaiveDate::from_ymd_opt(2025, 11, 16).unwrap();
//! let e = estimate(Some(14.0), "1 viên", "2 lần/ngày", start).unwrap();
//! assert_eq!(e.end_date.to_string(), "2025-11-23");
//! assert_eq!(e.estimated_days, 7);
//! assert!(!e.is_estimated);
//! ```

pub mod error;
mod estimate;
mod parse;

use chrono::NaiveDate;
use coact_core::Medication;

pub use error::{Error, Result};
pub use estimate::{
  CompletedMedication, DurationEstimate, EstimateBasis, Estimator,
  EstimatorConfig, Regimen,
};
pub use parse::{TimeOfDay, parse_dose, parse_frequency, times_of_day};

// ─── Public API ──────────────────────────────────────────────────────────────

/// Estimate the end of a course with the default configuration.
///
/// See [`Estimator::estimate`] for the policy table.
pub fn estimate(
  quantity: Option<f64>,
  dose: &str,
  frequency: &str,
  start: NaiveDate,
) -> Result<DurationEstimate> {
  Estimator::default().estimate(quantity, dose, frequency, start)
}

/// Fill missing end dates from dispensed quantities with the default
/// configuration.
pub fn complete_end_dates(medications: &[Medication]) -> Vec<CompletedMedication> {
  Estimator::default().complete_end_dates(medications)
}
