//! Duration estimator: turns a dispensed quantity and a regimen into an end
//! date.
//!
//! The policy table below is the only place that interprets a parser `None`.
//! Whenever it substitutes a default it says so through `is_estimated`.

use chrono::{Days, NaiveDate};
use coact_core::Medication;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  parse::{parse_dose, parse_frequency},
};

/// Absorbs float noise such as `1.1 / 0.1 == 11.000000000000002` before
/// rounding up to whole days.
const DAY_EPSILON: f64 = 1e-9;

// ─── Regimen ─────────────────────────────────────────────────────────────────

/// Parser output for one prescription.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Regimen {
  pub dose_per_admin:    Option<f64>,
  pub frequency_per_day: Option<u32>,
}

impl Regimen {
  pub fn parse(dose: &str, frequency: &str) -> Self {
    Self {
      dose_per_admin:    parse_dose(dose),
      frequency_per_day: parse_frequency(frequency),
    }
  }

  /// Units consumed per day, or `None` when either half is missing or the
  /// product is not a positive number.
  pub fn daily_quantity(&self) -> Option<f64> {
    let daily = self.dose_per_admin? * f64::from(self.frequency_per_day?);
    (daily.is_finite() && daily > 0.0).then_some(daily)
  }
}

// ─── Estimate ────────────────────────────────────────────────────────────────

/// Which row of the policy table produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EstimateBasis {
  /// No quantity, parseable frequency: long-term therapy default.
  ChronicDefault,
  /// No quantity, no frequency: a one-off administration.
  SingleDose,
  /// Quantity present but the regimen is unusable: quantity read as days.
  QuantityAsDays,
  /// Quantity divided by the daily consumption.
  DailyConsumption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationEstimate {
  pub end_date:       NaiveDate,
  pub estimated_days: u32,
  pub is_estimated:   bool,
  pub basis:          EstimateBasis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
  /// Assumed course length for a regimen with no dispensed quantity.
  pub chronic_default_days: u32,
}

impl Default for EstimatorConfig {
  fn default() -> Self {
    Self {
      chronic_default_days: 30,
    }
  }
}

/// Stateless estimator; holds configuration only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Estimator {
  config: EstimatorConfig,
}

impl Estimator {
  pub fn new(config: EstimatorConfig) -> Self { Self { config } }

  /// Estimate when a course that begins on `start` ends.
  ///
  /// A quantity that is not a positive number is treated as missing.
  pub fn estimate(
    &self,
    quantity: Option<f64>,
    dose: &str,
    frequency: &str,
    start: NaiveDate,
  ) -> Result<DurationEstimate> {
    let regimen = Regimen::parse(dose, frequency);

    let Some(quantity) = usable_quantity(quantity) else {
      if regimen.frequency_per_day.is_some() {
        tracing::debug!(
          days = self.config.chronic_default_days,
          "no dispensed quantity; assuming chronic course"
        );
        return finish(
          start,
          self.config.chronic_default_days,
          true,
          EstimateBasis::ChronicDefault,
        );
      }
      return Ok(DurationEstimate {
        end_date:       start,
        estimated_days: 1,
        is_estimated:   false,
        basis:          EstimateBasis::SingleDose,
      });
    };

    match regimen.daily_quantity() {
      Some(daily) => {
        let days = whole_days(quantity / daily);
        finish(start, days, false, EstimateBasis::DailyConsumption)
      }
      None => {
        tracing::debug!(
          quantity,
          dose,
          frequency,
          "regimen unparseable; reading quantity as a day count"
        );
        finish(start, whole_days(quantity), true, EstimateBasis::QuantityAsDays)
      }
    }
  }
}

fn usable_quantity(quantity: Option<f64>) -> Option<f64> {
  let quantity = quantity?;
  if quantity.is_finite() && quantity > 0.0 {
    return Some(quantity);
  }
  tracing::warn!(quantity, "ignoring dispensed quantity that is not a positive number");
  None
}

/// Round a positive day count up to whole days (at least one).
fn whole_days(days: f64) -> u32 {
  let rounded = (days - DAY_EPSILON).ceil().max(1.0);
  if rounded >= f64::from(u32::MAX) {
    u32::MAX
  } else {
    rounded as u32
  }
}

fn finish(
  start: NaiveDate,
  days: u32,
  is_estimated: bool,
  basis: EstimateBasis,
) -> Result<DurationEstimate> {
  let end_date = start
    .checked_add_days(Days::new(u64::from(days)))
    .ok_or(Error::DateOutOfRange { start, days })?;
  Ok(DurationEstimate {
    end_date,
    estimated_days: days,
    is_estimated,
    basis,
  })
}

// ─── End-date completion ─────────────────────────────────────────────────────

/// A medication after end-date completion, with the estimate that filled it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedMedication {
  pub medication: Medication,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub estimate:   Option<DurationEstimate>,
}

impl Estimator {
  /// Fill missing end dates from dispensed quantities.
  ///
  /// Only records with a start date, no end date and a usable dispensed
  /// quantity are completed. Everything else passes through unchanged, so an
  /// open-ended record stays open-ended. A record whose estimate fails is
  /// logged and passed through; the rest of the list is still completed. The
  /// input is never modified.
  pub fn complete_end_dates(
    &self,
    medications: &[Medication],
  ) -> Vec<CompletedMedication> {
    medications.iter().map(|med| self.complete_one(med)).collect()
  }

  fn complete_one(&self, med: &Medication) -> CompletedMedication {
    let unchanged = || CompletedMedication {
      medication: med.clone(),
      estimate:   None,
    };
    let (Some(start), None, Some(quantity)) = (
      med.usage_start_date,
      med.usage_end_date,
      usable_quantity(med.dispensed_quantity),
    ) else {
      return unchanged();
    };
    match self.estimate(
      Some(quantity),
      &med.prescribed_dose,
      &med.prescribed_frequency,
      start,
    ) {
      Ok(estimate) => {
        let mut medication = med.clone();
        medication.usage_end_date = Some(estimate.end_date);
        CompletedMedication {
          medication,
          estimate: Some(estimate),
        }
      }
      Err(err) => {
        tracing::warn!(drug = %med.drug_name, %err, "could not complete end date");
        unchanged()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, m, day).unwrap() }

  fn estimate(
    quantity: Option<f64>,
    dose: &str,
    frequency: &str,
  ) -> DurationEstimate {
    Estimator::default()
      .estimate(quantity, dose, frequency, d(11, 16))
      .unwrap()
  }

  #[test]
  fn quantity_over_daily_consumption() {
    let e = estimate(Some(14.0), "1 viên", "2 lần/ngày");
    assert_eq!(e.end_date, d(11, 23));
    assert_eq!(e.estimated_days, 7);
    assert!(!e.is_estimated);
    assert_eq!(e.basis, EstimateBasis::DailyConsumption);
  }

  #[test]
  fn partial_last_day_rounds_up() {
    let e = estimate(Some(10.0), "1/2 viên", "sáng, trưa, tối");
    assert_eq!(e.estimated_days, 7);
    assert_eq!(e.end_date, d(11, 23));
  }

  #[test]
  fn float_noise_does_not_add_a_day() {
    let e = estimate(Some(1.1), "0.1 ml", "1 lần/ngày");
    assert_eq!(e.estimated_days, 11);
  }

  #[test]
  fn no_quantity_with_frequency_is_chronic() {
    let e = estimate(None, "1 viên", "1 lần/ngày");
    assert_eq!(e.estimated_days, 30);
    assert_eq!(e.end_date, d(12, 16));
    assert!(e.is_estimated);
    assert_eq!(e.basis, EstimateBasis::ChronicDefault);
  }

  #[test]
  fn chronic_default_is_configurable() {
    let e = Estimator::new(EstimatorConfig {
      chronic_default_days: 90,
    })
    .estimate(None, "", "sáng", d(1, 1))
    .unwrap();
    assert_eq!(e.estimated_days, 90);
    assert_eq!(e.end_date, d(4, 1));
  }

  #[test]
  fn no_quantity_no_frequency_is_single_dose() {
    let e = estimate(None, "1 ống", "khi cần");
    assert_eq!(e.end_date, d(11, 16));
    assert_eq!(e.estimated_days, 1);
    assert!(!e.is_estimated);
    assert_eq!(e.basis, EstimateBasis::SingleDose);
  }

  #[test]
  fn unparseable_regimen_reads_quantity_as_days() {
    let e = estimate(Some(4.5), "theo chỉ định", "2 lần/ngày");
    assert_eq!(e.estimated_days, 5);
    assert_eq!(e.end_date, d(11, 21));
    assert!(e.is_estimated);
    assert_eq!(e.basis, EstimateBasis::QuantityAsDays);
  }

  #[test]
  fn zero_daily_dose_falls_back_to_quantity_as_days() {
    let e = estimate(Some(10.0), "0 viên", "2 lần/ngày");
    assert_eq!(e.basis, EstimateBasis::QuantityAsDays);
    assert_eq!(e.estimated_days, 10);
    assert!(e.is_estimated);
  }

  #[test]
  fn non_positive_quantity_counts_as_missing() {
    for q in [0.0, -3.0, f64::NAN, f64::INFINITY] {
      let e = estimate(Some(q), "1 viên", "1 lần/ngày");
      assert_eq!(e.basis, EstimateBasis::ChronicDefault, "{q}");
      assert!(e.is_estimated);
      let e = estimate(Some(q), "1 ống", "khi cần");
      assert_eq!(e.basis, EstimateBasis::SingleDose, "{q}");
    }
  }

  #[test]
  fn end_date_overflow_is_an_error() {
    let err = Estimator::default()
      .estimate(Some(10.0), "1 viên", "1 lần/ngày", NaiveDate::MAX)
      .unwrap_err();
    assert!(matches!(err, Error::DateOutOfRange { days: 10, .. }));
  }

  #[test]
  fn completion_fills_only_open_dated_records_with_quantity() {
    let meds = vec![
      Medication::new("Amoxicillin")
        .with_regimen("1 viên", "3 lần/ngày")
        .with_dates(Some(d(11, 1)), None)
        .with_quantity(21.0),
      Medication::new("Atorvastatin")
        .with_regimen("1 viên", "1 lần/ngày")
        .with_dates(Some(d(11, 1)), None),
      Medication::new("Paracetamol")
        .with_dates(Some(d(11, 1)), Some(d(11, 3)))
        .with_quantity(10.0),
    ];
    let done = Estimator::default().complete_end_dates(&meds);

    assert_eq!(done[0].medication.usage_end_date, Some(d(11, 8)));
    assert_eq!(done[0].estimate.map(|e| e.estimated_days), Some(7));
    assert_eq!(done[1].medication, meds[1]);
    assert!(done[1].estimate.is_none());
    assert_eq!(done[2].medication, meds[2]);
    // Input untouched.
    assert_eq!(meds[0].usage_end_date, None);
  }

  #[test]
  fn one_bad_record_does_not_spoil_the_list() {
    let meds = vec![
      Medication::new("Amoxicillin")
        .with_regimen("1 viên", "3 lần/ngày")
        .with_dates(Some(d(11, 1)), None)
        .with_quantity(21.0),
      Medication::new("Paracetamol")
        .with_regimen("1 viên", "khi sốt")
        .with_dates(Some(d(11, 1)), None)
        .with_quantity(0.0),
      Medication::new("Metformin")
        .with_regimen("1 viên", "2 lần/ngày")
        .with_dates(Some(NaiveDate::MAX), None)
        .with_quantity(60.0),
    ];
    let done = Estimator::default().complete_end_dates(&meds);

    assert_eq!(done.len(), 3);
    assert_eq!(done[0].medication.usage_end_date, Some(d(11, 8)));
    assert_eq!(done[1].medication, meds[1]);
    assert!(done[1].estimate.is_none());
    assert_eq!(done[2].medication, meds[2]);
    assert!(done[2].estimate.is_none());
  }
}
