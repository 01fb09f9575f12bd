//! The medication record, the unit every engine component works on.
//!
//! A record belongs to one clinical case. Derived data (canonical intervals,
//! estimated end dates, segments) is recomputed on each request and never
//! written back into the record.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  date::{DateRole, parse_usage_date},
};

// ─── Medication ──────────────────────────────────────────────────────────────

/// A prescribed medication with an optional usage window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
  /// Pharmacological identity key.
  pub drug_name:            String,
  #[serde(default)]
  pub prescribed_dose:      String,
  #[serde(default)]
  pub prescribed_frequency: String,
  #[serde(default)]
  pub usage_start_date:     Option<NaiveDate>,
  #[serde(default)]
  pub usage_end_date:       Option<NaiveDate>,
  #[serde(default)]
  pub indication:           String,
  /// Total quantity dispensed, in the same unit as the dose (tablets,
  /// sachets, ml). Feeds the duration estimator.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dispensed_quantity:   Option<f64>,
}

impl Medication {
  /// Convenience constructor with every optional field empty.
  pub fn new(drug_name: impl Into<String>) -> Self {
    Self {
      drug_name:            drug_name.into(),
      prescribed_dose:      String::new(),
      prescribed_frequency: String::new(),
      usage_start_date:     None,
      usage_end_date:       None,
      indication:           String::new(),
      dispensed_quantity:   None,
    }
  }

  pub fn with_dates(
    mut self,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
  ) -> Self {
    self.usage_start_date = start;
    self.usage_end_date = end;
    self
  }

  pub fn with_regimen(
    mut self,
    dose: impl Into<String>,
    frequency: impl Into<String>,
  ) -> Self {
    self.prescribed_dose = dose.into();
    self.prescribed_frequency = frequency.into();
    self
  }

  pub fn with_quantity(mut self, quantity: f64) -> Self {
    self.dispensed_quantity = Some(quantity);
    self
  }

  /// True when at least one of the usage dates is recorded.
  pub fn is_dated(&self) -> bool {
    self.usage_start_date.is_some() || self.usage_end_date.is_some()
  }

  /// The drug name reduced to its comparable form.
  pub fn normalized_name(&self) -> String { normalize_drug_name(&self.drug_name) }

  /// A total order over records, used wherever output must not depend on
  /// input order.
  pub fn canonical_cmp(&self, other: &Self) -> Ordering {
    self
      .drug_name
      .cmp(&other.drug_name)
      .then_with(|| self.usage_start_date.cmp(&other.usage_start_date))
      .then_with(|| self.usage_end_date.cmp(&other.usage_end_date))
      .then_with(|| self.prescribed_dose.cmp(&other.prescribed_dose))
      .then_with(|| self.prescribed_frequency.cmp(&other.prescribed_frequency))
      .then_with(|| self.indication.cmp(&other.indication))
      .then_with(|| {
        let q = |m: &Self| m.dispensed_quantity.unwrap_or(f64::NEG_INFINITY);
        q(self).total_cmp(&q(other))
      })
  }
}

// ─── Raw extraction input ────────────────────────────────────────────────────

/// A medication exactly as the extraction collaborator emits it, with dates
/// still in free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMedication {
  pub drug_name:            String,
  #[serde(default)]
  pub prescribed_dose:      Option<String>,
  #[serde(default)]
  pub prescribed_frequency: Option<String>,
  #[serde(default)]
  pub usage_start_date:     Option<String>,
  #[serde(default)]
  pub usage_end_date:       Option<String>,
  #[serde(default)]
  pub indication:           Option<String>,
  #[serde(default)]
  pub dispensed_quantity:   Option<f64>,
}

impl TryFrom<RawMedication> for Medication {
  type Error = Error;

  fn try_from(raw: RawMedication) -> Result<Self> {
    let drug_name = raw.drug_name.trim().to_string();
    if drug_name.is_empty() {
      return Err(Error::EmptyDrugName);
    }

    let date = |v: &Option<String>, role| match v {
      Some(s) => parse_usage_date(s, role),
      None => Ok(None),
    };

    Ok(Self {
      drug_name,
      prescribed_dose: raw.prescribed_dose.unwrap_or_default(),
      prescribed_frequency: raw.prescribed_frequency.unwrap_or_default(),
      usage_start_date: date(&raw.usage_start_date, DateRole::Start)?,
      usage_end_date: date(&raw.usage_end_date, DateRole::End)?,
      indication: raw.indication.unwrap_or_default(),
      dispensed_quantity: raw.dispensed_quantity,
    })
  }
}

// ─── Names ───────────────────────────────────────────────────────────────────

/// Reduce a drug name to its comparable form: lower-case, with strength and
/// packaging suffixes dropped ("Atorvastatin 20mg" → "atorvastatin").
pub fn normalize_drug_name(name: &str) -> String {
  let lowered = name.to_lowercase();
  let mut kept: Vec<&str> = Vec::new();
  for token in lowered.split_whitespace() {
    let starts_numeric = token
      .chars()
      .next()
      .is_some_and(|c| c.is_ascii_digit() || c == '(');
    if starts_numeric {
      break;
    }
    let token = token.trim_matches(|c: char| !c.is_alphanumeric());
    if !token.is_empty() {
      kept.push(token);
    }
  }
  kept.join(" ")
}
