//! Lenient calendar-date parsing for extracted usage dates.
//!
//! The extraction collaborator hands over dates as free text. Full dates are
//! read in the handful of layouts prescriptions actually use; partial dates
//! (`2025-10`, `10/2025`, `2025`) resolve to the first or last day of their
//! period depending on which end of the usage window they describe.

use chrono::{Datelike, NaiveDate};

use crate::{Error, Result};

/// Which end of a usage window a date string describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum DateRole {
  #[strum(serialize = "usageStartDate")]
  Start,
  #[strum(serialize = "usageEndDate")]
  End,
}

/// Values the extractor emits when it found no date at all.
const PLACEHOLDERS: &[&str] = &[
  "", "-", "?", "null", "none", "n/a", "na", "unknown", "không rõ", "không có",
  "chưa rõ",
];

const FULL_FORMATS: &[&str] =
  &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Parse an extracted date string.
///
/// Returns `Ok(None)` for absent values and placeholders, and
/// [`Error::InvalidDate`] for text that is not a date in any supported
/// layout.
pub fn parse_usage_date(value: &str, role: DateRole) -> Result<Option<NaiveDate>> {
  let trimmed = value.trim();
  let lowered = trimmed.to_lowercase();
  if PLACEHOLDERS.contains(&lowered.as_str()) {
    return Ok(None);
  }

  let text = lowered
    .strip_prefix("ngày")
    .map(str::trim_start)
    .unwrap_or(&lowered);

  // ISO timestamps: only the calendar part matters.
  let text = match text.char_indices().nth(10) {
    Some((i, 'T' | 't' | ' ')) => &text[..i],
    _ => text,
  };

  for fmt in FULL_FORMATS {
    if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
      return Ok(Some(d));
    }
  }

  if let Some(d) = parse_partial(text, role) {
    return Ok(Some(d));
  }

  Err(Error::InvalidDate {
    field: role.into(),
    value: trimmed.to_string(),
  })
}

/// `YYYY`, `YYYY-MM`, `YYYY/MM`, `MM/YYYY` or `MM-YYYY`.
fn parse_partial(text: &str, role: DateRole) -> Option<NaiveDate> {
  let is_year = |s: &str| s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit());
  let is_month = |s: &str| {
    (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
  };

  if is_year(text) {
    let year: i32 = text.parse().ok()?;
    return match role {
      DateRole::Start => NaiveDate::from_ymd_opt(year, 1, 1),
      DateRole::End => NaiveDate::from_ymd_opt(year, 12, 31),
    };
  }

  let parts: Vec<&str> = text.split(['-', '/']).collect();
  let [a, b] = parts.as_slice() else {
    return None;
  };
  let (year, month) = if is_year(a) && is_month(b) {
    (a.parse().ok()?, b.parse().ok()?)
  } else if is_month(a) && is_year(b) {
    (b.parse().ok()?, a.parse().ok()?)
  } else {
    return None;
  };

  let first = NaiveDate::from_ymd_opt(year, month, 1)?;
  match role {
    DateRole::Start => Some(first),
    DateRole::End => last_day_of_month(first),
  }
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
  let (year, month) = if first.month() == 12 {
    (first.year() + 1, 1)
  } else {
    (first.year(), first.month() + 1)
  };
  NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}
