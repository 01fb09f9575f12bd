//! Canonical usage intervals.
//!
//! Every medication, dated or not, maps to exactly one inclusive interval of
//! calendar days. A missing start means "already active" and a missing end
//! means "still active"; both are represented as explicit infinite bounds so
//! that comparisons stay total.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::medication::Medication;

// ─── Bound ───────────────────────────────────────────────────────────────────

/// One end of an interval. Variant order is the temporal order, so the
/// derived `Ord` sorts `NegativeInfinity < Bounded(_) < PositiveInfinity`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum Bound {
  NegativeInfinity,
  Bounded(NaiveDate),
  PositiveInfinity,
}

impl Bound {
  pub fn date(&self) -> Option<NaiveDate> {
    match self {
      Self::Bounded(d) => Some(*d),
      _ => None,
    }
  }

  pub fn is_finite(&self) -> bool { matches!(self, Self::Bounded(_)) }

  /// The following calendar day. Infinite bounds are fixed points; the last
  /// representable date steps to `PositiveInfinity`.
  pub fn next_day(self) -> Self {
    match self {
      Self::Bounded(d) => d.succ_opt().map_or(Self::PositiveInfinity, Self::Bounded),
      other => other,
    }
  }

  /// The preceding calendar day, mirroring [`Bound::next_day`].
  pub fn previous_day(self) -> Self {
    match self {
      Self::Bounded(d) => d.pred_opt().map_or(Self::NegativeInfinity, Self::Bounded),
      other => other,
    }
  }
}

impl From<NaiveDate> for Bound {
  fn from(d: NaiveDate) -> Self { Self::Bounded(d) }
}

impl fmt::Display for Bound {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NegativeInfinity => f.write_str("-inf"),
      Self::Bounded(d) => write!(f, "{}", d.format("%Y-%m-%d")),
      Self::PositiveInfinity => f.write_str("+inf"),
    }
  }
}

// ─── Repair record ───────────────────────────────────────────────────────────

/// Emitted when a record's end date precedes its start date. The medication
/// is kept; its window is rebuilt from the original end to the original start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRepair {
  pub original_start: NaiveDate,
  pub original_end:   NaiveDate,
}

// ─── CanonicalInterval ───────────────────────────────────────────────────────

/// An inclusive range of calendar days, possibly unbounded on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalInterval {
  pub start: Bound,
  pub end:   Bound,
}

impl CanonicalInterval {
  pub const UNBOUNDED: Self = Self {
    start: Bound::NegativeInfinity,
    end:   Bound::PositiveInfinity,
  };

  pub fn new(start: Bound, end: Bound) -> Self { Self { start, end } }

  /// The interval for `med`, repairing reversed dates. Use
  /// [`CanonicalInterval::resolve`] to learn whether a repair happened.
  pub fn of(med: &Medication) -> Self { Self::resolve(med).0 }

  /// The interval for `med` together with the repair applied, if any.
  ///
  /// Reversed dates are never rejected: the original end becomes the start
  /// and the window closes on the original start, so the medication stays in
  /// every analysis it belongs to. Reporting the repair is left to the
  /// caller.
  pub fn resolve(med: &Medication) -> (Self, Option<DateRepair>) {
    match (med.usage_start_date, med.usage_end_date) {
      (Some(start), Some(end)) if end < start => {
        let repair = DateRepair {
          original_start: start,
          original_end:   end,
        };
        (Self::new(end.into(), start.into()), Some(repair))
      }
      (start, end) => {
        let start = start.map_or(Bound::NegativeInfinity, Bound::Bounded);
        let end = end.map_or(Bound::PositiveInfinity, Bound::Bounded);
        (Self::new(start, end), None)
      }
    }
  }

  /// The first bound past the interval; the sweep's end-event position.
  pub fn exclusive_end(&self) -> Bound { self.end.next_day() }

  pub fn is_unbounded(&self) -> bool { *self == Self::UNBOUNDED }

  /// True iff both intervals contain at least one common calendar day.
  pub fn overlaps(&self, other: &Self) -> bool {
    self.start <= other.end && other.start <= self.end
  }

  pub fn contains(&self, day: NaiveDate) -> bool {
    let day = Bound::Bounded(day);
    self.start <= day && day <= self.end
  }

  /// Number of whole days strictly between the two intervals, when they are
  /// disjoint with bounded facing ends. Order of the arguments does not
  /// matter.
  pub fn gap_days(&self, other: &Self) -> Option<i64> {
    let (earlier, later) = if self.end < other.start {
      (self, other)
    } else if other.end < self.start {
      (other, self)
    } else {
      return None;
    };
    let last = earlier.end.date()?;
    let first = later.start.date()?;
    Some((first - last).num_days() - 1)
  }

  /// Human-readable range label used to group findings.
  pub fn label(&self) -> String {
    match (self.start, self.end) {
      (Bound::Bounded(s), Bound::Bounded(e)) if s == e => Bound::Bounded(s).to_string(),
      (s @ Bound::Bounded(_), e @ Bound::Bounded(_)) => format!("{s} → {e}"),
      (Bound::NegativeInfinity, e @ Bound::Bounded(_)) => format!("until {e}"),
      (s @ Bound::Bounded(_), Bound::PositiveInfinity) => format!("from {s} (ongoing)"),
      _ => "unknown date".to_string(),
    }
  }
}

impl fmt::Display for CanonicalInterval {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}, {}]", self.start, self.end)
  }
}
