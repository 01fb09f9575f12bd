//! Free-text dose and frequency parser.
//!
//! Pipeline:
//!   dose text      └─ lowercase → fraction | "nửa" | unit-suffixed | bare number
//!   frequency text └─ lowercase → explicit count | hourly interval
//!                                 | abbreviation | time-of-day tokens | daily
//!
//! Anything the patterns do not recognise is `None`. No branch ever guesses
//! 0 or 1 on its own.

use std::sync::LazyLock;

use regex::Regex;
use strum::IntoEnumIterator;

// ─── Patterns ────────────────────────────────────────────────────────────────

/// Units that count administrations of the dispensed form. Mass units are
/// not listed: "500mg" says nothing about how many tablets are taken.
const UNITS: &str = r"(?:viên\s+nang|viên|gói|ống|ml|giọt|nang|miếng|lọ|chai|liều|muỗng|thìa|xịt|nhát|tablets?|tabs?|capsules?|caps?|sachets?|drops?|puffs?)";

static RE_FRACTION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!(
    r"(?:(\d+)\s+)?(\d+)\s*/\s*(\d+)\s*{UNITS}(?:\b|$)"
  ))
  .unwrap()
});
static RE_BARE_FRACTION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?:(\d+)\s+)?(\d+)\s*/\s*(\d+)$").unwrap()
});
static RE_HALF: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(&format!(r"\bnửa\s*{UNITS}")).unwrap());
static RE_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!(r"(\d+(?:[.,]\d+)?)\s*{UNITS}(?:\b|$)")).unwrap()
});
static RE_BARE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(\d+(?:[.,]\d+)?)$").unwrap());

const COUNT: &str = r"(\d+|một|hai|ba|bốn)";

static RE_TIMES_PER_DAY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!(
    r"{COUNT}\s*lần\s*(?:/|mỗi|trong|trên|một|1)?\s*ngày"
  ))
  .unwrap()
});
static RE_DAY_THEN_TIMES: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!(
    r"ngày\s*(?:uống|dùng|tiêm|bôi|nhỏ|xịt|ngậm)?\s*{COUNT}\s*lần"
  ))
  .unwrap()
});
static RE_X_PER_DAY: LazyLock<Regex> = LazyLock::new(|| {
  // "x 5 ngày" is a course length, not a rate.
  Regex::new(
    r"(?:x\s*(\d+)|(\d+)\s*(?:x|times))\s*(?:(?:/|\ba|\bper)\s*(?:ngày|day)\b|daily\b)",
  )
  .unwrap()
});
static RE_EVERY_HOURS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?:mỗi|cách|every|q)\s*(\d+)\s*(?:giờ|tiếng|hours?|hrs?|h)\b").unwrap()
});
static RE_ABBREVIATION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b(od|qd|once daily|bid|b\.i\.d|twice daily|tid|t\.i\.d|qid|q\.i\.d)\b")
    .unwrap()
});
static RE_DAILY: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b(?:hàng|mỗi)\s*ngày\b|\bdaily\b").unwrap());

// ─── Time of day ─────────────────────────────────────────────────────────────

/// Administration slots recognised in schedules like "sáng 1 viên, tối 1
/// viên". Each distinct slot counts as one administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum TimeOfDay {
  Morning,
  Noon,
  Afternoon,
  Evening,
  Bedtime,
  LateNight,
}

impl TimeOfDay {
  fn pattern(self) -> &'static Regex {
    static MORNING: LazyLock<Regex> =
      LazyLock::new(|| Regex::new(r"\b(?:sáng|morning)\b").unwrap());
    static NOON: LazyLock<Regex> =
      LazyLock::new(|| Regex::new(r"\b(?:trưa|noon|midday)\b").unwrap());
    static AFTERNOON: LazyLock<Regex> =
      LazyLock::new(|| Regex::new(r"\b(?:chiều|afternoon)\b").unwrap());
    static EVENING: LazyLock<Regex> =
      LazyLock::new(|| Regex::new(r"\b(?:tối|evening)\b").unwrap());
    static BEDTIME: LazyLock<Regex> = LazyLock::new(|| {
      Regex::new(r"\btrước\s+(?:khi\s+)?(?:đi\s+)?ngủ\b|\bbedtime\b").unwrap()
    });
    static LATE_NIGHT: LazyLock<Regex> =
      LazyLock::new(|| Regex::new(r"\b(?:khuya|night)\b").unwrap());

    match self {
      Self::Morning => &MORNING,
      Self::Noon => &NOON,
      Self::Afternoon => &AFTERNOON,
      Self::Evening => &EVENING,
      Self::Bedtime => &BEDTIME,
      Self::LateNight => &LATE_NIGHT,
    }
  }
}

/// Distinct time-of-day slots mentioned in `text`, in day order.
pub fn times_of_day(text: &str) -> Vec<TimeOfDay> {
  // "tối đa" means "at most", not "evening".
  let text = text.to_lowercase().replace("tối đa", " ");
  TimeOfDay::iter().filter(|t| t.pattern().is_match(&text)).collect()
}

// ─── Dose ────────────────────────────────────────────────────────────────────

fn parse_number(s: &str) -> Option<f64> { s.replace(',', ".").parse().ok() }

fn parse_count(s: &str) -> Option<u32> {
  match s {
    "một" => Some(1),
    "hai" => Some(2),
    "ba" => Some(3),
    "bốn" => Some(4),
    digits => digits.parse().ok(),
  }
}

/// `[whole] num/den`, as in "1 1/2 viên".
fn fraction(caps: &regex::Captures<'_>) -> Option<f64> {
  let whole: f64 = match caps.get(1) {
    Some(m) => m.as_str().parse().ok()?,
    None => 0.0,
  };
  let num: f64 = caps[2].parse().ok()?;
  let den: f64 = caps[3].parse().ok()?;
  (den != 0.0).then(|| whole + num / den)
}

/// Quantity taken per administration, in the dispensed unit.
pub fn parse_dose(text: &str) -> Option<f64> {
  let text = text.trim().to_lowercase();
  if text.is_empty() {
    return None;
  }

  if let Some(caps) = RE_FRACTION.captures(&text) {
    return fraction(&caps);
  }
  if let Some(caps) = RE_BARE_FRACTION.captures(&text) {
    return fraction(&caps);
  }
  if RE_HALF.is_match(&text) {
    return Some(0.5);
  }
  if let Some(caps) = RE_QUANTITY.captures(&text) {
    return parse_number(&caps[1]);
  }
  if let Some(caps) = RE_BARE.captures(&text) {
    return parse_number(&caps[1]);
  }
  None
}

// ─── Frequency ───────────────────────────────────────────────────────────────

/// Administrations per day. `None` when unparseable or when the text works
/// out to zero.
pub fn parse_frequency(text: &str) -> Option<u32> {
  let text = text.trim().to_lowercase();
  if text.is_empty() {
    return None;
  }
  explicit_frequency(&text).filter(|n| *n > 0)
}

fn explicit_frequency(text: &str) -> Option<u32> {
  if let Some(caps) = RE_TIMES_PER_DAY.captures(text) {
    return parse_count(&caps[1]);
  }
  if let Some(caps) = RE_DAY_THEN_TIMES.captures(text) {
    return parse_count(&caps[1]);
  }
  if let Some(caps) = RE_X_PER_DAY.captures(text) {
    let n = caps.get(1).or_else(|| caps.get(2))?;
    return parse_count(n.as_str());
  }
  if let Some(caps) = RE_EVERY_HOURS.captures(text) {
    let hours: u32 = caps[1].parse().ok()?;
    return (1..=24).contains(&hours).then(|| 24 / hours);
  }
  if let Some(caps) = RE_ABBREVIATION.captures(text) {
    return match &caps[1] {
      "od" | "qd" | "once daily" => Some(1),
      "bid" | "b.i.d" | "twice daily" => Some(2),
      "tid" | "t.i.d" => Some(3),
      _ => Some(4),
    };
  }

  let slots = times_of_day(text);
  if !slots.is_empty() {
    return u32::try_from(slots.len()).ok();
  }

  RE_DAILY.is_match(text).then_some(1)
}
