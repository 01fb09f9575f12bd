//! Timeline segmentation by plane sweep.
//!
//! Every dated medication contributes a start event at its first day and an
//! end event on the day after its last day, turning inclusive windows into
//! half-open ones. Sorting the events and sweeping them once yields the
//! maximal spans over which the set of active medications does not change.
//! Only spans with at least two medications are kept; a lone drug has nothing
//! to interact with.

use std::collections::BTreeSet;

use coact_core::{Bound, CanonicalInterval, Medication, normalize_drug_name};
use serde::{Deserialize, Serialize};

// ─── Segment ─────────────────────────────────────────────────────────────────

/// A maximal span during which exactly these medications were co-active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
  /// Inclusive on both ends.
  pub range:       CanonicalInterval,
  #[serde(rename = "rangeLabel")]
  pub label:       String,
  /// Sorted by [`Medication::canonical_cmp`]; always two or more.
  pub medications: Vec<Medication>,
}

impl Segment {
  fn new(range: CanonicalInterval, mut medications: Vec<Medication>) -> Self {
    medications.sort_by(Medication::canonical_cmp);
    Self {
      label: range.label(),
      range,
      medications,
    }
  }

  pub fn drug_names(&self) -> Vec<&str> {
    self.medications.iter().map(|m| m.drug_name.as_str()).collect()
  }

  /// True when a medication in this segment carries `drug` (compared on
  /// normalised names).
  pub fn contains(&self, drug: &str) -> bool {
    let wanted = normalize_drug_name(drug);
    self.medications.iter().any(|m| m.normalized_name() == wanted)
  }
}

/// Segments in which both drugs were active: the labels under which an
/// interaction finding for the pair belongs.
pub fn segments_with_pair<'a>(
  segments: &'a [Segment],
  drug_a: &str,
  drug_b: &str,
) -> Vec<&'a Segment> {
  segments
    .iter()
    .filter(|s| s.contains(drug_a) && s.contains(drug_b))
    .collect()
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Declaration order is the tie-break on a shared date: a medication that
/// stops on the day another starts does not overlap it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
  End,
  Start,
}

/// Field order is the sort order: position, then kind, then medication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Event {
  at:         Bound,
  kind:       EventKind,
  medication: usize,
}

// ─── Sweep ───────────────────────────────────────────────────────────────────

/// Split `medications` into co-active segments, in time order.
///
/// Pure and deterministic: the same multiset of records yields the same
/// segments whatever the input order. Records with neither date are assumed
/// active throughout: they count toward the co-active set everywhere, so
/// they can open spans before the first and after the last dated event, but
/// they never add a boundary of their own.
pub fn segment(medications: &[Medication]) -> Vec<Segment> {
  let mut sorted: Vec<&Medication> = medications.iter().collect();
  sorted.sort_by(|a, b| a.canonical_cmp(b));
  let (dated, undated): (Vec<&Medication>, Vec<&Medication>) =
    sorted.into_iter().partition(|m| m.is_dated());

  if dated.is_empty() {
    if undated.len() < 2 {
      return Vec::new();
    }
    let all = undated.into_iter().cloned().collect();
    return vec![Segment::new(CanonicalInterval::UNBOUNDED, all)];
  }

  let mut events = Vec::with_capacity(dated.len() * 2);
  for (i, med) in dated.iter().enumerate() {
    let (interval, repair) = CanonicalInterval::resolve(med);
    if let Some(repair) = repair {
      tracing::warn!(
        drug = %med.drug_name,
        start = %repair.original_start,
        end = %repair.original_end,
        "usage end date precedes start date; keeping medication with swapped window"
      );
    }
    events.push(Event {
      at:         interval.start,
      kind:       EventKind::Start,
      medication: i,
    });
    events.push(Event {
      at:         interval.exclusive_end(),
      kind:       EventKind::End,
      medication: i,
    });
  }
  events.sort_unstable();

  let co_active = |active: &BTreeSet<usize>| active.len() + undated.len() >= 2;
  let snapshot = |range: CanonicalInterval, active: &BTreeSet<usize>| {
    let members = active
      .iter()
      .map(|&i| dated[i])
      .chain(undated.iter().copied())
      .cloned()
      .collect();
    Segment::new(range, members)
  };

  let mut active: BTreeSet<usize> = BTreeSet::new();
  let mut segment_start = Bound::NegativeInfinity;
  let mut segments = Vec::new();

  for event in &events {
    // Several events on one date leave zero-day states behind; skip them.
    if co_active(&active) && segment_start < event.at {
      let range = CanonicalInterval::new(segment_start, event.at.previous_day());
      segments.push(snapshot(range, &active));
    }

    match event.kind {
      EventKind::Start => active.insert(event.medication),
      EventKind::End => active.remove(&event.medication),
    };
    segment_start = event.at;
  }

  // Only undated records remain active past the last event.
  if co_active(&active) && segment_start < Bound::PositiveInfinity {
    let range = CanonicalInterval::new(segment_start, Bound::PositiveInfinity);
    segments.push(snapshot(range, &active));
  }

  tracing::debug!(
    dated = dated.len(),
    undated = undated.len(),
    events = events.len(),
    segments = segments.len(),
    "timeline segmented"
  );
  segments
}
