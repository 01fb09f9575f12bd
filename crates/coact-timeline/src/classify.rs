//! Pairwise relationship classifier.
//!
//! Answers three questions about two medications: did they overlap, was the
//! second a switch from the first, and should an interaction claimed between
//! them reach the clinician. The temporal half lives here; pharmacological
//! relatedness is injected.

use coact_core::{CanonicalInterval, Medication, Relatedness, normalize_drug_name};
use serde::{Deserialize, Serialize};

/// True iff the canonical windows of `a` and `b` share at least one calendar
/// day. A medication that stops on one day and another that starts the next
/// day do not overlap.
pub fn overlaps(a: &Medication, b: &Medication) -> bool {
  CanonicalInterval::of(a).overlaps(&CanonicalInterval::of(b))
}

// ─── Verdicts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
  ConcurrentUse,
  SequentialSwitch,
  InsufficientEvidence,
  OverlapDespiteSimilarity,
}

impl VerdictReason {
  pub fn message(&self) -> &'static str {
    match self {
      Self::ConcurrentUse => "real concurrent use",
      Self::SequentialSwitch => "sequential switch, not concurrent; suppressed",
      Self::InsufficientEvidence => "insufficient temporal evidence to suppress",
      Self::OverlapDespiteSimilarity => "real overlap despite class similarity",
    }
  }

  /// Decision table over (overlap, switching).
  fn decide(overlap: bool, switching: bool) -> (bool, Self) {
    match (overlap, switching) {
      (true, false) => (true, Self::ConcurrentUse),
      (false, true) => (false, Self::SequentialSwitch),
      (false, false) => (true, Self::InsufficientEvidence),
      (true, true) => (true, Self::OverlapDespiteSimilarity),
    }
  }
}

/// Everything the classifier knows about one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipVerdict {
  pub pair:              (String, String),
  pub overlap:           bool,
  pub switching:         bool,
  pub interaction_valid: bool,
  pub reason:            VerdictReason,
}

/// Outcome of sanity-checking one claimed interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionCheck {
  pub is_valid: bool,
  pub reason:   String,
}

// ─── Claims ──────────────────────────────────────────────────────────────────

/// An interaction statement produced by the downstream analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionClaim {
  pub drug_a: String,
  pub drug_b: String,
  pub text:   String,
}

/// A claim annotated for the report layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReview {
  pub claim:      InteractionClaim,
  /// `None` when either drug is absent from the medication record.
  pub verdict:    Option<RelationshipVerdict>,
  pub suppressed: bool,
  pub reason:     String,
}

// ─── Classifier ──────────────────────────────────────────────────────────────

pub struct Classifier<R> {
  relatedness:     R,
  switch_gap_days: u32,
}

impl<R: Relatedness> Classifier<R> {
  /// A classifier that accepts only next-day starts as switches.
  pub fn new(relatedness: R) -> Self {
    Self {
      relatedness,
      switch_gap_days: 0,
    }
  }

  pub fn with_switch_gap_days(mut self, days: u32) -> Self {
    self.switch_gap_days = days;
    self
  }

  pub fn switch_gap_days(&self) -> u32 { self.switch_gap_days }

  pub fn overlaps(&self, a: &Medication, b: &Medication) -> bool { overlaps(a, b) }

  /// True iff the windows are disjoint, the gap between them is within the
  /// configured tolerance, and the drugs are related.
  pub fn is_switching(&self, a: &Medication, b: &Medication) -> bool {
    let (ia, ib) = (CanonicalInterval::of(a), CanonicalInterval::of(b));
    if ia.overlaps(&ib) {
      return false;
    }
    let Some(gap) = ia.gap_days(&ib) else {
      return false;
    };
    gap <= i64::from(self.switch_gap_days) && self.relatedness.are_related(a, b)
  }

  pub fn verdict(&self, a: &Medication, b: &Medication) -> RelationshipVerdict {
    let overlap = self.overlaps(a, b);
    let switching = self.is_switching(a, b);
    let (interaction_valid, reason) = VerdictReason::decide(overlap, switching);
    RelationshipVerdict {
      pair: (a.drug_name.clone(), b.drug_name.clone()),
      overlap,
      switching,
      interaction_valid,
      reason,
    }
  }

  /// Sanity-check an externally claimed interaction between `a` and `b`
  /// against their timelines.
  pub fn validate_interaction(
    &self,
    a: &Medication,
    b: &Medication,
    claim: &str,
  ) -> InteractionCheck {
    let verdict = self.verdict(a, b);
    if !verdict.interaction_valid {
      tracing::info!(
        drug_a = %a.drug_name,
        drug_b = %b.drug_name,
        claim,
        "suppressing interaction claim on a sequential switch"
      );
    }
    InteractionCheck {
      is_valid: verdict.interaction_valid,
      reason:   format!(
        "{} ({} / {})",
        verdict.reason.message(),
        a.drug_name,
        b.drug_name
      ),
    }
  }

  /// Annotate each claim against the medication record.
  ///
  /// A claim is suppressed only when every pair of records matching its two
  /// drugs is a sequential switch. Claims naming a drug absent from the
  /// record are kept.
  pub fn review_claims(
    &self,
    medications: &[Medication],
    claims: &[InteractionClaim],
  ) -> Vec<ClaimReview> {
    claims
      .iter()
      .map(|claim| self.review_claim(medications, claim))
      .collect()
  }

  fn review_claim(
    &self,
    medications: &[Medication],
    claim: &InteractionClaim,
  ) -> ClaimReview {
    let side_a = matching(medications, &claim.drug_a);
    let side_b = matching(medications, &claim.drug_b);

    let mut verdicts = side_a.iter().flat_map(|a| {
      side_b
        .iter()
        .filter(move |b| !std::ptr::eq(*a, **b))
        .map(move |b| self.verdict(a, b))
    });

    let Some(first) = verdicts.next() else {
      return ClaimReview {
        claim:      claim.clone(),
        verdict:    None,
        suppressed: false,
        reason:     "drug not found in medication record; kept".to_string(),
      };
    };

    let verdict = if first.interaction_valid {
      first
    } else {
      verdicts.find(|v| v.interaction_valid).unwrap_or(first)
    };
    let suppressed = !verdict.interaction_valid;
    if suppressed {
      tracing::info!(
        drug_a = %claim.drug_a,
        drug_b = %claim.drug_b,
        "suppressing interaction claim on a sequential switch"
      );
    }
    ClaimReview {
      claim: claim.clone(),
      reason: verdict.reason.message().to_string(),
      verdict: Some(verdict),
      suppressed,
    }
  }
}

/// Records whose drug matches `name`: equal normalised names, or a one-word
/// name equal to the other's leading word ("atorvastatin" matches
/// "Atorvastatin calcium").
fn matching<'a>(medications: &'a [Medication], name: &str) -> Vec<&'a Medication> {
  let wanted = normalize_drug_name(name);
  if wanted.is_empty() {
    return Vec::new();
  }
  let leading = |s: &str| s.split_whitespace().next().map(str::to_string);
  medications
    .iter()
    .filter(|m| {
      let have = m.normalized_name();
      if have == wanted {
        return true;
      }
      let single = |s: &str| !s.contains(' ');
      (single(&have) || single(&wanted)) && leading(&have) == leading(&wanted)
    })
    .collect()
}
