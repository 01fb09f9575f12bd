//! Configured entry point tying the segmenter and the classifier together.

use coact_core::{
  Medication, Relatedness,
  relatedness::{AnyOf, ClassTable, NameSimilarity},
};

use crate::{
  Error, Result,
  classify::{ClaimReview, Classifier, InteractionClaim},
  config::EngineConfig,
  segment::{Segment, segment},
};

pub struct Engine<R> {
  config:     EngineConfig,
  classifier: Classifier<R>,
}

impl<R: Relatedness> Engine<R> {
  pub fn new(config: EngineConfig, relatedness: R) -> Self {
    let classifier =
      Classifier::new(relatedness).with_switch_gap_days(config.switch_gap_days);
    Self { config, classifier }
  }

  pub fn config(&self) -> &EngineConfig { &self.config }

  pub fn classifier(&self) -> &Classifier<R> { &self.classifier }

  /// [`segment`] behind the input-size cap.
  pub fn segment(&self, medications: &[Medication]) -> Result<Vec<Segment>> {
    self.check_size(medications)?;
    Ok(segment(medications))
  }

  pub fn review_claims(
    &self,
    medications: &[Medication],
    claims: &[InteractionClaim],
  ) -> Result<Vec<ClaimReview>> {
    self.check_size(medications)?;
    let reviews = self.classifier.review_claims(medications, claims);
    tracing::debug!(
      claims = reviews.len(),
      suppressed = reviews.iter().filter(|r| r.suppressed).count(),
      "interaction claims reviewed"
    );
    Ok(reviews)
  }

  fn check_size(&self, medications: &[Medication]) -> Result<()> {
    let max = self.config.max_medications;
    if medications.len() > max {
      tracing::warn!(count = medications.len(), max, "rejecting oversized input");
      return Err(Error::TooManyMedications {
        count: medications.len(),
        max,
      });
    }
    Ok(())
  }
}

impl Engine<AnyOf> {
  /// An engine using the built-in class table, falling back to the
  /// name-stem heuristic.
  pub fn with_builtin(config: EngineConfig) -> Self {
    let relatedness = AnyOf::new()
      .with(ClassTable::builtin())
      .with(NameSimilarity::new());
    Self::new(config, relatedness)
  }
}
