//! Pharmacological relatedness, injected into the relationship classifier.
//!
//! The classifier only reasons about time. Whether two drugs are close enough
//! for a gap between them to read as a therapy switch is decided by an
//! implementation of [`Relatedness`]: an exact class table, a name heuristic,
//! a composition of both, or an external ontology behind [`from_fn`].

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::medication::Medication;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Decides whether two medications are pharmacologically related.
///
/// Implementations must be symmetric and free of side effects; the classifier
/// may call them from several threads at once.
pub trait Relatedness: Send + Sync {
  fn are_related(&self, a: &Medication, b: &Medication) -> bool;
}

impl<R: Relatedness + ?Sized> Relatedness for Box<R> {
  fn are_related(&self, a: &Medication, b: &Medication) -> bool {
    (**self).are_related(a, b)
  }
}

impl<R: Relatedness + ?Sized> Relatedness for Arc<R> {
  fn are_related(&self, a: &Medication, b: &Medication) -> bool {
    (**self).are_related(a, b)
  }
}

impl<R: Relatedness + ?Sized> Relatedness for &R {
  fn are_related(&self, a: &Medication, b: &Medication) -> bool {
    (**self).are_related(a, b)
  }
}

// ─── Closure adapter ─────────────────────────────────────────────────────────

/// Adapts a closure (typically a lookup against an external ontology).
pub struct FnRelatedness<F>(F);

pub fn from_fn<F>(f: F) -> FnRelatedness<F>
where
  F: Fn(&Medication, &Medication) -> bool + Send + Sync,
{
  FnRelatedness(f)
}

impl<F> Relatedness for FnRelatedness<F>
where
  F: Fn(&Medication, &Medication) -> bool + Send + Sync,
{
  fn are_related(&self, a: &Medication, b: &Medication) -> bool { (self.0)(a, b) }
}

// ─── Drug classes ────────────────────────────────────────────────────────────

/// Classes covered by the built-in table.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DrugClass {
  Statin,
  Antiplatelet,
  Anticoagulant,
  Cephalosporin,
  Penicillin,
  Fluoroquinolone,
  Macrolide,
  ProtonPumpInhibitor,
  AceInhibitor,
  AngiotensinReceptorBlocker,
  BetaBlocker,
  CalciumChannelBlocker,
  Nsaid,
  Sulfonylurea,
  Benzodiazepine,
}

/// Generic and common brand names, already normalised.
const BUILTIN_CLASSES: &[(&str, DrugClass)] = &[
  ("atorvastatin", DrugClass::Statin),
  ("lipitor", DrugClass::Statin),
  ("rosuvastatin", DrugClass::Statin),
  ("crestor", DrugClass::Statin),
  ("simvastatin", DrugClass::Statin),
  ("zocor", DrugClass::Statin),
  ("lovastatin", DrugClass::Statin),
  ("pravastatin", DrugClass::Statin),
  ("pitavastatin", DrugClass::Statin),
  ("fluvastatin", DrugClass::Statin),
  ("aspirin", DrugClass::Antiplatelet),
  ("aspégic", DrugClass::Antiplatelet),
  ("clopidogrel", DrugClass::Antiplatelet),
  ("plavix", DrugClass::Antiplatelet),
  ("ticagrelor", DrugClass::Antiplatelet),
  ("brilinta", DrugClass::Antiplatelet),
  ("prasugrel", DrugClass::Antiplatelet),
  ("warfarin", DrugClass::Anticoagulant),
  ("acenocoumarol", DrugClass::Anticoagulant),
  ("sintrom", DrugClass::Anticoagulant),
  ("rivaroxaban", DrugClass::Anticoagulant),
  ("xarelto", DrugClass::Anticoagulant),
  ("apixaban", DrugClass::Anticoagulant),
  ("dabigatran", DrugClass::Anticoagulant),
  ("enoxaparin", DrugClass::Anticoagulant),
  ("lovenox", DrugClass::Anticoagulant),
  ("ceftazidime", DrugClass::Cephalosporin),
  ("ceftriaxone", DrugClass::Cephalosporin),
  ("cefuroxime", DrugClass::Cephalosporin),
  ("cefixime", DrugClass::Cephalosporin),
  ("cefotaxime", DrugClass::Cephalosporin),
  ("cefepime", DrugClass::Cephalosporin),
  ("cefazolin", DrugClass::Cephalosporin),
  ("cefoperazone", DrugClass::Cephalosporin),
  ("cephalexin", DrugClass::Cephalosporin),
  ("cefalexin", DrugClass::Cephalosporin),
  ("amoxicillin", DrugClass::Penicillin),
  ("augmentin", DrugClass::Penicillin),
  ("ampicillin", DrugClass::Penicillin),
  ("piperacillin", DrugClass::Penicillin),
  ("levofloxacin", DrugClass::Fluoroquinolone),
  ("ciprofloxacin", DrugClass::Fluoroquinolone),
  ("moxifloxacin", DrugClass::Fluoroquinolone),
  ("ofloxacin", DrugClass::Fluoroquinolone),
  ("azithromycin", DrugClass::Macrolide),
  ("clarithromycin", DrugClass::Macrolide),
  ("erythromycin", DrugClass::Macrolide),
  ("omeprazole", DrugClass::ProtonPumpInhibitor),
  ("esomeprazole", DrugClass::ProtonPumpInhibitor),
  ("nexium", DrugClass::ProtonPumpInhibitor),
  ("pantoprazole", DrugClass::ProtonPumpInhibitor),
  ("lansoprazole", DrugClass::ProtonPumpInhibitor),
  ("rabeprazole", DrugClass::ProtonPumpInhibitor),
  ("enalapril", DrugClass::AceInhibitor),
  ("lisinopril", DrugClass::AceInhibitor),
  ("perindopril", DrugClass::AceInhibitor),
  ("captopril", DrugClass::AceInhibitor),
  ("ramipril", DrugClass::AceInhibitor),
  ("losartan", DrugClass::AngiotensinReceptorBlocker),
  ("valsartan", DrugClass::AngiotensinReceptorBlocker),
  ("irbesartan", DrugClass::AngiotensinReceptorBlocker),
  ("telmisartan", DrugClass::AngiotensinReceptorBlocker),
  ("candesartan", DrugClass::AngiotensinReceptorBlocker),
  ("bisoprolol", DrugClass::BetaBlocker),
  ("metoprolol", DrugClass::BetaBlocker),
  ("atenolol", DrugClass::BetaBlocker),
  ("carvedilol", DrugClass::BetaBlocker),
  ("propranolol", DrugClass::BetaBlocker),
  ("nebivolol", DrugClass::BetaBlocker),
  ("amlodipine", DrugClass::CalciumChannelBlocker),
  ("nifedipine", DrugClass::CalciumChannelBlocker),
  ("felodipine", DrugClass::CalciumChannelBlocker),
  ("ibuprofen", DrugClass::Nsaid),
  ("diclofenac", DrugClass::Nsaid),
  ("meloxicam", DrugClass::Nsaid),
  ("celecoxib", DrugClass::Nsaid),
  ("naproxen", DrugClass::Nsaid),
  ("etoricoxib", DrugClass::Nsaid),
  ("gliclazide", DrugClass::Sulfonylurea),
  ("glimepiride", DrugClass::Sulfonylurea),
  ("glibenclamide", DrugClass::Sulfonylurea),
  ("glipizide", DrugClass::Sulfonylurea),
  ("diazepam", DrugClass::Benzodiazepine),
  ("alprazolam", DrugClass::Benzodiazepine),
  ("lorazepam", DrugClass::Benzodiazepine),
  ("bromazepam", DrugClass::Benzodiazepine),
  ("clonazepam", DrugClass::Benzodiazepine),
];

// ─── Exact class table ───────────────────────────────────────────────────────

/// Exact lookup of normalised drug names to class labels. Two medications
/// are related when they share a label, or when their normalised names are
/// identical.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
  classes: HashMap<String, String>,
}

impl ClassTable {
  pub fn new() -> Self { Self::default() }

  /// A table preloaded with common generics and brands.
  pub fn builtin() -> Self {
    let mut table = Self::new();
    for (name, class) in BUILTIN_CLASSES {
      table.insert(*name, class.to_string());
    }
    table
  }

  /// Register (or override) the class of a drug. `name` is normalised.
  pub fn insert(&mut self, name: &str, class: impl Into<String>) {
    self
      .classes
      .insert(crate::normalize_drug_name(name), class.into());
  }

  pub fn class_of(&self, name: &str) -> Option<&str> {
    let key = crate::normalize_drug_name(name);
    self.classes.get(&key).map(String::as_str).or_else(|| {
      // "Aspirin 81 mg" normalises to "aspirin"; "Aspirin Cardio" does not,
      // so fall back to the leading word.
      let first = key.split_whitespace().next()?;
      self.classes.get(first).map(String::as_str)
    })
  }

  pub fn len(&self) -> usize { self.classes.len() }

  pub fn is_empty(&self) -> bool { self.classes.is_empty() }
}

impl Relatedness for ClassTable {
  fn are_related(&self, a: &Medication, b: &Medication) -> bool {
    if a.normalized_name() == b.normalized_name() {
      return true;
    }
    match (self.class_of(&a.drug_name), self.class_of(&b.drug_name)) {
      (Some(x), Some(y)) => x == y,
      _ => false,
    }
  }
}

// ─── Name heuristic ──────────────────────────────────────────────────────────

/// International nonproprietary name stems that mark a shared class.
const SUFFIX_STEMS: &[&str] = &[
  "statin", "pril", "sartan", "olol", "prazole", "floxacin", "mycin",
  "cillin", "azepam", "azolam", "profen", "gliptin", "gliflozin", "dipine",
  "tidine", "grel", "xaban", "parin",
];
const PREFIX_STEMS: &[&str] = &["cef", "ceph"];

/// Relates drugs whose names share a class stem, and optionally any two
/// names sharing a long enough common prefix.
#[derive(Debug, Clone, Default)]
pub struct NameSimilarity {
  min_common_prefix: Option<usize>,
}

impl NameSimilarity {
  pub fn new() -> Self { Self::default() }

  /// Also treat names sharing at least `chars` leading characters as related.
  pub fn with_common_prefix(mut self, chars: usize) -> Self {
    self.min_common_prefix = Some(chars);
    self
  }

  fn stem_of(name: &str) -> Option<&'static str> {
    let first = name.split_whitespace().next()?;
    SUFFIX_STEMS
      .iter()
      .find(|s| first.len() > s.len() && first.ends_with(*s))
      .or_else(|| {
        PREFIX_STEMS
          .iter()
          .find(|s| first.len() > s.len() && first.starts_with(*s))
      })
      .copied()
  }
}

impl Relatedness for NameSimilarity {
  fn are_related(&self, a: &Medication, b: &Medication) -> bool {
    let (a, b) = (a.normalized_name(), b.normalized_name());
    if a.is_empty() || b.is_empty() {
      return false;
    }
    if a == b {
      return true;
    }
    if let (Some(x), Some(y)) = (Self::stem_of(&a), Self::stem_of(&b))
      && x == y
    {
      return true;
    }
    self.min_common_prefix.is_some_and(|n| {
      a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count() >= n
    })
  }
}

// ─── Composition ─────────────────────────────────────────────────────────────

/// Related when any inner capability says so.
#[derive(Default)]
pub struct AnyOf(pub Vec<Box<dyn Relatedness>>);

impl AnyOf {
  pub fn new() -> Self { Self::default() }

  pub fn with(mut self, r: impl Relatedness + 'static) -> Self {
    self.0.push(Box::new(r));
    self
  }
}

impl Relatedness for AnyOf {
  fn are_related(&self, a: &Medication, b: &Medication) -> bool {
    self.0.iter().any(|r| r.are_related(a, b))
  }
}

/// Never related. Every disjoint pair then classifies as non-switching.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrelated;

impl Relatedness for Unrelated {
  fn are_related(&self, _: &Medication, _: &Medication) -> bool { false }
}
