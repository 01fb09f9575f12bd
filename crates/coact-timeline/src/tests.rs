//! End-to-end checks over the segmenter, the classifier and the engine.

use chrono::NaiveDate;
use coact_core::{Medication, RawMedication, relatedness::ClassTable};

use crate::{
  Classifier, Engine, EngineConfig, Error, InteractionClaim, VerdictReason,
  overlaps, segment,
};

fn d(m: u32, day: u32) -> Option<NaiveDate> { NaiveDate::from_ymd_opt(2025, m, day) }

fn med(name: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Medication {
  Medication::new(name).with_dates(start, end)
}

fn classifier() -> Classifier<ClassTable> { Classifier::new(ClassTable::builtin()) }

fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
  if items.len() <= 1 {
    return vec![items.to_vec()];
  }
  let mut out = Vec::new();
  for i in 0..items.len() {
    let mut rest = items.to_vec();
    let head = rest.remove(i);
    for mut tail in permutations(&rest) {
      tail.insert(0, head.clone());
      out.push(tail);
    }
  }
  out
}

// ─── Classifier scenarios ────────────────────────────────────────────────────

#[test]
fn next_day_statin_switch_is_suppressed() {
  let lova = med("Lovastatin", d(10, 23), d(10, 27));
  let atorva = med("Atorvastatin", d(10, 28), d(11, 4));
  let c = classifier();

  assert!(!c.overlaps(&lova, &atorva));
  assert!(c.is_switching(&lova, &atorva));
  let check = c.validate_interaction(&lova, &atorva, "Statin duplication");
  assert!(!check.is_valid);
}

#[test]
fn overlapping_antiplatelets_are_real_concurrent_use() {
  let aspirin = med("Aspirin", d(10, 23), d(11, 4));
  let plavix = med("Plavix", d(10, 25), d(11, 1));
  let c = classifier();

  assert!(c.overlaps(&aspirin, &plavix));
  assert!(!c.is_switching(&aspirin, &plavix));
  let v = c.verdict(&aspirin, &plavix);
  assert!(v.interaction_valid);
  assert_eq!(v.reason, VerdictReason::ConcurrentUse);
  assert!(c.validate_interaction(&aspirin, &plavix, "Bleeding risk").is_valid);
}

#[test]
fn cephalosporin_step_down_is_a_switch() {
  let a = med("Ceftazidime", d(10, 27), d(11, 3));
  let b = med("Ceftriaxone", d(11, 4), d(11, 10));
  let c = classifier();

  assert!(!c.overlaps(&a, &b));
  assert!(c.is_switching(&a, &b));
}

#[test]
fn forced_overlap_is_not_a_switch() {
  let lova = med("Lovastatin", d(10, 23), d(10, 30));
  let atorva = med("Atorvastatin", d(10, 28), d(11, 4));
  let c = classifier();

  assert!(c.overlaps(&lova, &atorva));
  assert!(!c.is_switching(&lova, &atorva));
  assert!(c.validate_interaction(&lova, &atorva, "Statin duplication").is_valid);
}

#[test]
fn overlap_agrees_with_segmentation() {
  let cases = [
    (med("A", d(10, 1), d(10, 27)), med("B", d(10, 28), d(11, 4))),
    (med("A", d(10, 1), d(10, 28)), med("B", d(10, 28), d(11, 4))),
    (med("A", None, d(10, 5)), med("B", d(10, 5), None)),
    (med("A", None, None), med("B", d(10, 5), d(10, 6))),
    (med("A", d(11, 4), d(10, 28)), med("B", d(10, 20), d(10, 27))),
  ];
  for (a, b) in cases {
    let segmented = !segment(&[a.clone(), b.clone()]).is_empty();
    assert_eq!(overlaps(&a, &b), segmented, "{} / {}", a.drug_name, b.drug_name);
    assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
  }
}

// ─── Segmentation properties ─────────────────────────────────────────────────

#[test]
fn segmentation_ignores_input_order() {
  let meds = vec![
    med("Aspirin", d(10, 23), d(11, 4)),
    med("Plavix", d(10, 25), d(11, 1)),
    med("Omeprazole", None, None),
    med("Atorvastatin", d(10, 28), None),
  ];
  let expected = segment(&meds);
  assert!(!expected.is_empty());
  for order in permutations(&meds) {
    assert_eq!(segment(&order), expected);
  }
}

#[test]
fn every_segment_has_at_least_two_medications() {
  // Deterministic pseudo-random windows over two months.
  let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
  let mut next = |m: u64| {
    seed ^= seed << 13;
    seed ^= seed >> 7;
    seed ^= seed << 17;
    seed % m
  };
  let day = |n: u64| NaiveDate::from_ymd_opt(2025, 10, 1).map(|d| d + chrono::Days::new(n));

  for _ in 0..50 {
    let count = next(8) as usize;
    let meds: Vec<Medication> = (0..count)
      .map(|i| {
        let start = (next(4) != 0).then(|| day(next(60))).flatten();
        let end = (next(4) != 0).then(|| day(next(60))).flatten();
        med(&format!("Drug{i}"), start, end)
      })
      .collect();
    for s in segment(&meds) {
      assert!(s.medications.len() >= 2, "{}", s.label);
      assert!(s.range.start <= s.range.end, "{}", s.range);
    }
  }
}

#[test]
fn reversed_dates_keep_the_medication_everywhere_it_belongs() {
  let meds = vec![
    med("Warfarin", d(11, 10), d(10, 20)),
    med("Aspirin", d(10, 25), d(10, 30)),
    med("Omeprazole", d(11, 5), d(11, 15)),
  ];
  let segs = segment(&meds);
  assert_eq!(segs.len(), 2);
  assert!(segs.iter().all(|s| s.contains("warfarin")));
  assert_eq!(segs[0].label, "2025-10-25 → 2025-10-30");
  assert_eq!(segs[1].label, "2025-11-05 → 2025-11-10");
}

#[test]
fn undated_medication_joins_every_multi_drug_segment() {
  let segs = segment(&[
    med("A", d(10, 1), d(10, 10)),
    med("B", d(10, 5), d(10, 15)),
    med("C", d(10, 12), d(10, 20)),
    med("Undated", None, None),
  ]);
  assert_eq!(
    segs.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
    vec![
      "2025-10-01 → 2025-10-04",
      "2025-10-05 → 2025-10-10",
      "2025-10-11",
      "2025-10-12 → 2025-10-15",
      "2025-10-16 → 2025-10-20",
    ]
  );
  assert!(segs.iter().all(|s| s.contains("undated")));
  // Every span where two or more dated drugs overlap is still there.
  assert_eq!(segs[1].drug_names(), vec!["A", "B", "Undated"]);
  assert_eq!(segs[3].drug_names(), vec!["B", "C", "Undated"]);
}

#[test]
fn undated_pairs_with_a_single_dated_medication() {
  let segs = segment(&[med("A", d(10, 1), d(10, 10)), med("U", None, None)]);
  assert_eq!(segs.len(), 1);
  assert_eq!(segs[0].label, "2025-10-01 → 2025-10-10");
  assert_eq!(segs[0].drug_names(), vec!["A", "U"]);
}

#[test]
fn adding_a_dated_record_never_hides_an_undated_pair() {
  let undated = vec![med("Omeprazole", None, None), med("Warfarin", None, None)];
  assert_eq!(segment(&undated).len(), 1);

  let mut meds = undated.clone();
  meds.push(med("Aspirin", d(10, 1), d(10, 10)));
  let segs = segment(&meds);
  assert_eq!(segs.len(), 3);
  assert!(
    segs
      .iter()
      .all(|s| s.contains("omeprazole") && s.contains("warfarin"))
  );
}

// ─── Extraction input ────────────────────────────────────────────────────────

#[test]
fn extraction_payload_flows_into_segments() {
  let payload = serde_json::json!([
    {
      "drugName": "Aspirin 81mg",
      "prescribedDose": "1 viên",
      "prescribedFrequency": "sáng",
      "usageStartDate": "2025-10-23",
      "usageEndDate": "2025-11-04",
      "indication": "Dự phòng"
    },
    {
      "drugName": "Plavix 75mg",
      "prescribedDose": "1 viên",
      "prescribedFrequency": "1 lần/ngày",
      "usageStartDate": "25/10/2025",
      "usageEndDate": null
    },
    {
      "drugName": "Pantoprazole",
      "usageStartDate": null,
      "usageEndDate": "2025-10-24"
    }
  ]);
  let raw: Vec<RawMedication> = serde_json::from_value(payload).unwrap();
  let meds: Vec<Medication> = raw
    .into_iter()
    .map(Medication::try_from)
    .collect::<Result<_, _>>()
    .unwrap();

  let segs = segment(&meds);
  let summary: Vec<(&str, Vec<&str>)> = segs
    .iter()
    .map(|s| (s.label.as_str(), s.drug_names()))
    .collect();
  assert_eq!(summary, vec![
    ("2025-10-23 → 2025-10-24", vec!["Aspirin 81mg", "Pantoprazole"]),
    ("2025-10-25 → 2025-11-04", vec!["Aspirin 81mg", "Plavix 75mg"]),
  ]);

  let json = serde_json::to_value(&segs[0]).unwrap();
  assert_eq!(json["rangeLabel"], "2025-10-23 → 2025-10-24");
  assert_eq!(json["medications"][0]["drugName"], "Aspirin 81mg");
}

// ─── Engine ──────────────────────────────────────────────────────────────────

#[test]
fn engine_rejects_oversized_input() {
  let engine = Engine::with_builtin(EngineConfig {
    max_medications: 2,
    ..EngineConfig::default()
  });
  let meds = vec![
    med("A", d(10, 1), d(10, 5)),
    med("B", d(10, 1), d(10, 5)),
    med("C", d(10, 1), d(10, 5)),
  ];
  let err = engine.segment(&meds).unwrap_err();
  assert!(matches!(err, Error::TooManyMedications { count: 3, max: 2 }));
  assert!(engine.review_claims(&meds, &[]).is_err());
  assert_eq!(engine.segment(&meds[..2]).unwrap().len(), 1);
}

#[test]
fn engine_applies_configured_switch_gap() {
  let meds = vec![
    med("Ceftazidime", d(10, 27), d(11, 1)),
    med("Ceftriaxone", d(11, 4), d(11, 10)),
  ];
  let claim = InteractionClaim {
    drug_a: "Ceftazidime".into(),
    drug_b: "Ceftriaxone".into(),
    text:   "Duplicate cephalosporin therapy".into(),
  };

  let strict = Engine::with_builtin(EngineConfig::default());
  let reviews = strict.review_claims(&meds, &[claim.clone()]).unwrap();
  assert!(!reviews[0].suppressed);
  assert_eq!(
    reviews[0].verdict.as_ref().map(|v| v.reason),
    Some(VerdictReason::InsufficientEvidence)
  );

  let tolerant = Engine::with_builtin(EngineConfig {
    switch_gap_days: 2,
    ..EngineConfig::default()
  });
  assert_eq!(tolerant.classifier().switch_gap_days(), 2);
  let reviews = tolerant.review_claims(&meds, &[claim]).unwrap();
  assert!(reviews[0].suppressed);
  assert_eq!(reviews[0].reason, VerdictReason::SequentialSwitch.message());
}

#[test]
fn builtin_engine_relates_stems_missing_from_the_table() {
  // Neither name is in the class table; the stem heuristic relates them.
  let a = med("Zofenopril", d(10, 1), d(10, 10));
  let b = med("Fosinopril", d(10, 11), d(10, 20));
  let engine = Engine::with_builtin(EngineConfig::default());
  assert!(engine.classifier().is_switching(&a, &b));
  assert!(!classifier().is_switching(&a, &b));
}
