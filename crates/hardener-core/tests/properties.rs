use hardener_core::{
    decide, prioritize, summarize, validate, ActiveSession, AuditResult, Decision,
    DeterministicPatcher, Finding, IterationRecord, Outcome, Severity,
};
use hardener_core::prioritizer::{CRITICAL_CAP, HIGH_CAP, MEDIUM_CAP};
use proptest::prelude::*;

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Critical),
        Just(Severity::High),
        Just(Severity::Medium),
        Just(Severity::Low),
    ]
}

fn findings() -> impl Strategy<Value = Vec<Finding>> {
    prop::collection::vec(severity(), 0..40).prop_map(|severities| {
        severities
            .into_iter()
            .enumerate()
            .map(|(i, s)| Finding::new(s, format!("finding-{}", i), ""))
            .collect()
    })
}

fn operations() -> impl Strategy<Value = Vec<(String, &'static str, bool)>> {
    prop::collection::vec(
        (
            "[a-z]{1,8}",
            prop::sample::select(vec!["get", "post", "put", "delete", "patch"]),
            any::<bool>(),
        ),
        0..6,
    )
}

fn document_text(ops: &[(String, &'static str, bool)], http_server: bool) -> String {
    let mut text = String::from("openapi: \"3.0.1\"\ninfo:\n  title: \"Generated\"\n  version: \"1.0\"\n");
    if http_server {
        text.push_str("servers:\n  - url: \"http://svc.example.com\"\n");
    }
    text.push_str("paths:\n");
    if ops.is_empty() {
        text.push_str("  {}\n");
    }
    for (i, (segment, method, with_responses)) in ops.iter().enumerate() {
        text.push_str(&format!("  /{}{}:\n    {}:\n", segment, i, method));
        if *with_responses {
            text.push_str("      responses:\n        \"200\":\n          description: \"ok\"\n");
        } else {
            text.push_str("      summary: \"op\"\n");
        }
    }
    text
}

proptest! {
    #[test]
    fn policy_target_always_wins(
        target in 0u8..=100,
        max in 1u32..20,
        index_offset in 0u32..20,
        bonus in 0u8..=100,
    ) {
        let index = index_offset % max;
        let score = target.saturating_add(bonus).min(100).max(target);
        prop_assert_eq!(decide(score, index, max, target), Decision::StopTargetAchieved);
    }

    #[test]
    fn policy_below_target(
        target in 1u8..=100,
        max in 1u32..20,
        index_offset in 0u32..20,
        score_seed in any::<u8>(),
    ) {
        let index = index_offset % max;
        let score = score_seed % target;
        let expected = if index == max - 1 {
            Decision::StopBudgetExhausted
        } else {
            Decision::Continue
        };
        prop_assert_eq!(decide(score, index, max, target), expected);
    }

    #[test]
    fn prioritizer_respects_caps_and_order(findings in findings()) {
        let prioritized = prioritize(&findings);
        prop_assert!(prioritized.critical.len() <= CRITICAL_CAP);
        prop_assert!(prioritized.high.len() <= HIGH_CAP);
        prop_assert!(prioritized.medium.len() <= MEDIUM_CAP);

        for (bucket, severity, cap) in [
            (&prioritized.critical, Severity::Critical, CRITICAL_CAP),
            (&prioritized.high, Severity::High, HIGH_CAP),
            (&prioritized.medium, Severity::Medium, MEDIUM_CAP),
        ] {
            let expected: Vec<&Finding> = findings
                .iter()
                .filter(|f| f.severity == severity)
                .take(cap)
                .collect();
            let actual: Vec<&Finding> = bucket.iter().collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn score_delta_is_exact(scores in prop::collection::vec(0u8..=100, 1..8)) {
        let artifact = validate("openapi: \"3.0.3\"\n").unwrap();
        let mut active = ActiveSession::new(100, scores.len() as u32);
        for (i, score) in scores.iter().enumerate() {
            active = active
                .record(IterationRecord::new(
                    i as u32,
                    artifact.clone(),
                    AuditResult::normal(*score, vec![]),
                    None,
                ))
                .unwrap();
        }
        let summary = summarize(&active.conclude(Outcome::BudgetExhausted));

        let first = scores[0] as i16;
        let last = scores[scores.len() - 1] as i16;
        prop_assert_eq!(summary.score_delta, last - first);
        prop_assert_eq!(summary.iterations_used as usize, scores.len());
    }

    #[test]
    fn deterministic_patch_is_idempotent(ops in operations(), http_server in any::<bool>()) {
        let artifact = validate(&document_text(&ops, http_server)).unwrap();
        let patcher = DeterministicPatcher::new();

        let once = patcher.apply(&artifact).unwrap();
        let twice = patcher.apply(&once).unwrap();
        prop_assert!(once.content_eq(&twice));
        prop_assert_eq!(once.text(), twice.text());
    }
}
