//! Integration tests for the Escalation Controller
//!
//! Drives the controller end to end with scripted generators and checks the
//! threshold, budget, reset and failure-accounting behaviour.

use std::sync::Arc;

use plan_router::{
    DecisionReason, EscalationController, ModelClass, RouterConfig, RoutingError,
    ScriptedGenerator,
};

type SharedController = EscalationController<Arc<ScriptedGenerator>, Arc<ScriptedGenerator>>;

fn controller_with(
    config: RouterConfig,
) -> (SharedController, Arc<ScriptedGenerator>, Arc<ScriptedGenerator>) {
    let small = Arc::new(ScriptedGenerator::new(ModelClass::Small));
    let large = Arc::new(ScriptedGenerator::new(ModelClass::Large));
    let controller =
        EscalationController::with_config(Arc::clone(&small), Arc::clone(&large), config)
            .expect("valid config");
    (controller, small, large)
}

/// Nine confident requests followed by a weak one: the weak one is in the
/// bottom 20% and the budget is untouched, so it escalates.
#[tokio::test]
async fn test_low_confidence_after_confident_history_escalates() {
    let (controller, small, large) = controller_with(RouterConfig::default());
    for _ in 0..9 {
        controller.tracker().increment_total();
        controller.window().record(0.9);
    }
    small.push_response("create chess tournament on monday in chicago", "small", Some(0.1));
    large.push_response("create chess tournament on monday in chicago", "large", None);

    let routed = controller
        .generate_plan("create chess tournament on monday in chicago")
        .await
        .unwrap();

    assert_eq!(routed.source, ModelClass::Large);
    assert_eq!(routed.plan, "large");
    assert_eq!(routed.decision.reason, DecisionReason::LowConfidence);
    assert_eq!(routed.decision.escalation_ratio, 0.0);
    assert_eq!(controller.usage().total_requests, 10);
    assert_eq!(controller.usage().escalated_requests, 1);
}

/// Same history, but three earlier requests already escalated: 3/10 is over
/// the 0.2 budget, so the weak request stays on the small generator.
#[tokio::test]
async fn test_exhausted_budget_blocks_escalation() {
    let (controller, small, large) = controller_with(RouterConfig::default());
    for _ in 0..9 {
        controller.tracker().increment_total();
        controller.window().record(0.9);
    }
    for _ in 0..3 {
        controller.tracker().increment_escalated();
    }
    small.push_response("Who is james manager ?", "small", Some(0.1));

    let routed = controller.generate_plan("Who is james manager ?").await.unwrap();

    assert_eq!(routed.source, ModelClass::Small);
    assert_eq!(routed.confidence, Some(0.1));
    assert_eq!(routed.decision.reason, DecisionReason::BudgetExhausted);
    assert!((routed.decision.escalation_ratio - 0.3).abs() < 1e-9);
    assert_eq!(large.calls(), 0);
}

/// With identical confidences every request ties the threshold, so only the
/// budget gates escalation: one in five requests escalates.
#[tokio::test]
async fn test_budget_paces_escalations() {
    let (controller, small, large) = controller_with(RouterConfig::default());
    for _ in 0..20 {
        small.push_response("u", "small", Some(0.5));
        large.push_response("u", "large", None);
    }

    let mut escalated_at = Vec::new();
    for i in 0..20 {
        if controller.generate_plan("u").await.unwrap().escalated() {
            escalated_at.push(i);
        }
    }

    assert_eq!(escalated_at, vec![0, 5, 10, 15]);
    assert_eq!(large.calls(), 4);
    assert_eq!(controller.usage().escalated_requests, 4);
}

#[tokio::test]
async fn test_confidence_above_threshold_never_escalates() {
    let (controller, small, large) = controller_with(RouterConfig::default());
    for c in [0.1, 0.2, 0.3, 0.4] {
        controller.window().record(c);
    }
    small.push_response("Is Abby on my team ?", "small", Some(0.6));

    let routed = controller.generate_plan("Is Abby on my team ?").await.unwrap();

    assert_eq!(routed.source, ModelClass::Small);
    assert!(routed.decision.confidence > routed.decision.threshold);
    assert_eq!(large.calls(), 0);
}

/// Old low scores drop out of the window and stop dragging the threshold.
#[tokio::test]
async fn test_evicted_scores_leave_threshold() {
    let config = RouterConfig {
        window_capacity: 3,
        max_delegation_ratio: 1.0,
        ..Default::default()
    };
    let (controller, small, large) = controller_with(config);
    for c in [0.1, 0.8, 0.8, 0.8] {
        small.push_response("u", "small", Some(c));
        large.push_response("u", "large", None);
    }

    let mut thresholds = Vec::new();
    for _ in 0..4 {
        thresholds.push(controller.generate_plan("u").await.unwrap().decision.threshold);
    }

    assert!(thresholds[2] < 0.8, "0.1 still in window: {:?}", thresholds);
    assert!((thresholds[3] - 0.8).abs() < 1e-9, "0.1 evicted: {:?}", thresholds);
    assert_eq!(controller.window().snapshot(), vec![0.8, 0.8, 0.8]);
}

/// The large generator failing keeps the request counted but never counts
/// it as escalated.
#[tokio::test]
async fn test_large_failure_is_counted_as_total_only() {
    let (controller, small, large) = controller_with(RouterConfig::default());
    small.push_response("u", "small", Some(0.3));
    large.push_failure("u", "bedrock throttled");

    let err = controller.generate_plan("u").await.unwrap_err();

    assert!(matches!(
        err,
        RoutingError::Generator {
            class: ModelClass::Large,
            ..
        }
    ));
    assert!(err.to_string().contains("bedrock throttled"));
    assert_eq!(controller.usage().total_requests, 1);
    assert_eq!(controller.usage().escalated_requests, 0);
    assert_eq!(controller.window().len(), 1);
}

#[tokio::test]
async fn test_counters_reset_at_limit() {
    let config = RouterConfig {
        max_requests_before_reset: 4,
        max_delegation_ratio: 0.0,
        ..Default::default()
    };
    let (controller, small, _large) = controller_with(config);
    for _ in 0..5 {
        small.push_response("u", "small", Some(0.5));
    }

    for _ in 0..4 {
        controller.generate_plan("u").await.unwrap();
    }
    let usage = controller.usage();
    assert_eq!(usage.total_requests, 0);
    assert_eq!(usage.escalation_ratio, 0.0);
    assert_eq!(usage.resets, 1);

    controller.generate_plan("u").await.unwrap();
    assert_eq!(controller.usage().total_requests, 1);
    // Window history survives the counter reset.
    assert_eq!(controller.window().len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_keep_counts_consistent() {
    let (controller, small, large) = controller_with(RouterConfig::default());
    let controller = Arc::new(controller);
    for i in 0..200 {
        small.push_response("u", "small", Some(f64::from(i % 10) / 10.0));
        large.push_response("u", "large", None);
    }

    let handles: Vec<_> = (0..200)
        .map(|_| {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.generate_plan("u").await })
        })
        .collect();

    let mut escalated = 0;
    for result in futures::future::join_all(handles).await {
        if result.unwrap().unwrap().escalated() {
            escalated += 1;
        }
    }

    let usage = controller.usage();
    assert_eq!(usage.total_requests, 200);
    assert_eq!(usage.escalated_requests, escalated);
    assert_eq!(large.calls(), escalated);
    assert_eq!(small.calls(), 200);
    assert_eq!(controller.window().len(), 100);
}
