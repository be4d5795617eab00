//! Concurrency limits and health sampling under load.

use ai_orchestrator::provider::{GenerationRequest, ProviderId};
use ai_orchestrator::resilience::BreakerState;
use ai_orchestrator::usage::AttemptOutcome;
use ai_orchestrator::{AiError, HealthStatus};
use common::{Behavior, ScriptedAdapter};
use std::sync::Arc;
use tokio::sync::Semaphore;

mod common;

#[tokio::test]
async fn test_eleventh_request_is_throttled() {
    let mut config = common::config(&[("claude", 1)]);
    config.max_concurrent_requests = 10;
    let gate = Arc::new(Semaphore::new(0));
    let adapter = ScriptedAdapter::new(Behavior::Gate(gate.clone()));
    let service = Arc::new(common::service(&config, &[(ProviderId::Claude, adapter.clone())]));
    let entry = service.registry().get(ProviderId::Claude).unwrap().clone();

    let mut held = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        held.push(tokio::spawn(async move {
            service.generate(GenerationRequest::new("hi")).await
        }));
    }
    common::wait_until(|| adapter.calls() == 10).await;
    assert_eq!(entry.limiter.in_flight(), 10);
    assert_eq!(service.system_health().per_provider[&ProviderId::Claude], HealthStatus::Degraded);

    let error = service.generate(GenerationRequest::new("hi")).await.unwrap_err();
    assert_eq!(
        error.failures()[0].error,
        AiError::Throttled { provider: ProviderId::Claude }
    );
    assert_eq!(adapter.calls(), 10, "throttled request must not reach the adapter");

    gate.add_permits(10);
    for handle in held {
        assert_eq!(handle.await.unwrap().unwrap().text(), "released");
    }
    assert_eq!(entry.limiter.in_flight(), 0);

    // Throttling is not a provider failure.
    assert_eq!(entry.breaker.snapshot().failure_count, 0);
    let throttled = service
        .usage()
        .unwrap()
        .records()
        .iter()
        .filter(|r| r.outcome == AttemptOutcome::Throttled)
        .count();
    assert_eq!(throttled, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_limit_holds_across_threads() {
    let mut config = common::config(&[("openai", 1), ("gemini", 2)]);
    config.providers[0].max_concurrent_requests = Some(3);
    let gate = Arc::new(Semaphore::new(0));
    let primary = ScriptedAdapter::new(Behavior::Gate(gate.clone()));
    let secondary = ScriptedAdapter::replying("overflow");
    let service = Arc::new(common::service(
        &config,
        &[(ProviderId::OpenAi, primary.clone()), (ProviderId::Gemini, secondary.clone())],
    ));

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.generate(GenerationRequest::new("hi")).await
        }));
    }

    // Exactly three hold the primary; the rest overflow to the secondary.
    common::wait_until(|| primary.calls() == 3 && secondary.calls() == 17).await;

    gate.add_permits(3);
    let mut overflowed = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().provider_used == ProviderId::Gemini {
            overflowed += 1;
        }
    }
    assert_eq!(overflowed, 17);
    assert_eq!(primary.calls(), 3);
    assert_eq!(
        service.registry().get(ProviderId::OpenAi).unwrap().limiter.in_flight(),
        0
    );
}

#[tokio::test]
async fn test_health_sampling_is_idempotent() {
    let mut config = common::config(&[("openai", 1), ("claude", 2)]);
    config.circuit_breaker.failure_threshold = 2;
    let service = common::service(
        &config,
        &[
            (ProviderId::OpenAi, ScriptedAdapter::failing()),
            (ProviderId::Claude, ScriptedAdapter::replying("ok")),
        ],
    );
    service.generate(GenerationRequest::new("hi")).await.unwrap();

    let first = service.system_health();
    let second = service.system_health();
    assert_eq!(first, second);
    assert_eq!(first.per_provider[&ProviderId::OpenAi], HealthStatus::Degraded);
    assert_eq!(first.per_provider[&ProviderId::Claude], HealthStatus::Healthy);
    assert_eq!(first.overall, HealthStatus::Degraded);

    let snapshot = service.registry().get(ProviderId::OpenAi).unwrap().breaker.snapshot();
    assert_eq!(snapshot.state, BreakerState::Closed);
    assert_eq!(snapshot.failure_count, 1);
}
