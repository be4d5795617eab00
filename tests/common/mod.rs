//! Shared utilities for integration testing.

#![allow(dead_code)]

use ai_orchestrator::config::{AiConfig, ProviderSettings};
use ai_orchestrator::provider::{
    AdapterError, GenerationParams, ProviderAdapter, ProviderId, ProviderResponse,
};
use ai_orchestrator::service::AiService;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// What a mock provider does on one call.
#[derive(Debug, Clone)]
pub enum Behavior {
    Reply(&'static str),
    Fail(AdapterError),
    /// Sleep, then reply. Used to outlast the dispatcher's deadline.
    Sleep(Duration),
    /// Wait for a permit on the gate, then reply.
    Gate(Arc<Semaphore>),
    /// Wait for a permit on the gate, then fail transiently.
    GateThenFail(Arc<Semaphore>),
}

/// Mock provider that plays back a script, then repeats a fallback.
#[derive(Debug)]
pub struct ScriptedAdapter {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Behavior>>,
    fallback: Behavior,
}

impl ScriptedAdapter {
    pub fn new(fallback: Behavior) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(VecDeque::new()),
            fallback,
        })
    }

    pub fn replying(text: &'static str) -> Arc<Self> {
        Self::new(Behavior::Reply(text))
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Behavior::Fail(AdapterError::Transient("upstream 503".into())))
    }

    pub fn scripted(script: Vec<Behavior>, fallback: Behavior) -> Arc<Self> {
        let adapter = Self::new(fallback);
        adapter.script.lock().unwrap().extend(script);
        adapter
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
        _timeout: Duration,
    ) -> Result<ProviderResponse, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match behavior {
            Behavior::Reply(text) => Ok(ProviderResponse::text(text)),
            Behavior::Fail(error) => Err(error),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                Ok(ProviderResponse::text("slow"))
            }
            Behavior::Gate(gate) => {
                let _permit = gate.acquire().await.unwrap();
                Ok(ProviderResponse::text("released"))
            }
            Behavior::GateThenFail(gate) => {
                let _permit = gate.acquire().await.unwrap();
                Err(AdapterError::Transient("connection reset".into()))
            }
        }
    }
}

/// Config with the given `(id, priority)` providers, all credentialed and no
/// default provider, so candidates follow priority order.
pub fn config(providers: &[(&str, u32)]) -> AiConfig {
    AiConfig {
        default_provider: String::new(),
        providers: providers
            .iter()
            .map(|(id, priority)| ProviderSettings::new(*id, *priority).with_api_key("test-key"))
            .collect(),
        ..AiConfig::default()
    }
}

pub fn service(config: &AiConfig, adapters: &[(ProviderId, Arc<ScriptedAdapter>)]) -> AiService {
    adapters
        .iter()
        .fold(AiService::from_config(config), |builder, (id, adapter)| {
            builder.adapter(*id, adapter.clone())
        })
        .build()
}

/// Yield to the runtime until `condition` holds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}
