use crate::client::LlamaClient;
use crate::error::{LlamaError, Result};
use async_trait::async_trait;
use mrag_vector_store::{Embedder, Summarizer};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug)]
struct Server {
    client: LlamaClient,
    /// Last health result and when it was taken
    health: Mutex<Option<(Instant, bool)>>,
}

impl Server {
    fn cached(&self, interval: Duration) -> Option<bool> {
        let state = *self.health.lock().unwrap_or_else(PoisonError::into_inner);
        state.and_then(|(checked_at, healthy)| (checked_at.elapsed() < interval).then_some(healthy))
    }

    fn record(&self, healthy: bool) {
        let mut state = self.health.lock().unwrap_or_else(PoisonError::into_inner);
        *state = Some((Instant::now(), healthy));
    }
}

/// Ordered list of interchangeable servers. Requests go to the first server
/// whose (cached) health check passes.
#[derive(Debug)]
pub struct ServerPool {
    kind: &'static str,
    servers: Vec<Server>,
    interval: Duration,
}

impl ServerPool {
    /// `kind` names the pool in logs and errors, e.g. "embedding" or "chat"
    #[must_use]
    pub fn new(kind: &'static str, clients: Vec<LlamaClient>, interval: Duration) -> Self {
        Self {
            kind,
            servers: clients
                .into_iter()
                .map(|client| Server {
                    client,
                    health: Mutex::new(None),
                })
                .collect(),
            interval,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// First healthy server, re-checking any whose cached result expired
    pub async fn healthy(&self) -> Result<&LlamaClient> {
        for server in &self.servers {
            let healthy = match server.cached(self.interval) {
                Some(healthy) => healthy,
                None => {
                    let healthy = server.client.health().await;
                    server.record(healthy);
                    if !healthy {
                        log::warn!(
                            "{} server {} is unhealthy",
                            self.kind,
                            server.client.base_url()
                        );
                    }
                    healthy
                }
            };
            if healthy {
                return Ok(&server.client);
            }
        }
        Err(LlamaError::NoHealthyServer(self.kind))
    }

    /// Treat a server as down until its cached result expires
    fn mark_failed(&self, client: &LlamaClient) {
        if let Some(server) = self
            .servers
            .iter()
            .find(|s| s.client.base_url() == client.base_url())
        {
            server.record(false);
        }
    }

    async fn route<'a, T, F, Fut>(&'a self, call: F) -> Result<T>
    where
        F: FnOnce(&'a LlamaClient) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let client = self.healthy().await?;
        let result = call(client).await;
        if let Err(LlamaError::Http(err)) = &result {
            log::warn!("{} server {} failed: {err}", self.kind, client.base_url());
            self.mark_failed(client);
        }
        result
    }
}

#[async_trait]
impl Embedder for ServerPool {
    async fn embed(&self, text: &str) -> mrag_vector_store::Result<Vec<f32>> {
        Ok(self.route(|client| client.embedding(text)).await?)
    }
}

#[async_trait]
impl Summarizer for ServerPool {
    async fn summarize(&self, prompt: &str) -> mrag_vector_store::Result<String> {
        Ok(self.route(|client| client.chat(prompt)).await?)
    }
}
