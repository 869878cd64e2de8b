//! Consul-backed membership source.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::DiscoveryConfig;
use crate::discovery::{DiscoveryError, Instancer, MembershipEvent};
use crate::resilience::backoff::Backoff;

/// Watches one service in the Consul catalog and broadcasts a full address
/// snapshot to every subscriber after each successful poll.
///
/// Polls `/v1/health/service/{name}?passing=1` with blocking queries, so a
/// membership change is usually observed within one round trip and a stable
/// catalog costs one request per `wait_secs`.
pub struct ConsulInstancer {
    shared: Arc<Shared>,
}

struct Shared {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<MembershipEvent>>>,
    cache: Mutex<Option<MembershipEvent>>,
}

impl Shared {
    fn broadcast(&self, event: MembershipEvent) {
        *self.cache.lock().unwrap() = Some(event.clone());
        self.subscribers
            .lock()
            .unwrap()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

impl ConsulInstancer {
    /// Start watching. The watcher task exits on the shutdown signal.
    pub fn spawn(
        config: DiscoveryConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> reqwest::Result<(Self, JoinHandle<()>)> {
        let wait = Duration::from_secs(config.wait_secs);
        let client = reqwest::Client::builder()
            .timeout(wait + Duration::from_secs(10))
            .build()?;

        let shared = Arc::new(Shared {
            subscribers: Mutex::new(Vec::new()),
            cache: Mutex::new(None),
        });

        let watcher = Watcher {
            client,
            url: format!(
                "{}/v1/health/service/{}",
                config.consul_address.trim_end_matches('/'),
                config.service_name
            ),
            datacenter: config.datacenter.clone(),
            wait_secs: config.wait_secs,
            backoff: Backoff::new(config.backoff_base_ms, config.backoff_max_ms),
            index: 0,
            shared: shared.clone(),
        };
        let handle = tokio::spawn(watcher.run(shutdown));

        Ok((Self { shared }, handle))
    }
}

impl Instancer for ConsulInstancer {
    fn register(&self, subscriber: mpsc::UnboundedSender<MembershipEvent>) {
        if let Some(event) = self.shared.cache.lock().unwrap().clone() {
            let _ = subscriber.send(event);
        }
        self.shared.subscribers.lock().unwrap().push(subscriber);
    }
}

struct Watcher {
    client: reqwest::Client,
    url: String,
    datacenter: Option<String>,
    wait_secs: u64,
    backoff: Backoff,
    /// Last blocking-query index returned by Consul.
    index: u64,
    shared: Arc<Shared>,
}

impl Watcher {
    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(url = %self.url, wait_secs = self.wait_secs, "consul watcher starting");
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("consul watcher received shutdown signal");
                    break;
                }
                result = self.poll() => match result {
                    Ok(instances) => {
                        self.backoff.reset();
                        self.shared.broadcast(MembershipEvent::instances(instances));
                    }
                    Err(error) => {
                        let delay = self.backoff.next_delay();
                        tracing::warn!(
                            error = %error,
                            delay_ms = delay.as_millis() as u64,
                            "consul poll failed"
                        );
                        self.shared.broadcast(MembershipEvent::failure(error));
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = shutdown.recv() => {
                                tracing::info!("consul watcher received shutdown signal");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    async fn poll(&mut self) -> Result<Vec<String>, DiscoveryError> {
        let mut request = self.client.get(&self.url).query(&[
            ("passing", "1".to_string()),
            ("index", self.index.to_string()),
            ("wait", format!("{}s", self.wait_secs)),
        ]);
        if let Some(datacenter) = &self.datacenter {
            request = request.query(&[("dc", datacenter)]);
        }

        let response = request
            .send()
            .await
            .map_err(|error| DiscoveryError::Transport(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Transport(format!(
                "consul returned {status}"
            )));
        }

        if let Some(value) = response.headers().get("x-consul-index") {
            if let Some(index) = value.to_str().ok().and_then(|raw| raw.parse().ok()) {
                self.index = index;
            }
        }

        let entries: Vec<ServiceEntry> = response
            .json()
            .await
            .map_err(|error| DiscoveryError::Decode(error.to_string()))?;
        Ok(addresses_of(&entries))
    }
}

#[derive(Debug, Deserialize)]
struct ServiceEntry {
    #[serde(rename = "Node")]
    node: Node,
    #[serde(rename = "Service")]
    service: AgentService,
}

#[derive(Debug, Deserialize)]
struct Node {
    #[serde(rename = "Address")]
    address: String,
}

#[derive(Debug, Deserialize)]
struct AgentService {
    #[serde(rename = "Address", default)]
    address: String,
    #[serde(rename = "Port")]
    port: u16,
}

/// Service address wins; agents that register without one fall back to the
/// node address.
fn addresses_of(entries: &[ServiceEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let host = if entry.service.address.is_empty() {
                &entry.node.address
            } else {
                &entry.service.address
            };
            format!("{}:{}", host, entry.service.port)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_health_entries_to_addresses() {
        let payload = r#"[
            {
                "Node": {"Node": "n1", "Address": "10.0.0.1"},
                "Service": {"ID": "couchdb-1", "Address": "10.0.0.5", "Port": 5984}
            },
            {
                "Node": {"Node": "n2", "Address": "10.0.0.2"},
                "Service": {"ID": "couchdb-2", "Address": "", "Port": 5984}
            }
        ]"#;

        let entries: Vec<ServiceEntry> = serde_json::from_str(payload).unwrap();
        assert_eq!(
            addresses_of(&entries),
            vec!["10.0.0.5:5984".to_string(), "10.0.0.2:5984".to_string()]
        );
    }

    #[test]
    fn register_replays_the_cached_event() {
        let shared = Arc::new(Shared {
            subscribers: Mutex::new(Vec::new()),
            cache: Mutex::new(None),
        });
        let instancer = ConsulInstancer {
            shared: shared.clone(),
        };
        shared.broadcast(MembershipEvent::instances(vec!["10.0.0.5:5984".into()]));

        let (tx, mut rx) = mpsc::unbounded_channel();
        instancer.register(tx);

        let replayed = rx.try_recv().unwrap();
        assert_eq!(replayed.instances, vec!["10.0.0.5:5984".to_string()]);
        assert!(replayed.error.is_none());
    }
}
