//! Provider health aggregation

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::{ProviderId, ProviderRegistry};

/// Reachability of every known provider, rebuilt on each query
pub type AvailabilityMap = BTreeMap<ProviderId, bool>;

/// Probes every registered provider concurrently
pub struct HealthAggregator {
    registry: Arc<ProviderRegistry>,
    max_wait: Duration,
}

impl HealthAggregator {
    /// `max_wait` caps each probe in addition to the adapter's own probe timeout
    pub fn new(registry: Arc<ProviderRegistry>, max_wait: Duration) -> Self {
        Self { registry, max_wait }
    }

    /// Probe all providers. Never fails: any probe error, panic or overrun
    /// degrades only that provider's entry to `false`.
    pub async fn probe_all(&self) -> AvailabilityMap {
        let known = self.registry.list_known();

        let probes = known.iter().map(|&id| {
            let registry = self.registry.clone();
            let max_wait = self.max_wait;
            tokio::spawn(async move { probe_one(&registry, id, max_wait).await })
        });
        let outcomes = join_all(probes).await;

        let mut availability = AvailabilityMap::new();
        for (id, outcome) in known.into_iter().zip(outcomes) {
            let available = match outcome {
                Ok(available) => available,
                Err(e) => {
                    warn!(provider = %id, error = %e, "Probe task failed");
                    false
                }
            };
            availability.insert(id, available);
        }

        info!(
            reachable = availability.values().filter(|v| **v).count(),
            total = availability.len(),
            "Provider health probed"
        );

        availability
    }
}

async fn probe_one(registry: &ProviderRegistry, id: ProviderId, max_wait: Duration) -> bool {
    let provider = match registry.get(id) {
        Ok(provider) => provider,
        Err(e) => {
            warn!(provider = %id, error = %e, "Provider could not be resolved for probing");
            return false;
        }
    };

    match tokio::time::timeout(max_wait, provider.is_available()).await {
        Ok(available) => {
            debug!(provider = %id, available, "Probe finished");
            available
        }
        Err(_) => {
            warn!(
                provider = %id,
                max_wait_ms = max_wait.as_millis() as u64,
                "Probe abandoned"
            );
            false
        }
    }
}

/// Overall status string: healthy when at least one provider is reachable
pub fn overall_status(availability: &AvailabilityMap) -> &'static str {
    if availability.values().any(|available| *available) {
        "healthy"
    } else {
        "unhealthy"
    }
}
