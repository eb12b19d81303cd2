//! Agent card cache.
//!
//! Holds the last validated card for one peer. The card is fetched on first
//! use and again only when a refresh is forced; there is no expiry. A failed
//! fetch leaves the previously cached card in place.

use parley_a2a::{A2aError, A2aResult, AgentCard, Transport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Cached discovery for a single peer
#[derive(Debug)]
pub struct AgentCardCache {
    transport: Arc<dyn Transport>,
    card: RwLock<Option<Arc<AgentCard>>>,
    /// Serializes fetches so concurrent misses share one request
    refresh: Mutex<()>,
    timeout: Duration,
}

impl AgentCardCache {
    /// Create an empty cache fetching through `transport`
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            transport,
            card: RwLock::new(None),
            refresh: Mutex::new(()),
            timeout,
        }
    }

    /// Currently cached card, without fetching
    pub async fn cached(&self) -> Option<Arc<AgentCard>> {
        self.card.read().await.clone()
    }

    /// Get the peer's card, fetching on a miss or when `force_refresh` is set
    ///
    /// # Errors
    ///
    /// Returns `A2aError::Discovery` wrapping the fetch or validation failure.
    pub async fn get(&self, force_refresh: bool) -> A2aResult<Arc<AgentCard>> {
        if !force_refresh && let Some(card) = self.cached().await {
            return Ok(card);
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have filled the cache while we waited.
        if !force_refresh && let Some(card) = self.cached().await {
            return Ok(card);
        }

        let endpoint = self.transport.endpoint();
        debug!(endpoint = %endpoint, force_refresh, "Fetching agent card");

        match self.fetch().await {
            Ok(card) => {
                let card = Arc::new(card);
                *self.card.write().await = Some(Arc::clone(&card));
                info!(
                    endpoint = %endpoint,
                    agent_id = %card.id,
                    skills = card.skills.len(),
                    "Agent card cached"
                );
                Ok(card)
            }
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Agent card discovery failed");
                Err(A2aError::discovery(endpoint, e))
            }
        }
    }

    async fn fetch(&self) -> A2aResult<AgentCard> {
        let card = tokio::time::timeout(self.timeout, self.transport.fetch_card())
            .await
            .map_err(|_| A2aError::timeout(self.transport.endpoint(), self.timeout))??;
        card.validate()?;
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_a2a::AgentSkill;
    use parley_a2a::testing::MockTransport;

    fn card(id: &str) -> AgentCard {
        AgentCard::new(id, "Legal Agent", "https://legal.example.com")
            .with_skill(AgentSkill::new("legal", "Legal review"))
    }

    fn cache(mock: &Arc<MockTransport>) -> AgentCardCache {
        AgentCardCache::new(mock.clone(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_cached_card_is_reused() {
        let mock = Arc::new(MockTransport::new("mock://legal").with_card(card("legal-agent")));
        let cache = cache(&mock);

        let first = cache.get(false).await.unwrap();
        let second = cache.get(false).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mock.card_fetches(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_replaces_card() {
        let mock = Arc::new(MockTransport::new("mock://legal").with_card(card("v2")));
        mock.push_card_result(Ok(card("v1")));
        let cache = cache(&mock);

        assert_eq!(cache.get(false).await.unwrap().id, "v1");
        assert_eq!(cache.get(true).await.unwrap().id, "v2");
        assert_eq!(cache.cached().await.unwrap().id, "v2");
        assert_eq!(mock.card_fetches(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_card() {
        let mock = Arc::new(MockTransport::new("mock://legal").with_card(card("v1")));
        let cache = cache(&mock);
        cache.get(false).await.unwrap();

        mock.push_card_result(Err(A2aError::network("mock://legal", "refused")));
        let err = cache.get(true).await.unwrap_err();

        assert!(matches!(err, A2aError::Discovery { .. }));
        assert_eq!(cache.cached().await.unwrap().id, "v1");
    }

    #[tokio::test]
    async fn test_invalid_card_is_discovery_error() {
        let invalid = AgentCard::new("", "Nameless", "https://legal.example.com");
        let mock = Arc::new(MockTransport::new("mock://legal").with_card(invalid));
        let cache = cache(&mock);

        let err = cache.get(false).await.unwrap_err();
        match err {
            A2aError::Discovery { source, .. } => {
                assert!(matches!(*source, A2aError::InvalidAgentCard { .. }));
            }
            other => panic!("expected discovery error, got {other:?}"),
        }
        assert!(cache.cached().await.is_none());
    }
}
