//! Registry of peer agents, looked up by advertised skill.
//!
//! Registration fetches and validates the peer's card before the peer is
//! added, so every entry is known to be reachable and well-formed at the
//! time it was registered.

use parley_a2a::AgentCard;
use std::sync::Arc;
use tracing::info;

use crate::client::ResilientClient;
use crate::config::ResilienceConfig;
use crate::error::AgentResult;

/// A registered peer: its validated card and the client used to call it
#[derive(Debug, Clone)]
pub struct RegisteredAgent {
    pub card: Arc<AgentCard>,
    pub client: Arc<ResilientClient>,
}

impl RegisteredAgent {
    /// Agent id from the card
    pub fn id(&self) -> &str {
        &self.card.id
    }

    /// Whether the agent advertises `skill_id`
    pub fn has_skill(&self, skill_id: &str) -> bool {
        self.card.has_skill(skill_id)
    }
}

/// A registry of agents that can be discovered by skill.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<RegisteredAgent>,
}

impl AgentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer through an existing client.
    ///
    /// The card is always fetched fresh. Registering an agent id that is
    /// already present replaces the earlier entry in place.
    ///
    /// # Errors
    ///
    /// Fails with the discovery error if the card cannot be fetched or is
    /// invalid; the registry is left unchanged.
    pub async fn register(&mut self, client: ResilientClient) -> AgentResult<RegisteredAgent> {
        let client = Arc::new(client);
        let card = client.get_card(true).await?;

        let entry = RegisteredAgent {
            card: Arc::clone(&card),
            client,
        };

        info!(
            agent_id = %card.id,
            name = %card.name,
            endpoint = %entry.client.endpoint(),
            skills = ?card.skills.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            "Registering agent"
        );

        match self.agents.iter_mut().find(|a| a.card.id == card.id) {
            Some(existing) => {
                info!(agent_id = %card.id, "Replacing earlier registration");
                *existing = entry.clone();
            }
            None => self.agents.push(entry.clone()),
        }

        Ok(entry)
    }

    /// Connect to `url` over HTTP and register the peer.
    pub async fn register_endpoint(
        &mut self,
        url: &str,
        config: &ResilienceConfig,
    ) -> AgentResult<RegisteredAgent> {
        let client = ResilientClient::connect(url, config)?;
        self.register(client).await
    }

    /// Find agents advertising a skill, in registration order.
    ///
    /// An empty result is not an error.
    pub fn find_by_skill(&self, skill_id: &str) -> Vec<RegisteredAgent> {
        self.agents
            .iter()
            .filter(|a| a.has_skill(skill_id))
            .cloned()
            .collect()
    }

    /// Find the agent registered at an endpoint.
    pub fn find_by_endpoint(&self, endpoint: &str) -> Option<RegisteredAgent> {
        let wanted = endpoint.trim_end_matches('/');
        self.agents
            .iter()
            .find(|a| a.client.endpoint().trim_end_matches('/') == wanted)
            .cloned()
    }

    /// Find an agent by ID.
    pub fn get(&self, agent_id: &str) -> Option<RegisteredAgent> {
        self.agents.iter().find(|a| a.card.id == agent_id).cloned()
    }

    /// Every skill advertised by a registered agent, first-seen order, no duplicates.
    pub fn skills(&self) -> Vec<String> {
        let mut skills: Vec<String> = Vec::new();
        for skill in self.agents.iter().flat_map(|a| a.card.skills.iter()) {
            if !skills.contains(&skill.id) {
                skills.push(skill.id.clone());
            }
        }
        skills
    }

    /// List all registered agents.
    pub fn list(&self) -> &[RegisteredAgent] {
        &self.agents
    }

    /// Get count of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
