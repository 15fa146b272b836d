//! Node configuration for the gossip engine.

use std::time::Duration;

/// Identity and timing settings for one managed node.
#[derive(Clone, Debug)]
pub struct GossipConfig {
    /// Cluster this node belongs to.
    pub cluster_id: String,
    /// This node's identity.
    pub node_id: String,
    /// Advertised address (transport interprets it; the engine only
    /// records it in membership).
    pub address: String,
    /// How often the gossip loop runs a round.
    pub gossip_interval: Duration,
    /// Silence after which a member is suspected.
    pub suspect_timeout: Duration,
    /// Silence after which a suspect is declared dead.
    pub dead_timeout: Duration,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            cluster_id: "default".to_string(),
            node_id: "node-0".to_string(),
            address: "127.0.0.1:50000".to_string(),
            gossip_interval: Duration::from_millis(100),
            suspect_timeout: Duration::from_secs(5),
            dead_timeout: Duration::from_secs(10),
        }
    }
}

pub struct GossipConfigBuilder {
    config: GossipConfig,
}

impl GossipConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GossipConfig::default(),
        }
    }

    pub fn cluster_id(mut self, cluster_id: impl Into<String>) -> Self {
        self.config.cluster_id = cluster_id.into();
        self
    }

    pub fn node_id(mut self, node_id: impl Into<String>) -> Self {
        self.config.node_id = node_id.into();
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn gossip_interval(mut self, interval: Duration) -> Self {
        self.config.gossip_interval = interval;
        self
    }

    pub fn suspect_timeout(mut self, timeout: Duration) -> Self {
        self.config.suspect_timeout = timeout;
        self
    }

    pub fn dead_timeout(mut self, timeout: Duration) -> Self {
        self.config.dead_timeout = timeout;
        self
    }

    pub fn build(self) -> GossipConfig {
        self.config
    }
}

impl Default for GossipConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
