//! In-process cluster simulation.
//!
//! The real transport is out of scope, so tests and the demo binary drive
//! convergence through this simulator instead: each round every node
//! snapshots its digest and "sends" it to one peer, optionally losing or
//! duplicating messages on the way. Because every merge is idempotent and
//! commutative, convergence must survive whatever this does to delivery.

use crate::manager::{GossipManager, GossipMessage};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

/// Delivery fault rates for a simulated network.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimConfig {
    /// Probability a message is dropped (0.0 - 1.0).
    pub loss_rate: f64,
    /// Probability a message is delivered twice (0.0 - 1.0).
    pub dup_rate: f64,
}

impl SimConfig {
    pub fn lossy(loss_rate: f64) -> Self {
        Self {
            loss_rate,
            ..Default::default()
        }
    }

    pub fn with_dups(dup_rate: f64) -> Self {
        Self {
            dup_rate,
            ..Default::default()
        }
    }
}

pub struct ClusterSim {
    nodes: Vec<Arc<GossipManager>>,
    in_flight: VecDeque<(usize, GossipMessage)>,
    config: SimConfig,
    rng_state: u64,
}

impl ClusterSim {
    pub fn new(nodes: Vec<Arc<GossipManager>>, config: SimConfig) -> Self {
        Self {
            nodes,
            in_flight: VecDeque::new(),
            config,
            rng_state: 0x5DEECE66D,
        }
    }

    pub fn nodes(&self) -> &[Arc<GossipManager>] {
        &self.nodes
    }

    /// Simple LCG so runs are deterministic.
    fn next_random(&mut self) -> f64 {
        self.rng_state = self.rng_state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.rng_state >> 16) & 0x7fff) as f64 / 32768.0
    }

    fn pick_peer(&mut self, sender: usize) -> usize {
        let peer = (self.next_random() * (self.nodes.len() - 1) as f64) as usize;
        let peer = peer.min(self.nodes.len() - 2);
        if peer >= sender {
            peer + 1
        } else {
            peer
        }
    }

    /// One gossip round: every node sends its digest to one random peer,
    /// then all queued messages are delivered through `dispatch`.
    pub fn round(&mut self) {
        if self.nodes.len() < 2 {
            return;
        }
        for sender in 0..self.nodes.len() {
            let peer = self.pick_peer(sender);
            for message in self.nodes[sender].digest() {
                if self.next_random() < self.config.loss_rate {
                    continue;
                }
                if self.next_random() < self.config.dup_rate {
                    self.in_flight.push_back((peer, message.clone()));
                }
                self.in_flight.push_back((peer, message));
            }
        }

        while let Some((to, message)) = self.in_flight.pop_front() {
            // A rejected merge (e.g. mismatched variants seeded under one
            // key) affects only that message; the round continues.
            if let Err(err) = self.nodes[to].dispatch(message) {
                warn!(node = %self.nodes[to].node_id(), %err, "dispatch rejected message");
            }
        }

        for node in &self.nodes {
            node.housekeeping();
        }
    }

    pub fn run_rounds(&mut self, count: usize) {
        for _ in 0..count {
            self.round();
        }
    }
}
