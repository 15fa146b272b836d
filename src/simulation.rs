//! In-process cluster convergence runs for the demo binary.
//!
//! Spins up N gossip managers, applies concurrent writes from tokio
//! tasks, then drives simulated gossip rounds until every node reports
//! the same state. Delivery faults are injected to show that duplication
//! and loss do not break convergence.

use murmur_crdt::{GrowOnlySet, PnCounter};
use murmur_engine::{
    ClusterSim, GossipConfigBuilder, GossipManager, SharedPayload, SimConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statistics from one convergence run.
#[derive(Clone, Debug)]
pub struct RunStats {
    pub label: &'static str,
    pub num_nodes: usize,
    pub writes_per_node: usize,
    pub rounds_to_converge: usize,
    pub total_time: Duration,
}

impl RunStats {
    pub fn print(&self) {
        println!("\n── {} ──", self.label);
        println!("  nodes:              {}", self.num_nodes);
        println!("  writes per node:    {}", self.writes_per_node);
        println!("  rounds to converge: {}", self.rounds_to_converge);
        println!(
            "  total time:         {:.3}s",
            self.total_time.as_secs_f64()
        );
    }
}

fn build_cluster(num_nodes: usize, faults: SimConfig) -> ClusterSim {
    let nodes = (0..num_nodes)
        .map(|i| {
            Arc::new(GossipManager::new(
                GossipConfigBuilder::new()
                    .cluster_id("demo")
                    .node_id(format!("node-{i}"))
                    .address(format!("127.0.0.1:{}", 50000 + i))
                    .build(),
            ))
        })
        .collect();
    ClusterSim::new(nodes, faults)
}

/// Concurrent grow-only set writers on every node, then gossip until all
/// nodes see the full element set.
pub async fn run_gset_convergence(
    num_nodes: usize,
    writes_per_node: usize,
    faults: SimConfig,
) -> RunStats {
    let start = Instant::now();
    let mut sim = build_cluster(num_nodes, faults);

    let mut handles = vec![];
    for (idx, node) in sim.nodes().iter().enumerate() {
        let node = Arc::clone(node);
        handles.push(tokio::spawn(async move {
            for i in 0..writes_per_node {
                let set: GrowOnlySet<String> =
                    [format!("item-{idx}-{i}")].into_iter().collect();
                node.gossip_shared_data("inventory", SharedPayload::GrowOnlySet(set))
                    .expect("grow-only set payloads always merge");
                if i % 16 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    for handle in handles {
        handle.await.expect("writer task panicked");
    }

    let expected = num_nodes * writes_per_node;
    let mut rounds = 0;
    while !converged_gset(&sim, expected) {
        sim.round();
        rounds += 1;
        assert!(rounds < 1000, "cluster failed to converge");
    }

    RunStats {
        label: "grow-only set convergence",
        num_nodes,
        writes_per_node,
        rounds_to_converge: rounds,
        total_time: start.elapsed(),
    }
}

fn converged_gset(sim: &ClusterSim, expected: usize) -> bool {
    sim.nodes().iter().all(|node| {
        matches!(
            node.find_crdt("inventory"),
            Some(SharedPayload::GrowOnlySet(set)) if set.len() == expected
        )
    })
}

/// Random signed counter deltas on every node; the cluster must settle on
/// the global sum.
pub async fn run_pncounter_convergence(
    num_nodes: usize,
    writes_per_node: usize,
    faults: SimConfig,
) -> RunStats {
    let start = Instant::now();
    let mut sim = build_cluster(num_nodes, faults);

    for node in sim.nodes() {
        node.gossip_shared_data("tally", SharedPayload::PnCounter(PnCounter::new()))
            .expect("first write always stores");
    }

    let mut rng = StdRng::seed_from_u64(7);
    let mut expected: i64 = 0;
    for node in sim.nodes() {
        for _ in 0..writes_per_node {
            let delta = rng.gen_range(-20i64..=20);
            expected += delta;
            let Some(SharedPayload::PnCounter(c)) = node.find_crdt("tally") else {
                unreachable!("tally was seeded above");
            };
            let node_id = node.node_id().to_string();
            node.gossip_shared_data(
                "tally",
                SharedPayload::PnCounter(c.incremented(&node_id, delta)),
            )
            .expect("same-variant merge");
        }
    }

    let mut rounds = 0;
    while !converged_pn(&sim, expected) {
        sim.round();
        rounds += 1;
        assert!(rounds < 1000, "cluster failed to converge");
    }

    RunStats {
        label: "pn-counter convergence",
        num_nodes,
        writes_per_node,
        rounds_to_converge: rounds,
        total_time: start.elapsed(),
    }
}

fn converged_pn(sim: &ClusterSim, expected: i64) -> bool {
    sim.nodes().iter().all(|node| {
        matches!(
            node.find_crdt("tally"),
            Some(SharedPayload::PnCounter(c)) if c.value() == expected
        )
    })
}

/// Membership: every node must learn of every peer through heartbeats.
pub fn run_membership_convergence(num_nodes: usize, faults: SimConfig) -> RunStats {
    let start = Instant::now();
    let mut sim = build_cluster(num_nodes, faults);

    let mut rounds = 0;
    while sim
        .nodes()
        .iter()
        .any(|n| n.live_members().len() < num_nodes - 1)
    {
        sim.round();
        rounds += 1;
        assert!(rounds < 1000, "membership failed to converge");
    }

    RunStats {
        label: "membership convergence",
        num_nodes,
        writes_per_node: 0,
        rounds_to_converge: rounds,
        total_time: start.elapsed(),
    }
}
