//! Compatibility graph over justified rare nodes, with bounded maximal
//! clique enumeration
//!
//! Vertices are the rare nodes whose justification succeeded; an edge
//! connects two vertices whose test vectors agree on every primary input
//! they both constrain. A clique is therefore a set of rare nodes that a
//! single input assignment drives to their rare values simultaneously.

use std::collections::{BTreeSet, HashMap};

use kdam::{tqdm, BarExt};

use crate::netlist::{Netlist, NodeId};
use crate::podem::{Justifier, TestVector};

/// Hard cap on the number of cliques reported by a single search
pub const MAX_CLIQUES: usize = 1000;
/// Hard cap on recursion steps for a single search
pub const MAX_STEPS: u64 = 1_000_000;
/// Progress is reported every this many recursion steps
const REPORT_STEPS: u64 = 50_000;

/// Result of a clique search
///
/// When `pruned` is set, one of the safety caps fired and the clique
/// list is partial; this is informational, never fatal.
#[derive(Debug, Clone, Default)]
pub struct CliqueSet {
    /// Maximal cliques of the requested minimum size, in enumeration order
    pub cliques: Vec<Vec<NodeId>>,
    /// Whether a safety cap cut the enumeration short
    pub pruned: bool,
    /// Number of recursion steps taken
    pub steps: u64,
}

/// Compatibility graph built from per-rare-node justification vectors
pub struct CompatGraph<'a> {
    netlist: &'a Netlist,
    vectors: HashMap<NodeId, TestVector>,
    members: Vec<NodeId>,
    adj: HashMap<NodeId, BTreeSet<NodeId>>,
}

/// Two vectors are compatible when they agree on every primary input
/// they both constrain
fn compatible(v1: &TestVector, v2: &TestVector) -> bool {
    v1.iter()
        .all(|(pi, val)| v2.get(pi).map_or(true, |v| v == val))
}

impl<'a> CompatGraph<'a> {
    /// Create an empty graph over a netlist
    pub fn new(netlist: &'a Netlist) -> CompatGraph<'a> {
        CompatGraph {
            netlist,
            vectors: HashMap::new(),
            members: Vec::new(),
            adj: HashMap::new(),
        }
    }

    /// Run the justifier on every rare node and keep the ones with a
    /// satisfying vector as graph vertices
    pub fn generate_vectors(&mut self, rare_nodes: &[NodeId]) {
        let mut justifier = Justifier::new(self.netlist);
        let mut progress = tqdm!(total = rare_nodes.len());
        progress.set_description("Justification");

        for (i, &node) in rare_nodes.iter().enumerate() {
            let Some(polarity) = self.netlist.node(node).rare_polarity else {
                continue;
            };
            if let Some(vector) = justifier.generate_test(node, polarity) {
                self.vectors.insert(node, vector);
                self.members.push(node);
            }
            if i % 10 == 0 {
                progress.update_to(i).unwrap();
            }
        }
        progress.update_to(rare_nodes.len()).unwrap();
        println!();
        log::info!(
            "Generated vectors for {}/{} rare nodes",
            self.members.len(),
            rare_nodes.len()
        );
    }

    /// Add an edge between every compatible pair of vertices
    pub fn build(&mut self) {
        for i in 0..self.members.len() {
            for j in i + 1..self.members.len() {
                let (a, b) = (self.members[i], self.members[j]);
                if compatible(&self.vectors[&a], &self.vectors[&b]) {
                    self.adj.entry(a).or_default().insert(b);
                    self.adj.entry(b).or_default().insert(a);
                }
            }
        }
        log::info!(
            "Compatibility graph: {} vertices, {} edges, density {:.3}",
            self.nb_vertices(),
            self.nb_edges(),
            self.density()
        );
    }

    /// Vertices, in ascending node id order of insertion
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Test vector of a vertex
    pub fn vector(&self, node: NodeId) -> Option<&TestVector> {
        self.vectors.get(&node)
    }

    /// Whether two vertices are connected
    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.adj.get(&a).map_or(false, |s| s.contains(&b))
    }

    /// Number of vertices
    pub fn nb_vertices(&self) -> usize {
        self.members.len()
    }

    /// Number of edges
    pub fn nb_edges(&self) -> usize {
        self.adj.values().map(|s| s.len()).sum::<usize>() / 2
    }

    /// Edge count over the maximum possible edge count
    pub fn density(&self) -> f64 {
        let v = self.nb_vertices();
        if v <= 1 {
            return 0.0;
        }
        let max_edges = v * (v - 1) / 2;
        self.nb_edges() as f64 / max_edges as f64
    }

    /// Enumerate maximal cliques with at least `min_size` vertices
    ///
    /// Pivot-free Bron–Kerbosch; candidates are visited in ascending
    /// vertex id. Enumeration stops after [`MAX_CLIQUES`] cliques or
    /// [`MAX_STEPS`] recursion steps, returning the partial list with
    /// the `pruned` flag raised.
    pub fn find_cliques(&self, min_size: usize) -> CliqueSet {
        let mut out = CliqueSet::default();
        let p: BTreeSet<NodeId> = self.members.iter().copied().collect();
        self.bron_kerbosch(BTreeSet::new(), p, BTreeSet::new(), min_size, &mut out);
        if out.pruned {
            log::warn!(
                "Clique search pruned after {} steps with {} cliques",
                out.steps,
                out.cliques.len()
            );
        } else {
            log::info!("Found {} cliques of size >= {}", out.cliques.len(), min_size);
        }
        out
    }

    fn bron_kerbosch(
        &self,
        r: BTreeSet<NodeId>,
        mut p: BTreeSet<NodeId>,
        mut x: BTreeSet<NodeId>,
        min_size: usize,
        out: &mut CliqueSet,
    ) {
        out.steps += 1;
        if out.steps % REPORT_STEPS == 0 {
            log::debug!("Clique search step {}", out.steps);
        }
        if out.cliques.len() >= MAX_CLIQUES || out.steps > MAX_STEPS {
            out.pruned = true;
            return;
        }

        if p.is_empty() && x.is_empty() {
            if r.len() >= min_size {
                out.cliques.push(r.into_iter().collect());
            }
            return;
        }

        let empty = BTreeSet::new();
        for v in p.clone() {
            if out.pruned {
                break;
            }
            let adj_v = self.adj.get(&v).unwrap_or(&empty);
            let mut nr = r.clone();
            nr.insert(v);
            let np = p.intersection(adj_v).copied().collect();
            let nx = x.intersection(adj_v).copied().collect();
            self.bron_kerbosch(nr, np, nx, min_size, out);
            p.remove(&v);
            x.insert(v);
        }
    }
}
