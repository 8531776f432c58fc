//! 2-valued simulation and Monte-Carlo rare-node mining

use std::collections::HashMap;

use kdam::{tqdm, BarExt};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::netlist::{GateKind, Netlist, NodeId};

/// 2-valued combinational evaluator over a netlist
///
/// Values are memoised per node; `clear_values` resets the memoisation
/// between vectors. Inputs (and DFF pseudo-inputs) are driven externally
/// and default to 0 when left undriven; evaluation never descends
/// through a flip-flop, so the circuit is evaluated as a DAG.
pub struct Simulator<'a> {
    netlist: &'a Netlist,
    values: Vec<Option<bool>>,
}

/// Combinational gate function over already-evaluated operands
fn compute(kind: GateKind, vals: &[bool]) -> bool {
    use GateKind::*;
    match kind {
        And => vals.iter().all(|&v| v),
        Nand => !vals.iter().all(|&v| v),
        Or => vals.iter().any(|&v| v),
        Nor => !vals.iter().any(|&v| v),
        Xor => vals.iter().fold(false, |acc, &v| acc ^ v),
        Xnor => !vals.iter().fold(false, |acc, &v| acc ^ v),
        Not => !vals[0],
        Buf => vals[0],
        Input | Output | Dff | Unknown => false,
    }
}

impl<'a> Simulator<'a> {
    /// Create a simulator with every node unevaluated
    pub fn new(netlist: &'a Netlist) -> Simulator<'a> {
        Simulator {
            netlist,
            values: vec![None; netlist.nb_nodes()],
        }
    }

    /// Reset the memoisation for a new vector
    pub fn clear_values(&mut self) {
        self.values.fill(None);
    }

    /// Drive an input (or DFF pseudo-input) with a value
    pub fn set_input(&mut self, id: NodeId, value: bool) {
        self.values[id] = Some(value);
    }

    /// Current value of a node, if evaluated
    pub fn value(&self, id: NodeId) -> Option<bool> {
        self.values[id]
    }

    /// Evaluate a node, memoising every node visited on the way
    pub fn evaluate(&mut self, root: NodeId) -> bool {
        let mut stack = vec![root];
        while let Some(&n) = stack.last() {
            if self.values[n].is_some() {
                stack.pop();
                continue;
            }
            let node = self.netlist.node(n);
            // Undriven inputs and pseudo-inputs read as 0; unknown kinds
            // are never evaluated
            if matches!(node.kind, GateKind::Input | GateKind::Dff | GateKind::Unknown)
                || node.fanin.is_empty()
            {
                self.values[n] = Some(false);
                stack.pop();
                continue;
            }
            let mut ready = true;
            for &f in &node.fanin {
                if self.values[f].is_none() {
                    stack.push(f);
                    ready = false;
                }
            }
            if ready {
                let vals: Vec<bool> = node.fanin.iter().map(|&f| self.values[f].unwrap()).collect();
                self.values[n] = Some(compute(node.kind, &vals));
                stack.pop();
            }
        }
        self.values[root].unwrap()
    }

    /// Drive every primary input from an assignment (absent entries read
    /// as 0) and evaluate the whole netlist
    pub fn run_vector(&mut self, assignment: &HashMap<NodeId, bool>) {
        let netlist = self.netlist;
        self.clear_values();
        for &pi in netlist.inputs() {
            self.set_input(pi, assignment.get(&pi).copied().unwrap_or(false));
        }
        for &g in netlist.gates() {
            self.evaluate(g);
        }
        for &o in netlist.outputs() {
            self.evaluate(o);
        }
    }
}

/// Count, for every node, how often it evaluated to 1 under uniform
/// random stimulus
fn count_ones(netlist: &Netlist, nb_vectors: usize, seed: u64) -> Vec<usize> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut sim = Simulator::new(netlist);
    let mut ones = vec![0usize; netlist.nb_nodes()];

    let mut progress = tqdm!(total = nb_vectors);
    progress.set_description("Simulation");
    for i in 0..nb_vectors {
        sim.clear_values();
        for &pi in netlist.inputs() {
            sim.set_input(pi, rng.gen());
        }
        for &g in netlist.gates() {
            sim.evaluate(g);
        }
        for &o in netlist.outputs() {
            sim.evaluate(o);
        }
        for (id, count) in ones.iter_mut().enumerate() {
            if sim.value(id) == Some(true) {
                *count += 1;
            }
        }
        if i % 1000 == 0 {
            progress.update_to(i).unwrap();
        }
    }
    progress.update_to(nb_vectors).unwrap();
    println!();
    ones
}

/// Monte-Carlo rare-node mining
///
/// Simulates `nb_vectors` uniform random vectors and annotates every
/// internal node whose 1-count (or 0-count) stays at or below
/// `nb_vectors * threshold_ratio` with the corresponding rare polarity.
/// When both counts qualify the rare-1 classification wins. Returns the
/// number of rare nodes found.
pub fn find_rare_nodes(
    netlist: &mut Netlist,
    nb_vectors: usize,
    threshold_ratio: f64,
    seed: u64,
) -> usize {
    let limit = (nb_vectors as f64 * threshold_ratio) as usize;
    let ones = count_ones(netlist, nb_vectors, seed);

    let mut nb_rare = 0;
    for id in 0..netlist.nb_nodes() {
        let node = netlist.node(id);
        if matches!(node.kind, GateKind::Input | GateKind::Output) {
            continue;
        }
        let polarity = if ones[id] <= limit {
            Some(true)
        } else if nb_vectors - ones[id] <= limit {
            Some(false)
        } else {
            None
        };
        if polarity.is_some() {
            nb_rare += 1;
        }
        netlist.set_rare_polarity(id, polarity);
    }
    log::info!("Identified {} rare nodes", nb_rare);
    nb_rare
}
