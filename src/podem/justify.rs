//! PODEM-style justification
//!
//! Given a target node and a desired value, the justifier searches for a
//! primary-input assignment that drives the target to that value and
//! propagates a differentiating effect to at least one primary output.
//! Propagation reuses the stuck-at fault model: desiring 1 places a `D`
//! at the target (stuck-at-0), desiring 0 places a `D̄` (stuck-at-1).

use std::collections::HashMap;

use crate::netlist::{GateKind, Netlist, NodeId};
use crate::podem::logic::{gate_value, Logic5};

/// A primary-input assignment produced by a successful justification.
/// Every primary input is present; inputs the search left unassigned
/// default to 0.
pub type TestVector = HashMap<NodeId, bool>;

/// PODEM decision engine over a borrowed netlist
pub struct Justifier<'a> {
    netlist: &'a Netlist,
    state: Vec<Logic5>,
    fault_node: NodeId,
    fault_value: Logic5,
}

impl<'a> Justifier<'a> {
    /// Create a justifier with every node unassigned
    pub fn new(netlist: &'a Netlist) -> Justifier<'a> {
        Justifier {
            netlist,
            state: vec![Logic5::X; netlist.nb_nodes()],
            fault_node: 0,
            fault_value: Logic5::X,
        }
    }

    /// Generate a test vector driving `target` to `value` with the effect
    /// observable at a primary output. Returns `None` when no satisfying
    /// assignment exists under the decision strategy.
    pub fn generate_test(&mut self, target: NodeId, value: bool) -> Option<TestVector> {
        self.state.fill(Logic5::X);
        self.fault_node = target;
        self.fault_value = if value { Logic5::D } else { Logic5::DBar };

        if !self.search() {
            return None;
        }
        let vector = self
            .netlist
            .inputs()
            .iter()
            .map(|&pi| (pi, self.state[pi] == Logic5::One))
            .collect();
        Some(vector)
    }

    /// Good-circuit value that activates the fault
    fn activation_value(&self) -> Logic5 {
        if self.fault_value == Logic5::D {
            Logic5::One
        } else {
            Logic5::Zero
        }
    }

    /// Monotone forward implication to a fixed point
    ///
    /// Every node with fanin is recomputed from the 5-valued tables until
    /// nothing changes; DFF and unknown kinds are never computed (the
    /// flip-flop output is a pseudo-primary input). When the fault site
    /// reaches its activation value, by computation or by direct
    /// assignment, it is upgraded to the faulty symbol.
    fn imply(&mut self) {
        if self.state[self.fault_node] == self.activation_value() {
            self.state[self.fault_node] = self.fault_value;
        }
        let mut changed = true;
        while changed {
            changed = false;
            for &g in self.netlist.gates() {
                if self.state[g] != Logic5::X {
                    continue;
                }
                let node = self.netlist.node(g);
                if matches!(node.kind, GateKind::Dff | GateKind::Unknown) {
                    continue;
                }
                let in_vals: Vec<Logic5> = node.fanin.iter().map(|&f| self.state[f]).collect();
                let mut val = gate_value(node.kind, &in_vals);
                if g == self.fault_node && val == self.activation_value() {
                    val = self.fault_value;
                }
                if val != Logic5::X {
                    self.state[g] = val;
                    changed = true;
                }
            }
        }
    }

    /// Next objective: activate the fault if the site is still X, else
    /// advance the D-frontier through its first gate
    fn objective(&self) -> Option<(NodeId, bool)> {
        if self.state[self.fault_node] == Logic5::X {
            return Some((self.fault_node, self.fault_value == Logic5::D));
        }

        for &g in self.netlist.gates() {
            if self.state[g] != Logic5::X {
                continue;
            }
            let node = self.netlist.node(g);
            if matches!(node.kind, GateKind::Dff | GateKind::Unknown) {
                continue;
            }
            if !node.fanin.iter().any(|&f| self.state[f].is_faulty()) {
                continue;
            }
            // Frontier gate found: set an unassigned input to the
            // non-controlling value (1 for And/Nand, 0 otherwise)
            for &f in &node.fanin {
                if self.state[f] == Logic5::X {
                    let non_controlling = matches!(node.kind, GateKind::And | GateKind::Nand);
                    return Some((f, non_controlling));
                }
            }
        }
        None
    }

    /// Walk an objective back to a primary input through unassigned
    /// fanins, flipping the value at every inverting gate
    fn backtrace(&self, start: NodeId, mut value: bool) -> (NodeId, bool) {
        let mut curr = start;
        loop {
            let node = self.netlist.node(curr);
            if node.fanin.is_empty() || node.kind == GateKind::Dff {
                break;
            }
            let Some(&next) = node.fanin.iter().find(|&&f| self.state[f] == Logic5::X) else {
                break;
            };
            if node.kind.is_inverting() {
                value = !value;
            }
            curr = next;
        }
        (curr, value)
    }

    /// Recursive decision search: try the backtraced assignment, then its
    /// negation, restoring the state snapshot between branches
    fn search(&mut self) -> bool {
        if self
            .netlist
            .outputs()
            .iter()
            .any(|&o| self.state[o].is_faulty())
        {
            return true;
        }

        let Some((obj_node, obj_value)) = self.objective() else {
            return false;
        };
        let (pi, value) = self.backtrace(obj_node, obj_value);

        let snapshot = self.state.clone();
        self.state[pi] = Logic5::from_bool(value);
        self.imply();
        if self.search() {
            return true;
        }

        self.state.copy_from_slice(&snapshot);
        self.state[pi] = Logic5::from_bool(!value);
        self.imply();
        if self.search() {
            return true;
        }

        self.state = snapshot;
        false
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::Justifier;
    use crate::netlist::{GateKind, Netlist, NodeId};
    use crate::sim::Simulator;

    /// Drive the returned vector through the 2-valued simulator and
    /// return the value of a node
    fn simulate_vector(netlist: &Netlist, vector: &HashMap<NodeId, bool>, node: NodeId) -> bool {
        let mut sim = Simulator::new(netlist);
        sim.run_vector(vector);
        sim.value(node).unwrap()
    }

    #[test]
    fn test_and_gate() {
        let mut nl = Netlist::new();
        let a = nl.add_input("a");
        let b = nl.add_input("b");
        let g = nl.add_gate("g", GateKind::And, &["a", "b"]);
        nl.add_output("g");

        let mut justifier = Justifier::new(&nl);
        let vec1 = justifier.generate_test(g, true).unwrap();
        assert_eq!(vec1[&a], true);
        assert_eq!(vec1[&b], true);

        let vec0 = justifier.generate_test(g, false).unwrap();
        assert!(!vec0[&a] || !vec0[&b]);
        assert!(!simulate_vector(&nl, &vec0, g));
    }

    #[test]
    fn test_justification_through_logic() {
        // g = NOR(NOT(a), b) is 1 only for a=1, b=0
        let mut nl = Netlist::new();
        let a = nl.add_input("a");
        let b = nl.add_input("b");
        nl.add_gate("n", GateKind::Not, &["a"]);
        let g = nl.add_gate("g", GateKind::Nor, &["n", "b"]);
        nl.add_output("g");

        let mut justifier = Justifier::new(&nl);
        let vector = justifier.generate_test(g, true).unwrap();
        assert_eq!(vector[&a], true);
        assert_eq!(vector[&b], false);
        assert!(simulate_vector(&nl, &vector, g));
    }

    #[test]
    fn test_vector_drives_target() {
        // Deeper circuit: the returned assignment must reproduce the
        // requested value in the good circuit
        let mut nl = Netlist::new();
        for name in ["a", "b", "c", "d"] {
            nl.add_input(name);
        }
        nl.add_gate("x", GateKind::Nand, &["a", "b"]);
        nl.add_gate("y", GateKind::Or, &["c", "x"]);
        let z = nl.add_gate("z", GateKind::Xor, &["y", "d"]);
        nl.add_gate("out", GateKind::And, &["z", "x"]);
        nl.add_output("out");

        let mut justifier = Justifier::new(&nl);
        for value in [true, false] {
            let vector = justifier.generate_test(z, value).unwrap();
            assert_eq!(simulate_vector(&nl, &vector, z), value);
        }
    }

    #[test]
    fn test_effect_reaches_an_output() {
        let mut nl = Netlist::new();
        nl.add_input("a");
        nl.add_input("b");
        nl.add_input("c");
        let g = nl.add_gate("g", GateKind::And, &["a", "b"]);
        let out = nl.add_gate("out", GateKind::And, &["g", "c"]);
        nl.add_output("out");

        let mut justifier = Justifier::new(&nl);
        let vector = justifier.generate_test(g, true).unwrap();
        // Propagation requires the side input c to be non-controlling,
        // so the output observes the target
        assert!(simulate_vector(&nl, &vector, out));
        // Forcing the target low under the same side inputs must change
        // the observed output
        let mut masked = vector.clone();
        masked.insert(nl.get("a").unwrap(), false);
        assert!(!simulate_vector(&nl, &masked, out));
    }

    #[test]
    fn test_unjustifiable_target() {
        // x = AND(a, NOT(a)) is constant 0
        let mut nl = Netlist::new();
        nl.add_input("a");
        nl.add_gate("n", GateKind::Not, &["a"]);
        let x = nl.add_gate("x", GateKind::And, &["a", "n"]);
        nl.add_output("x");

        let mut justifier = Justifier::new(&nl);
        assert!(justifier.generate_test(x, true).is_none());
        assert!(justifier.generate_test(x, false).is_some());
    }

    #[test]
    fn test_dff_boundary() {
        // The flip-flop output is a decision variable like any primary
        // input; its data driver is an observation point
        let mut nl = Netlist::new();
        nl.add_input("a");
        nl.add_gate("d", GateKind::And, &["a", "q"]);
        let q = nl.add_gate("q", GateKind::Dff, &["d"]);
        let d = nl.get("d").unwrap();

        let mut justifier = Justifier::new(&nl);
        let vector = justifier.generate_test(d, true).unwrap();
        assert_eq!(vector[&q], true);
        assert_eq!(vector[&nl.get("a").unwrap()], true);
    }
}
