use std::collections::HashMap;

use crate::netlist::node::{GateKind, Node, NodeId};

/// Gate-level netlist
///
/// Owns a dense arena of nodes (position = id) plus a name index and
/// three ordered views: primary inputs, primary outputs and internal
/// drivers. DFF outputs are registered as pseudo-primary inputs and
/// their data drivers as pseudo-primary outputs, so that every analysis
/// downstream sees a DAG.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    nodes: Vec<Node>,
    name_to_node: HashMap<String, NodeId>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    gates: Vec<NodeId>,
}

impl Netlist {
    /// Create an empty netlist
    pub fn new() -> Netlist {
        Netlist::default()
    }

    /// Number of nodes in the arena
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Access a node by id
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Look a node up by name
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.name_to_node.get(name).copied()
    }

    /// Primary inputs, including DFF pseudo-primary inputs, in declaration order
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Primary outputs, including DFF pseudo-primary outputs, in declaration order
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// All internal drivers (every node defined by a gate statement, DFFs included)
    pub fn gates(&self) -> &[NodeId] {
        &self.gates
    }

    /// Iterate over all nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Get the node with this name, creating an `Unknown` placeholder if absent
    pub fn ensure_node(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.get(name) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(Node::new(name.to_string(), id));
        self.name_to_node.insert(name.to_string(), id);
        id
    }

    /// Declare a primary input
    pub fn add_input(&mut self, name: &str) -> NodeId {
        let id = self.ensure_node(name);
        self.node_mut(id).kind = GateKind::Input;
        if !self.inputs.contains(&id) {
            self.inputs.push(id);
        }
        id
    }

    /// Declare a primary output. The node's kind is left to its driver.
    pub fn add_output(&mut self, name: &str) -> NodeId {
        let id = self.ensure_node(name);
        if !self.outputs.contains(&id) {
            self.outputs.push(id);
        }
        id
    }

    /// Declare a driver statement `name = kind(fanin...)`
    ///
    /// Ensures the driver and every operand exist, wires fanin/fanout in
    /// both directions and appends the driver to the gate list. A DFF
    /// driver is additionally registered as a pseudo-primary input and
    /// each of its operands as a pseudo-primary output.
    pub fn add_gate(&mut self, name: &str, kind: GateKind, fanin: &[&str]) -> NodeId {
        let id = self.ensure_node(name);
        self.node_mut(id).kind = kind;
        if kind == GateKind::Dff && !self.inputs.contains(&id) {
            self.inputs.push(id);
        }
        self.gates.push(id);
        for operand in fanin {
            let in_id = self.ensure_node(operand);
            self.node_mut(id).fanin.push(in_id);
            self.node_mut(in_id).fanout.push(id);
            if kind == GateKind::Dff && !self.outputs.contains(&in_id) {
                self.outputs.push(in_id);
            }
        }
        id
    }

    /// Create a new gate from existing nodes, wiring fanout and appending
    /// to the gate list. Used by the trojan synthesiser.
    pub fn create_gate(&mut self, name: &str, kind: GateKind, fanin: &[NodeId]) -> NodeId {
        let id = self.ensure_node(name);
        self.node_mut(id).kind = kind;
        self.node_mut(id).fanin = fanin.to_vec();
        for &in_id in fanin {
            self.node_mut(in_id).fanout.push(id);
        }
        self.gates.push(id);
        id
    }

    /// Rename a node, keeping the name index a bijection
    pub fn rename_node(&mut self, id: NodeId, new_name: &str) {
        let old_name = self.nodes[id].name.clone();
        self.name_to_node.remove(&old_name);
        debug_assert!(
            !self.name_to_node.contains_key(new_name),
            "Renaming {old_name} to {new_name} would collide"
        );
        self.nodes[id].name = new_name.to_string();
        self.name_to_node.insert(new_name.to_string(), id);
    }

    /// Substitute `old` by `new` in the primary output list (first
    /// occurrence; no-op when absent)
    pub fn replace_output(&mut self, old: NodeId, new: NodeId) {
        if let Some(pos) = self.outputs.iter().position(|&o| o == old) {
            self.outputs[pos] = new;
        }
    }

    /// Rename every node whose name parses as an integer `>= threshold`
    /// to that integer plus `delta`
    ///
    /// Renames run in decreasing numeric order so intermediate states
    /// stay collision-free.
    pub fn shift_ids(&mut self, threshold: i64, delta: i64) {
        let mut to_shift: Vec<(i64, NodeId)> = self
            .nodes
            .iter()
            .filter_map(|n| n.numeric_name().map(|v| (v, n.id)))
            .filter(|&(v, _)| v >= threshold)
            .collect();
        to_shift.sort_by(|a, b| b.0.cmp(&a.0));
        for (value, id) in to_shift {
            self.rename_node(id, &(value + delta).to_string());
        }
    }

    /// Largest integer appearing as a node name, or 0 when every name is
    /// non-numeric
    pub fn max_numeric_name(&self) -> i64 {
        self.nodes
            .iter()
            .filter_map(|n| n.numeric_name())
            .max()
            .unwrap_or(0)
            .max(0)
    }

    /// Record the rare polarity mined for a node
    pub fn set_rare_polarity(&mut self, id: NodeId, polarity: Option<bool>) {
        self.nodes[id].rare_polarity = polarity;
    }

    /// Ids of all nodes currently annotated as rare, in id order
    pub fn rare_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.rare_polarity.is_some())
            .map(|n| n.id)
            .collect()
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        for n in &self.nodes {
            assert_eq!(self.name_to_node.get(&n.name), Some(&n.id));
            for &f in &n.fanin {
                assert!(
                    self.nodes[f].fanout.contains(&n.id),
                    "Fanin {} of {} has no matching fanout",
                    self.nodes[f].name,
                    n.name
                );
            }
            for &f in &n.fanout {
                assert!(
                    self.nodes[f].fanin.contains(&n.id),
                    "Fanout {} of {} has no matching fanin",
                    self.nodes[f].name,
                    n.name
                );
            }
        }
        assert_eq!(self.name_to_node.len(), self.nodes.len());
    }
}
