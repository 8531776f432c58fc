//! Netlist data model and mutation API

#[allow(clippy::module_inception)]
mod netlist;
mod node;
pub mod stats;

pub use netlist::Netlist;
pub use node::{GateKind, Node, NodeId};
