//! Compute gate statistics on netlists

use std::fmt;

use crate::netlist::{GateKind, Netlist};

/// Number of inputs, outputs and gates per kind in a netlist
#[derive(Clone, Copy, Debug, Default)]
pub struct NetlistStats {
    /// Number of primary inputs (pseudo-primary inputs included)
    pub nb_inputs: usize,
    /// Number of primary outputs (pseudo-primary outputs included)
    pub nb_outputs: usize,
    /// Number of And gates
    pub nb_and: usize,
    /// Number of Nand gates
    pub nb_nand: usize,
    /// Number of Or gates
    pub nb_or: usize,
    /// Number of Nor gates
    pub nb_nor: usize,
    /// Number of Xor gates
    pub nb_xor: usize,
    /// Number of Xnor gates
    pub nb_xnor: usize,
    /// Number of Not gates
    pub nb_not: usize,
    /// Number of Buf gates
    pub nb_buf: usize,
    /// Number of Dff
    pub nb_dff: usize,
    /// Number of rare nodes annotated by the miner
    pub nb_rare: usize,
}

impl NetlistStats {
    /// Total number of gates, including Dff
    pub fn nb_gates(&self) -> usize {
        self.nb_and
            + self.nb_nand
            + self.nb_or
            + self.nb_nor
            + self.nb_xor
            + self.nb_xnor
            + self.nb_not
            + self.nb_buf
            + self.nb_dff
    }
}

impl fmt::Display for NetlistStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  Gates: {}", self.nb_gates())?;
        for (label, count) in [
            ("And", self.nb_and),
            ("Nand", self.nb_nand),
            ("Or", self.nb_or),
            ("Nor", self.nb_nor),
            ("Xor", self.nb_xor),
            ("Xnor", self.nb_xnor),
            ("Not", self.nb_not),
            ("Buf", self.nb_buf),
            ("Dff", self.nb_dff),
        ] {
            if count != 0 {
                writeln!(f, "  {}: {}", label, count)?;
            }
        }
        if self.nb_rare != 0 {
            writeln!(f, "  Rare nodes: {}", self.nb_rare)?;
        }
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of a netlist
pub fn stats(netlist: &Netlist) -> NetlistStats {
    use GateKind::*;
    let mut ret = NetlistStats {
        nb_inputs: netlist.inputs().len(),
        nb_outputs: netlist.outputs().len(),
        ..NetlistStats::default()
    };
    for &g in netlist.gates() {
        match netlist.node(g).kind {
            And => ret.nb_and += 1,
            Nand => ret.nb_nand += 1,
            Or => ret.nb_or += 1,
            Nor => ret.nb_nor += 1,
            Xor => ret.nb_xor += 1,
            Xnor => ret.nb_xnor += 1,
            Not => ret.nb_not += 1,
            Buf => ret.nb_buf += 1,
            Dff => ret.nb_dff += 1,
            Input | Output | Unknown => (),
        }
    }
    ret.nb_rare = netlist.iter().filter(|n| n.rare_polarity.is_some()).count();
    ret
}

#[cfg(test)]
mod tests {
    use super::stats;
    use crate::netlist::{GateKind, Netlist};

    #[test]
    fn test_stats() {
        let mut nl = Netlist::new();
        nl.add_input("a");
        nl.add_input("b");
        nl.add_gate("g", GateKind::And, &["a", "b"]);
        nl.add_gate("h", GateKind::Xor, &["a", "g"]);
        nl.add_gate("q", GateKind::Dff, &["h"]);
        nl.add_output("h");

        let s = stats(&nl);
        assert_eq!(s.nb_inputs, 3);
        assert_eq!(s.nb_gates(), 3);
        assert_eq!(s.nb_and, 1);
        assert_eq!(s.nb_xor, 1);
        assert_eq!(s.nb_dff, 1);
    }
}
