use std::fmt;

/// Index of a node within its netlist; dense, assigned at creation and stable
pub type NodeId = usize;

/// Function of a signal driver
///
/// This is the closed set of statements understood by the bench format.
/// `Unknown` is used for statements with an unrecognised keyword and for
/// names that are referenced but never defined; such nodes are preserved
/// but never evaluated or emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Declared primary input
    Input,
    /// Declared primary output (the declaration only; an output node
    /// normally carries the kind of its driver)
    Output,
    /// N-input And
    And,
    /// N-input Nand
    Nand,
    /// N-input Or
    Or,
    /// N-input Nor
    Nor,
    /// N-input Xor
    Xor,
    /// N-input Xnor
    Xnor,
    /// Inverter
    Not,
    /// Buffer (spelled `BUFF` in bench files)
    Buf,
    /// D flip-flop; its output is a pseudo-primary input and its data
    /// input a pseudo-primary output for all combinational analysis
    Dff,
    /// Unrecognised or undefined
    Unknown,
}

impl GateKind {
    /// Parse a bench keyword, case-insensitively. `BUFF` is accepted for `BUF`.
    pub fn from_keyword(s: &str) -> GateKind {
        use GateKind::*;
        match s.to_uppercase().as_str() {
            "INPUT" => Input,
            "OUTPUT" => Output,
            "AND" => And,
            "NAND" => Nand,
            "OR" => Or,
            "NOR" => Nor,
            "XOR" => Xor,
            "XNOR" => Xnor,
            "NOT" => Not,
            "BUF" | "BUFF" => Buf,
            "DFF" => Dff,
            _ => Unknown,
        }
    }

    /// Keyword used when emitting a bench file. `Buf` round-trips as `BUFF`.
    pub fn keyword(self) -> &'static str {
        use GateKind::*;
        match self {
            Input => "INPUT",
            Output => "OUTPUT",
            And => "AND",
            Nand => "NAND",
            Or => "OR",
            Nor => "NOR",
            Xor => "XOR",
            Xnor => "XNOR",
            Not => "NOT",
            Buf => "BUFF",
            Dff => "DFF",
            Unknown => "UNKNOWN",
        }
    }

    /// Whether the gate inverts the signal on a single justified path
    /// (used when backtracing objectives through the circuit)
    pub fn is_inverting(self) -> bool {
        use GateKind::*;
        matches!(self, Nand | Nor | Not | Xnor)
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single signal driver in a netlist
///
/// Fanin order is preserved from the source; fanout is maintained
/// consistent with fanin by the netlist mutation API.
#[derive(Debug, Clone)]
pub struct Node {
    /// Name, unique within the netlist; usually a decimal identifier
    pub name: String,
    /// Dense index, equal to the node's position in the netlist arena
    pub id: NodeId,
    /// Gate function driving this signal
    pub kind: GateKind,
    /// Input operands, in declaration order
    pub fanin: Vec<NodeId>,
    /// Nodes that list this node in their fanin
    pub fanout: Vec<NodeId>,
    /// `Some(v)` when Monte-Carlo mining found `v` to be this node's
    /// hard-to-excite value; `None` when the node is not rare
    pub rare_polarity: Option<bool>,
}

impl Node {
    pub(crate) fn new(name: String, id: NodeId) -> Node {
        Node {
            name,
            id,
            kind: GateKind::Unknown,
            fanin: Vec::new(),
            fanout: Vec::new(),
            rare_polarity: None,
        }
    }

    /// Numeric value of the name, when the name is a decimal integer
    pub fn numeric_name(&self) -> Option<i64> {
        self.name.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::GateKind;

    #[test]
    fn test_keywords() {
        assert_eq!(GateKind::from_keyword("nand"), GateKind::Nand);
        assert_eq!(GateKind::from_keyword("Buff"), GateKind::Buf);
        assert_eq!(GateKind::from_keyword("BUF"), GateKind::Buf);
        assert_eq!(GateKind::from_keyword("MYSTERY"), GateKind::Unknown);
        assert_eq!(GateKind::Buf.keyword(), "BUFF");
        assert_eq!(GateKind::Dff.keyword(), "DFF");
    }

    #[test]
    fn test_inverting() {
        assert!(GateKind::Nand.is_inverting());
        assert!(GateKind::Xnor.is_inverting());
        assert!(!GateKind::And.is_inverting());
        assert!(!GateKind::Buf.is_inverting());
    }
}
