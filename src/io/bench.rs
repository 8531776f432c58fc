//! IO for .bench (ISCAS) files

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::{BufRead, BufReader, Read, Write};

use itertools::Itertools;

use crate::errors::{Error, Result};
use crate::netlist::{GateKind, Netlist, NodeId};

/// Fallback used when ordering gates whose name is not a decimal integer
const NUMERIC_SENTINEL: i64 = 999_999;

/// Parse a bench file, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = NOR(i0, x1)
///     x3 = BUFF(x2)
///     OUTPUT(x3)
/// ```
/// Gate keywords are case-insensitive and `BUFF` is an alias for `BUF`.
/// Statements with an unrecognised keyword are kept as `Unknown` nodes.
pub fn read_bench<R: Read>(r: R) -> Result<Netlist> {
    let mut netlist = Netlist::new();
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let l = l?;
        let code = l.split('#').next().unwrap_or("").trim();
        if code.is_empty() {
            continue;
        }
        let parts: Vec<&str> = code
            .split(['=', '(', ',', ')'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() == 2 && parts[0] == "INPUT" {
            netlist.add_input(parts[1]);
        } else if parts.len() == 2 && parts[0] == "OUTPUT" {
            netlist.add_output(parts[1]);
        } else if parts.len() >= 3 {
            netlist.add_gate(parts[0], GateKind::from_keyword(parts[1]), &parts[2..]);
        } else {
            return Err(Error::MalformedLine {
                line: i + 1,
                text: code.to_string(),
            });
        }
    }
    Ok(netlist)
}

/// Write a bench file, as used by the ISCAS benchmarks
///
/// The output is fully deterministic given the netlist state: inputs and
/// outputs are sorted by name, then gates follow in the effective-ID
/// order computed by [`emission_order`]. `Buf` is written back as `BUFF`
/// and `Unknown` nodes are never written as drivers.
pub fn write_bench<W: Write>(w: &mut W, netlist: &Netlist) -> std::io::Result<()> {
    writeln!(w, "# Generated by woodworm")?;

    let mut input_names: Vec<&str> = netlist
        .inputs()
        .iter()
        .map(|&i| netlist.node(i).name.as_str())
        .collect();
    input_names.sort_unstable();
    for name in input_names {
        writeln!(w, "INPUT({})", name)?;
    }
    writeln!(w)?;

    let mut output_names: Vec<&str> = netlist
        .outputs()
        .iter()
        .map(|&o| netlist.node(o).name.as_str())
        .collect();
    output_names.sort_unstable();
    for name in output_names {
        writeln!(w, "OUTPUT({})", name)?;
    }
    writeln!(w)?;

    for id in emission_order(netlist) {
        let node = netlist.node(id);
        let operands = node
            .fanin
            .iter()
            .map(|&f| netlist.node(f).name.as_str())
            .join(", ");
        writeln!(w, "{} = {}({})", node.name, node.kind.keyword(), operands)?;
    }
    Ok(())
}

/// Whether each node is a driver that gets emitted as a gate statement
fn emittable_drivers(netlist: &Netlist) -> Vec<bool> {
    let mut is_driver = vec![false; netlist.nb_nodes()];
    for &g in netlist.gates() {
        let kind = netlist.node(g).kind;
        if kind != GateKind::Input && kind != GateKind::Unknown {
            is_driver[g] = true;
        }
    }
    is_driver
}

/// Order the gate statements of a netlist for emission
///
/// Kahn-style scheduling over the combinational dependency graph. DFF
/// in-edges are cut (a flip-flop output is a pseudo-primary input), so
/// sequential feedback never blocks the ready queue. The queue is a
/// priority queue keyed by `(effective id, name)` ascending, which pulls
/// the producers of low-numbered downstream signals to the front.
fn emission_order(netlist: &Netlist) -> Vec<NodeId> {
    let is_driver = emittable_drivers(netlist);

    let mut dep_count = vec![0usize; netlist.nb_nodes()];
    let mut fanout_graph: Vec<Vec<NodeId>> = vec![Vec::new(); netlist.nb_nodes()];
    for &g in netlist.gates() {
        if !is_driver[g] || netlist.node(g).kind == GateKind::Dff {
            continue;
        }
        for &f in &netlist.node(g).fanin {
            // Edges from inputs and unresolved references carry no
            // scheduling constraint
            if is_driver[f] {
                fanout_graph[f].push(g);
                dep_count[g] += 1;
            }
        }
    }

    let eff = effective_ids(netlist, &is_driver, &fanout_graph);

    let mut ready = BinaryHeap::new();
    for &g in netlist.gates() {
        if is_driver[g] && dep_count[g] == 0 {
            ready.push(Reverse((eff[g], netlist.node(g).name.clone(), g)));
        }
    }

    let mut order = Vec::new();
    let mut emitted = vec![false; netlist.nb_nodes()];
    while let Some(Reverse((_, _, g))) = ready.pop() {
        if emitted[g] {
            continue;
        }
        emitted[g] = true;
        order.push(g);
        for &succ in &fanout_graph[g] {
            dep_count[succ] -= 1;
            if dep_count[succ] == 0 {
                ready.push(Reverse((eff[succ], netlist.node(succ).name.clone(), succ)));
            }
        }
    }
    order
}

/// Effective ID of every emittable driver
///
/// `eff(g) = min(numeric(g), min over comb fanout f of eff(f))`, with
/// non-numeric names falling back to [`NUMERIC_SENTINEL`]. Memoised
/// post-order walk over the fanout graph; a successor still on the walk
/// stack indicates a combinational cycle and contributes its own numeric
/// name instead of recursing.
fn effective_ids(netlist: &Netlist, is_driver: &[bool], fanout_graph: &[Vec<NodeId>]) -> Vec<i64> {
    let numeric = |id: NodeId| netlist.node(id).numeric_name().unwrap_or(NUMERIC_SENTINEL);

    let mut eff = vec![0i64; netlist.nb_nodes()];
    let mut visited = vec![false; netlist.nb_nodes()];
    let mut on_stack = vec![false; netlist.nb_nodes()];

    for &root in netlist.gates() {
        if !is_driver[root] || visited[root] {
            continue;
        }
        let mut stack = vec![(root, false)];
        while let Some((n, processed)) = stack.pop() {
            if processed {
                let mut val = numeric(n);
                for &out in &fanout_graph[n] {
                    let out_val = if visited[out] { eff[out] } else { numeric(out) };
                    val = val.min(out_val);
                }
                on_stack[n] = false;
                visited[n] = true;
                eff[n] = val;
            } else {
                if visited[n] || on_stack[n] {
                    continue;
                }
                on_stack[n] = true;
                stack.push((n, true));
                for &out in &fanout_graph[n] {
                    if !visited[out] && !on_stack[out] {
                        stack.push((out, false));
                    }
                }
            }
        }
    }
    eff
}
