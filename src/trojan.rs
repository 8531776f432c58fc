//! Trigger synthesis and payload insertion
//!
//! The trigger is a combinational function that is 1 exactly when every
//! clique member sits at its rare value. The payload corrupts one
//! primary output when and only when the trigger fires. New gates take
//! fresh decimal names past the netlist's original numeric range, then
//! get renumbered into a reserved identifier block so the result keeps
//! the lexical convention of the input format.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::netlist::{GateKind, Netlist, NodeId};

/// Payload flavours, following the TrustHub effect taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TrojanKind {
    /// Invert the victim output while the trigger is active
    FunctionalXor,
    /// Force the victim output to 0 while the trigger is active
    DosSa0,
    /// Force the victim output to 1 while the trigger is active
    DosSa1,
    /// Route the victim output through a buffer chain while the trigger
    /// is active
    DelayParametric,
    /// Replace the victim output by an internal secret signal while the
    /// trigger is active
    LeakInfo,
}

impl TrojanKind {
    /// Number of gates the payload splice adds on top of the trigger
    fn payload_overhead(self) -> i64 {
        match self {
            TrojanKind::FunctionalXor => 1,
            TrojanKind::DosSa0 => 2,
            TrojanKind::DosSa1 => 1,
            TrojanKind::DelayParametric => 8,
            TrojanKind::LeakInfo => 4,
        }
    }
}

/// Trojan synthesiser
///
/// Keeps a next-free-identifier cursor derived from the largest numeric
/// name seen at construction; the cursor lives with the synthesiser, not
/// the netlist. Victim and secret selection are the two seeded random
/// choices: different seeds intentionally produce different trojans.
pub struct TrojanSynth {
    next_id: i64,
    initial_max_id: i64,
    rng: SmallRng,
}

impl TrojanSynth {
    /// Create a synthesiser for a netlist, scanning its numeric name range
    pub fn new(netlist: &Netlist, seed: u64) -> TrojanSynth {
        let max_id = netlist.max_numeric_name();
        TrojanSynth {
            next_id: max_id + 1,
            initial_max_id: max_id,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn fresh_name(&mut self) -> String {
        let name = self.next_id.to_string();
        self.next_id += 1;
        name
    }

    /// Synthesise the trigger for a clique of rare nodes
    ///
    /// Cliques of up to 8 members get a flat And/Nor pair; larger
    /// cliques are grouped into chunks of 4 whose results are And-ed
    /// together, keeping the fan-in of every new gate small. Returns the
    /// root of the trigger tree, or `None` for an empty clique.
    pub fn build_trigger(&mut self, netlist: &mut Netlist, clique: &[NodeId]) -> Option<NodeId> {
        if clique.is_empty() {
            return None;
        }
        if clique.len() > 8 {
            let mut chunk_results = Vec::new();
            for chunk in clique.chunks(4) {
                if let Some(result) = self.conjunction(netlist, chunk) {
                    chunk_results.push(result);
                }
            }
            let name = self.fresh_name();
            Some(netlist.create_gate(&name, GateKind::And, &chunk_results))
        } else {
            self.conjunction(netlist, clique)
        }
    }

    /// And of the rare-1 members and Nor of the rare-0 members, combined
    /// with a final And when both sides are present
    fn conjunction(&mut self, netlist: &mut Netlist, members: &[NodeId]) -> Option<NodeId> {
        let need_1: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|&n| netlist.node(n).rare_polarity == Some(true))
            .collect();
        let need_0: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|&n| netlist.node(n).rare_polarity != Some(true))
            .collect();

        let mut part_1 = None;
        if !need_1.is_empty() {
            let name = self.fresh_name();
            part_1 = Some(netlist.create_gate(&name, GateKind::And, &need_1));
        }
        let mut part_0 = None;
        if !need_0.is_empty() {
            let name = self.fresh_name();
            part_0 = Some(netlist.create_gate(&name, GateKind::Nor, &need_0));
        }
        match (part_1, part_0) {
            (Some(p1), Some(p0)) => {
                let name = self.fresh_name();
                Some(netlist.create_gate(&name, GateKind::And, &[p1, p0]))
            }
            (Some(p1), None) => Some(p1),
            (None, Some(p0)) => Some(p0),
            (None, None) => None,
        }
    }

    /// Largest original numeric name reachable in the trigger's fan-in
    /// cone; the walk stops at original nodes
    fn max_original_id_in_cone(&self, netlist: &Netlist, trigger: NodeId) -> i64 {
        let mut max_source = -1;
        let mut visited = vec![false; netlist.nb_nodes()];
        let mut stack = vec![trigger];
        while let Some(n) = stack.pop() {
            if visited[n] {
                continue;
            }
            visited[n] = true;
            let id = netlist.node(n).numeric_name().unwrap_or(-1);
            if id <= self.initial_max_id {
                max_source = max_source.max(id);
            } else {
                stack.extend(netlist.node(n).fanin.iter());
            }
        }
        max_source
    }

    /// Gates created for the trigger (numeric names past the original
    /// range), sorted by internal id
    fn collect_trigger_gates(&self, netlist: &Netlist, trigger: NodeId) -> Vec<NodeId> {
        let mut gates = Vec::new();
        let mut visited = vec![false; netlist.nb_nodes()];
        let mut stack = vec![trigger];
        while let Some(n) = stack.pop() {
            if visited[n] {
                continue;
            }
            visited[n] = true;
            if netlist.node(n).numeric_name().unwrap_or(-1) > self.initial_max_id {
                gates.push(n);
                stack.extend(netlist.node(n).fanin.iter());
            }
        }
        gates.sort_unstable();
        gates
    }

    /// Every node in the trigger's transitive fan-in cone, trigger included
    fn trigger_cone(&self, netlist: &Netlist, trigger: NodeId) -> Vec<bool> {
        let mut in_cone = vec![false; netlist.nb_nodes()];
        let mut stack = vec![trigger];
        while let Some(n) = stack.pop() {
            if in_cone[n] {
                continue;
            }
            in_cone[n] = true;
            stack.extend(netlist.node(n).fanin.iter());
        }
        in_cone
    }

    /// Random original node to leak: outside the trigger cone and not the
    /// victim, with the trigger itself as last resort
    fn pick_secret(&mut self, netlist: &Netlist, trigger: NodeId, victim: NodeId) -> NodeId {
        let in_cone = self.trigger_cone(netlist, trigger);
        for _ in 0..100 {
            let cand = self.rng.gen_range(0..netlist.nb_nodes());
            let id = netlist.node(cand).numeric_name().unwrap_or(-1);
            if id <= self.initial_max_id && !in_cone[cand] && cand != victim {
                return cand;
            }
        }
        trigger
    }

    /// Splice a payload of the given kind between the victim output and
    /// the trigger
    ///
    /// Chooses a victim among outputs numerically downstream of the
    /// trigger's source cone (any output when none qualifies), reserves a
    /// contiguous identifier block past the netlist's numeric range,
    /// renumbers the trigger gates into it and rebuilds the output
    /// through the payload. Returns false, leaving the netlist unchanged,
    /// when there is no primary output.
    pub fn insert_payload(
        &mut self,
        netlist: &mut Netlist,
        trigger: NodeId,
        kind: TrojanKind,
    ) -> bool {
        if netlist.outputs().is_empty() {
            return false;
        }

        let max_source_id = self.max_original_id_in_cone(netlist, trigger);
        let candidates: Vec<NodeId> = netlist
            .outputs()
            .iter()
            .copied()
            .filter(|&o| netlist.node(o).numeric_name().unwrap_or(-1) > max_source_id)
            .collect();
        let pool = if candidates.is_empty() {
            netlist.outputs().to_vec()
        } else {
            candidates
        };
        let victim = pool[self.rng.gen_range(0..pool.len())];
        let original_name = netlist.node(victim).name.clone();

        // Reserve identifier space past everything, numeric or not
        let mut max_id_val = netlist.max_numeric_name();
        if max_id_val < netlist.nb_nodes() as i64 {
            max_id_val = netlist.nb_nodes() as i64 + 10_000;
        }
        let base = max_id_val + 1000;

        let trigger_gates = self.collect_trigger_gates(netlist, trigger);
        let delta = trigger_gates.len() as i64 + kind.payload_overhead();
        netlist.shift_ids(base, delta);

        let mut current = base;
        for &t in &trigger_gates {
            netlist.rename_node(t, &current.to_string());
            current += 1;
        }

        // The victim keeps its driver under an internal name; the payload
        // root takes over its output slot
        let internal_name = current.to_string();
        netlist.rename_node(victim, &internal_name);
        current += 1;
        let final_name = (base + delta).to_string();

        use GateKind::*;
        let payload = match kind {
            TrojanKind::FunctionalXor => {
                netlist.create_gate(&final_name, Xor, &[victim, trigger])
            }
            TrojanKind::DosSa0 => {
                let not_trigger = netlist.create_gate(&current.to_string(), Not, &[trigger]);
                netlist.create_gate(&final_name, And, &[victim, not_trigger])
            }
            TrojanKind::DosSa1 => netlist.create_gate(&final_name, Or, &[victim, trigger]),
            TrojanKind::DelayParametric => {
                let mut delayed = victim;
                for _ in 0..4 {
                    delayed = netlist.create_gate(&current.to_string(), Buf, &[delayed]);
                    current += 1;
                }
                let not_trigger = netlist.create_gate(&current.to_string(), Not, &[trigger]);
                current += 1;
                let term_1 =
                    netlist.create_gate(&current.to_string(), And, &[victim, not_trigger]);
                current += 1;
                let term_2 = netlist.create_gate(&current.to_string(), And, &[delayed, trigger]);
                netlist.create_gate(&final_name, Or, &[term_1, term_2])
            }
            TrojanKind::LeakInfo => {
                let secret = self.pick_secret(netlist, trigger, victim);
                log::info!("Leaking node {} onto the victim output", netlist.node(secret).name);
                let not_trigger = netlist.create_gate(&current.to_string(), Not, &[trigger]);
                current += 1;
                let term_1 =
                    netlist.create_gate(&current.to_string(), And, &[victim, not_trigger]);
                current += 1;
                let term_2 = netlist.create_gate(&current.to_string(), And, &[secret, trigger]);
                netlist.create_gate(&final_name, Or, &[term_1, term_2])
            }
        };
        netlist.replace_output(victim, payload);

        log::info!("Inserted {:?} trojan", kind);
        log::info!(
            "  Trigger: {} ({} gates)",
            netlist.node(trigger).name,
            trigger_gates.len()
        );
        log::info!("  Victim: {} (renamed to {})", original_name, internal_name);
        log::info!("  Payload output: {}", final_name);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{TrojanKind, TrojanSynth};
    use crate::io::{read_bench, write_bench};
    use crate::netlist::{GateKind, Netlist, NodeId};
    use crate::sim::Simulator;

    /// Netlist with a known 2-clique of rare-1 nodes and one output
    fn clique_netlist() -> (Netlist, Vec<NodeId>) {
        let mut nl = Netlist::new();
        nl.add_input("a");
        nl.add_input("b");
        let r1 = nl.add_gate("r1", GateKind::And, &["a", "b"]);
        let r2 = nl.add_gate("r2", GateKind::And, &["r1", "a"]);
        nl.add_gate("o", GateKind::Or, &["r1", "a"]);
        nl.add_output("o");
        nl.set_rare_polarity(r1, Some(true));
        nl.set_rare_polarity(r2, Some(true));
        (nl, vec![r1, r2])
    }

    fn attack_vector(nl: &Netlist) -> HashMap<NodeId, bool> {
        HashMap::from([(nl.get("a").unwrap(), true), (nl.get("b").unwrap(), true)])
    }

    #[test]
    fn test_flat_trigger() {
        let (mut nl, clique) = clique_netlist();
        let mut synth = TrojanSynth::new(&nl, 1);
        let trigger = synth.build_trigger(&mut nl, &clique).unwrap();
        nl.check();

        // Two rare-1 members collapse into a single And
        assert_eq!(nl.node(trigger).kind, GateKind::And);
        assert_eq!(nl.node(trigger).fanin, clique);

        let mut sim = Simulator::new(&nl);
        sim.run_vector(&attack_vector(&nl));
        assert_eq!(sim.value(trigger), Some(true));
        sim.run_vector(&HashMap::new());
        assert_eq!(sim.value(trigger), Some(false));
    }

    #[test]
    fn test_mixed_polarity_trigger() {
        let (mut nl, clique) = clique_netlist();
        nl.set_rare_polarity(clique[1], Some(false));
        let nb_before = nl.gates().len();
        let mut synth = TrojanSynth::new(&nl, 1);
        let trigger = synth.build_trigger(&mut nl, &clique).unwrap();
        nl.check();

        // And over rare-1, Nor over rare-0, And of the two
        assert_eq!(nl.gates().len(), nb_before + 3);
        assert_eq!(nl.node(trigger).kind, GateKind::And);
        assert_eq!(nl.node(trigger).fanin.len(), 2);
    }

    #[test]
    fn test_deep_trigger() {
        let mut nl = Netlist::new();
        let mut clique = Vec::new();
        for i in 0..9 {
            let input = format!("i{i}");
            nl.add_input(&input);
            let gate = nl.add_gate(&format!("g{i}"), GateKind::Buf, &[input.as_str()]);
            nl.set_rare_polarity(gate, Some(true));
            clique.push(gate);
        }
        nl.add_output("g0");

        let nb_before = nl.gates().len();
        let mut synth = TrojanSynth::new(&nl, 1);
        let trigger = synth.build_trigger(&mut nl, &clique).unwrap();
        nl.check();

        // Chunks of 4, 4 and 1, each a single And, plus the root
        assert_eq!(nl.gates().len(), nb_before + 4);
        assert_eq!(nl.node(trigger).fanin.len(), 3);
        for &chunk in &nl.node(trigger).fanin {
            assert!(nl.node(chunk).fanin.len() <= 4);
        }
    }

    #[test]
    fn test_empty_clique() {
        let (mut nl, _) = clique_netlist();
        let mut synth = TrojanSynth::new(&nl, 1);
        assert!(synth.build_trigger(&mut nl, &[]).is_none());
    }

    #[test]
    fn test_no_output_is_a_noop() {
        let mut nl = Netlist::new();
        nl.add_input("a");
        let g = nl.add_gate("g", GateKind::Not, &["a"]);
        nl.set_rare_polarity(g, Some(true));
        let mut synth = TrojanSynth::new(&nl, 1);
        let trigger = synth.build_trigger(&mut nl, &[g]).unwrap();
        let nb_gates = nl.gates().len();
        assert!(!synth.insert_payload(&mut nl, trigger, TrojanKind::FunctionalXor));
        assert_eq!(nl.gates().len(), nb_gates);
    }

    #[test]
    fn test_functional_xor_insertion() {
        let (mut nl, clique) = clique_netlist();
        let victim = nl.get("o").unwrap();
        let nb_gates = nl.gates().len();
        let nb_outputs = nl.outputs().len();

        let mut synth = TrojanSynth::new(&nl, 1);
        let trigger = synth.build_trigger(&mut nl, &clique).unwrap();
        assert!(synth.insert_payload(&mut nl, trigger, TrojanKind::FunctionalXor));
        nl.check();

        // One trigger gate plus the payload wrapper
        assert_eq!(nl.gates().len(), nb_gates + 2);
        assert_eq!(nl.outputs().len(), nb_outputs);
        assert!(!nl.outputs().contains(&victim));

        // Under the attack vector the output inverts the original signal
        let payload = nl.outputs()[0];
        let mut sim = Simulator::new(&nl);
        sim.run_vector(&attack_vector(&nl));
        assert_eq!(sim.value(trigger), Some(true));
        assert_eq!(sim.value(payload), Some(!sim.value(victim).unwrap()));

        // A quiet vector leaves the output transparent
        sim.run_vector(&HashMap::from([(nl.get("a").unwrap(), true)]));
        assert_eq!(sim.value(trigger), Some(false));
        assert_eq!(sim.value(payload), sim.value(victim));
    }

    #[test]
    fn test_insertion_roundtrip() {
        let (mut nl, clique) = clique_netlist();
        let nb_gates = nl.gates().len();
        let mut synth = TrojanSynth::new(&nl, 1);
        let trigger = synth.build_trigger(&mut nl, &clique).unwrap();
        let trigger_gates = nl.gates().len() - nb_gates;
        assert!(synth.insert_payload(&mut nl, trigger, TrojanKind::FunctionalXor));

        let mut buf = Vec::new();
        write_bench(&mut buf, &nl).unwrap();
        let reparsed = read_bench(buf.as_slice()).unwrap();
        reparsed.check();

        assert_eq!(reparsed.gates().len(), nb_gates + trigger_gates + 1);
        assert_eq!(reparsed.outputs().len(), 1);
        assert_eq!(reparsed.inputs().len(), 2);
    }

    #[test]
    fn test_dos_payloads() {
        for (kind, expected_when_triggered) in
            [(TrojanKind::DosSa0, false), (TrojanKind::DosSa1, true)]
        {
            let (mut nl, clique) = clique_netlist();
            let mut synth = TrojanSynth::new(&nl, 1);
            let trigger = synth.build_trigger(&mut nl, &clique).unwrap();
            assert!(synth.insert_payload(&mut nl, trigger, kind));
            nl.check();

            let payload = nl.outputs()[0];
            let mut sim = Simulator::new(&nl);
            sim.run_vector(&attack_vector(&nl));
            assert_eq!(sim.value(payload), Some(expected_when_triggered));

            // Quiet vectors pass the original value through
            sim.run_vector(&HashMap::from([(nl.get("a").unwrap(), true)]));
            assert!(nl.get("o").is_none(), "victim should have been renamed");
            assert_eq!(sim.value(payload), Some(true));
        }
    }

    #[test]
    fn test_delay_payload_is_transparent() {
        let (mut nl, clique) = clique_netlist();
        let victim = nl.get("o").unwrap();
        let nb_gates = nl.gates().len();
        let mut synth = TrojanSynth::new(&nl, 1);
        let trigger = synth.build_trigger(&mut nl, &clique).unwrap();
        assert!(synth.insert_payload(&mut nl, trigger, TrojanKind::DelayParametric));
        nl.check();

        // Trigger gate + buffer chain and mux logic
        assert_eq!(nl.gates().len(), nb_gates + 1 + 8);

        // The delay trojan is combinationally transparent in both modes
        let payload = nl.outputs()[0];
        let mut sim = Simulator::new(&nl);
        sim.run_vector(&attack_vector(&nl));
        assert_eq!(sim.value(payload), sim.value(victim));
        sim.run_vector(&HashMap::from([(nl.get("b").unwrap(), true)]));
        assert_eq!(sim.value(payload), sim.value(victim));
    }

    #[test]
    fn test_leak_payload() {
        let mut nl = Netlist::new();
        nl.add_input("1");
        nl.add_input("2");
        nl.add_input("3");
        let r1 = nl.add_gate("4", GateKind::And, &["1", "2"]);
        let r2 = nl.add_gate("5", GateKind::And, &["4", "1"]);
        nl.add_gate("6", GateKind::Not, &["3"]);
        nl.add_gate("7", GateKind::Or, &["4", "1"]);
        nl.add_output("7");
        nl.set_rare_polarity(r1, Some(true));
        nl.set_rare_polarity(r2, Some(true));

        let mut synth = TrojanSynth::new(&nl, 3);
        let trigger = synth.build_trigger(&mut nl, &[r1, r2]).unwrap();
        assert!(synth.insert_payload(&mut nl, trigger, TrojanKind::LeakInfo));
        nl.check();

        // When quiet, the output still carries the original signal
        let payload = nl.outputs()[0];
        let mut sim = Simulator::new(&nl);
        sim.run_vector(&HashMap::from([(nl.get("1").unwrap(), true)]));
        assert_eq!(sim.value(trigger), Some(false));
        assert_eq!(sim.value(payload), Some(true));
    }
}
