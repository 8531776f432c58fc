//! Command line interface

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::compat::CompatGraph;
use crate::errors::Result;
use crate::io::{read_netlist_file, write_netlist_file};
use crate::netlist::stats::stats;
use crate::netlist::Netlist;
use crate::sim::find_rare_nodes;
use crate::trojan::{TrojanKind, TrojanSynth};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Insert a hardware trojan into a netlist
    ///
    /// Mines rare nodes with random simulation, proves a clique of them
    /// simultaneously excitable with PODEM, then splices a trigger and
    /// payload into the design.
    #[clap()]
    Insert(InsertArgs),

    /// Process every netlist under the batch input directories
    ///
    /// Scans inputs/combinational and inputs/sequential for .bench files
    /// and writes the modified designs under outputs/, continuing with
    /// the next file on failure.
    #[clap()]
    Batch(BatchArgs),

    /// Show rare-node and compatibility statistics for a netlist
    ///
    /// Runs the analysis phases only; the netlist is not modified.
    #[clap(alias = "stats")]
    Analyze(AnalyzeArgs),
}

impl Commands {
    /// Run the selected subcommand
    pub fn run(&self) -> Result<()> {
        match self {
            Commands::Insert(a) => a.run(),
            Commands::Batch(a) => a.run(),
            Commands::Analyze(a) => a.run(),
        }
    }
}

/// Command arguments for single-file insertion
#[derive(Args)]
pub struct InsertArgs {
    /// Netlist to infect
    file: PathBuf,

    /// Output file for the modified netlist; defaults to
    /// <stem>_trojan.bench next to the input
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Number of rare nodes the trigger should cover
    #[arg(short = 't', long, default_value_t = 4)]
    trigger_size: usize,

    /// Payload kind to splice in
    #[arg(short = 'p', long, value_enum, default_value = "functional-xor")]
    payload: TrojanKind,

    /// Seed for simulation vectors and synthesiser choices
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of Monte-Carlo vectors for rare-node mining
    #[arg(long, default_value_t = 10000)]
    num_vectors: usize,

    /// Rarity threshold ratio
    #[arg(long, default_value_t = 0.2)]
    threshold: f64,
}

impl InsertArgs {
    /// Run single-file insertion
    pub fn run(&self) -> Result<()> {
        let mut netlist = read_netlist_file(&self.file)?;
        log::info!(
            "Parsed {} inputs, {} outputs, {} gates",
            netlist.inputs().len(),
            netlist.outputs().len(),
            netlist.gates().len()
        );
        if infect(
            &mut netlist,
            self.trigger_size,
            self.payload,
            self.seed,
            self.num_vectors,
            self.threshold,
        ) {
            let output = self
                .output
                .clone()
                .unwrap_or_else(|| trojan_output_path(&self.file));
            write_netlist_file(&output, &netlist)?;
            log::info!("Wrote {}", output.display());
        } else {
            log::warn!("No trojan inserted in {}", self.file.display());
        }
        Ok(())
    }
}

/// Command arguments for batch processing
#[derive(Args)]
pub struct BatchArgs {
    /// Number of rare nodes the trigger should cover
    #[arg(short = 't', long, default_value_t = 4)]
    trigger_size: usize,

    /// Payload kind to splice in, applied to every file
    #[arg(short = 'p', long, value_enum, default_value = "functional-xor")]
    payload: TrojanKind,

    /// Seed for simulation vectors and synthesiser choices
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of Monte-Carlo vectors for rare-node mining
    #[arg(long, default_value_t = 10000)]
    num_vectors: usize,

    /// Rarity threshold ratio
    #[arg(long, default_value_t = 0.2)]
    threshold: f64,
}

impl BatchArgs {
    /// Run batch processing over the fixed input directories
    pub fn run(&self) -> Result<()> {
        for dir in ["inputs/combinational", "inputs/sequential"] {
            let dir = Path::new(dir);
            if !dir.exists() {
                log::warn!("Directory {} not found, creating it", dir.display());
                fs::create_dir_all(dir)?;
                continue;
            }
            let out_dir = Path::new("outputs").join(dir.file_name().unwrap_or_default());
            fs::create_dir_all(&out_dir)?;

            let mut files: Vec<PathBuf> = fs::read_dir(dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().map_or(false, |e| e == "bench"))
                .collect();
            files.sort();
            if files.is_empty() {
                log::warn!("No .bench files found in {}", dir.display());
            }
            for path in files {
                log::info!("Processing {}", path.display());
                if let Err(e) = self.process_file(&path, &out_dir) {
                    log::error!("{}: {e}", path.display());
                }
            }
        }
        Ok(())
    }

    fn process_file(&self, path: &Path, out_dir: &Path) -> Result<()> {
        let mut netlist = read_netlist_file(path)?;
        if infect(
            &mut netlist,
            self.trigger_size,
            self.payload,
            self.seed,
            self.num_vectors,
            self.threshold,
        ) {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let out = out_dir.join(format!("{stem}_trojan.bench"));
            write_netlist_file(&out, &netlist)?;
            log::info!("Wrote {}", out.display());
        } else {
            log::warn!("Skipped {}", path.display());
        }
        Ok(())
    }
}

/// Command arguments for analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Netlist to analyze
    file: PathBuf,

    /// Seed for simulation vectors
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of Monte-Carlo vectors for rare-node mining
    #[arg(long, default_value_t = 10000)]
    num_vectors: usize,

    /// Rarity threshold ratio
    #[arg(long, default_value_t = 0.2)]
    threshold: f64,
}

impl AnalyzeArgs {
    /// Run the analysis report
    pub fn run(&self) -> Result<()> {
        let mut netlist = read_netlist_file(&self.file)?;
        find_rare_nodes(&mut netlist, self.num_vectors, self.threshold, self.seed);
        println!("{}", stats(&netlist));

        let rare = netlist.rare_nodes();
        let mut graph = CompatGraph::new(&netlist);
        graph.generate_vectors(&rare);
        graph.build();
        println!(
            "Compatibility graph: {} vertices, {} edges, density {:.3}",
            graph.nb_vertices(),
            graph.nb_edges(),
            graph.density()
        );
        Ok(())
    }
}

/// Default output path: `<stem>_trojan.bench` next to the input
fn trojan_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_trojan.bench"))
}

/// Full insertion pipeline over a parsed netlist
///
/// Returns false, leaving the netlist untouched, when any phase comes up
/// empty: no rare nodes, no justified vectors, or no clique of any size
/// down to 2.
fn infect(
    netlist: &mut Netlist,
    trigger_size: usize,
    payload: TrojanKind,
    seed: u64,
    num_vectors: usize,
    threshold: f64,
) -> bool {
    let trigger_size = trigger_size.max(2);
    if find_rare_nodes(netlist, num_vectors, threshold, seed) == 0 {
        log::warn!("No rare nodes found");
        return false;
    }
    let rare = netlist.rare_nodes();

    let clique = {
        let mut graph = CompatGraph::new(netlist);
        graph.generate_vectors(&rare);
        graph.build();

        // Fallback chain: retry with smaller cliques down to pairs
        let mut result = graph.find_cliques(trigger_size);
        let mut size = trigger_size;
        while result.cliques.is_empty() && size > 2 {
            size -= 1;
            log::warn!("No clique of size {}, trying {}", size + 1, size);
            result = graph.find_cliques(size);
        }
        result.cliques.first().cloned()
    };
    let Some(clique) = clique else {
        log::warn!("No viable trigger clique");
        return false;
    };
    log::info!("Selected clique of {} rare nodes", clique.len());

    let mut synth = TrojanSynth::new(netlist, seed);
    match synth.build_trigger(netlist, &clique) {
        Some(trigger) => synth.insert_payload(netlist, trigger, payload),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::trojan_output_path;
    use std::path::Path;

    #[test]
    fn test_output_path() {
        assert_eq!(
            trojan_output_path(Path::new("designs/c432.bench")),
            Path::new("designs/c432_trojan.bench")
        );
    }
}
