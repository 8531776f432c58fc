//! Hardware trojan insertion research tool
//!
//! This crate takes a combinational or sequential gate-level netlist in
//! the .bench (ISCAS) format, finds signals that are statistically hard
//! to excite under random stimulus, proves that small sets of them can
//! be driven to their rare values by a single input assignment, and
//! splices a stealthy trigger and payload into the design.
//!
//! # Usage
//!
//! The command line tool can be installed using
//! [Cargo](https://doc.rust-lang.org/cargo/getting-started/installation.html):
//! `cargo install woodworm`.
//!
//! The `insert` command runs the full pipeline on a single design:
//! ```bash
//! woodworm insert c432.bench --trigger-size 4 --payload functional-xor
//! ```
//!
//! The `batch` command scans `inputs/combinational` and
//! `inputs/sequential` and processes every .bench file found:
//! ```bash
//! woodworm batch --payload dos-sa1
//! ```
//!
//! The `analyze` command reports rare-node and compatibility statistics
//! without modifying the design:
//! ```bash
//! woodworm analyze c432.bench
//! ```
//!
//! # Pipeline
//!
//! *   **Rare mining**: Monte-Carlo simulation annotates every internal
//!     signal whose 1-probability (or 0-probability) under uniform
//!     random inputs stays below a threshold.
//! *   **Justification**: a PODEM engine over the 5-valued D-algebra
//!     produces, for each rare node, a primary-input assignment that
//!     excites the rare value and makes the effect observable.
//! *   **Compatibility**: rare nodes whose assignments never conflict
//!     form a graph; Bron–Kerbosch enumeration yields cliques of nodes
//!     that one vector excites simultaneously.
//! *   **Synthesis**: a trigger tree over the chosen clique and one of
//!     five payloads are spliced in, with new gates renumbered to keep
//!     the lexical convention of the input.
//!
//! Flip-flops are cut for all analysis: a DFF output is a pseudo-primary
//! input and its data driver a pseudo-primary output, so every component
//! works on a DAG.
//!
//! This is an experimental research artefact for trojan-detection
//! benchmarking, not a production EDA component.

#![warn(missing_docs)]

pub mod cmd;
pub mod compat;
pub mod errors;
pub mod io;
pub mod netlist;
pub mod podem;
pub mod sim;
pub mod trojan;

pub use errors::{Error, Result};
pub use netlist::{GateKind, Netlist, Node, NodeId};
pub use trojan::TrojanKind;
