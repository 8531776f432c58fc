//! Read and write netlists to files

mod bench;

use std::fs::File;
use std::path::Path;

pub use bench::{read_bench, write_bench};

use crate::errors::{Error, Result};
use crate::netlist::Netlist;

/// Read a netlist from a file
///
/// Following extensions are supported: .bench
pub fn read_netlist_file(path: &Path) -> Result<Netlist> {
    match path.extension() {
        Some(s) if s == "bench" => {
            let f = File::open(path)?;
            read_bench(f)
        }
        _ => Err(Error::UnsupportedExtension(path.to_path_buf())),
    }
}

/// Write a netlist to a file
///
/// Following extensions are supported: .bench
pub fn write_netlist_file(path: &Path, netlist: &Netlist) -> Result<()> {
    match path.extension() {
        Some(s) if s == "bench" => {
            let mut f = File::create(path)?;
            write_bench(&mut f, netlist)?;
            Ok(())
        }
        _ => Err(Error::UnsupportedExtension(path.to_path_buf())),
    }
}
