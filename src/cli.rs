use std::path::PathBuf;

use clap::Parser;

/// Simulates a two-level cache hierarchy (L1, optional victim cache,
/// optional L2, main memory) against an address trace.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// L1 cache size in bytes.
    pub l1_size: usize,

    /// L1 associativity (ways per set).
    pub l1_assoc: usize,

    /// Block size in bytes, shared by L1, the victim cache, and L2.
    pub l1_blocksize: usize,

    /// Number of victim-cache entries. 0 disables the victim cache.
    pub vc_num_blocks: usize,

    /// L2 cache size in bytes. 0 disables L2.
    pub l2_size: usize,

    /// L2 associativity (ways per set). Ignored when `l2_size` is 0.
    pub l2_assoc: usize,

    /// Path to the address trace file (`op addr` per line).
    pub trace_file: PathBuf,
}
