//! Stdout report printer: configuration echo, cache contents, then the raw
//! and performance result blocks, in a fixed section order with four-decimal
//! fixed precision throughout.

use crate::cli::Cli;
use crate::hierarchy::Hierarchy;
use crate::statistics::{PerformanceStatistics, RawStatistics};

pub fn print(cli: &Cli, hierarchy: &Hierarchy, raw: &RawStatistics, perf: &PerformanceStatistics) {
    print_configuration(cli);
    print_contents(hierarchy);
    print_raw(raw);
    print_performance(perf);
}

fn print_configuration(cli: &Cli) {
    println!("L1_SIZE:\t\t{}", cli.l1_size);
    println!("L1_ASSOC:\t\t{}", cli.l1_assoc);
    println!("L1_BLOCKSIZE:\t\t{}", cli.l1_blocksize);
    println!("VC_NUM_BLOCKS:\t\t{}", cli.vc_num_blocks);
    println!("L2_SIZE:\t\t{}", cli.l2_size);
    println!("L2_ASSOC:\t\t{}", cli.l2_assoc);
    println!("TRACE_FILE:\t\t{}", cli.trace_file.display());
}

fn print_contents(hierarchy: &Hierarchy) {
    println!("===== L1 contents =====");
    print!("{}", hierarchy.l1().format_contents());

    if let Some(vc) = hierarchy.l1().vc() {
        println!("===== VC contents =====");
        print!("{}", vc.format_contents());
    }

    if let Some(l2) = hierarchy.l2() {
        println!("===== L2 contents =====");
        print!("{}", l2.format_contents());
    }
}

fn print_raw(raw: &RawStatistics) {
    println!("===== Simulation results (raw) =====");
    println!("  a. number of L1 reads:\t\t{}", raw.l1_reads);
    println!("  b. number of L1 read misses:\t\t{}", raw.l1_read_misses);
    println!("  c. number of L1 writes:\t\t{}", raw.l1_writes);
    println!("  d. number of L1 write misses:\t\t{}", raw.l1_write_misses);
    println!("  e. number of swap requests:\t\t{}", raw.swap_requests);
    println!("  f. swap request rate:\t\t{:.4}", raw.swap_request_rate);
    println!("  g. number of swaps:\t\t{}", raw.swaps);
    println!("  h. combined L1+VC miss rate:\t\t{:.4}", raw.l1vc_miss_rate);
    println!("  i. number writebacks from L1/VC:\t\t{}", raw.l1vc_writebacks);
    println!("  j. number of L2 reads:\t\t{}", raw.l2_reads);
    println!("  k. number of L2 read misses:\t\t{}", raw.l2_read_misses);
    println!("  l. number of L2 writes:\t\t{}", raw.l2_writes);
    println!("  m. number of L2 write misses:\t\t{}", raw.l2_write_misses);
    println!("  n. L2 miss rate:\t\t{:.4}", raw.l2_miss_rate);
    println!("  o. number of writebacks from L2:\t\t{}", raw.l2_writebacks);
    println!("  p. total memory traffic:\t\t{}", raw.memory_traffic);
}

fn print_performance(perf: &PerformanceStatistics) {
    println!("===== Simulation results (performance) =====");
    println!("  1. average access time:\t\t{:.4}", perf.average_access_time);
    println!("  2. energy-delay product:\t\t{:.4}", perf.energy_delay_product);
    println!("  3. total area:\t\t{:.4}", perf.total_area);
}
