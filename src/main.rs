use std::process::ExitCode;

use clap::Parser;
use log::info;

use cache_hierarchy_sim::cli::Cli;
use cache_hierarchy_sim::error::SimulatorError;
use cache_hierarchy_sim::hierarchy::Hierarchy;
use cache_hierarchy_sim::report;
use cache_hierarchy_sim::statistics;
use cache_hierarchy_sim::trace::{self, Op};

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), SimulatorError> {
    info!(
        "building hierarchy: l1_size={} l1_assoc={} block_size={} vc_blocks={} l2_size={} l2_assoc={}",
        cli.l1_size, cli.l1_assoc, cli.l1_blocksize, cli.vc_num_blocks, cli.l2_size, cli.l2_assoc
    );
    let mut hierarchy = Hierarchy::new(
        cli.l1_size,
        cli.l1_assoc,
        cli.l1_blocksize,
        cli.vc_num_blocks,
        cli.l2_size,
        cli.l2_assoc,
    )?;

    let records = trace::read(&cli.trace_file)?;
    info!("replaying {} trace records", records.len());
    for record in &records {
        match record.op {
            Op::Read => hierarchy.read_request(record.addr),
            Op::Write => hierarchy.write_request(record.addr),
        }
    }

    let (raw, perf) = statistics::derive(&hierarchy);
    report::print(cli, &hierarchy, &raw, &perf);
    Ok(())
}
