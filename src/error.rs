use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator.
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("invalid cache configuration: {0}")]
    Config(String),

    #[error("failed to open trace file '{0}': {1}")]
    TraceIo(PathBuf, #[source] std::io::Error),

    #[error("malformed trace record at line {line}: {detail}")]
    TraceParse { line: usize, detail: String },
}

pub type SimulatorResult<T> = Result<T, SimulatorError>;
