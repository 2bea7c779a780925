//! Reads an address-reference trace: one `op addr` record per line,
//! `op ∈ {r, w}`, `addr` hexadecimal without a required `0x` prefix.

use std::fs;
use std::path::Path;

use crate::error::{SimulatorError, SimulatorResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug)]
pub struct TraceRecord {
    pub op: Op,
    pub addr: u64,
}

/// Reads the whole trace into memory. Blank trailing lines are ignored; any
/// other malformed line fails with the offending 1-based line number.
pub fn read(path: &Path) -> SimulatorResult<Vec<TraceRecord>> {
    let contents =
        fs::read_to_string(path).map_err(|e| SimulatorError::TraceIo(path.to_path_buf(), e))?;

    let mut records = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let op_token = fields.next().ok_or_else(|| SimulatorError::TraceParse {
            line: line_no,
            detail: "missing operation".to_string(),
        })?;
        let addr_token = fields.next().ok_or_else(|| SimulatorError::TraceParse {
            line: line_no,
            detail: "missing address".to_string(),
        })?;
        if fields.next().is_some() {
            return Err(SimulatorError::TraceParse {
                line: line_no,
                detail: "too many fields".to_string(),
            });
        }

        let op = match op_token {
            "r" => Op::Read,
            "w" => Op::Write,
            other => {
                return Err(SimulatorError::TraceParse {
                    line: line_no,
                    detail: format!("unknown operation '{other}'"),
                })
            }
        };

        let addr = u64::from_str_radix(addr_token.trim_start_matches("0x"), 16).map_err(|e| {
            SimulatorError::TraceParse {
                line: line_no,
                detail: format!("invalid hex address '{addr_token}': {e}"),
            }
        })?;

        records.push(TraceRecord { op, addr });
    }

    Ok(records)
}
