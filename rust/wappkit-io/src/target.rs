//! Classification of the target a stream is opened on.

use std::path::PathBuf;

use wappkit_common::{Error, Result};

/// Pseudo-target for an unbounded in-memory stream.
pub const MEMORY_TARGET: &str = "memory://";

/// Pseudo-target for a memory-backed stream that spills to disk.
pub const TEMP_TARGET: &str = "temp://";

/// Spill threshold used by a plain `temp://` target.
pub const DEFAULT_MAX_MEMORY: u64 = 2 * 1024 * 1024;

const MAX_MEMORY_PREFIX: &str = "maxmemory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A filesystem path.
    File(PathBuf),
    /// Anonymous in-memory storage. `max_memory` is the spill threshold,
    /// `None` keeps everything in memory.
    Memory { max_memory: Option<u64> },
}

impl Target {
    pub fn parse(target: &str) -> Result<Target> {
        if target.is_empty() {
            return Err(Error::invalid_target(target, "empty target"));
        }
        if target == MEMORY_TARGET {
            return Ok(Target::Memory { max_memory: None });
        }
        if let Some(rest) = target.strip_prefix(TEMP_TARGET) {
            if rest.is_empty() {
                return Ok(Target::Memory {
                    max_memory: Some(DEFAULT_MAX_MEMORY),
                });
            }
            let limit = rest
                .strip_prefix(MAX_MEMORY_PREFIX)
                .ok_or_else(|| Error::invalid_target(target, "expected maxmemory:<bytes>"))?;
            let limit = limit
                .parse::<u64>()
                .map_err(|e| Error::invalid_target(target, e.to_string()))?;
            return Ok(Target::temporary(limit));
        }
        if target.starts_with("memory:") || target.starts_with("temp:") {
            return Err(Error::invalid_target(target, "malformed pseudo-target"));
        }
        Ok(Target::File(PathBuf::from(target)))
    }

    /// A temporary target with the given spill threshold, 0 meaning unbounded.
    pub fn temporary(max_memory: u64) -> Target {
        Target::Memory {
            max_memory: (max_memory != 0).then_some(max_memory),
        }
    }

    /// The textual form reported as the stream's uri.
    pub fn uri(&self) -> String {
        match self {
            Target::File(path) => path.display().to_string(),
            Target::Memory { max_memory: None } => MEMORY_TARGET.to_string(),
            Target::Memory {
                max_memory: Some(limit),
            } => format!("{TEMP_TARGET}{MAX_MEMORY_PREFIX}{limit}"),
        }
    }
}
