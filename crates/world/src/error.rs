//! Recoverable faults raised while generating and realizing chunks.
//!
//! None of these are fatal: each is handled at the smallest granularity that
//! keeps the rest of the world intact (one placement, one column, one chunk).

use thiserror::Error;
use voxelgen_core::{BlockPos, ChunkKey};

/// Failure raised by the generation pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// A placement names a block type the host registry does not know.
    #[error("block type `{block}` at {pos} is not registered")]
    UnregisteredBlockType { block: String, pos: BlockPos },

    /// The host declined to create a block.
    #[error("host failed to realize `{block}` at {pos}")]
    PlacementRealization { block: String, pos: BlockPos },

    /// Synthesis of a single column failed.
    #[error("column ({x}, {z}) failed: {reason}")]
    Column { x: i32, z: i32, reason: String },

    /// A background generation task panicked.
    #[error("generation of chunk {key} faulted: {reason}")]
    WorkerFault { key: ChunkKey, reason: String },
}

impl GenerationError {
    /// Build a `WorkerFault` from a caught panic payload.
    pub fn from_panic(key: ChunkKey, payload: &(dyn std::any::Any + Send)) -> Self {
        let reason = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic payload".to_string()
        };
        GenerationError::WorkerFault { key, reason }
    }
}
