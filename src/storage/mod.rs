//! Persistence of phase output
//!
//! Each phase writes one JSON array that doubles as progress log and final
//! output; see [`checkpoint`].

pub mod checkpoint;

pub use checkpoint::{
    Checkpoint, DetailDiagnostic, DiagnosticsWriter, JsonCheckpoint, MemoryCheckpoint,
};
