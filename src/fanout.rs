//! Copying the source onto every endpoint.
//!
//! Each chunk gets exactly one non-blocking write per endpoint.
//! An endpoint with a full buffer loses that chunk, nothing is queued or retried,
//! and the other endpoints and the source are never held up by it.

use std::{fmt::Display, io};

use tracing::{info, trace, warn};

use crate::{
    endpoint::Delivery,
    registry::EndpointRegistry,
    source::SourceReader,
};

/// Per-chunk bookkeeping, only used for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    /// Endpoints which accepted (at least part of) the chunk.
    pub written: usize,

    /// Endpoints whose buffers were full.
    pub dropped: usize,

    /// Endpoints where the write failed otherwise.
    pub failed: usize,
}

/// Offer one chunk to every registered endpoint.
pub fn broadcast(registry: &EndpointRegistry, chunk: &[u8]) -> Tally {
    let mut tally = Tally::default();

    for endpoint in registry.iter() {
        match endpoint.offer(chunk) {
            Delivery::Written(written) => {
                if written < chunk.len() {
                    trace!(index = endpoint.index(), %written, "Partial write");
                }
                tally.written += 1;
            }
            Delivery::Dropped => {
                trace!(index = endpoint.index(), "Full, dropped chunk");
                tally.dropped += 1;
            }
            Delivery::Failed(e) => {
                trace!(index = endpoint.index(), ?e, "Write failed");
                tally.failed += 1;
            }
        }
    }

    tally
}

/// Why the main loop stopped.
#[derive(Debug)]
pub enum SourceEnd {
    /// The source reached end-of-stream.
    Eof,

    /// Reading from the source failed.
    Error(io::Error),
}

impl Display for SourceEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceEnd::Eof => write!(f, "end of stream"),
            SourceEnd::Error(e) => write!(f, "read error: {e}"),
        }
    }
}

/// Read the source until it ends, broadcasting every chunk.
///
/// Chunks are at most `chunk_size` bytes.
/// The registry is only read, tearing it down is left to the caller.
pub async fn run(
    source: &mut SourceReader,
    registry: &EndpointRegistry,
    chunk_size: usize,
) -> SourceEnd {
    let mut buf = vec![0; chunk_size];

    info!(source = ?source.path(), endpoints = registry.len(), "Splitting");

    loop {
        match source.read(&mut buf).await {
            Ok(0) => {
                info!("Source EOF");
                return SourceEnd::Eof;
            }
            Ok(n) => {
                let tally = broadcast(registry, &buf[..n]);
                trace!(bytes = n, ?tally, "Chunk");
            }
            Err(e) => {
                warn!(?e, "Source read error");
                return SourceEnd::Error(e);
            }
        }
    }
}
