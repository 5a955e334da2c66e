//! Error types for the highlight engine
//!
//! Nothing in this subsystem is fatal to the host application: anchor misses
//! drop the highlight from the current render, persistence failures leave the
//! cache authoritative, and storage unavailability degrades to a no-op.

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("remote store error: {0}")]
    Remote(#[from] crate::remote::RemoteError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
