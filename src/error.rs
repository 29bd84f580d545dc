//! Error types for the bootstrap and renderer surfaces.
//!
//! The component core itself is total: staging, committing, and lifecycle
//! sequencing never fail. Errors only exist at the edges - attaching to and
//! detaching from a host renderer, and the host's own I/O.

use std::io;

use thiserror::Error;

/// Errors surfaced by the mount/teardown bootstrap and the host boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The host renderer reported an I/O failure during a redraw pass.
    #[error("host renderer error: {0}")]
    Renderer(#[from] io::Error),

    /// A root component is already mounted on this renderer.
    #[error("a root component is already mounted")]
    AlreadyMounted,

    /// No root component is mounted on this renderer.
    #[error("no root component is mounted")]
    NotMounted,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
