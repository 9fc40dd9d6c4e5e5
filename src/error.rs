use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that may occur in this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The source device never showed up while polling for it.
    #[error("The source device `{path}` did not appear after {attempts} attempts")]
    SourceTimeout {
        /// Where we looked.
        path: PathBuf,

        /// How many waits were spent before giving up.
        attempts: u32,
    },

    /// The source device exists but could not be opened.
    #[error("Could not open the source device `{path}`. Problem: {source}")]
    SourceOpen {
        /// The device path.
        path: PathBuf,

        /// The underlying problem.
        source: io::Error,
    },

    /// Allocating or configuring a pseudo-terminal pair failed.
    #[error("Pseudo-terminal problem: {0}")]
    Pty(#[from] nix::Error),

    /// An endpoint could not be exposed at its public path.
    #[error("Could not publish `{link}` -> `{device}`. Problem: {source}")]
    Publish {
        /// The public path.
        link: PathBuf,

        /// The consumer-facing device the link should point at.
        device: PathBuf,

        /// The underlying problem.
        source: io::Error,
    },

    /// Listening for termination signals was not possible.
    #[error("Could not listen for signals. Problem: {0}")]
    Signal(io::Error),
}
