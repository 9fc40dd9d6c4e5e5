#![deny(missing_docs)]

//! Share one serial GPS receiver between any number of local readers.
//!
//! The physical device (by default `/dev/ttyACM0`) is opened once, read-only.
//! A number of pseudo-terminals are created and published as `/dev/gps0`, `/dev/gps1`, ...
//! Every chunk read from the device is written to every pseudo-terminal.
//!
//! Writes to the pseudo-terminals never block.
//! A reader which is slow, or not there at all, loses chunks when its buffer is full,
//! and nobody else notices.
//!
//! The number of ports comes from a key-value file (`gps_port = N`).
//! `false`, a missing key or a missing file means the splitter stays off.
//!
//! Links left behind by a run which could not clean up are removed at startup.
//! A run which is stopped by a signal, or whose source goes away, removes its own links.

/// The command line interface.
pub mod cli;

/// Relates to config files and run settings.
pub mod config;

/// A published endpoint, and the pseudo-terminal behind it.
pub mod endpoint;

/// Possible errors in this library.
pub mod error;

/// Copying source chunks onto every endpoint.
pub mod fanout;

/// Signals which stop the service.
pub mod lifecycle;

/// Logging/tracing setup.
pub mod logging;

/// Creating endpoints.
pub mod provision;

/// Removing links left over by earlier runs.
pub mod reclaim;

/// The endpoints created by this run.
pub mod registry;

/// Ties everything together into one run.
pub mod service;

/// The physical source device.
pub mod source;
