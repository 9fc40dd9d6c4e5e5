use std::{fmt::Display, future::Future};

use tracing::{info, warn};

use crate::{
    config::{PortCount, Settings},
    error::Error,
    fanout::{self, SourceEnd},
    lifecycle::ShutdownReason,
    provision::provision,
    reclaim::reclaim_stale,
    registry::EndpointRegistry,
    source::SourceReader,
};

/// How a run of the splitter ended, when it ended well.
#[derive(Debug)]
pub enum Outcome {
    /// The configuration says the splitter should not run.
    Disabled,

    /// The source stopped producing data.
    SourceEnded(SourceEnd),

    /// Shutdown was requested.
    Stopped(ShutdownReason),
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Disabled => write!(f, "disabled via config"),
            Outcome::SourceEnded(end) => write!(f, "source ended ({end})"),
            Outcome::Stopped(reason) => write!(f, "stopped ({reason})"),
        }
    }
}

/// Run the splitter until the source ends or `shutdown` resolves.
///
/// In order:
/// - stale links from earlier runs are removed
/// - the configuration decides whether to carry on, and with how many endpoints
/// - the source device is waited for and opened
/// - endpoints are provisioned
/// - the source is split onto the endpoints
///
/// Whatever ends the run, every endpoint created is torn down before returning.
/// Errors are only returned for a source which never appeared or could not be opened.
pub async fn run<F>(settings: Settings, shutdown: F) -> Result<Outcome, Error>
where
    F: Future<Output = ShutdownReason>,
{
    tokio::pin!(shutdown);

    reclaim_stale(&settings.links);

    let ports = PortCount::from_path(&settings.config_path);
    let count = match ports {
        PortCount::Disabled => {
            info!(config = ?settings.config_path, "GPS splitter disabled via config");
            return Ok(Outcome::Disabled);
        }
        PortCount::Enabled(count) => count.get(),
    };

    info!(%ports, source = ?settings.source_path, links = %settings.links, "Starting GPS splitter");

    let mut source = tokio::select! {
        source = SourceReader::open_when_present(&settings.source_path, settings.wait) => source?,
        reason = &mut shutdown => return Ok(Outcome::Stopped(reason)),
    };

    let mut registry = EndpointRegistry::new();

    if provision(&settings.links, count, &mut registry) < count {
        warn!(
            available = registry.len(),
            wanted = count,
            "Not all endpoints could be created"
        );
    }

    let outcome = tokio::select! {
        end = fanout::run(&mut source, &registry, settings.chunk_size) => Outcome::SourceEnded(end),
        reason = &mut shutdown => Outcome::Stopped(reason),
    };

    registry.teardown();

    info!(%outcome, "GPS splitter done");

    Ok(outcome)
}
