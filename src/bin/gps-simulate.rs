//! Pretend to be a GPS receiver for whoever reads the published endpoint.
//!
//! Alternates between reporting driving speed and standing still,
//! which is handy for checking how a consumer reacts to movement.

use std::{fmt::Display, path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::Result;
use gps_splitter::{
    endpoint::LinkNamespace, fanout::broadcast, lifecycle::ShutdownSignals, logging,
    provision::provision_one, registry::EndpointRegistry,
};
use tracing::{debug, error, info, Level};

/// Feed a fake GPS endpoint with speed sentences.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// The endpoint is published as this prefix followed by `0`.
    #[arg(long, default_value = "/dev/gps")]
    link_prefix: PathBuf,

    /// Seconds spent in each phase. One sentence is sent per second.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    phase_secs: u32,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Driving,
    Stopped,
}

impl Phase {
    fn sentence(&self) -> &'static [u8] {
        match self {
            // 20 km/h, 10.8 knots.
            Phase::Driving => b"$GNVTG,,T,,M,10.8,N,20.0,K,D*1D\r\n",
            Phase::Stopped => b"$GNVTG,,T,,M,0.0,N,0.0,K,D*26\r\n",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Driving => write!(f, "DRIVING (20.0 km/h)"),
            Phase::Stopped => write!(f, "STOPPED (0.0 km/h)"),
        }
    }
}

/// Returns when the endpoint can't be written to anymore.
async fn simulate(registry: &EndpointRegistry, phase_secs: u32) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    for phase in [Phase::Driving, Phase::Stopped].into_iter().cycle() {
        info!(%phase, "Status");

        for _ in 0..phase_secs {
            ticker.tick().await;

            let tally = broadcast(registry, phase.sentence());

            if tally.failed > 0 {
                error!("Write error, stopping");
                return;
            }

            if tally.dropped > 0 {
                debug!("Nobody is reading, dropped sentence");
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(Level::INFO, None);

    let mut signals = ShutdownSignals::install()?;

    let links = LinkNamespace::new(&args.link_prefix);
    let endpoint = provision_one(&links, 0)?;
    info!(%endpoint, "Virtual GPS port created, Ctrl-C to stop");

    let mut registry = EndpointRegistry::new();
    registry.register(endpoint);

    tokio::select! {
        _ = signals.recv() => {}
        _ = simulate(&registry, args.phase_secs) => {}
    }

    registry.teardown();
    logging::shutdown();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_report_driving_then_standing_still() {
        assert_eq!(
            Phase::Driving.sentence(),
            b"$GNVTG,,T,,M,10.8,N,20.0,K,D*1D\r\n"
        );
        assert_eq!(
            Phase::Stopped.sentence(),
            b"$GNVTG,,T,,M,0.0,N,0.0,K,D*26\r\n"
        );
    }
}
