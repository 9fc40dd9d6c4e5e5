use clap::Parser;
use color_eyre::Result;
use gps_splitter::{cli, lifecycle::ShutdownSignals, logging, service};
use tracing::{debug, error};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let mut cli = cli::Cli::parse();

    if let Some(command) = cli.command.take() {
        cli::handle_command(command);

        return Ok(());
    }

    logging::init(
        cli.log_level,
        cli.log_dir.clone().map(|dir| (cli.log_level, dir)),
    );

    // Listen before touching anything on disk, so an early Ctrl-C still cleans up.
    let mut signals = ShutdownSignals::install()?;

    let settings = cli.settings();
    debug!(?settings, "Settings");

    let result = service::run(settings, signals.recv()).await;

    if let Err(e) = &result {
        error!(%e, "GPS splitter failed");
    }

    logging::shutdown();

    result?;

    Ok(())
}
