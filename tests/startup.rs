use std::os::unix::fs::symlink;

use color_eyre::Result;
use common::{start, FakeReceiver, Sandbox};
use gps_splitter::{
    error::Error,
    lifecycle::ShutdownReason,
    service::{self, Outcome},
};
use pretty_assertions::assert_eq;

mod common;

async fn run_to_completion(sandbox: &Sandbox) -> Result<Result<Outcome, Error>> {
    let receiver = FakeReceiver::new()?;

    Ok(service::run(sandbox.settings(receiver.path()), std::future::pending()).await)
}

#[tokio::test]
async fn false_disables() -> Result<()> {
    let sandbox = Sandbox::with_config("gps_port = false\n")?;

    let outcome = run_to_completion(&sandbox).await??;

    assert!(matches!(outcome, Outcome::Disabled));
    assert!(sandbox.published().is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_key_disables() -> Result<()> {
    let sandbox = Sandbox::with_config("[winset]\nbrightness = 80\n")?;

    let outcome = run_to_completion(&sandbox).await??;

    assert!(matches!(outcome, Outcome::Disabled));
    assert!(sandbox.published().is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_config_disables() -> Result<()> {
    let sandbox = Sandbox::new()?;

    let outcome = run_to_completion(&sandbox).await??;

    assert!(matches!(outcome, Outcome::Disabled));
    assert!(sandbox.published().is_empty());

    Ok(())
}

#[tokio::test]
async fn leftovers_are_removed_even_when_disabled() -> Result<()> {
    let sandbox = Sandbox::with_config("gps_port = false\n")?;
    symlink("/dev/pts/4242", sandbox.link(0))?;

    run_to_completion(&sandbox).await??;

    assert!(sandbox.published().is_empty());

    Ok(())
}

#[tokio::test]
async fn restart_after_unclean_exit_gives_fresh_links() -> Result<()> {
    let receiver = FakeReceiver::new()?;
    let sandbox = Sandbox::with_config("gps_port = 2\n")?;

    // What a killed run leaves behind.
    symlink("/dev/pts/4242", sandbox.link(0))?;
    symlink("/dev/pts/4243", sandbox.link(1))?;
    symlink("/dev/null", sandbox.link(7))?;
    std::fs::write(sandbox.dir().join("gpsd"), b"not ours")?;

    let running = start(sandbox.settings(receiver.path()));
    sandbox.wait_for_published(2).await?;

    assert_eq!(sandbox.published(), vec![sandbox.link(0), sandbox.link(1)]);

    for index in 0..2 {
        let device = std::fs::read_link(sandbox.link(index))?;
        assert!(device.starts_with("/dev/pts"), "{device:?}");
        assert!(device.exists(), "{device:?}");
        assert_ne!(device, std::path::Path::new("/dev/pts/4242"));
    }

    assert!(sandbox.dir().join("gpsd").exists());

    running.stop().await?;
    assert!(sandbox.published().is_empty());

    Ok(())
}

#[tokio::test]
async fn source_never_appearing_is_fatal() -> Result<()> {
    let sandbox = Sandbox::with_config("gps_port = 2\n")?;
    let missing = sandbox.dir().join("ttyACM0");

    let result = service::run(sandbox.settings(&missing), std::future::pending()).await;

    assert!(
        matches!(result, Err(Error::SourceTimeout { attempts: 5, .. })),
        "{result:?}"
    );
    assert!(sandbox.published().is_empty());

    Ok(())
}

#[tokio::test]
async fn source_which_cannot_be_opened_is_fatal() -> Result<()> {
    let sandbox = Sandbox::with_config("gps_port = 1\n")?;

    // Exists, but a directory can't be polled like a device.
    let result = service::run(sandbox.settings(sandbox.dir()), std::future::pending()).await;

    assert!(matches!(result, Err(Error::SourceOpen { .. })), "{result:?}");
    assert!(sandbox.published().is_empty());

    Ok(())
}

#[tokio::test]
async fn shutdown_while_waiting_for_the_source() -> Result<()> {
    let sandbox = Sandbox::with_config("gps_port = 2\n")?;
    let mut settings = sandbox.settings(&sandbox.dir().join("ttyACM0"));
    settings.wait.attempts = 1000;

    let outcome = service::run(settings, async { ShutdownReason::Interrupt }).await?;

    assert!(matches!(
        outcome,
        Outcome::Stopped(ShutdownReason::Interrupt)
    ));
    assert!(sandbox.published().is_empty());

    Ok(())
}
