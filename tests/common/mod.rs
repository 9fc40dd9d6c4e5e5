#![allow(dead_code)]

use std::{
    fs::{File, OpenOptions},
    io::Read,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::{eyre::eyre, Result};
use gps_splitter::{
    config::{Settings, CHUNK_SIZE},
    endpoint::{pty::PtyPair, LinkNamespace},
    error::Error,
    lifecycle::ShutdownReason,
    service::{self, Outcome},
    source::WaitPolicy,
};
use nix::fcntl::OFlag;
use tempfile::TempDir;
use tokio::{io::unix::AsyncFd, sync::oneshot, task::JoinHandle, time::timeout};

pub const PATIENCE: Duration = Duration::from_secs(5);

/// Stands in for the physical receiver.
/// The service reads its consumer-facing device, the test writes to it.
pub struct FakeReceiver {
    pty: PtyPair,
}

impl FakeReceiver {
    pub fn new() -> Result<Self> {
        let pty = PtyPair::allocate()?;
        pty.make_raw()?;

        Ok(Self { pty })
    }

    /// What to hand the service as its source device.
    pub fn path(&self) -> &Path {
        self.pty.device()
    }

    pub fn emit(&self, bytes: &[u8]) -> Result<()> {
        self.pty.write_all(bytes)?;

        Ok(())
    }
}

/// A scratch directory holding a config file and the published links.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn with_config(contents: &str) -> Result<Self> {
        let sandbox = Self::new()?;
        std::fs::write(sandbox.config_path(), contents)?;

        Ok(sandbox)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.ini")
    }

    pub fn links(&self) -> LinkNamespace {
        LinkNamespace::new(self.dir.path().join("gps"))
    }

    pub fn link(&self, index: usize) -> PathBuf {
        self.links().link(index)
    }

    /// Everything currently in the link namespace, sorted.
    pub fn published(&self) -> Vec<PathBuf> {
        let links = self.links();

        let mut published = std::fs::read_dir(self.dir.path())
            .expect("Sandbox directory should be readable")
            .flatten()
            .filter(|entry| links.matches(&entry.file_name()))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();
        published.sort();

        published
    }

    pub fn settings(&self, source: &Path) -> Settings {
        Settings {
            config_path: self.config_path(),
            source_path: source.into(),
            links: self.links(),
            wait: WaitPolicy {
                interval: Duration::from_millis(10),
                attempts: 5,
            },
            chunk_size: CHUNK_SIZE,
        }
    }

    pub async fn wait_for_published(&self, count: usize) -> Result<()> {
        timeout(PATIENCE, async {
            while self.published().len() != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .map_err(|_| eyre!("Expected {count} published link(s), have {:?}", self.published()))
    }
}

/// A service run in the background, stopped on request.
pub struct Running {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<Outcome, Error>>,
}

pub fn start(settings: Settings) -> Running {
    let (shutdown, requested) = oneshot::channel();

    let handle = tokio::spawn(service::run(settings, async move {
        let _ = requested.await;
        ShutdownReason::Requested
    }));

    Running { shutdown, handle }
}

impl Running {
    /// Ask the service to stop and wait for it.
    pub async fn stop(self) -> Result<Outcome> {
        let _ = self.shutdown.send(());

        Ok(timeout(PATIENCE, self.handle).await???)
    }

    /// Wait for the service to stop by itself.
    pub async fn finish(self) -> Result<std::result::Result<Outcome, Error>> {
        let Running { shutdown, handle } = self;

        let result = timeout(PATIENCE, handle).await??;
        drop(shutdown);

        Ok(result)
    }
}

/// A reader on a published endpoint.
pub struct Consumer {
    inner: AsyncFd<File>,
}

impl Consumer {
    pub fn open(link: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags((OFlag::O_NOCTTY | OFlag::O_NONBLOCK).bits())
            .open(link)?;

        Ok(Self {
            inner: AsyncFd::new(file)?,
        })
    }

    /// Read until exactly `n` bytes have arrived.
    pub async fn read_exactly(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut received = Vec::with_capacity(n);
        let mut buf = [0; 4096];

        timeout(PATIENCE, async {
            while received.len() < n {
                let want = (n - received.len()).min(buf.len());
                let mut guard = self.inner.readable().await?;

                match guard.try_io(|inner| inner.get_ref().read(&mut buf[..want])) {
                    Ok(Ok(0)) => return Err(eyre!("Endpoint closed")),
                    Ok(Ok(read)) => received.extend_from_slice(&buf[..read]),
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_would_block) => continue,
                }
            }

            Ok::<_, color_eyre::Report>(())
        })
        .await??;

        Ok(received)
    }
}
