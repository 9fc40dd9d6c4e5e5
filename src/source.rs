//! The physical device everything is read from.

use std::{
    fs::{File, OpenOptions},
    io::{self, Read},
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
    time::Duration,
};

use nix::fcntl::OFlag;
use tokio::io::unix::AsyncFd;
use tracing::{info, warn};

use crate::error::Error;

/// How to wait for the source device to show up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Time between checks.
    pub interval: Duration,

    /// How many times to wait before giving up.
    pub attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            attempts: 30,
        }
    }
}

/// Wait until `path` exists.
///
/// The path is checked right away, then again after each wait.
pub async fn wait_for_device(path: &Path, policy: WaitPolicy) -> Result<(), Error> {
    if path.exists() {
        return Ok(());
    }

    for attempt in 1..=policy.attempts {
        info!(?path, %attempt, "Waiting for source device");
        tokio::time::sleep(policy.interval).await;

        if path.exists() {
            return Ok(());
        }
    }

    warn!(?path, "Source device did not appear");

    Err(Error::SourceTimeout {
        path: path.into(),
        attempts: policy.attempts,
    })
}

/// The read-only handle to the source device.
///
/// Never shared, never written to.
#[derive(Debug)]
pub struct SourceReader {
    path: PathBuf,
    inner: AsyncFd<File>,
}

impl SourceReader {
    /// Open the device read-only, without making it our controlling terminal.
    ///
    /// The device has to be pollable (a tty, an ACM device, a pseudo-terminal).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let open_error = |source: io::Error| Error::SourceOpen {
            path: path.into(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .custom_flags((OFlag::O_NOCTTY | OFlag::O_NONBLOCK).bits())
            .open(path)
            .map_err(open_error)?;

        let inner = AsyncFd::new(file).map_err(open_error)?;

        info!(?path, "Opened source");

        Ok(Self {
            path: path.into(),
            inner,
        })
    }

    /// [`wait_for_device`], then [`SourceReader::open`].
    pub async fn open_when_present<P: AsRef<Path>>(
        path: P,
        policy: WaitPolicy,
    ) -> Result<Self, Error> {
        wait_for_device(path.as_ref(), policy).await?;
        Self::open(path)
    }

    /// The device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next chunk and read it into `buf`.
    ///
    /// `Ok(0)` means the source reached end-of-stream.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.inner.readable().await?;

            match guard.try_io(|inner| inner.get_ref().read(buf)) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }
}
