//! Pseudo-terminal pairs backing the virtual endpoints.

use std::{
    fs::File,
    os::unix::io::{AsRawFd, FromRawFd},
    path::{Path, PathBuf},
};

use nix::{
    errno::Errno,
    fcntl::{self, FcntlArg, OFlag},
    pty::{self, PtyMaster},
    sys::{stat::Mode, termios},
    unistd,
};
use tracing::trace;

/// A pseudo-terminal pair.
///
/// The master is the side this process writes to.
/// The consumer-facing side is kept open for as long as the pair lives,
/// so readers coming and going never hang up the pair.
#[derive(Debug)]
pub struct PtyPair {
    master: PtyMaster,
    consumer: File,
    device: PathBuf,
}

impl PtyPair {
    /// Allocate a new pair.
    /// Both sides are in blocking mode and use the default line discipline settings.
    pub fn allocate() -> nix::Result<Self> {
        let master = pty::posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY)?;
        pty::grantpt(&master)?;
        pty::unlockpt(&master)?;

        let device = PathBuf::from(pty::ptsname_r(&master)?);

        let fd = fcntl::open(device.as_path(), OFlag::O_RDWR | OFlag::O_NOCTTY, Mode::empty())?;
        // SAFETY: `fd` was just opened and nothing else owns it.
        let consumer = unsafe { File::from_raw_fd(fd) };

        trace!(?device, "Allocated pseudo-terminal");

        Ok(Self {
            master,
            consumer,
            device,
        })
    }

    /// The consumer-facing device, e.g. `/dev/pts/3`.
    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Make writes to the master fail fast instead of waiting for room.
    pub fn set_non_blocking(&self) -> nix::Result<()> {
        let fd = self.master.as_raw_fd();
        let flags = OFlag::from_bits_truncate(fcntl::fcntl(fd, FcntlArg::F_GETFL)?);
        fcntl::fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;

        Ok(())
    }

    /// Whether writes to the master fail fast.
    #[cfg(test)]
    pub(crate) fn is_non_blocking(&self) -> nix::Result<bool> {
        let flags = fcntl::fcntl(self.master.as_raw_fd(), FcntlArg::F_GETFL)?;

        Ok(OFlag::from_bits_truncate(flags).contains(OFlag::O_NONBLOCK))
    }

    /// Pass bytes through untouched: no echo, no line editing, no CR/LF translation.
    pub fn make_raw(&self) -> nix::Result<()> {
        let fd = self.consumer.as_raw_fd();
        let mut attributes = termios::tcgetattr(fd)?;
        termios::cfmakeraw(&mut attributes);
        termios::tcsetattr(fd, termios::SetArg::TCSANOW, &attributes)
    }

    /// A single write to the master.
    /// Whether this can wait depends on [`PtyPair::set_non_blocking`].
    pub fn write(&self, bytes: &[u8]) -> nix::Result<usize> {
        unistd::write(self.master.as_raw_fd(), bytes)
    }

    /// Write everything, retrying on interruption and partial writes.
    /// Only sensible while the master is blocking.
    pub fn write_all(&self, mut bytes: &[u8]) -> nix::Result<()> {
        while !bytes.is_empty() {
            match self.write(bytes) {
                Ok(written) => bytes = &bytes[written..],
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}
