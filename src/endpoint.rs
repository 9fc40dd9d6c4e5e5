use std::{
    ffi::OsStr,
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

use nix::errno::Errno;

use self::pty::PtyPair;

pub mod pty;

/// The prefix published endpoints get by default.
pub const DEFAULT_LINK_PREFIX: &str = "/dev/gps";

/// The family of public paths endpoints are published under.
///
/// A prefix such as `/dev/gps` gives `/dev/gps0`, `/dev/gps1` and so on.
/// Only the prefix followed by one or more ASCII digits belongs to the namespace,
/// so `/dev/gps`, `/dev/gps0a` or `/dev/gpsd` are never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkNamespace {
    prefix: PathBuf,
}

impl LinkNamespace {
    /// A namespace from a prefix.
    /// The prefix's last component is the stem indices are appended to.
    pub fn new<P: AsRef<Path>>(prefix: P) -> Self {
        Self {
            prefix: prefix.as_ref().into(),
        }
    }

    /// The public path of the endpoint with the given index.
    pub fn link(&self, index: usize) -> PathBuf {
        let mut link = self.prefix.clone().into_os_string();
        link.push(index.to_string());
        link.into()
    }

    /// The directory the links live in.
    pub fn directory(&self) -> &Path {
        match self.prefix.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Whether a file name (within [`LinkNamespace::directory`]) belongs to this namespace.
    pub fn matches(&self, file_name: &OsStr) -> bool {
        let Some(stem) = self.prefix.file_name().and_then(OsStr::to_str) else {
            return false;
        };

        file_name
            .to_str()
            .and_then(|name| name.strip_prefix(stem))
            .map_or(false, |digits| {
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            })
    }
}

impl Default for LinkNamespace {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_PREFIX)
    }
}

impl Display for LinkNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}N", self.prefix.display())
    }
}

/// What happened when a chunk was offered to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// This many bytes were accepted.
    Written(usize),

    /// The endpoint's buffer was full, the chunk was dropped for this endpoint.
    Dropped,

    /// The write failed for another reason.
    /// The endpoint stays registered and gets the next chunk as usual.
    Failed(Errno),
}

/// One published endpoint.
///
/// Owns the service-facing side of a pseudo-terminal pair, plus the public
/// path which points at its consumer-facing device.
#[derive(Debug)]
pub struct VirtualEndpoint {
    index: usize,
    link: PathBuf,
    pty: PtyPair,
}

impl VirtualEndpoint {
    pub(crate) fn new(index: usize, link: PathBuf, pty: PtyPair) -> Self {
        Self { index, link, pty }
    }

    /// The index, which is also the suffix of the public path.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The public path consumers open.
    pub fn link(&self) -> &Path {
        &self.link
    }

    /// The consumer-facing device the public path points at.
    pub fn device(&self) -> &Path {
        self.pty.device()
    }

    /// Make exactly one attempt at writing the chunk.
    /// Never waits.
    pub fn offer(&self, chunk: &[u8]) -> Delivery {
        match self.pty.write(chunk) {
            Ok(written) => Delivery::Written(written),
            Err(Errno::EAGAIN) => Delivery::Dropped,
            Err(e) => Delivery::Failed(e),
        }
    }

    /// Remove the public path.
    ///
    /// Returns `false` if it was already gone, which is not an error.
    pub(crate) fn unpublish(&self) -> io::Result<bool> {
        match std::fs::remove_file(&self.link) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Display for VirtualEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.link.display(), self.device().display())
    }
}
