use std::{
    fmt::Display,
    io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{endpoint::LinkNamespace, source::WaitPolicy};

/// The key in the configuration file which holds the number of ports.
pub const PORT_COUNT_KEY: &str = "gps_port";

/// Where the configuration file is looked for by default.
pub const DEFAULT_CONFIG_PATH: &str = "/bin/wmt_winset/config.ini";

/// The physical GPS receiver used by default.
pub const DEFAULT_SOURCE_PATH: &str = "/dev/ttyACM0";

/// The largest chunk read from the source in one go.
pub const CHUNK_SIZE: usize = 4096;

/// How many virtual endpoints to provision, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCount {
    /// The service should not run.
    /// Covers an explicit `false`, a missing key, a missing file,
    /// and any value which is not a positive integer.
    Disabled,

    /// Provision this many endpoints, indexed from zero.
    Enabled(NonZeroUsize),
}

impl PortCount {
    /// Resolve the port count from the contents of a key-value file.
    ///
    /// Only the first line whose trimmed key is [`PORT_COUNT_KEY`] is considered.
    /// Lines without a `=` are not key-value lines and are skipped.
    /// The value ends at the next `=`, if any.
    pub fn parse(contents: &str) -> Self {
        let value = contents
            .lines()
            .filter_map(|line| {
                let mut fields = line.split('=');
                Some((fields.next()?, fields.next()?))
            })
            .find(|(key, _)| key.trim() == PORT_COUNT_KEY)
            .map(|(_, value)| value.trim());

        let Some(value) = value else {
            debug!("No `{PORT_COUNT_KEY}` setting found");
            return Self::Disabled;
        };

        if value.eq_ignore_ascii_case("false") {
            return Self::Disabled;
        }

        match value.parse::<usize>().ok().and_then(NonZeroUsize::new) {
            Some(count) => Self::Enabled(count),
            None => {
                debug!(%value, "Port count is not a positive integer");
                Self::Disabled
            }
        }
    }

    /// Resolve the port count from a configuration file.
    ///
    /// A missing or unreadable file means [`PortCount::Disabled`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "No configuration file");
                Self::Disabled
            }
            Err(e) => {
                warn!(?path, ?e, "Could not read configuration file");
                Self::Disabled
            }
        }
    }

    /// The number of endpoints, zero when disabled.
    pub fn count(&self) -> usize {
        match self {
            Self::Disabled => 0,
            Self::Enabled(count) => count.get(),
        }
    }

    /// An example configuration file's contents.
    pub fn example() -> String {
        format!(
            "\
# Number of virtual GPS ports to publish as /dev/gps0, /dev/gps1, ...
# Set to `false` to disable the splitter.
{PORT_COUNT_KEY} = 2
"
        )
    }
}

impl Display for PortCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Enabled(count) => write!(f, "{count} port(s)"),
        }
    }
}

/// Everything a run of the splitter needs to know.
/// Settled once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// The key-value file holding [`PORT_COUNT_KEY`].
    pub config_path: PathBuf,

    /// The physical device to read from.
    pub source_path: PathBuf,

    /// Where endpoints are published.
    pub links: LinkNamespace,

    /// How long to wait for the source device to appear.
    pub wait: WaitPolicy,

    /// Largest number of bytes read from the source at once.
    pub chunk_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG_PATH.into(),
            source_path: DEFAULT_SOURCE_PATH.into(),
            links: LinkNamespace::default(),
            wait: WaitPolicy::default(),
            chunk_size: CHUNK_SIZE,
        }
    }
}
