//! Startup cleanup of links a previous run could not remove,
//! e.g. because it was killed with `SIGKILL` or the power went out.

use std::io;

use tracing::{debug, info, warn};

use crate::endpoint::LinkNamespace;

/// Remove every entry in the namespace's directory whose name belongs to the namespace.
///
/// Directories are left alone.
/// A failed removal is logged and the scan carries on.
/// Returns how many entries were removed.
pub fn reclaim_stale(links: &LinkNamespace) -> usize {
    let directory = links.directory();
    debug!(?directory, %links, "Looking for stale endpoints");

    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(?directory, ?e, "Could not scan for stale endpoints");
            return 0;
        }
    };

    let mut removed = 0;

    for entry in entries.flatten() {
        if !links.matches(&entry.file_name()) {
            continue;
        }

        let path = entry.path();

        // Symlinks are not followed here, a dangling one is still a file type we remove.
        let is_directory = match std::fs::symlink_metadata(&path) {
            Ok(metadata) => metadata.is_dir(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                warn!(?path, ?e, "Could not inspect stale entry");
                continue;
            }
        };

        if is_directory {
            warn!(?path, "Not removing directory");
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(?path, "Removed stale entry");
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(?path, ?e, "Could not remove stale entry"),
        }
    }

    removed
}
