//! Creating and publishing the virtual endpoints.

use std::{
    fs::Permissions,
    io,
    os::unix::fs::{symlink, PermissionsExt},
    path::Path,
};

use tracing::{error, info, info_span, warn};

use crate::{
    endpoint::{pty::PtyPair, LinkNamespace, VirtualEndpoint},
    error::Error,
    registry::EndpointRegistry,
};

/// Anyone on the machine may read and write an endpoint.
const ENDPOINT_MODE: u32 = 0o666;

/// Provision endpoints `0..count` into the registry.
///
/// An index which fails is logged and skipped, the others are still provisioned.
/// Returns how many endpoints were added.
pub fn provision(links: &LinkNamespace, count: usize, registry: &mut EndpointRegistry) -> usize {
    let mut added = 0;

    for index in 0..count {
        let _span = info_span!("endpoint", %index).entered();

        match provision_one(links, index) {
            Ok(endpoint) => {
                info!(%endpoint, "Created");
                registry.register(endpoint);
                added += 1;
            }
            Err(e) => {
                error!(%e, "Could not create endpoint, skipping it");
            }
        }
    }

    added
}

/// Create a single endpoint and publish it at its public path.
pub fn provision_one(links: &LinkNamespace, index: usize) -> Result<VirtualEndpoint, Error> {
    let pty = PtyPair::allocate()?;
    pty.set_non_blocking()?;
    pty.make_raw()?;

    let link = links.link(index);
    publish(&link, pty.device())?;

    Ok(VirtualEndpoint::new(index, link, pty))
}

/// Point `link` at `device` and open both up to everyone.
///
/// Whatever is at `link` already is replaced.
/// If the permissions can't be set the new link is removed again.
pub fn publish(link: &Path, device: &Path) -> Result<(), Error> {
    let publish_error = |source: io::Error| Error::Publish {
        link: link.into(),
        device: device.into(),
        source,
    };

    match std::fs::remove_file(link) {
        Ok(()) => info!(?link, "Replaced existing entry"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(publish_error(e)),
    }

    symlink(device, link).map_err(publish_error)?;

    // Setting permissions on the link follows it to the device.
    let permissions = std::fs::set_permissions(link, Permissions::from_mode(ENDPOINT_MODE))
        .and_then(|()| std::fs::set_permissions(device, Permissions::from_mode(ENDPOINT_MODE)));

    if let Err(e) = permissions {
        if let Err(remove_error) = std::fs::remove_file(link) {
            warn!(?link, ?remove_error, "Could not remove half-published link");
        }
        return Err(publish_error(e));
    }

    Ok(())
}
