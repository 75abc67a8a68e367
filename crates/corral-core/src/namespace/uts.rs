//! UTS namespace isolation.
//!
//! Gives the container its own hostname.

use corral_common::error::{CorralError, Result};
use corral_common::types::ContainerId;

/// Sets the hostname inside the UTS namespace to the container id.
///
/// # Errors
///
/// Returns [`CorralError::Namespace`] if `sethostname(2)` fails.
pub fn set_hostname(id: &ContainerId) -> Result<()> {
    nix::unistd::sethostname(id.as_str()).map_err(|e| CorralError::Namespace {
        operation: "sethostname",
        source: e,
    })?;
    tracing::debug!(hostname = %id, "container hostname set");
    Ok(())
}
