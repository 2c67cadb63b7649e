//! Root privilege check performed before any side effect.

use nix::unistd::geteuid;
use tracing::debug;

use super::PROCESS_TARGET;
use super::errors::LaunchError;

/// Reports the effective user id of the current process.
pub trait PrivilegeSource: Send + Sync {
    /// Effective uid.
    fn effective_uid(&self) -> u32;
}

/// Reads the effective uid with `geteuid(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPrivilege;

impl PrivilegeSource for SystemPrivilege {
    fn effective_uid(&self) -> u32 {
        geteuid().as_raw()
    }
}

/// Fails unless the effective uid is 0.
pub(crate) fn ensure_privileged(source: &dyn PrivilegeSource) -> Result<(), LaunchError> {
    let euid = source.effective_uid();
    debug!(target: PROCESS_TARGET, euid, "checked effective uid");
    if euid == 0 {
        Ok(())
    } else {
        Err(LaunchError::InsufficientPrivilege { euid })
    }
}
