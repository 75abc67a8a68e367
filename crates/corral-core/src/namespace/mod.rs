//! Linux namespace management for container isolation.
//!
//! The launcher creates every namespace in a single `clone(2)` call; this
//! module decides which flags that call carries and provides the helpers
//! run on either side of it.

pub mod mount;
pub mod uts;

use nix::sched::CloneFlags;

/// Which namespaces a container gets.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceConfig {
    /// Isolate the PID namespace (the command sees itself as PID 1).
    pub pid: bool,
    /// Isolate the mount namespace.
    pub mount: bool,
    /// Isolate the UTS namespace (own hostname).
    pub uts: bool,
    /// Isolate the network namespace (empty network stack, loopback down).
    pub network: bool,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            pid: true,
            mount: true,
            uts: true,
            network: true,
        }
    }
}

impl NamespaceConfig {
    /// Converts the configuration into `clone(2)` flags.
    #[must_use]
    pub fn to_clone_flags(&self) -> CloneFlags {
        let mut flags = CloneFlags::empty();
        if self.pid {
            flags |= CloneFlags::CLONE_NEWPID;
        }
        if self.mount {
            flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.uts {
            flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.network {
            flags |= CloneFlags::CLONE_NEWNET;
        }
        flags
    }
}
