use std::fmt;

/// Lifecycle states the daemon moves through, in order.
///
/// `Exited` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Configuration loaded, nothing checked yet.
    Starting,
    /// Running as root.
    PrivilegeChecked,
    /// Working directory ready, PID file written, detached when requested.
    Detached,
    /// Inbound and outbound pipes exist.
    PipesReady,
    /// Relaying commands.
    Running,
    /// Shut down by an interrupt or at the end of a bounded run.
    Exited,
}

impl LifecycleState {
    /// Stable label used in structured logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::PrivilegeChecked => "privilege_checked",
            Self::Detached => "detached",
            Self::PipesReady => "pipes_ready",
            Self::Running => "running",
            Self::Exited => "exited",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
