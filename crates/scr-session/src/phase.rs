use std::fmt;

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Disconnected,
    Identifying,
    Racing,
    Restarting,
    Terminated,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        self == Phase::Terminated
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Disconnected => "disconnected",
            Phase::Identifying => "identifying",
            Phase::Racing => "racing",
            Phase::Restarting => "restarting",
            Phase::Terminated => "terminated",
        })
    }
}
