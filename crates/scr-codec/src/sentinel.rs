//! Out-of-band server messages.

/// Server control messages that are not tag-value groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// Identification accepted; racing frames follow.
    Identified,
    /// The server is shutting down the race.
    Shutdown,
    /// The server restarts the race; the client must identify again.
    Restart,
}

impl Sentinel {
    pub const fn marker(self) -> &'static str {
        match self {
            Sentinel::Identified => "***identified***",
            Sentinel::Shutdown => "***shutdown***",
            Sentinel::Restart => "***restart***",
        }
    }

    /// Find a sentinel anywhere in `text`.
    ///
    /// Shutdown is checked before restart, and both before identification.
    pub fn detect(text: &str) -> Option<Self> {
        [Sentinel::Shutdown, Sentinel::Restart, Sentinel::Identified]
            .into_iter()
            .find(|sentinel| text.contains(sentinel.marker()))
    }
}
