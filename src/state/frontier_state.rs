/// Frontier state definitions
///
/// A URL moves through these states exactly once per crawl cycle.
use std::fmt;

/// Where a URL stands relative to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontierState {
    /// URL is waiting in the queue
    Queued,

    /// URL was pulled from the queue and a cycle is processing it
    InFlight,

    /// URL was processed (or skipped but recorded) and will never be queued again
    Known,

    /// URL was removed from the queue without being recorded
    Rejected,
}

impl FrontierState {
    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// The only legal paths are `Queued -> InFlight -> {Known, Rejected}`.
    pub fn can_transition_to(&self, next: FrontierState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::InFlight)
                | (Self::InFlight, Self::Known)
                | (Self::InFlight, Self::Rejected)
        )
    }
}

impl fmt::Display for FrontierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::InFlight => "in-flight",
            Self::Known => "known",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}
