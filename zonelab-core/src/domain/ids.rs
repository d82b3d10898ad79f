use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a watched level inside a monitor's arena.
///
/// Handles are issued sequentially and never reused, so a released handle
/// can't alias a newer watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelHandle(pub(crate) usize);

impl LevelHandle {
    /// Arena slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for LevelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level-{}", self.0)
    }
}
