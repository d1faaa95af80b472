//! Block context passed explicitly into every state transition.
//!
//! The provider core never reads a wall clock: all time comes from the block
//! being executed, which is monotonically non-decreasing between blocks and
//! fixed within a block. Passing the context by value keeps every transition
//! deterministic and replayable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Block time as nanoseconds since the Unix epoch.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct BlockTime(u64);

impl BlockTime {
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    /// This time advanced by `duration`, saturating at the maximum timestamp.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(nanos))
    }
}

impl fmt::Debug for BlockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockTime({}ns)", self.0)
    }
}

/// Execution context of the block currently being processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockContext {
    /// Height of the block.
    pub height: u64,
    /// Time of the block.
    pub time: BlockTime,
}

impl BlockContext {
    pub fn new(height: u64, time: BlockTime) -> Self {
        Self { height, time }
    }
}
