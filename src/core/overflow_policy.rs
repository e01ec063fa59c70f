//! Overflow policies for the batch buffer
//!
//! Reaching `max_buffer_size` always triggers a flush. The policy decides
//! what happens when producers keep appending faster than the publisher
//! drains.

use std::fmt;

/// Policy applied when pending events pile up past `max_buffer_size`
///
/// # Example
///
/// ```
/// use rust_log_shipper::OverflowPolicy;
///
/// // Default behavior: trigger a flush, never drop, never block
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::TriggerOnly);
///
/// // Ring-buffer behavior with a hard ceiling
/// let policy = OverflowPolicy::DropOldest { ceiling: 50_000 };
/// assert_eq!(policy.ceiling(), Some(50_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Signal the publisher and keep accepting
    ///
    /// The buffer may transiently hold more than `max_buffer_size` events
    /// between the size check and the drain.
    #[default]
    TriggerOnly,

    /// Evict the oldest pending event for every new one past `ceiling`
    DropOldest { ceiling: usize },

    /// Reject new events while `ceiling` events are pending
    DropNewest { ceiling: usize },
}

impl OverflowPolicy {
    pub fn ceiling(&self) -> Option<usize> {
        match self {
            OverflowPolicy::TriggerOnly => None,
            OverflowPolicy::DropOldest { ceiling } | OverflowPolicy::DropNewest { ceiling } => {
                Some(*ceiling)
            }
        }
    }

    /// Raise a ceiling below `max_buffer_size` up to it
    pub(crate) fn normalized(self, max_buffer_size: usize) -> Self {
        match self {
            OverflowPolicy::TriggerOnly => self,
            OverflowPolicy::DropOldest { ceiling } => OverflowPolicy::DropOldest {
                ceiling: ceiling.max(max_buffer_size),
            },
            OverflowPolicy::DropNewest { ceiling } => OverflowPolicy::DropNewest {
                ceiling: ceiling.max(max_buffer_size),
            },
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::TriggerOnly => write!(f, "TriggerOnly"),
            OverflowPolicy::DropOldest { ceiling } => write!(f, "DropOldest({})", ceiling),
            OverflowPolicy::DropNewest { ceiling } => write!(f, "DropNewest({})", ceiling),
        }
    }
}
