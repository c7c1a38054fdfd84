//! Reference tracking for shared and cyclic graphs.

use crate::describe::Identity;
use std::collections::HashMap;

/// Outcome of [`ReferenceTracker::track`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tracked {
    /// First sighting; the container opens with this id.
    New(u64),
    /// Already written; emit a back-reference to this id.
    Seen(u64),
}

/// Assigns stable ids to containers by identity, scoped to one session.
#[derive(Debug, Default)]
pub(crate) struct ReferenceTracker {
    ids: HashMap<Identity, u64>,
    next_id: u64,
}

impl ReferenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn track(&mut self, identity: Identity) -> Tracked {
        if let Some(&id) = self.ids.get(&identity) {
            return Tracked::Seen(id);
        }
        self.next_id += 1;
        self.ids.insert(identity, self.next_id);
        Tracked::New(self.next_id)
    }

    /// Forgets every id. Called when the session completes or aborts.
    pub(crate) fn release(&mut self) {
        self.ids.clear();
        self.next_id = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}
