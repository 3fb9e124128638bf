//! In-memory friendship graph.

use std::collections::HashMap;

use parking_lot::RwLock;
use shared_types::entities::UserId;

use crate::ports::outbound::{FriendshipProvider, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

/// Friend requests keyed by (requester, addressee).
#[derive(Debug, Default)]
pub struct InMemoryFriendships {
    edges: RwLock<HashMap<(UserId, UserId), FriendshipStatus>>,
}

impl InMemoryFriendships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending request from `from` to `to`. Existing edges are kept.
    pub fn request(&self, from: UserId, to: UserId) {
        self.edges
            .write()
            .entry((from, to))
            .or_insert(FriendshipStatus::Pending);
    }

    /// Accept the pending request `from` sent to `to`.
    ///
    /// Returns false if no such request exists.
    pub fn accept(&self, from: UserId, to: UserId) -> bool {
        match self.edges.write().get_mut(&(from, to)) {
            Some(status) => {
                *status = FriendshipStatus::Accepted;
                true
            }
            None => false,
        }
    }

    /// Insert an accepted friendship directly.
    pub fn befriend(&self, a: UserId, b: UserId) {
        self.edges.write().insert((a, b), FriendshipStatus::Accepted);
    }
}

impl FriendshipProvider for InMemoryFriendships {
    fn are_friends(&self, user_a: UserId, user_b: UserId) -> StoreResult<bool> {
        let edges = self.edges.read();
        let accepted = |key| edges.get(&key) == Some(&FriendshipStatus::Accepted);
        Ok(accepted((user_a, user_b)) || accepted((user_b, user_a)))
    }
}
