//! Wire format of the recommendation service.

use serde::{Deserialize, Serialize};
use shared_bus::ProgressionEvent;
use shared_types::entities::{QuestId, UserId};

/// One user and every quest they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuestIds {
    pub user_id: UserId,
    pub quest_ids: Vec<QuestId>,
}

/// Body of `POST /users/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddUsersRequest {
    pub users: Vec<UserQuestIds>,
}

impl AddUsersRequest {
    pub fn single(user_id: UserId, quest_ids: Vec<QuestId>) -> Self {
        Self {
            users: vec![UserQuestIds { user_id, quest_ids }],
        }
    }

    /// Build the request for a purchase event. Other events map to `None`.
    pub fn from_event(event: &ProgressionEvent) -> Option<Self> {
        match event {
            ProgressionEvent::QuestPurchased {
                user_id,
                owned_quest_ids,
                ..
            } => Some(Self::single(*user_id, owned_quest_ids.clone())),
            _ => None,
        }
    }
}
