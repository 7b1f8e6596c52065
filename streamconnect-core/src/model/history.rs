use crate::model::room::RoomToken;
use crate::utils::unix_millis;
use serde::{Deserialize, Serialize};

/// One visited meeting, as kept in the on-disk history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRecord {
    pub room: String,
    /// Unix time in milliseconds.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
}

impl MeetingRecord {
    pub fn now(room: &RoomToken, host_name: Option<String>) -> Self {
        Self {
            room: room.to_string(),
            timestamp: unix_millis(),
            host_name,
        }
    }
}
