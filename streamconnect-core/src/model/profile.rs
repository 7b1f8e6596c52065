use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

/// Persisted user profile. The id keys the stored record and is never
/// used on the wire; every call signs with a freshly generated peer id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: PeerId::generate().to_string(),
            avatar: avatar_url(&name),
            name,
        }
    }
}

/// Deterministic placeholder avatar for a display name.
pub fn avatar_url(seed: &str) -> String {
    let sanitized: String = seed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={sanitized}")
}
