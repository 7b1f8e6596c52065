use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Generated room codes are short enough to read out over the phone.
const ROOM_CODE_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("room token is empty after normalization")]
pub struct InvalidRoomToken;

/// Normalized room identifier. Two participants end up on the same
/// relay channel iff their tokens normalize to the same string, so all
/// construction goes through [`RoomToken::parse`].
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomToken(String);

impl RoomToken {
    /// Trims and lowercases user input. Empty results are rejected.
    pub fn parse(raw: &str) -> Result<Self, InvalidRoomToken> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(InvalidRoomToken);
        }
        Ok(Self(normalized))
    }

    /// Short random base36 code for a fresh room.
    pub fn generate() -> Self {
        const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut rng = rand::thread_rng();
        let code: String = (0..ROOM_CODE_LEN)
            .map(|_| char::from(DIGITS[rng.gen_range(0..DIGITS.len())]))
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
