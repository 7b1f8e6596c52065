use crate::model::profile::avatar_url;
use crate::utils::{to_base36, unix_millis};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Builder;

const FALLBACK_SUFFIX_LEN: usize = 11;

/// Opaque identifier a session signs its signal traffic with. Unique
/// per participant, never interpreted beyond equality and ordering.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PeerId(pub String);

impl PeerId {
    /// Fresh collision-resistant id: a v4 UUID when the platform CSPRNG
    /// answers, otherwise a base36 timestamp with a random suffix.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        match getrandom::getrandom(&mut bytes) {
            Ok(()) => Self(Builder::from_random_bytes(bytes).into_uuid().to_string()),
            Err(_) => Self(Self::fallback()),
        }
    }

    fn fallback() -> String {
        const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        static CALLS: AtomicU64 = AtomicU64::new(0);
        let millis = unix_millis();
        // two fallback ids in the same millisecond must not collide
        let salt = CALLS.fetch_add(1, Ordering::Relaxed);
        let mut rng = SmallRng::seed_from_u64(millis ^ (salt << 48));
        let suffix: String = (0..FALLBACK_SUFFIX_LEN)
            .map(|_| char::from(DIGITS[rng.gen_range(0..DIGITS.len())]))
            .collect();
        format!("{}{}", to_base36(millis as u128), suffix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity stamped onto every outgoing signal message.
#[derive(Debug, Clone)]
pub struct LocalIdentity {
    pub peer_id: PeerId,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl LocalIdentity {
    pub fn new(display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            peer_id: PeerId::generate(),
            avatar: Some(avatar_url(&display_name)),
            display_name,
        }
    }

    /// Takes the display info from a saved profile. The peer id is
    /// generated fresh per call; two sessions sharing an id would each
    /// filter the other's traffic as their own echo.
    pub fn from_profile(profile: &crate::model::UserProfile) -> Self {
        Self {
            peer_id: PeerId::generate(),
            display_name: profile.name.clone(),
            avatar: Some(profile.avatar.clone()),
        }
    }
}
