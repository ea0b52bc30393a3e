use std::{collections::BTreeMap, fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    dao::models::{GameEntity, VoteRecordEntity},
    error::ServiceError,
};

/// Length of generated room codes.
pub const ROOM_CODE_LENGTH: usize = 5;
const ROOM_ID_MAX_LENGTH: usize = 32;
/// Uppercase alphabet without the easily confused `0`, `O`, `1` and `I`.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Opaque identifier of a room, shared between users to join it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Generate a fresh short room code such as `R7K2Q`.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..ROOM_CODE_LENGTH)
            .map(|_| {
                let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
                char::from(ROOM_CODE_ALPHABET[index])
            })
            .collect();
        Self(code)
    }

    /// Validate a caller-supplied room identifier.
    ///
    /// Identifiers become part of store keys, so whitespace and `:` are rejected.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        if raw.is_empty() {
            return Err(ServiceError::InvalidInput("room id must not be empty".into()));
        }
        if raw.len() > ROOM_ID_MAX_LENGTH {
            return Err(ServiceError::InvalidInput(format!(
                "room id must be at most {ROOM_ID_MAX_LENGTH} characters (got {})",
                raw.len()
            )));
        }
        if raw.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(ServiceError::InvalidInput(format!(
                "room id `{raw}` contains whitespace or `:`"
            )));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomId {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

/// Votes and vetoes of every user of a room, keyed by user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResults {
    /// Games each user wants to play.
    pub votes: BTreeMap<String, Vec<String>>,
    /// Games each user refuses to play.
    pub vetoes: BTreeMap<String, Vec<String>>,
}

impl From<BTreeMap<String, VoteRecordEntity>> for VoteResults {
    fn from(records: BTreeMap<String, VoteRecordEntity>) -> Self {
        let mut results = VoteResults::default();
        for (user, record) in records {
            results.votes.insert(user.clone(), record.votes);
            results.vetoes.insert(user, record.vetoes);
        }
        results
    }
}

/// Everything a client needs to render a room it just joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Every game of every user, as returned by `get_games`.
    pub games: Vec<GameEntity>,
    /// Current votes and vetoes keyed by user.
    pub vote_results: VoteResults,
}
