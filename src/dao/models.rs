use serde::{Deserialize, Serialize};

use crate::codec::{self, DecodeError};

/// Board game owned by a user, as stored in a room's games hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Upstream identifier of the game.
    pub id: String,
    /// Primary display name.
    pub name: String,
    /// URL of a small cover image, empty when the upstream has none.
    #[serde(default)]
    pub thumbnail: String,
    /// Player count and playtime bounds.
    #[serde(default)]
    pub info: GameInfoEntity,
}

/// Player count and playtime bounds of a game. Unknown values stay at zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameInfoEntity {
    /// Smallest supported player count.
    pub min_players: u32,
    /// Largest supported player count.
    pub max_players: u32,
    /// Shortest playtime in minutes.
    pub min_playtime: u32,
    /// Longest playtime in minutes.
    pub max_playtime: u32,
}

/// A user's current selection for the room's voting round.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteRecordEntity {
    /// Identifiers of the games the user wants to play.
    pub votes: Vec<String>,
    /// Identifiers of the games the user refuses to play.
    pub vetoes: Vec<String>,
}

impl VoteRecordEntity {
    /// Build a record from the user's selections.
    pub fn new(votes: Vec<String>, vetoes: Vec<String>) -> Self {
        Self { votes, vetoes }
    }

    /// Serialise the record into the value stored in the votes hash.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a stored record, accepting both the JSON form and the legacy
    /// `votes;;joined::vetoes;;joined` form.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        if codec::is_structured(raw) {
            return Ok(serde_json::from_str(raw)?);
        }

        let fields = codec::split_fields(raw, "vote record", 2)?;
        Ok(Self {
            votes: codec::split_items(fields[0]),
            vetoes: codec::split_items(fields[1]),
        })
    }
}

/// Serialise a collection entry for the games hash.
pub fn encode_games(games: &[GameEntity]) -> serde_json::Result<String> {
    serde_json::to_string(games)
}

/// Parse a collection entry stored in the games hash.
pub fn decode_games(raw: &str) -> Result<Vec<GameEntity>, DecodeError> {
    Ok(serde_json::from_str(raw)?)
}
