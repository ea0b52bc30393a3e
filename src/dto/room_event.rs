use serde::{Deserialize, Serialize};

use crate::{
    codec::{self, DecodeError, RECORD_SEP},
    dao::models::{GameEntity, decode_games},
};

const TAG_ADDED_GAMES: &str = "addedGamesUpdate";
const TAG_ADDED_VOTES: &str = "addedVotesUpdate";
const TAG_RESET_VOTES: &str = "resetVotesUpdate";

/// Mutation notice fanned out on a room's topic to every live subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    /// A user's collection grew by `games`.
    #[serde(rename = "addedGamesUpdate")]
    AddedGames {
        /// User whose collection grew.
        user: String,
        /// Only the games added by this mutation.
        games: Vec<GameEntity>,
    },
    /// A user replaced their votes and vetoes.
    #[serde(rename = "addedVotesUpdate")]
    AddedVotes {
        /// User who voted.
        user: String,
        /// Game identifiers voted for.
        votes: Vec<String>,
        /// Game identifiers vetoed.
        vetoes: Vec<String>,
    },
    /// Every vote record of the room was cleared.
    #[serde(rename = "resetVotesUpdate")]
    ResetVotes,
}

impl RoomEvent {
    /// Wire tag of the event, also used as the event name by live relays.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::AddedGames { .. } => TAG_ADDED_GAMES,
            RoomEvent::AddedVotes { .. } => TAG_ADDED_VOTES,
            RoomEvent::ResetVotes => TAG_RESET_VOTES,
        }
    }

    /// User that caused the event, if any.
    pub fn user(&self) -> Option<&str> {
        match self {
            RoomEvent::AddedGames { user, .. } | RoomEvent::AddedVotes { user, .. } => {
                Some(user.as_str())
            }
            RoomEvent::ResetVotes => None,
        }
    }

    /// Serialise the event into a topic payload.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a topic payload.
    ///
    /// JSON payloads are the current format. Anything else is read with the legacy
    /// `<typeTag>::<field>...` grammar, which has a fixed field count per type.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        if codec::is_structured(raw) {
            return Ok(serde_json::from_str(raw)?);
        }

        let tag = raw.split(RECORD_SEP).next().unwrap_or_default();
        match tag {
            TAG_ADDED_GAMES => {
                let fields = codec::split_fields(raw, TAG_ADDED_GAMES, 3)?;
                Ok(RoomEvent::AddedGames {
                    user: fields[1].to_owned(),
                    games: decode_games(fields[2])?,
                })
            }
            TAG_ADDED_VOTES => {
                let fields = codec::split_fields(raw, TAG_ADDED_VOTES, 4)?;
                Ok(RoomEvent::AddedVotes {
                    user: fields[1].to_owned(),
                    votes: codec::split_items(fields[2]),
                    vetoes: codec::split_items(fields[3]),
                })
            }
            TAG_RESET_VOTES => {
                codec::split_fields(raw, TAG_RESET_VOTES, 1)?;
                Ok(RoomEvent::ResetVotes)
            }
            _ if !raw.contains(RECORD_SEP) => Err(DecodeError::MissingSeparator),
            other => Err(DecodeError::UnknownType(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::GameInfoEntity;

    fn azul() -> GameEntity {
        GameEntity {
            id: "230802".into(),
            name: "Azul".into(),
            thumbnail: String::new(),
            info: GameInfoEntity {
                min_players: 2,
                max_players: 4,
                min_playtime: 30,
                max_playtime: 45,
            },
        }
    }

    #[test]
    fn every_kind_survives_encoding() {
        let events = [
            RoomEvent::AddedGames {
                user: "alice".into(),
                games: vec![azul()],
            },
            RoomEvent::AddedVotes {
                user: "bob::smith".into(),
                votes: vec!["Azul".into(), "a;;b".into()],
                vetoes: vec![],
            },
            RoomEvent::ResetVotes,
        ];

        for event in events {
            let decoded = RoomEvent::decode(&event.encode().unwrap()).unwrap();
            assert_eq!(decoded, event);
        }
    }

    #[test]
    fn encoding_is_tagged_json() {
        let raw = RoomEvent::ResetVotes.encode().unwrap();
        assert_eq!(raw, r#"{"type":"resetVotesUpdate"}"#);

        let raw = RoomEvent::AddedVotes {
            user: "alice".into(),
            votes: vec!["230802".into()],
            vetoes: vec![],
        }
        .encode()
        .unwrap();
        assert!(raw.starts_with(r#"{"type":"addedVotesUpdate","user":"alice""#));
    }

    #[test]
    fn legacy_payloads_are_decoded() {
        let games = RoomEvent::decode(r#"addedGamesUpdate::alice::[{"id":"230802","name":"Azul"}]"#)
            .unwrap();
        assert_eq!(games.user(), Some("alice"));
        assert_eq!(games.kind(), "addedGamesUpdate");

        let votes = RoomEvent::decode("addedVotesUpdate::bob::Azul;;Catan::Risk").unwrap();
        assert_eq!(
            votes,
            RoomEvent::AddedVotes {
                user: "bob".into(),
                votes: vec!["Azul".into(), "Catan".into()],
                vetoes: vec!["Risk".into()],
            }
        );

        assert_eq!(
            RoomEvent::decode("resetVotesUpdate").unwrap(),
            RoomEvent::ResetVotes
        );
    }

    #[test]
    fn wrong_field_counts_are_rejected() {
        assert!(matches!(
            RoomEvent::decode("addedVotesUpdate::bob::Azul"),
            Err(DecodeError::FieldCount {
                expected: 4,
                actual: 3,
                ..
            })
        ));
        assert!(matches!(
            RoomEvent::decode("addedGamesUpdate::alice::[]::extra"),
            Err(DecodeError::FieldCount { actual: 4, .. })
        ));
        assert!(matches!(
            RoomEvent::decode("resetVotesUpdate::now"),
            Err(DecodeError::FieldCount { expected: 1, .. })
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            RoomEvent::decode("hello there"),
            Err(DecodeError::MissingSeparator)
        ));
        assert!(matches!(
            RoomEvent::decode("somethingElse::x"),
            Err(DecodeError::UnknownType(tag)) if tag == "somethingElse"
        ));
        assert!(matches!(
            RoomEvent::decode(r#"{"type":"addedVotesUpdate","user":"a"}"#),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            RoomEvent::decode("addedGamesUpdate::alice::not json"),
            Err(DecodeError::Json(_))
        ));
    }
}
