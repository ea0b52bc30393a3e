use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::{GameEntity, VoteRecordEntity, decode_games, encode_games},
        room_store::{games_key, room_topic, votes_key},
    },
    dto::{
        room::{RoomId, RoomSnapshot},
        room_event::RoomEvent,
    },
    error::ServiceError,
    state::SharedState,
};

/// Allocate a fresh room code.
///
/// Rooms have no explicit lifecycle: the keys appear on the first write and expire after the
/// configured inactivity window.
pub fn new_room() -> RoomId {
    let room = RoomId::generate();
    info!(room = %room, "allocated room");
    room
}

/// Append `games` to `user`'s collection entry in `room` and notify subscribers.
///
/// Entries are not deduplicated; adding the same game twice stores it twice. Two concurrent
/// appends for the same user race and the last write wins.
pub async fn add_games(
    state: &SharedState,
    room: &RoomId,
    user: &str,
    games: Vec<GameEntity>,
) -> Result<(), ServiceError> {
    ensure_user(user)?;
    let store = state.store();
    let key = games_key(room.as_str());

    let mut entry = match store.hash_get(&key, user).await? {
        Some(raw) => decode_games(&raw).map_err(|source| ServiceError::CorruptRecord {
            room: room.to_string(),
            user: user.to_owned(),
            kind: "games",
            source,
        })?,
        None => Vec::new(),
    };
    entry.extend(games.iter().cloned());

    let encoded = encode_games(&entry).map_err(|source| ServiceError::Encode {
        what: "games entry",
        source,
    })?;
    store.hash_set(&key, user, encoded).await?;
    refresh_ttl(state, room).await;

    debug!(room = %room, user, added = games.len(), total = entry.len(), "stored games");
    publish(
        state,
        room,
        RoomEvent::AddedGames {
            user: user.to_owned(),
            games,
        },
    )
    .await
}

/// Every game of every user of `room`. Unknown rooms are empty.
///
/// Games are grouped by user: users come in the order they first added games and each user's
/// games keep the order they were added in. Interleaved additions from different users are
/// not returned in call order, since each user's entry is stored as a single value.
pub async fn get_games(state: &SharedState, room: &RoomId) -> Result<Vec<GameEntity>, ServiceError> {
    let entries = state.store().hash_get_all(&games_key(room.as_str())).await?;

    let mut games = Vec::new();
    for (user, raw) in entries {
        let entry = decode_games(&raw).map_err(|source| ServiceError::CorruptRecord {
            room: room.to_string(),
            user,
            kind: "games",
            source,
        })?;
        games.extend(entry);
    }

    refresh_ttl(state, room).await;
    Ok(games)
}

/// Replace `user`'s votes and vetoes in `room` and notify subscribers.
pub async fn set_votes(
    state: &SharedState,
    room: &RoomId,
    user: &str,
    votes: Vec<String>,
    vetoes: Vec<String>,
) -> Result<(), ServiceError> {
    ensure_user(user)?;
    let record = VoteRecordEntity::new(votes, vetoes);
    let encoded = record.encode().map_err(|source| ServiceError::Encode {
        what: "vote record",
        source,
    })?;

    state
        .store()
        .hash_set(&votes_key(room.as_str()), user, encoded)
        .await?;
    refresh_ttl(state, room).await;

    debug!(
        room = %room,
        user,
        votes = record.votes.len(),
        vetoes = record.vetoes.len(),
        "stored vote record"
    );
    let VoteRecordEntity { votes, vetoes } = record;
    publish(
        state,
        room,
        RoomEvent::AddedVotes {
            user: user.to_owned(),
            votes,
            vetoes,
        },
    )
    .await
}

/// Vote record of every user of `room`. A single undecodable record fails the whole call.
pub async fn get_votes(
    state: &SharedState,
    room: &RoomId,
) -> Result<BTreeMap<String, VoteRecordEntity>, ServiceError> {
    let entries = state.store().hash_get_all(&votes_key(room.as_str())).await?;

    let mut records = BTreeMap::new();
    for (user, raw) in entries {
        let record = VoteRecordEntity::decode(&raw).map_err(|source| {
            ServiceError::CorruptRecord {
                room: room.to_string(),
                user: user.clone(),
                kind: "vote",
                source,
            }
        })?;
        records.insert(user, record);
    }

    refresh_ttl(state, room).await;
    Ok(records)
}

/// Drop every vote record of `room` and notify subscribers. Resetting an empty room is fine.
pub async fn reset_votes(state: &SharedState, room: &RoomId) -> Result<(), ServiceError> {
    state.store().delete(&votes_key(room.as_str())).await?;
    refresh_ttl(state, room).await;
    info!(room = %room, "votes reset");
    publish(state, room, RoomEvent::ResetVotes).await
}

/// Games and vote results of `room` in one call, as needed by a client joining it.
pub async fn room_snapshot(state: &SharedState, room: &RoomId) -> Result<RoomSnapshot, ServiceError> {
    let games = get_games(state, room).await?;
    let votes = get_votes(state, room).await?;
    Ok(RoomSnapshot {
        games,
        vote_results: votes.into(),
    })
}

/// Re-arm the inactivity window of every key of `room`.
///
/// Best effort: the data operation already succeeded, so a failure is logged and swallowed.
async fn refresh_ttl(state: &SharedState, room: &RoomId) {
    let ttl = state.room_ttl();
    for key in [games_key(room.as_str()), votes_key(room.as_str())] {
        if let Err(err) = state.store().expire(&key, ttl).await {
            warn!(room = %room, key = %key, error = %err, "failed to refresh room ttl");
        }
    }
}

async fn publish(state: &SharedState, room: &RoomId, event: RoomEvent) -> Result<(), ServiceError> {
    let payload = event.encode().map_err(|source| ServiceError::Encode {
        what: "room event",
        source,
    })?;
    let receivers = state
        .store()
        .publish(&room_topic(room.as_str()), payload)
        .await?;
    debug!(room = %room, kind = event.kind(), receivers, "published room event");
    Ok(())
}

pub(crate) fn ensure_user(user: &str) -> Result<(), ServiceError> {
    if user.trim().is_empty() {
        return Err(ServiceError::InvalidInput("user must not be empty".into()));
    }
    Ok(())
}
