use tracing::info;

use crate::{
    dao::{bgg::ClientIdentity, models::GameEntity},
    dto::room::RoomId,
    error::ServiceError,
    services::room_service,
    state::SharedState,
};

/// Import `username`'s owned games from the inventory service into `user`'s entry of `room`.
///
/// `identity` is forwarded upstream so rate limiting applies per end user. Returns the games
/// that were added; nothing is written when the fetch fails.
pub async fn add_collection(
    state: &SharedState,
    room: &RoomId,
    user: &str,
    username: &str,
    identity: Option<ClientIdentity>,
) -> Result<Vec<GameEntity>, ServiceError> {
    room_service::ensure_user(user)?;
    if username.trim().is_empty() {
        return Err(ServiceError::InvalidInput("username must not be empty".into()));
    }

    let games = state.bgg().fetch_collection(username.trim(), identity).await?;
    info!(room = %room, user, username, count = games.len(), "importing collection");
    room_service::add_games(state, room, user, games.clone()).await?;
    Ok(games)
}

/// Look up a single game and add it to `user`'s entry of `room`.
pub async fn add_game(
    state: &SharedState,
    room: &RoomId,
    user: &str,
    game_id: &str,
) -> Result<GameEntity, ServiceError> {
    room_service::ensure_user(user)?;
    let game = lookup_game(state, game_id).await?;
    room_service::add_games(state, room, user, vec![game.clone()]).await?;
    Ok(game)
}

/// Metadata of the game with identifier `game_id`.
pub async fn lookup_game(state: &SharedState, game_id: &str) -> Result<GameEntity, ServiceError> {
    let game_id = game_id.trim();
    if game_id.is_empty() || !game_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::InvalidInput(format!(
            "game id `{game_id}` must be numeric"
        )));
    }
    Ok(state.bgg().fetch_game_info(game_id).await?)
}
