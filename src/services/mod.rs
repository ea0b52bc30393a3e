/// Upstream collection and game imports into a room.
pub mod collection_service;
/// Room store health check.
pub mod health_service;
/// Room games, votes and event publication.
pub mod room_service;
/// Live room event feeds.
pub mod subscription_service;
