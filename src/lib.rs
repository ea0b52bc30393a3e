//! Room synchronization core for pooling board-game collections: room storage with an
//! inactivity window, live room event feeds, and the upstream inventory client.

mod codec;
pub mod config;
/// Storage backends, stored records and the upstream client.
pub mod dao;
/// Identifiers, events and read models handed to callers.
pub mod dto;
/// Errors surfaced by room operations.
pub mod error;
/// Room operations, subscriptions and imports.
pub mod services;
pub mod state;
#[cfg(test)]
mod test_support;

pub use codec::DecodeError;
pub use config::AppConfig;
pub use dto::{
    room::{RoomId, RoomSnapshot, VoteResults},
    room_event::RoomEvent,
};
pub use error::ServiceError;
pub use services::subscription_service::RoomSubscription;
pub use state::{AppState, SharedState};
