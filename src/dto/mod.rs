/// Store health payload.
pub mod health;
/// Room identifiers and read models.
pub mod room;
/// Events fanned out on a room's topic.
pub mod room_event;
