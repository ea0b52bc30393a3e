/// Upstream inventory service client.
pub mod bgg;
/// Stored record definitions and encodings.
pub mod models;
/// Key-value and pub/sub backends the rooms live in.
pub mod room_store;
/// Backend-agnostic storage errors.
pub mod storage;
