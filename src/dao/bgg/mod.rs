//! Client for the upstream board game inventory service (BoardGameGeek XML API 2).

mod client;
mod config;
mod error;
mod models;
mod transport;

pub use client::{BggClient, RetryPolicy};
pub use config::BggConfig;
pub use error::{BggError, BggResult};
pub use transport::{BggTransport, ClientIdentity, HttpTransport, UpstreamRequest, UpstreamResponse};
