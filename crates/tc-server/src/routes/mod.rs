//! Route handlers for the HTTP API.

pub mod admin;
pub mod health;
pub mod live;
pub mod play;
pub mod stream;
pub mod streaming_helpers;
pub mod transcode;
