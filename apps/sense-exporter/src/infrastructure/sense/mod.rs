//! Sense Cloud Adapter
//!
//! REST authentication and device catalog over `reqwest`, realtime feed
//! over `tokio-tungstenite`.
//!
//! - `auth`: credentials to access token
//! - `client`: [`HttpSenseClient`], the production `SenseClient`
//! - `codec`: realtime frame decoding
//! - `messages`: wire types

pub mod auth;
pub mod client;
pub mod codec;
pub mod messages;

pub use auth::{SenseSession, authenticate};
pub use client::{HttpSenseClient, connect_all};
pub use codec::CodecError;
