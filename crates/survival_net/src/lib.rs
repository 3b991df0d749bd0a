//! # survival_net
//!
//! Network-facing types for the survival server.
//!
//! - [`messages`]: wire types exchanged with clients (`InputPayload`, `TickDelta`, ...).
//! - [`codec`]: MessagePack serialisation helpers.
//! - [`subjects`]: NATS subject builders and parsers.
//! - [`connection`]: NATS connection management.
//! - [`error`]: network-layer error types.

pub mod codec;
pub mod connection;
pub mod error;
pub mod messages;
pub mod subjects;

pub use codec::{decode, encode};
pub use connection::NatsConnection;
pub use error::NetError;
pub use messages::{EntityState, InputPayload, PlayerId, PlayerJoin, PlayerLeave, TickDelta, WorldType};
