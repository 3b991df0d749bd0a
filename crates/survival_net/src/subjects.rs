//! NATS subject hierarchy.
//!
//! All subjects live under a configurable prefix (default `survival`) so
//! several servers can share one NATS cluster.

use crate::error::NetError;
use crate::messages::PlayerId;

/// Default subject prefix.
pub const DEFAULT_PREFIX: &str = "survival";

/// Subject a client publishes its input on.
///
/// `{prefix}.input.<player>`
#[must_use]
pub fn input(prefix: &str, player: PlayerId) -> String {
    format!("{prefix}.input.{player}")
}

/// Wildcard subscription matching every player's input subject.
///
/// `{prefix}.input.*`
#[must_use]
pub fn input_wildcard(prefix: &str) -> String {
    format!("{prefix}.input.*")
}

/// `{prefix}.player.join`
#[must_use]
pub fn player_join(prefix: &str) -> String {
    format!("{prefix}.player.join")
}

/// `{prefix}.player.leave`
#[must_use]
pub fn player_leave(prefix: &str) -> String {
    format!("{prefix}.player.leave")
}

/// Subject the server broadcasts per-tick state on.
///
/// `{prefix}.tick.delta`
#[must_use]
pub fn tick_delta(prefix: &str) -> String {
    format!("{prefix}.tick.delta")
}

/// Extract the player id from an input subject.
///
/// # Errors
///
/// Returns [`NetError::Subject`] if the subject is not `{prefix}.input.<uuid>`.
pub fn parse_input(prefix: &str, subject: &str) -> Result<PlayerId, NetError> {
    subject
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(".input."))
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| NetError::Subject(subject.to_string()))
}
