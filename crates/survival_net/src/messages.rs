//! Message types exchanged between clients and the server.
//!
//! Routing metadata (which player sent an input) travels in the NATS subject,
//! not in the payload. See [`subjects`](crate::subjects).

use serde::{Deserialize, Serialize};
use survival_component::Entity;
use uuid::Uuid;

// ── Identity ────────────────────────────────────────────────────────────────

/// A connected player's session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Generate a fresh random player id.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build a player id from a `u128`, mostly useful in tests.
    #[must_use]
    pub const fn from_u128(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Which world instance a player is in. Terrain lookups are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldType {
    /// The persistent surface world.
    #[default]
    Overworld,
    /// The cave layer below it.
    Underground,
}

// ── Client → server ─────────────────────────────────────────────────────────

/// One frame of player input.
///
/// The server does not validate the semantics of these fields; shape
/// validation happens when the payload is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPayload {
    /// Client-side sequence number.
    pub seq: u32,
    /// -1 back, 0 none, 1 forward.
    pub forward: i8,
    /// -1 left, 0 none, 1 right.
    pub right: i8,
    pub jump: bool,
    pub crouch: bool,
    pub sprint: bool,
    /// Facing yaw in radians.
    pub rotation: f32,
    pub primary_action: bool,
    pub secondary_action: bool,
    /// Selected hotbar slot.
    pub selected_slot: u8,
}

/// A player joined and should receive an avatar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerJoin {
    pub player: PlayerId,
    #[serde(default)]
    pub world_type: WorldType,
}

/// A player disconnected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLeave {
    pub player: PlayerId,
}

// ── Server → clients ────────────────────────────────────────────────────────

/// Replicated kinematic state of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity: Entity,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub yaw: f32,
}

/// State broadcast after every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickDelta {
    /// The tick that produced this state.
    pub tick: u64,
    /// Normalised time of day in `[0, 1)`.
    pub time_of_day: f32,
    pub entities: Vec<EntityState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_payload_uses_camel_case_keys() {
        let json = r#"{
            "seq": 4, "forward": 1, "right": 0, "jump": false, "crouch": true,
            "sprint": false, "rotation": 0.5, "primaryAction": true,
            "secondaryAction": false, "selectedSlot": 2
        }"#;
        let input: InputPayload = serde_json::from_str(json).unwrap();
        assert_eq!(input.seq, 4);
        assert!(input.crouch);
        assert!(input.primary_action);
        assert_eq!(input.selected_slot, 2);
    }

    #[test]
    fn test_player_id_parses_from_subject_token() {
        let id = PlayerId::new_v4();
        let parsed: PlayerId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<PlayerId>().is_err());
    }

    #[test]
    fn test_join_defaults_to_overworld() {
        let json = format!(r#"{{"player":"{}"}}"#, PlayerId::from_u128(1));
        let join: PlayerJoin = serde_json::from_str(&json).unwrap();
        assert_eq!(join.world_type, WorldType::Overworld);
    }
}
