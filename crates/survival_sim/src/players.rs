//! Player → avatar directory.
//!
//! Network tasks register and remove players as they join and leave; the
//! simulation only reads it while applying input.

use std::sync::Arc;

use dashmap::DashMap;
use survival_ecs::Entity;
use survival_net::{PlayerId, WorldType};

/// Resolves players to the entity they control.
pub trait PlayerDirectory: Send + Sync {
    /// The avatar controlled by `player`, if any.
    fn player_entity(&self, player: PlayerId) -> Option<Entity>;

    /// The world `player` is in. Callers treat `None` as the overworld.
    fn world_type(&self, player: PlayerId) -> Option<WorldType>;
}

/// One connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerEntry {
    pub entity: Entity,
    pub world_type: WorldType,
}

/// Concurrent [`PlayerDirectory`] shared between network tasks and the
/// simulation. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct Players {
    entries: Arc<DashMap<PlayerId, PlayerEntry>>,
}

impl Players {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `player` to `entity`, replacing any previous binding.
    pub fn insert(&self, player: PlayerId, entity: Entity, world_type: WorldType) {
        self.entries.insert(player, PlayerEntry { entity, world_type });
    }

    /// Forget `player`, returning its last binding.
    pub fn remove(&self, player: PlayerId) -> Option<PlayerEntry> {
        self.entries.remove(&player).map(|(_, entry)| entry)
    }

    /// Move `player` to another world. Returns `false` if the player is unknown.
    pub fn set_world_type(&self, player: PlayerId, world_type: WorldType) -> bool {
        match self.entries.get_mut(&player) {
            Some(mut entry) => {
                entry.world_type = world_type;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> Option<PlayerEntry> {
        self.entries.get(&player).map(|entry| *entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PlayerDirectory for Players {
    fn player_entity(&self, player: PlayerId) -> Option<Entity> {
        self.get(player).map(|entry| entry.entity)
    }

    fn world_type(&self, player: PlayerId) -> Option<WorldType> {
        self.get(player).map(|entry| entry.world_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let players = Players::new();
        let view = players.clone();
        let p = PlayerId::from_u128(7);

        players.insert(p, Entity::from_raw(3), WorldType::Overworld);
        assert_eq!(view.player_entity(p), Some(Entity::from_raw(3)));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_remove_and_world_change() {
        let players = Players::new();
        let p = PlayerId::from_u128(1);
        assert!(!players.set_world_type(p, WorldType::Underground));

        players.insert(p, Entity::from_raw(1), WorldType::Overworld);
        assert!(players.set_world_type(p, WorldType::Underground));
        assert_eq!(players.world_type(p), Some(WorldType::Underground));

        let removed = players.remove(p).unwrap();
        assert_eq!(removed.entity, Entity::from_raw(1));
        assert!(players.is_empty());
        assert_eq!(players.player_entity(p), None);
    }
}
