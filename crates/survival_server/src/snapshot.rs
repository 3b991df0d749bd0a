//! World snapshots on disk.
//!
//! Snapshots are pretty-printed JSON so they can be inspected and edited by
//! hand. They are written to a temporary file first and renamed into place.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use survival_ecs::{Entity, World, WorldError};
use survival_net::{PlayerId, WorldType};
use survival_sim::{SchedulerHandle, SimContext};
use survival_sim::components::{
    Collider, Controlled, Dead, Facing, Grounded, InWorld, Position, Velocity, Vitals,
};
use tokio::sync::oneshot;
use tracing::{debug, info};

/// How long a save waits for the simulation to take the snapshot.
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Distinguishes the temp files of writes that overlap.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// One entity's persisted components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity: Entity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Velocity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<Facing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collider: Option<Collider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitals: Option<Vitals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_type: Option<WorldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerId>,
    #[serde(default)]
    pub dead: bool,
}

/// Persisted state of a whole world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub time_of_day: f32,
    pub entities: Vec<EntitySnapshot>,
}

impl WorldSnapshot {
    /// Copy the persistent components of every entity, in ascending id order.
    #[must_use]
    pub fn capture(world: &World, ctx: &SimContext, tick: u64) -> Self {
        let entities = world
            .all_entities()
            .into_iter()
            .map(|entity| EntitySnapshot {
                entity,
                position: world.get_component::<Position>(entity).copied(),
                velocity: world.get_component::<Velocity>(entity).copied(),
                facing: world.get_component::<Facing>(entity).copied(),
                collider: world.get_component::<Collider>(entity).copied(),
                vitals: world.get_component::<Vitals>(entity).copied(),
                world_type: world.get_component::<InWorld>(entity).map(|w| w.0),
                player: world.get_component::<Controlled>(entity).map(|c| c.player),
                dead: world.has_component::<Dead>(entity),
            })
            .collect();
        Self {
            tick,
            time_of_day: ctx.time_of_day,
            entities,
        }
    }

    /// Recreate the snapshot's non-player entities in `world` and restore
    /// the clock. Entities get fresh ids. Returns how many were created.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the gameplay components are not registered.
    pub fn restore(&self, world: &mut World, ctx: &mut SimContext) -> Result<usize, WorldError> {
        ctx.time_of_day = self.time_of_day.rem_euclid(1.0);
        let mut restored = 0;
        for saved in self.entities.iter().filter(|e| e.player.is_none()) {
            let entity = world.create_entity();
            if let Some(position) = saved.position {
                world.add_component(entity, position)?;
            }
            if let Some(velocity) = saved.velocity {
                world.add_component(entity, velocity)?;
            }
            if let Some(facing) = saved.facing {
                world.add_component(entity, facing)?;
            }
            if let Some(collider) = saved.collider {
                world.add_component(entity, collider)?;
                world.add_component(entity, Grounded(false))?;
            }
            if let Some(vitals) = saved.vitals {
                world.add_component(entity, vitals)?;
            }
            if let Some(world_type) = saved.world_type {
                world.add_component(entity, InWorld(world_type))?;
            }
            if saved.dead {
                world.add_component(entity, Dead)?;
            }
            restored += 1;
        }
        Ok(restored)
    }
}

/// Sibling of `path` that no other write in this process uses.
fn temp_path(path: &Path) -> PathBuf {
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(".{}-{seq}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Write `snapshot` to `path` via a sibling temp file.
///
/// # Errors
///
/// Returns an error if serialisation or any file operation fails.
pub async fn write(path: &Path, snapshot: &WorldSnapshot) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(snapshot).context("serialising snapshot")?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &bytes)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    debug!(path = %path.display(), tick = snapshot.tick, bytes = bytes.len(), "snapshot written");
    Ok(())
}

/// Read a snapshot. Returns `None` if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a snapshot.
pub async fn load(path: &Path) -> Result<Option<WorldSnapshot>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };
    let snapshot = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    Ok(Some(snapshot))
}

/// Save hook: captures the running world and writes it to disk.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
    handle: SchedulerHandle,
}

impl SnapshotWriter {
    #[must_use]
    pub fn new(path: PathBuf, handle: SchedulerHandle) -> Self {
        Self { path, handle }
    }

    /// Capture the world between two ticks and write it out.
    ///
    /// # Errors
    ///
    /// Returns an error if the simulation does not answer in time or the
    /// write fails.
    pub async fn save(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let dispatched = self.handle.dispatch(move |tick_loop| {
            let snapshot =
                WorldSnapshot::capture(tick_loop.world(), tick_loop.context(), tick_loop.tick_id());
            let _ = tx.send(snapshot);
        });
        if !dispatched {
            bail!("simulation is gone");
        }
        let snapshot = tokio::time::timeout(CAPTURE_TIMEOUT, rx)
            .await
            .context("timed out waiting for the simulation to capture a snapshot")?
            .context("simulation dropped the snapshot request")?;
        write(&self.path, &snapshot).await?;
        info!(
            path = %self.path.display(),
            tick = snapshot.tick,
            entities = snapshot.entities.len(),
            "world saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;
    use survival_sim::components::register_components;
    use survival_sim::{FlatTerrain, Players, Scheduler, TickConfig, TickLoop, spawn_player};

    use super::*;

    fn world_and_ctx() -> (World, SimContext) {
        let mut world = World::new();
        register_components(&mut world).unwrap();
        let ctx = SimContext::new(Arc::new(FlatTerrain::new(0)), WorldType::Overworld);
        (world, ctx)
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("survival-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn test_capture_and_restore_skip_players() {
        let (mut world, mut ctx) = world_and_ctx();
        ctx.time_of_day = 0.4;
        spawn_player(&mut world, PlayerId::from_u128(1), WorldType::Overworld, Vec3::ONE).unwrap();
        let crate_entity = world.create_entity();
        world
            .add_component(crate_entity, Position(Vec3::new(3.0, 1.0, 3.0)))
            .unwrap();
        world.add_component(crate_entity, Dead).unwrap();

        let snapshot = WorldSnapshot::capture(&world, &ctx, 42);
        assert_eq!(snapshot.entities.len(), 2);
        assert_eq!(snapshot.entities[0].player, Some(PlayerId::from_u128(1)));

        let (mut fresh, mut fresh_ctx) = world_and_ctx();
        assert_eq!(snapshot.restore(&mut fresh, &mut fresh_ctx).unwrap(), 1);
        assert_eq!(fresh.entity_count(), 1);
        assert!((fresh_ctx.time_of_day - 0.4).abs() < f32::EPSILON);
        let restored = fresh.all_entities()[0];
        assert!(fresh.has_component::<Dead>(restored));
        assert_eq!(
            fresh.get_component::<Position>(restored),
            Some(&Position(Vec3::new(3.0, 1.0, 3.0)))
        );
    }

    #[tokio::test]
    async fn test_write_then_load() {
        let (mut world, ctx) = world_and_ctx();
        let position = Vec3::new(0.5, 1.0, 0.5);
        spawn_player(&mut world, PlayerId::from_u128(2), WorldType::Underground, position).unwrap();
        let snapshot = WorldSnapshot::capture(&world, &ctx, 7);
        let path = scratch_path("roundtrip");

        write(&path, &snapshot).await.unwrap();
        let loaded = load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_overlapping_writes_both_land() {
        let (world, ctx) = world_and_ctx();
        let path = scratch_path("overlap");
        let early = WorldSnapshot::capture(&world, &ctx, 1);
        let late = WorldSnapshot::capture(&world, &ctx, 2);

        let (a, b) = tokio::join!(write(&path, &early), write(&path, &late));
        a.unwrap();
        b.unwrap();
        let loaded = load(&path).await.unwrap().unwrap();
        assert!(loaded.tick == 1 || loaded.tick == 2);
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[test]
    fn test_temp_names_are_unique_siblings() {
        let path = PathBuf::from("/tmp/saves/world.json");
        let first = temp_path(&path);
        let second = temp_path(&path);
        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let path = scratch_path("missing");
        assert!(load(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_writer_captures_running_world() {
        let players = Players::new();
        let tick_loop = TickLoop::new(
            TickConfig::default(),
            Arc::new(FlatTerrain::new(0)),
            Arc::new(players),
        )
        .unwrap()
        .with_default_systems();
        let mut scheduler = Scheduler::new(tick_loop);
        let path = scratch_path("writer");
        let writer = SnapshotWriter::new(path.clone(), scheduler.handle());

        scheduler.start();
        writer.save().await.unwrap();
        scheduler.stop().await.unwrap();

        let loaded = load(&path).await.unwrap().unwrap();
        assert!(loaded.entities.is_empty());
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
