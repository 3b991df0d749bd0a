//! # survival_server
//!
//! Runs one survival world and bridges it to clients over NATS.
//!
//! ## Startup Sequence
//!
//! 1. Build the tick loop and restore the last snapshot, if any.
//! 2. Connect to NATS and subscribe to client subjects.
//! 3. Start the scheduler; run until Ctrl-C or a failed tick.
//! 4. Stop the scheduler and write a final snapshot.

mod bridge;
mod snapshot;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use survival_net::connection::DEFAULT_NATS_URL;
use survival_net::{NatsConnection, subjects};
use survival_sim::{FlatTerrain, Players, Scheduler, TickConfig, TickLoop};

use bridge::{DELTA_BACKLOG, Ingress};
use snapshot::{SnapshotWriter, WorldSnapshot};

#[derive(Debug, Parser)]
#[command(name = "survival_server", about = "Authoritative survival simulation over NATS")]
struct Args {
    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = DEFAULT_NATS_URL)]
    nats_url: String,

    /// NATS subject prefix
    #[arg(short, long, default_value = subjects::DEFAULT_PREFIX)]
    prefix: String,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 20)]
    tick_rate: u32,

    /// Seconds between world saves
    #[arg(long, default_value_t = 60)]
    save_interval_secs: u64,

    /// Where the world snapshot is saved and restored from
    #[arg(long, default_value = "world.json")]
    snapshot_path: PathBuf,

    /// Height of the flat terrain surface
    #[arg(long, default_value_t = 64)]
    ground_level: i32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("survival_server=info".parse()?)
                .add_directive("survival_sim=info".parse()?),
        )
        .init();

    let args = Args::parse();
    info!(?args, "survival server starting");

    let players = Players::new();
    let config = TickConfig {
        tick_rate: args.tick_rate,
        save_interval: Duration::from_secs(args.save_interval_secs),
        ..TickConfig::default()
    };
    let mut tick_loop = TickLoop::new(
        config,
        Arc::new(FlatTerrain::new(args.ground_level)),
        Arc::new(players.clone()),
    )?
    .with_default_systems();

    if let Some(saved) = snapshot::load(&args.snapshot_path).await? {
        let (world, ctx) = tick_loop.world_and_context_mut();
        let restored = saved
            .restore(world, ctx)
            .context("restoring world snapshot")?;
        info!(path = %args.snapshot_path.display(), saved_tick = saved.tick, restored, "world restored");
    }

    let conn = NatsConnection::connect_to(&args.nats_url).await?;

    let mut scheduler = Scheduler::new(tick_loop);
    let handle = scheduler.handle();

    let (delta_tx, delta_rx) = mpsc::channel(DELTA_BACKLOG);
    scheduler.on_post_tick(bridge::delta_hook(delta_tx));
    let egress = bridge::spawn_egress(conn.clone(), subjects::tick_delta(&args.prefix), delta_rx);

    let writer = SnapshotWriter::new(args.snapshot_path.clone(), handle.clone());
    scheduler.on_save(move || {
        let writer = writer.clone();
        async move { writer.save().await }
    });

    let ingress = Ingress {
        prefix: args.prefix.clone(),
        handle,
        players,
        spawn_point: Vec3::new(0.5, (args.ground_level + 1) as f32, 0.5),
    }
    .spawn(&conn)
    .await?;

    scheduler.start();
    let outcome = tokio::select! {
        result = scheduler.wait() => result,
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!(error = %err, "failed to listen for ctrl-c, shutting down");
            }
            info!("shutdown requested");
            Ok(())
        }
    };
    let stopped = scheduler.stop().await;

    for task in &ingress {
        task.abort();
    }
    egress.abort();

    if let Some(tick_loop) = scheduler.tick_loop() {
        let snapshot =
            WorldSnapshot::capture(tick_loop.world(), tick_loop.context(), tick_loop.tick_id());
        match snapshot::write(&args.snapshot_path, &snapshot).await {
            Ok(()) => info!(tick = snapshot.tick, "final snapshot written"),
            Err(err) => error!(error = %err, "final snapshot failed"),
        }
    }

    let stats = scheduler.performance_stats();
    info!(
        ticks = stats.tick_count,
        avg_tick_ms = stats.avg_tick_ms,
        max_tick_ms = stats.max_tick_ms,
        "survival server shut down"
    );
    outcome.and(stopped).context("simulation failed")
}
