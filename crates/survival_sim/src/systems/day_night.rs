//! Advances the world clock and announces sunrise and sunset.

use survival_ecs::{World, WorldError};

use crate::context::{SimContext, WorldEvent};

const DAWN: f32 = 0.25;
const DUSK: f32 = 0.75;

pub fn run(_world: &mut World, ctx: &mut SimContext, dt: f32) -> Result<(), WorldError> {
    if ctx.day_length <= 0.0 {
        return Ok(());
    }
    let before = ctx.time_of_day;
    let after = (before + dt / ctx.day_length).rem_euclid(1.0);
    ctx.time_of_day = after;

    if crossed(before, after, DAWN) {
        ctx.emit(WorldEvent::Dawn);
    }
    if crossed(before, after, DUSK) {
        ctx.emit(WorldEvent::Dusk);
    }
    Ok(())
}

/// Whether advancing from `before` to `after` passed `mark`, allowing for
/// wrap-around at midnight.
fn crossed(before: f32, after: f32, mark: f32) -> bool {
    if after >= before {
        before < mark && mark <= after
    } else {
        before < mark || mark <= after
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use survival_net::WorldType;

    use super::*;
    use crate::terrain::FlatTerrain;

    fn ctx(time_of_day: f32) -> SimContext {
        let mut ctx = SimContext::new(Arc::new(FlatTerrain::new(0)), WorldType::Overworld);
        ctx.day_length = 100.0;
        ctx.time_of_day = time_of_day;
        ctx
    }

    #[test]
    fn test_clock_advances_by_dt() {
        let mut ctx = ctx(0.0);
        run(&mut World::new(), &mut ctx, 1.0).unwrap();
        assert!((ctx.time_of_day - 0.01).abs() < 1.0e-6);
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_dawn_and_dusk_fire_once() {
        let mut ctx = ctx(0.245);
        run(&mut World::new(), &mut ctx, 1.0).unwrap();
        assert_eq!(ctx.events, vec![WorldEvent::Dawn]);

        ctx.events.clear();
        run(&mut World::new(), &mut ctx, 1.0).unwrap();
        assert!(ctx.events.is_empty());

        ctx.time_of_day = 0.745;
        run(&mut World::new(), &mut ctx, 1.0).unwrap();
        assert_eq!(ctx.events, vec![WorldEvent::Dusk]);
    }

    #[test]
    fn test_wraps_at_midnight() {
        let mut ctx = ctx(0.995);
        run(&mut World::new(), &mut ctx, 1.0).unwrap();
        assert!(ctx.time_of_day < 0.01);
        assert!(ctx.is_night());
    }
}
