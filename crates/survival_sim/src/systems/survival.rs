//! Hunger, thirst and body temperature.

use survival_ecs::{World, WorldError};

use crate::components::{Dead, Vitals};
use crate::context::SimContext;

/// Hunger lost per second.
const HUNGER_DRAIN: f32 = 0.02;
/// Thirst lost per second.
const THIRST_DRAIN: f32 = 0.035;
/// Health lost per second for each empty meter.
const STARVATION_DAMAGE: f32 = 0.5;
/// Health lost per second while dangerously cold.
const FREEZING_DAMAGE: f32 = 0.25;

const DAY_TEMPERATURE: f32 = 20.0;
const NIGHT_TEMPERATURE: f32 = 5.0;
const FREEZING: f32 = 0.0;
/// Fraction of the gap to ambient temperature closed per second.
const TEMPERATURE_RATE: f32 = 0.01;

pub fn run(world: &mut World, ctx: &mut SimContext, dt: f32) -> Result<(), WorldError> {
    let ambient = if ctx.is_night() {
        NIGHT_TEMPERATURE
    } else {
        DAY_TEMPERATURE
    };
    let blend = (TEMPERATURE_RATE * dt).min(1.0);

    let entities = world.query::<(Vitals,)>()?;
    for &entity in entities.iter() {
        if world.has_component::<Dead>(entity) {
            continue;
        }
        let Some(vitals) = world.get_component_mut::<Vitals>(entity) else {
            continue;
        };

        vitals.hunger = (vitals.hunger - HUNGER_DRAIN * dt).max(0.0);
        vitals.thirst = (vitals.thirst - THIRST_DRAIN * dt).max(0.0);
        vitals.temperature += (ambient - vitals.temperature) * blend;

        let empty_meters = [vitals.hunger, vitals.thirst]
            .iter()
            .filter(|&&m| m <= 0.0)
            .count() as f32;
        let mut damage = STARVATION_DAMAGE * empty_meters;
        if vitals.temperature <= FREEZING {
            damage += FREEZING_DAMAGE;
        }
        vitals.health = (vitals.health - damage * dt).max(0.0);
    }
    Ok(())
}
