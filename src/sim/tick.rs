//! Fixed timestep simulation tick
//!
//! One call advances the world by one clock period:
//! 1. game phase transitions, actor phases synchronized
//! 2. score bookkeeping
//! 3. per-actor state machines
//! 4. in play only: forces, integration, collisions
//!
//! Drawing is left to the caller.

use super::actor::Actor;
use super::body::{Category, Phase};
use super::collision::{Collide, Contact, check_collision_events};
use super::noise::NoiseSource;
use super::state::{BOUNDARY_ID, SimulationWorld};

/// Keys held down during this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Start a round from the title screen
    pub space: bool,
    /// Restart after a round is lost
    pub backspace: bool,
    pub quit: bool,
}

/// Advance the world by one tick
pub fn tick(world: &mut SimulationWorld, input: &TickInput) {
    if world.is_closed() {
        return;
    }
    if input.quit {
        world.close();
        return;
    }
    if world.phase == Phase::Restart {
        world.reset();
        return;
    }

    update_phase(world, input);
    update_score(world);

    for actor in world.actors.iter_mut() {
        actor.machine_state(&mut world.noise);
    }
    if world.phase == Phase::Play {
        step_actors(&mut world.actors, input, &mut world.noise);
    }

    world.time_ticks += 1;
}

fn update_phase(world: &mut SimulationWorld, input: &TickInput) {
    let previous = world.phase;
    let next = match previous {
        Phase::Start if input.space => Phase::PrePlay,
        // The ring drives the world forward once it has closed in
        Phase::PrePlay => world
            .actor(BOUNDARY_ID)
            .map_or(Phase::PrePlay, |a| a.body.main_state),
        Phase::Play if world.actors.iter().any(ends_round) => Phase::Dead,
        Phase::Dead if input.backspace => Phase::Restart,
        phase => phase,
    };

    if next != previous {
        log::info!("Phase {} -> {}", previous.as_str(), next.as_str());
        if previous == Phase::Play && next == Phase::Dead {
            log::info!("Round over, score {}", world.score());
            if world.config().predictor.checkpoint_path.is_some() {
                world.save_models();
            }
        }
    }

    world.phase = next;
    for actor in &mut world.actors {
        actor.body.main_state = next;
    }
}

fn ends_round(actor: &Actor) -> bool {
    matches!(actor.body.category, Category::Boundary | Category::Turret)
        && actor.body.main_state == Phase::Dead
}

fn update_score(world: &mut SimulationWorld) {
    match world.phase {
        Phase::Start => world.score.start_tick = 0,
        Phase::PrePlay => world.score.start_tick = world.time_ticks,
        Phase::Play => {
            let clock_rate = world.config().clock_rate;
            world.score.update(world.time_ticks, clock_rate);
        }
        Phase::Dead | Phase::Restart => {}
    }
}

/// Forces, then integration, then collisions
fn step_actors(actors: &mut [Actor], input: &TickInput, noise: &mut dyn NoiseSource) {
    for actor in actors.iter_mut() {
        actor.natural_forces(noise);
    }
    for actor in actors.iter_mut() {
        actor.key_action(input);
    }

    let contacts: Vec<Contact> = actors.iter().map(Collide::contact).collect();
    for actor in actors.iter_mut() {
        actor.ai_action(&contacts);
    }
    for actor in actors.iter_mut() {
        actor.control(noise);
    }
    for actor in actors.iter_mut() {
        actor.update_pos(noise);
    }

    check_collision_events(actors);
}
