use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::{
    components::{Lifetime, Motion, Sprite},
    config::DemoConfig,
    ecs::{ComponentHandle, EcsResult, EntityId, World},
    spatial::{Camera2D, Position},
};

/// Sprite layers handed out to spawned entities
const SPRITE_LAYERS: i32 = 4;

/// What [`populate`] put into the world.
#[derive(Debug, Clone)]
pub struct Population {
    pub movers: Vec<EntityId>,
    pub camera: ComponentHandle,
}

/// Spawn a deterministic crowd of short-lived movers around the origin,
/// plus one drifting camera entity.
pub fn populate(world: &mut World, demo: &DemoConfig) -> EcsResult<Population> {
    let mut rng = ChaCha8Rng::seed_from_u64(demo.seed);
    let chunk = world.chunk_size();
    let extent_x = chunk.width as f32 * 2.0;
    let extent_y = chunk.height as f32 * 2.0;
    let speed = demo.max_speed.abs();

    let mut movers = Vec::with_capacity(demo.entities as usize);
    for _ in 0..demo.entities {
        let position = Position::new(
            rng.gen_range(-extent_x..=extent_x),
            rng.gen_range(-extent_y..=extent_y),
        );
        let id = world.spawn_at(position);
        let mut entity = world.entity_mut(id)?;
        entity.add_component(Motion::new(
            rng.gen_range(-speed..=speed),
            rng.gen_range(-speed..=speed),
        ));
        entity.add_component(Sprite::new(rng.gen_range(0..SPRITE_LAYERS)));
        entity.add_component(Lifetime::new(
            rng.gen_range(demo.lifetime_min..=demo.lifetime_max),
        ));
        movers.push(id);
    }

    let camera_entity = world.spawn_at(Position::new(0.0, 0.0));
    let camera = world.attach_component(camera_entity, Camera2D::new(demo.render_distance))?;
    world.attach_component(camera_entity, Motion::new(speed / 4.0, 0.0))?;

    info!(
        movers = movers.len(),
        camera = %camera_entity,
        seed = demo.seed,
        "populated world"
    );
    Ok(Population { movers, camera })
}
