use std::any::Any;
use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use sora::{
    components::{Lifetime, Motion, Sprite},
    ecs::{
        Component, ComponentHandle, ComponentId, ComponentKind, EcsError, Entity, EntityId,
        Siblings, UpdateContext, World,
    },
    signal::ENTITY_DEATH,
    spatial::{Camera2D, ChunkCoord, ChunkSize, Position},
};

struct HookCounter {
    hooks: Rc<Cell<u32>>,
}

impl HookCounter {
    const KIND: ComponentKind = ComponentKind::new("hook_counter");

    fn new() -> (Self, Rc<Cell<u32>>) {
        let hooks = Rc::new(Cell::new(0));
        (
            Self {
                hooks: hooks.clone(),
            },
            hooks,
        )
    }
}

impl Component for HookCounter {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    fn debug(&self, _owner: EntityId, _id: ComponentId) {}

    fn post_attach(&mut self, _siblings: &Siblings<'_>) {
        self.hooks.set(self.hooks.get() + 1);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn assert_indices_agree(world: &World) {
    world.audit().expect("audit passes");
    for kind in world.registry().kinds() {
        for handle in world.registry().get_components(kind).unwrap() {
            let owner = world.entity(handle.entity).expect("indexed owner exists");
            assert!(owner.contains(handle.id), "{handle:?} indexed but not attached");
        }
    }
    for entity in world.entities() {
        for attached in entity.components() {
            assert!(
                world.registry().contains(attached.handle()),
                "{:?} attached but not indexed",
                attached.handle()
            );
        }
    }
}

#[test]
fn index_stays_consistent_under_random_churn() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);
    let mut world = World::default();
    let mut live: Vec<ComponentHandle> = Vec::new();

    for _ in 0..500 {
        let entities = world.entity_ids();
        match rng.gen_range(0..7) {
            0 => {
                world.spawn();
            }
            1 | 2 if !entities.is_empty() => {
                let owner = entities[rng.gen_range(0..entities.len())];
                let handle = match rng.gen_range(0..3) {
                    0 => world.attach_component(owner, Motion::new(1.0, 1.0)),
                    1 => world.attach_component(owner, Sprite::new(1)),
                    _ => world.attach_component(owner, Lifetime::new(3)),
                }
                .unwrap();
                live.push(handle);
            }
            3 if !live.is_empty() => {
                let handle = live.swap_remove(rng.gen_range(0..live.len()));
                world.detach_component(handle);
            }
            4 if !live.is_empty() => {
                let handle = live.swap_remove(rng.gen_range(0..live.len()));
                let _ = world.remove_component(handle, rng.gen_bool(0.5));
            }
            5 if !entities.is_empty() => {
                let id = entities[rng.gen_range(0..entities.len())];
                world.set_alive(id, false).unwrap();
                world.reap_dead();
            }
            6 if !entities.is_empty() => {
                let id = entities[rng.gen_range(0..entities.len())];
                world.clean(id).unwrap();
            }
            _ => {}
        }
        live.retain(|h| world.registry().contains(*h));
        assert_indices_agree(&world);
    }
}

#[test]
fn identities_are_strictly_increasing() {
    let mut world = World::default();
    let mut entity_ids = Vec::new();
    let mut component_ids = Vec::new();

    for round in 0..20 {
        let id = world.spawn();
        entity_ids.push(id);
        for _ in 0..3 {
            component_ids.push(world.attach_component(id, Motion::new(0.0, 0.0)).unwrap().id);
        }
        if round % 3 == 0 {
            world.despawn(id).unwrap();
        }
    }

    assert!(entity_ids.windows(2).all(|w| w[0] < w[1]));
    assert!(component_ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(world.ids().entities_issued(), 20);
    assert_eq!(world.ids().components_issued(), 60);
}

#[test]
fn separate_worlds_have_separate_identity_spaces() {
    let mut a = World::default();
    let mut b = World::default();

    let ea = a.spawn();
    let eb = b.spawn();
    assert_eq!(ea, eb);
    let ca = a.attach_component(ea, Motion::new(0.0, 0.0)).unwrap();
    let cb = b.attach_component(eb, Motion::new(0.0, 0.0)).unwrap();
    assert_eq!(ca.id, cb.id);
}

#[test]
fn reload_fans_out_to_remaining_siblings_once() {
    let mut world = World::default();
    let id = world.spawn();
    let mut handles = Vec::new();
    let mut counters = Vec::new();
    for _ in 0..4 {
        let (component, hooks) = HookCounter::new();
        handles.push(world.attach_component(id, component).unwrap());
        counters.push(hooks);
    }
    assert!(counters.iter().all(|c| c.get() == 1), "attach runs the hook on the new component only");

    world.remove_component(handles[2], true).unwrap();

    let counts: Vec<u32> = counters.iter().map(|c| c.get()).collect();
    assert_eq!(counts, vec![2, 2, 1, 2]);
}

#[test]
fn removal_without_reload_fires_no_hooks() {
    let mut world = World::default();
    let id = world.spawn();
    let mut handles = Vec::new();
    let mut counters = Vec::new();
    for _ in 0..3 {
        let (component, hooks) = HookCounter::new();
        handles.push(world.attach_component(id, component).unwrap());
        counters.push(hooks);
    }

    world.remove_component(handles[0], false).unwrap();
    world.detach_component(handles[1]);

    assert!(counters.iter().all(|c| c.get() == 1));
    assert_eq!(world.entity(id).unwrap().component_count(), 1);
}

#[test]
fn entity_equality_is_identity_only() {
    let mut a = Entity::new(EntityId::from_raw(11));
    let b = Entity::new(EntityId::from_raw(11));
    a.set_zlayer(5);
    a.spatial_mut()
        .move_to(Position::new(100.0, 100.0), ChunkSize::new(10, 10));

    let hash = |e: &Entity| {
        let mut hasher = DefaultHasher::new();
        e.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(a, b);
    assert_eq!(hash(&a), hash(&b));
}

#[test]
fn death_signal_fires_exactly_once() {
    let (mut world, signals) = World::with_signal_queue(ChunkSize::default());
    let id = world.spawn();
    world.attach_component(id, Motion::new(0.0, 0.0)).unwrap();

    assert!(world.set_alive(id, false).unwrap());
    assert!(!world.set_alive(id, false).unwrap());

    assert!(!world.entity(id).unwrap().is_alive());
    assert_eq!(signals.count(ENTITY_DEATH), 1);
    assert_eq!(signals.drain()[0].entity, id);
    assert_eq!(
        world.entity(id).unwrap().component_count(),
        1,
        "teardown is a separate step"
    );
}

#[test]
fn camera_enumerates_visible_chunks() {
    let mut world = World::new(ChunkSize::new(4096, 4096), sora::signal::SignalQueue::new());
    let id = world.spawn_at(Position::new(8200.0, 0.0));
    let camera = world
        .attach_component(id, Camera2D::new(1))
        .unwrap();

    assert_eq!(world.entity(id).unwrap().spatial().chunk(), ChunkCoord::new(2, 0));
    let chunks: Vec<(i32, i32)> = world
        .visible_chunks(camera)
        .unwrap()
        .map(|c| (c.x, c.y))
        .collect();
    assert_eq!(chunks, vec![(1, -1), (1, 0), (2, -1), (2, 0)]);

    let again: Vec<(i32, i32)> = world
        .visible_chunks(camera)
        .unwrap()
        .map(|c| (c.x, c.y))
        .collect();
    assert_eq!(chunks, again);
}

#[test]
fn teardown_of_empty_entity_is_noop() {
    let mut world = World::default();
    let id = world.spawn();

    assert_eq!(world.clean(id).unwrap(), 0);
    assert_eq!(world.clean(id).unwrap(), 0);
    assert!(world.entity(id).unwrap().is_alive());
}

#[test]
fn teardown_drains_through_registry() {
    let mut world = World::default();
    let id = world.spawn();
    world.attach_component(id, Motion::new(0.0, 0.0)).unwrap();
    world.attach_component(id, Sprite::new(0)).unwrap();

    assert_eq!(world.clean(id).unwrap(), 2);
    assert_eq!(world.registry().len(Motion::KIND), 0);
    assert_eq!(world.registry().len(Sprite::KIND), 0);
    assert_eq!(world.clean(id).unwrap(), 0);
}

#[test]
fn lookups_report_not_found() {
    let mut world = World::default();
    assert_eq!(
        world.get_components(Motion::KIND).unwrap_err(),
        EcsError::UnknownKind(Motion::KIND)
    );

    let id = world.spawn();
    let handle = world.attach_component(id, Motion::new(0.0, 0.0)).unwrap();
    world.detach_component(handle);

    assert_eq!(
        world.get_component(Motion::KIND, handle.id).unwrap_err(),
        EcsError::ComponentNotFound {
            kind: Motion::KIND,
            id: handle.id
        }
    );
    assert!(world.get_components(Motion::KIND).unwrap().is_empty());
}
