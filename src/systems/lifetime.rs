use anyhow::Result;

use crate::{
    components::Lifetime,
    ecs::{EcsError, EntityId, Frame, World},
    engine::System,
};

/// Counts every `Lifetime` down once per tick and kills owners that run out.
pub struct LifetimeSystem {
    expired_total: u64,
}

impl LifetimeSystem {
    pub fn new() -> Self {
        Self { expired_total: 0 }
    }

    /// Entities this system has killed so far.
    pub fn expired_total(&self) -> u64 {
        self.expired_total
    }
}

impl Default for LifetimeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for LifetimeSystem {
    fn name(&self) -> &str {
        "lifetime"
    }

    fn run(&mut self, _frame: &Frame, world: &mut World) -> Result<()> {
        let handles = match world.iter_components(Lifetime::KIND) {
            Ok(handles) => handles,
            Err(EcsError::UnknownKind(_)) => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let mut expired: Vec<EntityId> = Vec::new();
        for handle in handles {
            if !world.entity(handle.entity)?.is_alive() {
                continue;
            }
            if world.component_as_mut::<Lifetime>(handle)?.tick() {
                expired.push(handle.entity);
            }
        }

        for entity in expired {
            if world.set_alive(entity, false)? {
                self.expired_total += 1;
            }
        }
        Ok(())
    }
}
