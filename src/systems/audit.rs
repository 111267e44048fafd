use anyhow::{Context, Result};

use crate::{
    ecs::{Frame, World},
    engine::System,
};

/// Cross-checks the registry against entity-local indices every `every`
/// ticks and fails the tick on any mismatch.
pub struct IndexAuditSystem {
    every: u64,
}

impl IndexAuditSystem {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for IndexAuditSystem {
    fn default() -> Self {
        Self::new(1)
    }
}

impl System for IndexAuditSystem {
    fn name(&self) -> &str {
        "index_audit"
    }

    fn run(&mut self, frame: &Frame, world: &mut World) -> Result<()> {
        if frame.tick % self.every != 0 {
            return Ok(());
        }
        world
            .audit()
            .with_context(|| format!("component index audit failed at tick {}", frame.tick))
    }
}
