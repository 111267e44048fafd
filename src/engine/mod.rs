use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::ecs::{EntityId, Frame, World};

pub struct EngineSettings {
    /// Seconds per tick
    pub dt: f64,
    /// Run the per-entity debug hooks every N ticks; 0 never does.
    pub debug_every: u64,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dt: config.simulation.dt,
            debug_every: config.logging.debug_every,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            systems: self.systems,
            settings: self.settings,
        }
    }
}

/// Drives the world one tick at a time: entity updates, then systems in
/// registration order, then reaping of whatever died.
pub struct Engine {
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
}

impl Engine {
    pub fn step(&mut self, world: &mut World) -> Result<TickSummary> {
        let frame = world.advance(self.settings.dt);
        world.update_entities(&frame);

        let mut systems = Vec::with_capacity(self.systems.len());
        for system in &mut self.systems {
            let start = Instant::now();
            system
                .run(&frame, world)
                .with_context(|| format!("system `{}` failed on tick {}", system.name(), frame.tick))?;
            systems.push(SystemRunReport {
                name: system.name().to_string(),
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            });
        }

        if self.settings.debug_every > 0 && frame.tick % self.settings.debug_every == 0 {
            world.debug_entities();
        }

        let reaped = world.reap_dead();
        let summary = TickSummary {
            tick: frame.tick,
            entities: world.entity_count(),
            components: world.component_count(),
            reaped,
            systems,
        };
        debug!(
            tick = summary.tick,
            entities = summary.entities,
            components = summary.components,
            reaped = summary.reaped.len(),
            "tick complete"
        );
        Ok(summary)
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TickSummary),
    {
        for _ in 0..ticks {
            let summary = self.step(world)?;
            hook(&summary);
        }
        info!(
            ticks,
            tick = world.tick(),
            entities = world.entity_count(),
            components = world.component_count(),
            "run finished"
        );
        Ok(())
    }
}

/// Bulk per-tick logic over the whole world, typically one component kind.
pub trait System {
    fn name(&self) -> &str;
    fn run(&mut self, frame: &Frame, world: &mut World) -> Result<()>;
}

#[derive(Clone, Debug, Serialize)]
pub struct SystemRunReport {
    pub name: String,
    pub duration_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub entities: usize,
    pub components: usize,
    pub reaped: Vec<EntityId>,
    pub systems: Vec<SystemRunReport>,
}
