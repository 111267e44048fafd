pub mod components;
pub mod config;
pub mod ecs;
pub mod engine;
pub mod logger;
pub mod scenario;
pub mod signal;
pub mod spatial;
pub mod systems;

pub use config::Config;
pub use ecs::{Component, ComponentHandle, ComponentKind, Entity, EntityId, World};
pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary};
