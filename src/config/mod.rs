//! Runtime configuration

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::spatial::{ChunkSize, DEFAULT_CHUNK_PIXEL_HEIGHT, DEFAULT_CHUNK_PIXEL_WIDTH};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_chunk_width")]
    pub chunk_pixel_width: u32,
    #[serde(default = "default_chunk_height")]
    pub chunk_pixel_height: u32,
}

fn default_chunk_width() -> u32 {
    DEFAULT_CHUNK_PIXEL_WIDTH
}

fn default_chunk_height() -> u32 {
    DEFAULT_CHUNK_PIXEL_HEIGHT
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_pixel_width: default_chunk_width(),
            chunk_pixel_height: default_chunk_height(),
        }
    }
}

impl WorldConfig {
    pub fn chunk_size(&self) -> ChunkSize {
        ChunkSize::new(self.chunk_pixel_width, self.chunk_pixel_height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seconds per tick
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
}

fn default_dt() -> f64 {
    1.0 / 60.0
}

fn default_ticks() -> u64 {
    600
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            ticks: default_ticks(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Dump every entity's components every N ticks; 0 turns it off.
    #[serde(default)]
    pub debug_every: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            debug_every: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_entities")]
    pub entities: u32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Pixels per second
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    #[serde(default = "default_lifetime_min")]
    pub lifetime_min: u32,
    #[serde(default = "default_lifetime_max")]
    pub lifetime_max: u32,
    #[serde(default = "default_render_distance")]
    pub render_distance: u16,
}

fn default_entities() -> u32 {
    256
}

fn default_seed() -> u64 {
    7
}

fn default_max_speed() -> f32 {
    600.0
}

fn default_lifetime_min() -> u32 {
    60
}

fn default_lifetime_max() -> u32 {
    900
}

fn default_render_distance() -> u16 {
    2
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            entities: default_entities(),
            seed: default_seed(),
            max_speed: default_max_speed(),
            lifetime_min: default_lifetime_min(),
            lifetime_max: default_lifetime_max(),
            render_distance: default_render_distance(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.world.chunk_pixel_width > 0 && self.world.chunk_pixel_height > 0,
            "chunk pixel size must be non-zero"
        );
        ensure!(self.simulation.dt > 0.0, "simulation.dt must be positive");
        ensure!(
            self.demo.lifetime_min <= self.demo.lifetime_max,
            "demo.lifetime_min ({}) exceeds demo.lifetime_max ({})",
            self.demo.lifetime_min,
            self.demo.lifetime_max
        );
        Ok(())
    }
}
