use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use sora::{
    engine::{EngineBuilder, EngineSettings},
    scenario,
    signal::ENTITY_DEATH,
    systems::{IndexAuditSystem, LifetimeSystem},
    Config, World,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "SORA entity/component runtime demo")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Override tick count (uses config when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the number of spawned entities
    #[arg(long)]
    entities: Option<u32>,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    ticks: u64,
    entities_spawned: u64,
    components_attached: u64,
    entities_alive: usize,
    components_alive: usize,
    deaths: usize,
    visible_chunks: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_yaml(&cli.config)?;
    if let Some(entities) = cli.entities {
        config.demo.entities = entities;
    }
    let ticks = cli.ticks.unwrap_or(config.simulation.ticks);
    sora::logger::init(&config.logging.level)?;

    let (mut world, signals) = World::with_signal_queue(config.world.chunk_size());
    let population = scenario::populate(&mut world, &config.demo)?;

    let mut engine = EngineBuilder::new(EngineSettings::from_config(&config))
        .with_system(LifetimeSystem::new())
        .with_system(IndexAuditSystem::new(60))
        .build();

    let mut deaths = 0;
    engine.run_with_hook(&mut world, ticks, |summary| {
        deaths += summary.reaped.len();
        if !summary.reaped.is_empty() {
            info!(tick = summary.tick, reaped = summary.reaped.len(), "entities reaped");
        }
    })?;
    world.audit()?;

    let summary = RunSummary {
        ticks,
        entities_spawned: world.ids().entities_issued(),
        components_attached: world.ids().components_issued(),
        entities_alive: world.alive_count(),
        components_alive: world.component_count(),
        deaths: signals.count(ENTITY_DEATH),
        visible_chunks: world.visible_chunks(population.camera)?.count(),
    };
    debug_assert_eq!(summary.deaths, deaths);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Ran {} ticks: {} of {} entities alive, {} components live, {} deaths, camera sees {} chunks",
            summary.ticks,
            summary.entities_alive,
            summary.entities_spawned,
            summary.components_alive,
            summary.deaths,
            summary.visible_chunks
        );
    }
    Ok(())
}
