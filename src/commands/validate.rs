use anyhow::{Context, Result};
use std::path::Path;

use cellwatch::config::Config;
use cellwatch::registry::WatchRegistry;
use cellwatch::world::GridWorld;

pub fn validate(config: &Config, world: Option<&Path>) -> Result<()> {
    let endpoints = config.endpoints().context("Failed to resolve endpoints")?;

    println!("Endpoints");
    println!("=========");
    println!("  Command report:  {}", endpoints.command);
    println!("  Monitor batch:   {}", endpoints.batch);
    println!("  Monitor update:  {}", endpoints.update);
    println!();
    println!(
        "Watch entries: {} (duplicates: {:?})",
        config.monitored_blocks.locations.len(),
        config.monitored_blocks.duplicates
    );

    if let Some(path) = world {
        let world = GridWorld::from_file(path)
            .with_context(|| format!("Failed to load world snapshot {}", path.display()))?;
        let registry = WatchRegistry::load(
            &config.monitored_blocks.locations,
            &world,
            config.monitored_blocks.duplicates,
        );
        println!("Watched cells in {}: {}", path.display(), registry.len());
        for cell in registry.cells() {
            println!("  #{:<4} {}", cell.id, cell.coordinate);
        }
    }

    config.validate().context("Configuration is invalid")?;
    println!();
    println!("Configuration is valid");

    Ok(())
}
