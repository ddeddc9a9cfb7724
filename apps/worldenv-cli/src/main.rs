mod config;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::DVec3;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use worldenv_common::{SimDuration, SimTime, WorldId};
use worldenv_kernel::{
    AtmosphereLayer, ChemistrySample, EnvSample, FrameSet, World, WorldEnvironment,
    WorldRegistry, WorldResolver, presets,
};
use worldenv_persist::{CATALOG_SCHEMA_VERSION, CatalogFormat, WorldCatalog, read_world_file};

use crate::config::WorldenvConfig;

const AU_M: f64 = 149_597_870_700.0;

#[derive(Parser)]
#[command(name = "worldenv", about = "Inspect, sample and catalog world environments")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (defaults to ./worldenv.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog directory, overriding the configured one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and configuration
    Info,
    /// List built-in world presets
    Presets,
    /// Describe a world: descriptor summary and field stack
    Show {
        /// Preset name or path to a JSON/YAML world file
        world: Option<String>,
        /// Print the world as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a world or descriptor file
    Validate { file: PathBuf },
    /// Sample the environment at one altitude
    Sample {
        world: Option<String>,
        /// Meters above the datum
        #[arg(short, long, default_value = "0")]
        altitude: f64,
        #[arg(long)]
        json: bool,
    },
    /// Sample a vertical column of altitudes
    Sweep {
        world: Option<String>,
        #[arg(long)]
        start: Option<f64>,
        #[arg(long)]
        end: Option<f64>,
        #[arg(long)]
        step: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Position of a world in the root frame
    Position {
        world_id: u64,
        /// Days after the global time origin
        #[arg(short, long, default_value = "0")]
        days: f64,
    },
    /// Manage the world catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogCommand,
    },
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// Create the catalog directory
    Init {
        /// File format for world files (json or yaml)
        #[arg(long)]
        format: Option<CatalogFormat>,
        /// Seed the catalog with the Sun/Earth/Moon system and frames
        #[arg(long = "presets")]
        with_presets: bool,
    },
    /// List catalogued worlds
    List,
    /// Check every file against the integrity manifest
    Verify,
    /// Copy a world file into the catalog
    Import {
        file: PathBuf,
        /// Store under this id instead of the one in the file
        #[arg(long)]
        id: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = WorldenvConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.catalog {
        config.catalog_dir = dir;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Info => {
            println!("worldenv v{}", env!("CARGO_PKG_VERSION"));
            println!("catalog: {} (schema v{CATALOG_SCHEMA_VERSION})", config.catalog_dir.display());
            println!("default world: {}", config.default_world);
            println!("presets: {}", presets::names().join(", "));
        }
        Commands::Presets => {
            for name in presets::names() {
                let Some(d) = presets::by_name(name) else {
                    continue;
                };
                println!(
                    "{name:<8} radius={:.0} m  g={} m/s²  medium={:?}  atmosphere={}",
                    d.space.surface_radius_m,
                    d.gravity.strength,
                    d.medium.default,
                    if d.atmosphere.is_some() { "yes" } else { "no" },
                );
            }
        }
        Commands::Show { world, json } => {
            let world = resolve_world(world.as_deref().unwrap_or(&config.default_world))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&world)?);
                return Ok(());
            }
            println!("World {} \"{}\"", world.id, world.name);
            if let Some(description) = &world.description {
                println!("  {description}");
            }
            if let Some(parent) = world.parent {
                println!("  parent: {parent}");
            }
            let d = &world.environment;
            println!("  space: radius={} m, up={:?}", d.space.surface_radius_m, d.space.up_model);
            println!("  gravity: {:?} {} m/s²", d.gravity.kind, d.gravity.strength);
            println!("  medium: {:?}, land: {:?}", d.medium.default, d.land);
            println!("  fields: {}", world.build_environment().field_names().join(" -> "));
        }
        Commands::Validate { file } => {
            let world = read_world_file(&file)
                .with_context(|| format!("{} is not a valid world", file.display()))?;
            println!("OK: world {} \"{}\"", world.id, world.name);
        }
        Commands::Sample {
            world,
            altitude,
            json,
        } => {
            let world = resolve_world(world.as_deref().unwrap_or(&config.default_world))?;
            let report = sample_report(&world, altitude);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_sample_header();
                print_sample(&report.sample);
                println!("layer: {}", report.layer);
                if let Some(chemistry) = &report.chemistry {
                    for (species, p) in &chemistry.partial_pressure_pa {
                        let rho = chemistry.mass_density_kg_m3.get(species).copied().unwrap_or(0.0);
                        println!("  {species:>4}: {p:>12.5e} Pa {rho:>12.5e} kg/m3");
                    }
                }
            }
        }
        Commands::Sweep {
            world,
            start,
            end,
            step,
            json,
        } => {
            let world = resolve_world(world.as_deref().unwrap_or(&config.default_world))?;
            let env: WorldEnvironment = world.build_environment();
            let samples = env.sweep(
                DVec3::Z,
                start.unwrap_or(config.sweep.start_m),
                end.unwrap_or(config.sweep.end_m),
                step.unwrap_or(config.sweep.step_m),
                SimTime::ZERO,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&samples)?);
            } else {
                println!("Sweep of \"{}\": {} samples", world.name, samples.len());
                print_sample_header();
                for sample in &samples {
                    print_sample(sample);
                }
            }
        }
        Commands::Position { world_id, days } => {
            let (registry, frames) = load_system(&config.catalog_dir)?;
            let id = WorldId(world_id);
            let t = SimTime::ZERO + SimDuration::days_f64(days);
            let resolver = WorldResolver::new(&registry, &frames);
            let origin = resolver.world_origin(id, t)?;
            println!(
                "world {id} at day {days}: ({:.6e}, {:.6e}, {:.6e}) m",
                origin.x, origin.y, origin.z
            );
            println!("  distance from root: {:.6} AU", origin.length() / AU_M);
            if let Some(parent) = registry.get(id).and_then(|w| w.parent) {
                let d = resolver.vector_between(id, DVec3::ZERO, parent, t)?;
                println!("  distance to parent {parent}: {:.0} km", d.length() / 1_000.0);
            }
        }
        Commands::Catalog { action } => run_catalog(action, &config)?,
    }

    Ok(())
}

fn run_catalog(action: CatalogCommand, config: &WorldenvConfig) -> anyhow::Result<()> {
    match action {
        CatalogCommand::Init {
            format,
            with_presets,
        } => {
            let format = format.unwrap_or(config.format);
            let mut catalog = WorldCatalog::open_with_format(&config.catalog_dir, format)?;
            if with_presets {
                catalog.save_registry(&presets::solar_system()?)?;
                catalog.save_frames(&presets::frame_presets())?;
            }
            println!(
                "Catalog at {} ({}, {} worlds)",
                catalog.root().display(),
                catalog.meta().format,
                catalog.meta().world_count
            );
        }
        CatalogCommand::List => {
            let catalog = WorldCatalog::open(&config.catalog_dir)?;
            let registry = catalog.load_registry()?;
            for id in registry.topological_order() {
                let Some(world) = registry.get(id) else {
                    continue;
                };
                let depth = registry.depth(id)?;
                println!("{}{} {}", "  ".repeat(depth), world.id, world.name);
            }
            println!("{}", registry.summary());
        }
        CatalogCommand::Verify => {
            let catalog = WorldCatalog::open(&config.catalog_dir)?;
            catalog.verify_integrity()?;
            println!(
                "OK: {} files verified",
                catalog.manifest().entries.len()
            );
        }
        CatalogCommand::Import { file, id } => {
            let mut world = read_world_file(&file)
                .with_context(|| format!("cannot import {}", file.display()))?;
            if let Some(id) = id {
                world.id = WorldId(id);
            }
            let mut catalog = WorldCatalog::open(&config.catalog_dir)?;
            let path = catalog.save_world(&world)?;
            println!("Imported world {} to {}", world.id, path.display());
        }
    }
    Ok(())
}

/// A preset name or a path to a world file.
fn resolve_world(name: &str) -> anyhow::Result<World> {
    if let Some(descriptor) = presets::by_name(name) {
        return Ok(World::new(WorldId(0), name, descriptor));
    }
    let path = Path::new(name);
    if !path.exists() {
        anyhow::bail!(
            "unknown world {name:?}: not a preset ({}) or an existing file",
            presets::names().join(", ")
        );
    }
    Ok(read_world_file(path)?)
}

/// Registry and frames from the catalog, or the built-in solar system when the
/// catalog has no frames.
fn load_system(catalog_dir: &Path) -> anyhow::Result<(WorldRegistry, FrameSet)> {
    if catalog_dir.join("catalog.meta.json").exists() {
        let catalog = WorldCatalog::open(catalog_dir)?;
        if let Some(frames) = catalog.load_frames()? {
            return Ok((catalog.load_registry()?, frames));
        }
        tracing::warn!(dir = %catalog_dir.display(), "catalog has no frames, using presets");
    }
    Ok((presets::solar_system()?, presets::frame_presets()))
}

/// One `sample` result: field values plus the layer and gas breakdown.
#[derive(Debug, Serialize)]
struct SampleReport {
    #[serde(flatten)]
    sample: EnvSample,
    layer: AtmosphereLayer,
    #[serde(skip_serializing_if = "Option::is_none")]
    chemistry: Option<ChemistrySample>,
}

fn sample_report(world: &World, altitude_m: f64) -> SampleReport {
    let descriptor = &world.environment;
    let sample = world
        .build_environment()
        .sample_at_altitude(DVec3::Z, altitude_m, SimTime::ZERO);
    SampleReport {
        layer: descriptor.layer_at(sample.altitude_m),
        chemistry: descriptor.chemistry().map(|c| c.sample(&sample.values)),
        sample,
    }
}

fn print_sample_header() {
    println!(
        "{:>10} {:>8} {:>12} {:>12} {:>9} {:>9}",
        "alt (m)", "medium", "rho (kg/m3)", "P (Pa)", "T (K)", "g (m/s2)"
    );
}

fn print_sample(sample: &EnvSample) {
    let v = &sample.values;
    println!(
        "{:>10.1} {:>8} {:>12.5e} {:>12.5e} {:>9.2} {:>9.4}",
        sample.altitude_m,
        format!("{:?}", v.medium),
        v.density,
        v.pressure,
        v.temperature,
        v.gravity_radial
    );
}
