use std::env;
use std::path::PathBuf;

use glam::IVec3;
use realms_shared::{RealmContent, World};
use tracing::info;

const USAGE: &str = "Usage: realm_inspector [--content <file.toml>] [--at <x> <z>]";

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let mut content_path: Option<PathBuf> = None;
    let mut at = (0, 0);

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--content" => {
                let Some(value) = args.next() else {
                    eprintln!("--content expects a path argument");
                    std::process::exit(2);
                };
                content_path = Some(PathBuf::from(value));
            }
            "--at" => {
                let (Some(x), Some(z)) = (args.next(), args.next()) else {
                    eprintln!("--at expects two integer arguments");
                    std::process::exit(2);
                };
                match (x.parse::<i32>(), z.parse::<i32>()) {
                    (Ok(x), Ok(z)) => at = (x, z),
                    _ => {
                        eprintln!("invalid column '{x} {z}'");
                        std::process::exit(2);
                    }
                }
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                return;
            }
            other => {
                eprintln!("unknown argument: {other}");
                eprintln!("{USAGE}");
                std::process::exit(2);
            }
        }
    }

    if let Err(err) = run(content_path, at) {
        eprintln!("realm_inspector error: {err}");
        std::process::exit(1);
    }
}

fn run(content_path: Option<PathBuf>, (x, z): (i32, i32)) -> Result<(), String> {
    let content = match &content_path {
        Some(path) => {
            info!("Loading realm content from {}", path.display());
            RealmContent::load(path).map_err(|err| err.to_string())?
        }
        None => RealmContent::default(),
    };
    let world = World::new(content).map_err(|err| format!("failed to build world: {err}"))?;

    let bounds = world.bounds();
    println!("Bounds: y {}..={}", bounds.min_y, bounds.max_y);
    println!("Blocks: {}", world.registry().len());
    println!(
        "Structures: {} cells across {} columns",
        world.structures().len(),
        world.structures().column_count()
    );

    println!("Biomes:");
    for biome in world.biomes().iter() {
        let center = biome.center();
        let target = world
            .biomes()
            .get(biome.portal_target)
            .map_or("?", |target| target.key());
        let arrival = world.portal_arrival(biome.id);
        println!(
            "  {} \"{}\" center ({}, {}) monument {:?} \"{}\"",
            biome.key(),
            biome.def.name,
            center.x,
            center.y,
            biome.def.monument,
            biome.def.monument_name
        );
        println!(
            "    portal at {} -> {}, arrivals land at ({:.1}, {:.1}, {:.1})",
            biome.portal_anchor(),
            target,
            arrival.x,
            arrival.y,
            arrival.z
        );
    }

    println!("Monuments from ({x}, {z}):");
    for entry in world.monument_distances(f64::from(x), f64::from(z)) {
        println!(
            "  {:>8.1}  {} ({})",
            entry.distance, entry.monument_name, entry.biome_name
        );
    }

    let biome = world.biome_at(x, z);
    println!(
        "Column ({x}, {z}) in {}: terrain height {}, render max {}",
        biome.key(),
        world.terrain_height_in(x, z, biome),
        world.column_render_max_y(x, z)
    );
    let top = bounds.max_y.min(world.column_render_max_y(x, z));
    for y in (bounds.min_y..=top).rev() {
        let pos = IVec3::new(x, y, z);
        let Some(sample) = world.block_sample_at(pos) else {
            continue;
        };
        let mut line = format!(
            "  y {:>3}  {:<14} {:?}",
            y,
            world.registry().name_of(sample.block),
            sample.source
        );
        if world.is_protected_block(pos) {
            line.push_str("  protected");
        }
        if let Some(target) = sample.portal_to.and_then(|id| world.biomes().get(id)) {
            line.push_str(&format!("  -> {}", target.key()));
        }
        println!("{line}");
    }

    Ok(())
}
