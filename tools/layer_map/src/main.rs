use std::env;
use std::path::{Path, PathBuf};

use glam::IVec3;
use image::{Rgb, RgbImage};
use realms_shared::{BlockId, LayerMask, RealmContent, World, WorldBounds};
use tracing::{info, warn};

const USAGE: &str = "Usage: layer_map [--content <file.toml>] [--biome <id>] [--radius <n>] \
[--slice <dz>] [--layers terrain,flora,monument,portal,special] [--out <file.png>]";
const DEFAULT_RADIUS: i32 = 56;
const MIN_RADIUS: i32 = 20;
const MAX_RADIUS: i32 = 128;
const MAX_SLICE_OFFSET: i32 = 128;
const EMPTY_COLUMN: Rgb<u8> = Rgb([18, 20, 26]);
const UNKNOWN_COLOR: [u8; 3] = [255, 0, 255];

struct Options {
    content: Option<PathBuf>,
    biome: Option<String>,
    radius: i32,
    slice: i32,
    layers: LayerMask,
    out: PathBuf,
}

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let options = match parse_args(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            println!("{USAGE}");
            return;
        }
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&options) {
        eprintln!("layer_map error: {err}");
        std::process::exit(1);
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>, String> {
    let mut options = Options {
        content: None,
        biome: None,
        radius: DEFAULT_RADIUS,
        slice: 0,
        layers: LayerMask::all(),
        out: PathBuf::from("layer_map.png"),
    };

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{flag} expects a value"));
        match arg.as_str() {
            "--content" => options.content = Some(PathBuf::from(value("--content")?)),
            "--biome" => options.biome = Some(value("--biome")?),
            "--radius" => {
                let radius = parse_int("radius", &value("--radius")?)?;
                options.radius = radius.clamp(MIN_RADIUS, MAX_RADIUS);
            }
            "--slice" => {
                let slice = parse_int("slice", &value("--slice")?)?;
                options.slice = slice.clamp(-MAX_SLICE_OFFSET, MAX_SLICE_OFFSET);
            }
            "--layers" => options.layers = parse_layers(&value("--layers")?),
            "--out" => options.out = PathBuf::from(value("--out")?),
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(Some(options))
}

fn parse_int(name: &str, raw: &str) -> Result<i32, String> {
    raw.trim()
        .parse::<i32>()
        .map_err(|err| format!("invalid {name} '{raw}': {err}"))
}

/// Unknown names are skipped. A list with no usable name selects every layer.
fn parse_layers(list: &str) -> LayerMask {
    let mut mask = LayerMask::empty();
    for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        mask |= match name {
            "terrain" => LayerMask::TERRAIN,
            "flora" => LayerMask::FLORA,
            "monument" => LayerMask::MONUMENT,
            "portal" => LayerMask::PORTAL,
            "special" => LayerMask::SPECIAL,
            other => {
                warn!("Ignoring unknown layer '{}'", other);
                continue;
            }
        };
    }
    if mask.is_empty() {
        LayerMask::all()
    } else {
        mask
    }
}

/// `map.png` becomes `map_slice.png` next to it.
fn slice_path(out: &Path) -> PathBuf {
    let stem = out
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layer_map".to_string());
    out.with_file_name(format!("{stem}_slice.png"))
}

fn run(options: &Options) -> Result<(), String> {
    let content = match &options.content {
        Some(path) => RealmContent::load(path).map_err(|err| err.to_string())?,
        None => RealmContent::default(),
    };
    let world = World::new(content).map_err(|err| format!("failed to build world: {err}"))?;

    let biome = match &options.biome {
        Some(key) => world
            .biomes()
            .get_by_key(key)
            .ok_or_else(|| format!("unknown biome '{key}'"))?,
        None => world.biomes().primary(),
    };
    let center = biome.center();
    let radius = options.radius;
    let slice_z = center.y + options.slice;

    info!(
        "Rendering {} around ({}, {}) radius {} slice z={} layers {:?}",
        biome.key(),
        center.x,
        center.y,
        radius,
        slice_z,
        options.layers
    );

    let (top_down, filled) = render_top_down(&world, center.x, center.y, radius, options.layers);
    save(&top_down, &options.out)?;
    println!(
        "Wrote {}x{} layer map of {} to {} ({} of {} columns matched)",
        top_down.width(),
        top_down.height(),
        biome.key(),
        options.out.display(),
        filled,
        top_down.width() as usize * top_down.height() as usize
    );

    let slice = render_slice(&world, center.x, slice_z, radius, options.layers);
    let slice_out = slice_path(&options.out);
    save(&slice, &slice_out)?;
    println!(
        "Wrote {}x{} slice at z={} to {}",
        slice.width(),
        slice.height(),
        slice_z,
        slice_out.display()
    );
    Ok(())
}

fn render_top_down(
    world: &World,
    center_x: i32,
    center_z: i32,
    radius: i32,
    layers: LayerMask,
) -> (RgbImage, usize) {
    let side = (radius * 2 + 1) as u32;
    let bounds = world.bounds();
    let mut image = RgbImage::from_pixel(side, side, EMPTY_COLUMN);
    let mut filled = 0usize;
    for (px, py, pixel) in image.enumerate_pixels_mut() {
        let x = center_x - radius + px as i32;
        let z = center_z - radius + py as i32;
        let Some(top) = world.top_block_for_layers(x, z, layers) else {
            continue;
        };
        *pixel = shaded(world, top.sample.block, top.y, bounds);
        filled += 1;
    }
    (image, filled)
}

/// Side view of the plane `z = slice_z`, top row at `max_y`.
fn render_slice(
    world: &World,
    center_x: i32,
    slice_z: i32,
    radius: i32,
    layers: LayerMask,
) -> RgbImage {
    let bounds = world.bounds();
    let width = (radius * 2 + 1) as u32;
    let mut image = RgbImage::from_pixel(width, bounds.height() as u32, EMPTY_COLUMN);
    for (px, py, pixel) in image.enumerate_pixels_mut() {
        let pos = IVec3::new(center_x - radius + px as i32, bounds.max_y - py as i32, slice_z);
        let Some(sample) = world.block_sample_at(pos) else {
            continue;
        };
        if layers.intersects(sample.source.layer()) {
            *pixel = shaded(world, sample.block, pos.y, bounds);
        }
    }
    image
}

/// Block color darkened toward the floor of the world.
fn shaded(world: &World, block: BlockId, y: i32, bounds: WorldBounds) -> Rgb<u8> {
    let span = (bounds.height() - 1).max(1) as f32;
    let base = world
        .registry()
        .get_properties(block)
        .and_then(|props| props.rgb())
        .unwrap_or(UNKNOWN_COLOR);
    let shade = 0.55 + 0.45 * (y - bounds.min_y) as f32 / span;
    Rgb(base.map(|channel| (f32::from(channel) * shade).min(255.0) as u8))
}

fn save(image: &RgbImage, path: &Path) -> Result<(), String> {
    image
        .save(path)
        .map_err(|err| format!("failed to write {}: {err}", path.display()))
}
