use crate::biome::{Biome, BiomeTable};
use crate::coords::WorldBounds;
use crate::noise::{fbm, DEFAULT_OCTAVES};

/// Lowest surface height terrain may produce.
pub const MIN_SURFACE_Y: i32 = 3;
/// Headroom kept free between the tallest surface and the world ceiling.
pub const CEILING_MARGIN: i32 = 4;

const BROAD_SCALE: f64 = 0.8;
const LOCAL_SCALE: f64 = 2.2;
const LOCAL_SEED_OFFSET: u32 = 31;
const RIDGE_SCALE: f64 = 3.1;
const RIDGE_SEED_OFFSET: u32 = 71;

pub trait HeightSource {
    fn height_in(&self, x: i32, z: i32, biome: &Biome) -> i32;
}

#[derive(Clone, Debug)]
pub struct Terrain {
    biomes: BiomeTable,
    bounds: WorldBounds,
    center_lift_radius: f64,
}

impl Terrain {
    pub fn new(biomes: BiomeTable, bounds: WorldBounds, center_lift_radius: f64) -> Self {
        Self {
            biomes,
            bounds,
            center_lift_radius,
        }
    }

    pub fn biomes(&self) -> &BiomeTable {
        &self.biomes
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Nearest biome center by squared distance; the earliest registered biome
    /// wins a tie.
    pub fn biome_at(&self, x: i32, z: i32) -> &Biome {
        let fx = f64::from(x);
        let fz = f64::from(z);
        let mut nearest = self.biomes.primary();
        let mut nearest_dist = f64::INFINITY;

        for biome in self.biomes.iter() {
            let dist = biome.distance_sq_to_center(fx, fz);
            if dist < nearest_dist {
                nearest_dist = dist;
                nearest = biome;
            }
        }

        nearest
    }

    pub fn height(&self, x: i32, z: i32) -> i32 {
        self.height_in(x, z, self.biome_at(x, z))
    }

    fn surface_ceiling(&self) -> i32 {
        (self.bounds.max_y - CEILING_MARGIN).max(MIN_SURFACE_Y)
    }
}

impl HeightSource for Terrain {
    fn height_in(&self, x: i32, z: i32, biome: &Biome) -> i32 {
        let profile = &biome.def.terrain;
        let seed = biome.seed();
        let nx = f64::from(x) * profile.scale;
        let nz = f64::from(z) * profile.scale;

        let broad = fbm(nx * BROAD_SCALE, nz * BROAD_SCALE, seed, DEFAULT_OCTAVES);
        let local = fbm(
            nx * LOCAL_SCALE,
            nz * LOCAL_SCALE,
            seed.wrapping_add(LOCAL_SEED_OFFSET),
            DEFAULT_OCTAVES,
        );
        let ridge = (fbm(
            nx * RIDGE_SCALE,
            nz * RIDGE_SCALE,
            seed.wrapping_add(RIDGE_SEED_OFFSET),
            DEFAULT_OCTAVES,
        ) - 0.5)
            .abs()
            * 2.0;

        let center_dist = biome.distance_to_center(f64::from(x), f64::from(z));
        let center_lift =
            (1.0 - center_dist / self.center_lift_radius).max(0.0) * profile.center_lift;

        let height = profile.base
            + broad * profile.amplitude
            + local * profile.detail_amp
            + ridge * profile.ridge_amp
            + center_lift;

        (height.floor() as i32).clamp(MIN_SURFACE_Y, self.surface_ceiling())
    }
}
