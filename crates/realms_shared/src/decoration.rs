use glam::IVec3;

use crate::biome::{Biome, DecorationStyle};
use crate::block::{BlockId, EnginePalette};
use crate::noise::hash2;
use crate::structures::StructureIndex;
use crate::terrain::HeightSource;

const TREE_SEED: u32 = 411;
const FLOWER_SEED: u32 = 547;
const BEACON_SEED: u32 = 683;
const TRUNK_SEED: u32 = 751;
const REED_SEED: u32 = 829;
const ICE_SEED: u32 = 977;
const BASALT_SEED: u32 = 1057;

/// Columns this far from a trunk can still hold its leaves.
const CANOPY_REACH: i32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Flora {
    Timber,
    Flower,
    Reed,
    IceSpike,
    LeafShrub,
    BasaltSpike,
    Lantern,
}

pub fn select_flora(biome: &Biome, x: i32, z: i32, plaza_radius: f64) -> Option<Flora> {
    if biome.distance_to_center(f64::from(x), f64::from(z)) < plaza_radius {
        return None;
    }

    let seed = biome.seed();
    let (fx, fz) = (f64::from(x), f64::from(z));
    let tree = hash2(fx, fz, seed.wrapping_add(TREE_SEED));
    let flower = hash2(fx, fz, seed.wrapping_add(FLOWER_SEED));
    let beacon = hash2(fx, fz, seed.wrapping_add(BEACON_SEED));

    match biome.def.decoration {
        DecorationStyle::Meadow => {
            if tree > 0.998 {
                Some(Flora::Timber)
            } else if flower > 0.985 {
                // Florets split between flowers and reeds on the same channel.
                if (flower * 10.0).floor() as i64 & 1 == 0 {
                    Some(Flora::Flower)
                } else {
                    Some(Flora::Reed)
                }
            } else {
                None
            }
        }
        DecorationStyle::Desert => {
            if tree > 0.975 {
                Some(Flora::Reed)
            } else if beacon > 0.994 {
                Some(Flora::Lantern)
            } else {
                None
            }
        }
        DecorationStyle::Frost => {
            if tree > 0.965 {
                Some(Flora::IceSpike)
            } else if flower > 0.94 {
                Some(Flora::LeafShrub)
            } else {
                None
            }
        }
        DecorationStyle::Volcanic => {
            if tree > 0.965 {
                Some(Flora::BasaltSpike)
            } else if beacon > 0.993 {
                Some(Flora::Lantern)
            } else if flower > 0.93 {
                Some(Flora::Flower)
            } else {
                None
            }
        }
        DecorationStyle::Barren => None,
    }
}

fn feature_height(biome: &Biome, x: i32, z: i32, salt: u32, base: i32, spread: f64) -> i32 {
    let noise = hash2(f64::from(x), f64::from(z), biome.seed().wrapping_add(salt));
    base + (noise * spread).floor() as i32
}

pub fn trunk_height(biome: &Biome, x: i32, z: i32) -> i32 {
    feature_height(biome, x, z, TRUNK_SEED, 3, 3.0)
}

#[derive(Copy, Clone, Debug)]
pub struct Decorator<'a> {
    pub palette: &'a EnginePalette,
    pub scan_height: i32,
    pub plaza_radius: f64,
}

impl Decorator<'_> {
    /// Flora block at `pos`, given the surface height of its column. Only
    /// cells in `(terrain_height, terrain_height + scan_height]` that no
    /// structure occupies can hold flora.
    pub fn block_at<H: HeightSource + ?Sized>(
        &self,
        heights: &H,
        structures: &StructureIndex,
        biome: &Biome,
        pos: IVec3,
        terrain_height: i32,
    ) -> Option<BlockId> {
        let IVec3 { x, y, z } = pos;
        if y <= terrain_height || y > terrain_height + self.scan_height {
            return None;
        }
        if structures.contains(pos) {
            return None;
        }

        let base_y = terrain_height + 1;
        let flora = select_flora(biome, x, z, self.plaza_radius);
        let p = self.palette;

        if flora == Some(Flora::Timber) && y < base_y + trunk_height(biome, x, z) {
            return Some(p.timber);
        }

        if y >= base_y + 2 && y <= base_y + 7 && self.in_canopy(heights, biome, pos) {
            return Some(p.leaf);
        }

        match flora? {
            Flora::Timber => None,
            Flora::Reed => {
                let height = feature_height(biome, x, z, REED_SEED, 2, 3.0);
                (y < base_y + height).then_some(p.reed)
            }
            Flora::IceSpike => {
                let height = feature_height(biome, x, z, ICE_SEED, 3, 4.0);
                (y < base_y + height).then_some(p.ice)
            }
            Flora::BasaltSpike => {
                let height = feature_height(biome, x, z, BASALT_SEED, 2, 4.0);
                if y >= base_y + height {
                    None
                } else if y == base_y + height - 1 {
                    Some(p.obsidian)
                } else {
                    Some(p.basalt)
                }
            }
            Flora::Lantern => (y == base_y + 1).then_some(p.lantern),
            Flora::LeafShrub => (y == base_y).then_some(p.leaf),
            Flora::Flower => (y == base_y).then_some(p.flower),
        }
    }

    /// Leaves are placed relative to each nearby trunk's own column, so the
    /// same canopy is seen from every column it overhangs.
    fn in_canopy<H: HeightSource + ?Sized>(&self, heights: &H, biome: &Biome, pos: IVec3) -> bool {
        let IVec3 { x, y, z } = pos;
        for ax in x - CANOPY_REACH..=x + CANOPY_REACH {
            for az in z - CANOPY_REACH..=z + CANOPY_REACH {
                if select_flora(biome, ax, az, self.plaza_radius) != Some(Flora::Timber) {
                    continue;
                }

                let canopy_base = heights.height_in(ax, az, biome) + trunk_height(biome, ax, az);
                if y < canopy_base - 1 || y > canopy_base + 1 {
                    continue;
                }

                let radius = if y == canopy_base + 1 { 1.2 } else { 1.8 };
                if f64::from(x - ax).hypot(f64::from(z - az)) <= radius {
                    return true;
                }
            }
        }
        false
    }
}
