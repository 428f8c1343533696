use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::biome::{default_biomes, BiomeDef};
use crate::block::{default_block_properties, BlockProperties};
use crate::coords::WorldBounds;
use crate::error::RealmError;

const MIN_SCAN_HEIGHT: i32 = 1;
const MAX_SCAN_HEIGHT: i32 = 32;
const MIN_SPAWN_CLEARANCE: f32 = 1.0;
const MAX_SPAWN_CLEARANCE: f32 = 8.0;
const MIN_CENTER_LIFT_RADIUS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    #[serde(default = "default_max_y")]
    pub max_y: i32,
    #[serde(default = "default_decoration_scan_height")]
    pub decoration_scan_height: i32,
    /// Height above the terrain at which a fresh spawn places the feet.
    #[serde(default = "default_spawn_clearance")]
    pub spawn_clearance: f32,
    #[serde(default = "default_plaza_clear_radius")]
    pub plaza_clear_radius: f64,
    #[serde(default = "default_center_lift_radius")]
    pub center_lift_radius: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_y: default_min_y(),
            max_y: default_max_y(),
            decoration_scan_height: default_decoration_scan_height(),
            spawn_clearance: default_spawn_clearance(),
            plaza_clear_radius: default_plaza_clear_radius(),
            center_lift_radius: default_center_lift_radius(),
        }
    }
}

impl WorldConfig {
    /// Clamps tunables into usable ranges. Bounds are left alone; inverted
    /// bounds are rejected when the world is built.
    pub fn sanitize(mut self) -> Self {
        self.decoration_scan_height = self
            .decoration_scan_height
            .clamp(MIN_SCAN_HEIGHT, MAX_SCAN_HEIGHT);
        self.spawn_clearance = self
            .spawn_clearance
            .clamp(MIN_SPAWN_CLEARANCE, MAX_SPAWN_CLEARANCE);
        self.plaza_clear_radius = self.plaza_clear_radius.max(0.0);
        self.center_lift_radius = self.center_lift_radius.max(MIN_CENTER_LIFT_RADIUS);
        self
    }

    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.min_y, self.max_y)
    }

    pub fn validated_bounds(&self) -> Result<WorldBounds, RealmError> {
        if self.min_y >= self.max_y {
            return Err(RealmError::InvalidBounds {
                min_y: self.min_y,
                max_y: self.max_y,
            });
        }
        Ok(self.bounds())
    }

    pub fn load(path: &Path) -> Result<Self, RealmError> {
        let contents = read(path)?;
        let parsed = toml::from_str::<Self>(&contents)?;
        Ok(parsed.sanitize())
    }
}

fn default_min_y() -> i32 {
    0
}

fn default_max_y() -> i32 {
    56
}

fn default_decoration_scan_height() -> i32 {
    8
}

fn default_spawn_clearance() -> f32 {
    2.1
}

fn default_plaza_clear_radius() -> f64 {
    34.0
}

fn default_center_lift_radius() -> f64 {
    82.0
}

/// Everything a world is built from: tunables, block palette and biomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmContent {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default = "default_block_properties")]
    pub blocks: Vec<BlockProperties>,
    #[serde(default = "default_biomes")]
    pub biomes: Vec<BiomeDef>,
}

impl Default for RealmContent {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            blocks: default_block_properties(),
            biomes: default_biomes(),
        }
    }
}

impl RealmContent {
    pub fn from_toml_str(contents: &str) -> Result<Self, RealmError> {
        let mut parsed = toml::from_str::<Self>(contents)?;
        parsed.world = parsed.world.sanitize();
        Ok(parsed)
    }

    pub fn load(path: &Path) -> Result<Self, RealmError> {
        Self::from_toml_str(&read(path)?)
    }
}

fn read(path: &Path) -> Result<String, RealmError> {
    fs::read_to_string(path).map_err(|source| RealmError::Io {
        path: path.to_path_buf(),
        source,
    })
}
