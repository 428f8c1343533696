pub mod biome;
pub mod block;
pub mod config;
pub mod coords;
pub mod decoration;
pub mod error;
pub mod noise;
pub mod structures;
pub mod terrain;
pub mod world;

pub use biome::{Biome, BiomeDef, BiomeId, BiomeTable};
pub use block::{BlockId, BlockProperties, BlockRegistry, EnginePalette};
pub use config::{RealmContent, WorldConfig};
pub use coords::{Face, WorldBounds};
pub use error::RealmError;
pub use structures::{StructureCell, StructureIndex};
pub use world::{
    BlockSample, BlockSource, ColumnTop, EditOverlay, LayerMask, MonumentDistance, World,
};
