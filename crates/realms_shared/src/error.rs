use std::io;
use std::path::PathBuf;

/// Failures raised while loading content or constructing a [`crate::World`].
#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse realm content: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid world bounds: min_y {min_y} must be below max_y {max_y}")]
    InvalidBounds { min_y: i32, max_y: i32 },

    #[error("biome table is empty")]
    EmptyBiomeTable,

    #[error("duplicate biome id: {0}")]
    DuplicateBiome(String),

    #[error("duplicate block name: {0}")]
    DuplicateBlock(String),

    #[error("biome {biome} references unknown block {block}")]
    UnknownBlock { biome: String, block: String },

    #[error("block registry is missing engine block {0}")]
    MissingEngineBlock(&'static str),

    #[error("biome {biome} has a portal to unknown biome {target}")]
    DanglingPortal { biome: String, target: String },

    #[error("biome {0} has a portal leading back to itself")]
    SelfPortal(String),
}
