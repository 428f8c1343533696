use glam::IVec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::block::{BlockId, BlockRegistry};
use crate::error::RealmError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BiomeId(pub u16);

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainProfile {
    pub base: f64,
    pub amplitude: f64,
    pub detail_amp: f64,
    pub ridge_amp: f64,
    /// Horizontal noise frequency.
    pub scale: f64,
    pub center_lift: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OreVein {
    pub block: String,
    /// `hash3` values above this become ore.
    pub threshold: f64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationStyle {
    #[default]
    Meadow,
    Desert,
    Frost,
    Volcanic,
    Barren,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonumentKind {
    StoneRing,
    Arena,
    Aqueduct,
    HutSettlement,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeDef {
    pub id: String,
    pub name: String,
    pub monument_name: String,
    pub center: [i32; 2],
    pub seed: u32,
    pub terrain: TerrainProfile,
    #[serde(default)]
    pub water_level: i32,
    pub top_block: String,
    pub filler_block: String,
    pub deep_block: String,
    #[serde(default)]
    pub water_surface_block: Option<String>,
    #[serde(default)]
    pub ore: Option<OreVein>,
    #[serde(default)]
    pub decoration: DecorationStyle,
    pub monument: MonumentKind,
    pub portal_to: String,
    pub portal_offset: [i32; 2],
    #[serde(default)]
    pub sky_color: String,
    #[serde(default)]
    pub fog_color: String,
}

#[derive(Clone, Debug)]
pub struct Biome {
    pub id: BiomeId,
    pub def: BiomeDef,
    pub top_block: BlockId,
    pub filler_block: BlockId,
    pub deep_block: BlockId,
    pub water_surface_block: Option<BlockId>,
    pub ore: Option<(BlockId, f64)>,
    pub portal_target: BiomeId,
}

impl Biome {
    pub fn key(&self) -> &str {
        &self.def.id
    }

    pub fn center(&self) -> IVec2 {
        IVec2::new(self.def.center[0], self.def.center[1])
    }

    pub fn portal_offset(&self) -> IVec2 {
        IVec2::new(self.def.portal_offset[0], self.def.portal_offset[1])
    }

    pub fn portal_anchor(&self) -> IVec2 {
        self.center() + self.portal_offset()
    }

    pub fn seed(&self) -> u32 {
        self.def.seed
    }

    pub fn water_level(&self) -> i32 {
        self.def.water_level
    }

    pub fn distance_sq_to_center(&self, x: f64, z: f64) -> f64 {
        let dx = x - f64::from(self.def.center[0]);
        let dz = z - f64::from(self.def.center[1]);
        dx * dx + dz * dz
    }

    pub fn distance_to_center(&self, x: f64, z: f64) -> f64 {
        self.distance_sq_to_center(x, z).sqrt()
    }
}

#[derive(Clone, Debug)]
pub struct BiomeTable {
    biomes: Vec<Biome>,
    by_key: FxHashMap<String, BiomeId>,
}

impl BiomeTable {
    /// Fails on an empty table, repeated ids, unknown block names and portals
    /// that lead nowhere or back into the same biome.
    pub fn new(defs: Vec<BiomeDef>, registry: &BlockRegistry) -> Result<Self, RealmError> {
        if defs.is_empty() {
            return Err(RealmError::EmptyBiomeTable);
        }

        let mut by_key = FxHashMap::default();
        for (index, def) in defs.iter().enumerate() {
            if by_key
                .insert(def.id.clone(), BiomeId(index as u16))
                .is_some()
            {
                return Err(RealmError::DuplicateBiome(def.id.clone()));
            }
        }

        let mut biomes = Vec::with_capacity(defs.len());
        for (index, def) in defs.into_iter().enumerate() {
            let resolve = |name: &str| {
                registry
                    .get_by_name(name)
                    .ok_or_else(|| RealmError::UnknownBlock {
                        biome: def.id.clone(),
                        block: name.to_string(),
                    })
            };

            let top_block = resolve(&def.top_block)?;
            let filler_block = resolve(&def.filler_block)?;
            let deep_block = resolve(&def.deep_block)?;
            let water_surface_block = def
                .water_surface_block
                .as_deref()
                .map(resolve)
                .transpose()?;
            let ore = def
                .ore
                .as_ref()
                .map(|vein| resolve(&vein.block).map(|block| (block, vein.threshold)))
                .transpose()?;

            let Some(&portal_target) = by_key.get(def.portal_to.as_str()) else {
                return Err(RealmError::DanglingPortal {
                    biome: def.id.clone(),
                    target: def.portal_to.clone(),
                });
            };
            if portal_target.0 as usize == index {
                return Err(RealmError::SelfPortal(def.id.clone()));
            }

            biomes.push(Biome {
                id: BiomeId(index as u16),
                top_block,
                filler_block,
                deep_block,
                water_surface_block,
                ore,
                portal_target,
                def,
            });
        }

        Ok(Self { biomes, by_key })
    }

    pub fn get(&self, id: BiomeId) -> Option<&Biome> {
        self.biomes.get(usize::from(id.0))
    }

    pub fn get_by_key(&self, key: &str) -> Option<&Biome> {
        self.by_key.get(key).and_then(|id| self.get(*id))
    }

    /// The first registered biome; used as the fallback for unknown ids.
    pub fn primary(&self) -> &Biome {
        // Construction rejects empty tables.
        &self.biomes[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Biome> {
        self.biomes.iter()
    }

    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}

pub fn default_biomes() -> Vec<BiomeDef> {
    vec![
        BiomeDef {
            id: "ring-plains".to_string(),
            name: "Ring Plains".to_string(),
            monument_name: "Ancient Stone Ring".to_string(),
            center: [0, 0],
            seed: 11,
            terrain: TerrainProfile {
                base: 10.0,
                amplitude: 4.2,
                detail_amp: 1.8,
                ridge_amp: 1.2,
                scale: 0.018,
                center_lift: 2.3,
            },
            water_level: 9,
            top_block: "grass".to_string(),
            filler_block: "dirt".to_string(),
            deep_block: "stone".to_string(),
            water_surface_block: None,
            ore: None,
            decoration: DecorationStyle::Meadow,
            monument: MonumentKind::StoneRing,
            portal_to: "dune-pyramid".to_string(),
            portal_offset: [12, -2],
            sky_color: "#9dc7f0".to_string(),
            fog_color: "#6ea0ca".to_string(),
        },
        BiomeDef {
            id: "dune-pyramid".to_string(),
            name: "Dune Pyramid".to_string(),
            monument_name: "Sun Pyramid".to_string(),
            center: [220, 12],
            seed: 23,
            terrain: TerrainProfile {
                base: 11.0,
                amplitude: 3.4,
                detail_amp: 2.2,
                ridge_amp: 1.4,
                scale: 0.017,
                center_lift: 1.5,
            },
            water_level: 0,
            top_block: "sand".to_string(),
            filler_block: "sandstone".to_string(),
            deep_block: "stone".to_string(),
            water_surface_block: None,
            ore: None,
            decoration: DecorationStyle::Desert,
            monument: MonumentKind::Arena,
            portal_to: "frost-citadel".to_string(),
            portal_offset: [-10, 8],
            sky_color: "#f0cb95".to_string(),
            fog_color: "#d9a367".to_string(),
        },
        BiomeDef {
            id: "frost-citadel".to_string(),
            name: "Frost Citadel".to_string(),
            monument_name: "Glacial Bastion".to_string(),
            center: [-208, 180],
            seed: 37,
            terrain: TerrainProfile {
                base: 13.0,
                amplitude: 5.0,
                detail_amp: 2.0,
                ridge_amp: 1.8,
                scale: 0.016,
                center_lift: 2.7,
            },
            water_level: 11,
            top_block: "frost".to_string(),
            filler_block: "stone".to_string(),
            deep_block: "stone".to_string(),
            water_surface_block: Some("ice".to_string()),
            ore: None,
            decoration: DecorationStyle::Frost,
            monument: MonumentKind::HutSettlement,
            portal_to: "ember-terrace".to_string(),
            portal_offset: [8, 11],
            sky_color: "#b3d7ef".to_string(),
            fog_color: "#88b4d6".to_string(),
        },
        BiomeDef {
            id: "ember-terrace".to_string(),
            name: "Ember Terrace".to_string(),
            monument_name: "Basalt Ziggurat".to_string(),
            center: [-226, -164],
            seed: 47,
            terrain: TerrainProfile {
                base: 12.0,
                amplitude: 4.6,
                detail_amp: 2.5,
                ridge_amp: 1.5,
                scale: 0.02,
                center_lift: 2.0,
            },
            water_level: 0,
            top_block: "basalt".to_string(),
            filler_block: "obsidian".to_string(),
            deep_block: "stone".to_string(),
            water_surface_block: None,
            ore: Some(OreVein {
                block: "obsidian".to_string(),
                threshold: 0.83,
            }),
            decoration: DecorationStyle::Volcanic,
            monument: MonumentKind::Aqueduct,
            portal_to: "ring-plains".to_string(),
            portal_offset: [-11, -6],
            sky_color: "#b4866f".to_string(),
            fog_color: "#7f5d50".to_string(),
        },
    ]
}
