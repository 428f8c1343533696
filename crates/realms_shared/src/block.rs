use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::RealmError;

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u16);

/// Physical and presentation flags for one block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockProperties {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_color")]
    pub color: String,
    pub solid: bool,
    #[serde(default)]
    pub transparent: bool,
    #[serde(default = "default_true")]
    pub breakable: bool,
    #[serde(default = "default_true")]
    pub placeable: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl BlockProperties {
    pub fn is_opaque(&self) -> bool {
        self.solid && !self.transparent
    }

    pub fn rgb(&self) -> Option<[u8; 3]> {
        let hex = self.color.strip_prefix('#').unwrap_or(&self.color);
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let value = u32::from_str_radix(&expanded, 16).ok()?;
        Some([(value >> 16) as u8, (value >> 8) as u8, value as u8])
    }
}

fn default_color() -> String {
    "#ff00ff".to_string()
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

#[derive(Default, Debug, Clone)]
pub struct BlockRegistry {
    properties: Vec<BlockProperties>,
    by_name: FxHashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    pub fn from_properties(list: Vec<BlockProperties>) -> Result<Self, RealmError> {
        let mut registry = Self::new();
        for props in list {
            if registry.by_name.contains_key(props.name.as_str()) {
                return Err(RealmError::DuplicateBlock(props.name));
            }
            registry.register(props);
        }
        Ok(registry)
    }

    pub fn register(&mut self, props: BlockProperties) -> BlockId {
        if let Some(existing) = self.by_name.get(props.name.as_str()) {
            return *existing;
        }

        // Content tables are tiny; running past u16 would be a content bug.
        let id = BlockId(self.properties.len().min(usize::from(u16::MAX)) as u16);

        self.by_name.insert(props.name.clone(), id);
        self.properties.push(props);
        id
    }

    pub fn get_properties(&self, id: BlockId) -> Option<&BlockProperties> {
        self.properties.get(usize::from(id.0))
    }

    pub fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: BlockId) -> &str {
        self.get_properties(id).map_or("unknown", |props| props.name.as_str())
    }

    pub fn is_solid(&self, id: BlockId) -> bool {
        self.get_properties(id).is_some_and(|props| props.solid)
    }

    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.get_properties(id).is_some_and(|props| props.transparent)
    }

    pub fn is_opaque(&self, id: BlockId) -> bool {
        self.get_properties(id).is_some_and(BlockProperties::is_opaque)
    }

    pub fn is_breakable(&self, id: BlockId) -> bool {
        self.get_properties(id).is_some_and(|props| props.breakable)
    }

    pub fn is_placeable(&self, id: BlockId) -> bool {
        self.get_properties(id).is_some_and(|props| props.placeable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &BlockProperties)> {
        self.properties
            .iter()
            .enumerate()
            .map(|(index, props)| (BlockId(index as u16), props))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

pub fn default_block_properties() -> Vec<BlockProperties> {
    fn block(
        name: &str,
        label: &str,
        color: &str,
        solid: bool,
        breakable: bool,
        placeable: bool,
    ) -> BlockProperties {
        BlockProperties {
            name: name.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            solid,
            transparent: false,
            breakable,
            placeable,
            opacity: 1.0,
        }
    }

    fn see_through(mut props: BlockProperties, opacity: f32) -> BlockProperties {
        props.transparent = true;
        props.opacity = opacity;
        props
    }

    vec![
        block("bedrock", "Bedrock", "#2d2d33", true, false, false),
        block("dirt", "Dirt", "#7f5a39", true, true, true),
        block("grass", "Grass", "#5fa048", true, true, true),
        block("stone", "Stone", "#80858f", true, true, true),
        block("sand", "Sand", "#d8c27a", true, true, true),
        block("sandstone", "Sandstone", "#c9ae73", true, true, true),
        block("marble", "Marble", "#e6e2d7", true, true, true),
        block("skara_earth", "Skara Earth", "#9d998e", true, true, true),
        block("skara_stone", "Skara Stone", "#8d939b", true, true, true),
        block("skara_hearth", "Skara Hearth Stone", "#c6c1b8", true, true, true),
        block("frost", "Frost Block", "#c2d7e7", true, true, true),
        see_through(block("ice", "Ice", "#a7d4f5", true, true, true), 0.72),
        block("basalt", "Basalt", "#3f434c", true, true, true),
        block("obsidian", "Obsidian", "#241f35", true, true, true),
        see_through(block("water", "Water", "#3a80c5", false, true, false), 0.72),
        see_through(
            block("aqueduct_water", "Aqueduct Water", "#6caed9", false, true, false),
            0.76,
        ),
        block("timber", "Timber", "#8f6c48", true, true, true),
        see_through(block("leaf", "Leaf Block", "#4f8a4c", false, true, true), 0.78),
        see_through(block("flower", "Flower", "#d26a8c", false, true, true), 0.9),
        see_through(block("reed", "Reed", "#86b760", false, true, true), 0.93),
        see_through(block("lantern", "Lantern", "#e5b860", false, true, false), 0.88),
        see_through(
            block("portal_core", "Portal Core", "#5ac8ff", false, false, false),
            0.62,
        ),
    ]
}

pub fn register_default_blocks() -> BlockRegistry {
    let mut registry = BlockRegistry::new();
    for props in default_block_properties() {
        registry.register(props);
    }
    registry
}

/// Block ids the engine writes on its own account (bedrock floor, portal
/// frames, monument masonry, flora), resolved by name once per world.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EnginePalette {
    pub bedrock: BlockId,
    pub dirt: BlockId,
    pub grass: BlockId,
    pub stone: BlockId,
    pub sand: BlockId,
    pub sandstone: BlockId,
    pub marble: BlockId,
    pub skara_earth: BlockId,
    pub skara_stone: BlockId,
    pub skara_hearth: BlockId,
    pub basalt: BlockId,
    pub obsidian: BlockId,
    pub water: BlockId,
    pub aqueduct_water: BlockId,
    pub timber: BlockId,
    pub leaf: BlockId,
    pub flower: BlockId,
    pub reed: BlockId,
    pub ice: BlockId,
    pub lantern: BlockId,
    pub portal_core: BlockId,
}

impl EnginePalette {
    pub fn resolve(registry: &BlockRegistry) -> Result<Self, RealmError> {
        let lookup = |name: &'static str| {
            registry
                .get_by_name(name)
                .ok_or(RealmError::MissingEngineBlock(name))
        };

        Ok(Self {
            bedrock: lookup("bedrock")?,
            dirt: lookup("dirt")?,
            grass: lookup("grass")?,
            stone: lookup("stone")?,
            sand: lookup("sand")?,
            sandstone: lookup("sandstone")?,
            marble: lookup("marble")?,
            skara_earth: lookup("skara_earth")?,
            skara_stone: lookup("skara_stone")?,
            skara_hearth: lookup("skara_hearth")?,
            basalt: lookup("basalt")?,
            obsidian: lookup("obsidian")?,
            water: lookup("water")?,
            aqueduct_water: lookup("aqueduct_water")?,
            timber: lookup("timber")?,
            leaf: lookup("leaf")?,
            flower: lookup("flower")?,
            reed: lookup("reed")?,
            ice: lookup("ice")?,
            lantern: lookup("lantern")?,
            portal_core: lookup("portal_core")?,
        })
    }

    /// Blocks the debug view files under the special layer wherever they appear.
    pub fn is_special(&self, block: BlockId) -> bool {
        block == self.lantern || block == self.portal_core
    }
}

#[cfg(test)]
mod tests {
    use super::{
        default_block_properties, register_default_blocks, BlockId, BlockProperties,
        BlockRegistry, EnginePalette,
    };
    use crate::error::RealmError;

    #[test]
    fn registry_contains_default_palette() {
        let registry = register_default_blocks();
        assert_eq!(registry.len(), 22);

        let bedrock = registry
            .get_by_name("bedrock")
            .expect("bedrock should be registered");
        assert_eq!(bedrock, BlockId(0));
        let bedrock_props = registry.get_properties(bedrock).expect("bedrock props");
        assert!(bedrock_props.solid);
        assert!(!bedrock_props.breakable);
        assert!(!bedrock_props.placeable);

        let portal_core = registry
            .get_by_name("portal_core")
            .expect("portal_core should be registered");
        assert!(!registry.is_solid(portal_core));
        assert!(!registry.is_breakable(portal_core));
        assert!(!registry.is_placeable(portal_core));
        assert!(registry.is_transparent(portal_core));

        let water = registry
            .get_by_name("water")
            .expect("water should be registered");
        assert!(!registry.is_solid(water));
        assert!(registry.is_breakable(water));
        assert!(!registry.is_placeable(water));
    }

    #[test]
    fn transparency_and_solidity_checks_match_default_blocks() {
        let registry = register_default_blocks();

        let stone = registry.get_by_name("stone").expect("stone missing");
        let ice = registry.get_by_name("ice").expect("ice missing");
        let leaf = registry.get_by_name("leaf").expect("leaf missing");

        assert!(registry.is_opaque(stone));
        assert!(registry.is_solid(ice));
        assert!(!registry.is_opaque(ice));
        assert!(!registry.is_solid(leaf));
        assert!(!registry.is_opaque(leaf));
        assert!(!registry.is_opaque(BlockId(999)));
        assert!(registry.get_properties(BlockId(999)).is_none());
    }

    #[test]
    fn register_is_idempotent_by_name() {
        let mut registry = BlockRegistry::new();
        let first = registry.register(default_block_properties().remove(0));
        let again = registry.register(default_block_properties().remove(0));
        assert_eq!(first, again);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn from_properties_rejects_duplicate_names() {
        let mut list = default_block_properties();
        list.push(list[3].clone());
        match BlockRegistry::from_properties(list) {
            Err(RealmError::DuplicateBlock(name)) => assert_eq!(name, "stone"),
            other => panic!("expected duplicate block error, got {other:?}"),
        }
    }

    #[test]
    fn palette_resolution_reports_missing_engine_blocks() {
        let list: Vec<BlockProperties> = default_block_properties()
            .into_iter()
            .filter(|props| props.name != "portal_core")
            .collect();
        let registry = BlockRegistry::from_properties(list).expect("registry");
        match EnginePalette::resolve(&registry) {
            Err(RealmError::MissingEngineBlock(name)) => assert_eq!(name, "portal_core"),
            other => panic!("expected missing engine block, got {other:?}"),
        }

        let palette = EnginePalette::resolve(&register_default_blocks()).expect("palette");
        assert!(palette.is_special(palette.lantern));
        assert!(palette.is_special(palette.portal_core));
        assert!(!palette.is_special(palette.stone));
    }

    #[test]
    fn colors_parse_as_rgb() {
        let registry = register_default_blocks();
        let grass = registry
            .get_properties(registry.get_by_name("grass").expect("grass"))
            .expect("grass props");
        assert_eq!(grass.rgb(), Some([0x5f, 0xa0, 0x48]));

        let mut short = grass.clone();
        short.color = "#abc".to_string();
        assert_eq!(short.rgb(), Some([0xaa, 0xbb, 0xcc]));
        short.color = "nope".to_string();
        assert_eq!(short.rgb(), None);
    }
}
