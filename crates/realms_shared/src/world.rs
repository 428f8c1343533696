use bitflags::bitflags;
use glam::{IVec3, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

use crate::biome::{Biome, BiomeId, BiomeTable};
use crate::block::{BlockId, BlockRegistry, EnginePalette};
use crate::config::{RealmContent, WorldConfig};
use crate::coords::{Face, WorldBounds};
use crate::decoration::Decorator;
use crate::error::RealmError;
use crate::noise::hash3;
use crate::structures::{build_structures, StructureIndex};
use crate::terrain::{HeightSource, Terrain};

const ORE_SEED: u32 = 301;
const SPAWN_OFFSET: i32 = 2;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct LayerMask: u8 {
        const TERRAIN = 1 << 0;
        const FLORA = 1 << 1;
        const MONUMENT = 1 << 2;
        const PORTAL = 1 << 3;
        const SPECIAL = 1 << 4;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockSource {
    Terrain,
    Flora,
    Monument,
    Portal,
    Special,
    Edit,
}

impl BlockSource {
    pub fn layer(self) -> LayerMask {
        match self {
            BlockSource::Terrain | BlockSource::Edit => LayerMask::TERRAIN,
            BlockSource::Flora => LayerMask::FLORA,
            BlockSource::Monument => LayerMask::MONUMENT,
            BlockSource::Portal => LayerMask::PORTAL,
            BlockSource::Special => LayerMask::SPECIAL,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockSample {
    pub block: BlockId,
    pub source: BlockSource,
    pub portal_to: Option<BiomeId>,
}

impl BlockSample {
    fn plain(block: BlockId, source: BlockSource) -> Self {
        Self {
            block,
            source,
            portal_to: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColumnTop {
    pub y: i32,
    pub sample: BlockSample,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonumentDistance {
    pub biome: BiomeId,
    pub biome_name: String,
    pub monument_name: String,
    pub distance: f64,
}

/// Player edits layered over generated content. A coordinate is never both
/// added and removed.
#[derive(Clone, Debug, Default)]
pub struct EditOverlay {
    added: FxHashMap<IVec3, BlockId>,
    removed: FxHashSet<IVec3>,
}

impl EditOverlay {
    pub fn set(&mut self, pos: IVec3, block: BlockId) {
        self.removed.remove(&pos);
        self.added.insert(pos, block);
    }

    /// Undoes a placed block if there is one, otherwise masks the generated
    /// block underneath.
    pub fn remove(&mut self, pos: IVec3) {
        if self.added.remove(&pos).is_some() {
            return;
        }
        self.removed.insert(pos);
    }

    pub fn added(&self, pos: IVec3) -> Option<BlockId> {
        self.added.get(&pos).copied()
    }

    pub fn is_removed(&self, pos: IVec3) -> bool {
        self.removed.contains(&pos)
    }

    pub fn added_len(&self) -> usize {
        self.added.len()
    }

    pub fn removed_len(&self) -> usize {
        self.removed.len()
    }
}

#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    registry: BlockRegistry,
    palette: EnginePalette,
    terrain: Terrain,
    structures: StructureIndex,
    edits: EditOverlay,
}

impl World {
    pub fn new(content: RealmContent) -> Result<Self, RealmError> {
        let config = content.world.sanitize();
        let bounds = config.validated_bounds()?;
        let registry = BlockRegistry::from_properties(content.blocks)?;
        let palette = EnginePalette::resolve(&registry)?;
        let biomes = BiomeTable::new(content.biomes, &registry)?;
        let terrain = Terrain::new(biomes, bounds, config.center_lift_radius);
        let structures = build_structures(terrain.biomes(), &terrain, &palette, bounds);

        info!(
            "Built realm: {} biomes, {} blocks, {} structure cells across {} columns",
            terrain.biomes().len(),
            registry.len(),
            structures.len(),
            structures.column_count()
        );

        Ok(Self {
            config,
            registry,
            palette,
            terrain,
            structures,
            edits: EditOverlay::default(),
        })
    }

    pub fn with_default_content() -> Result<Self, RealmError> {
        Self::new(RealmContent::default())
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn palette(&self) -> &EnginePalette {
        &self.palette
    }

    pub fn biomes(&self) -> &BiomeTable {
        self.terrain.biomes()
    }

    pub fn bounds(&self) -> WorldBounds {
        self.terrain.bounds()
    }

    pub fn structures(&self) -> &StructureIndex {
        &self.structures
    }

    pub fn edits(&self) -> &EditOverlay {
        &self.edits
    }

    pub fn biome_at(&self, x: i32, z: i32) -> &Biome {
        self.terrain.biome_at(x, z)
    }

    pub fn terrain_height(&self, x: i32, z: i32) -> i32 {
        self.terrain.height(x, z)
    }

    pub fn terrain_height_in(&self, x: i32, z: i32, biome: &Biome) -> i32 {
        self.terrain.height_in(x, z, biome)
    }

    pub fn is_valid_block(&self, block: BlockId) -> bool {
        usize::from(block.0) < self.registry.len()
    }

    fn decorator(&self) -> Decorator<'_> {
        Decorator {
            palette: &self.palette,
            scan_height: self.config.decoration_scan_height,
            plaza_radius: self.config.plaza_clear_radius,
        }
    }

    pub fn block_sample_at(&self, pos: IVec3) -> Option<BlockSample> {
        if !self.bounds().contains(pos.y) {
            return None;
        }

        if let Some(block) = self.edits.added(pos) {
            let source = if self.palette.is_special(block) {
                BlockSource::Special
            } else {
                BlockSource::Edit
            };
            return Some(BlockSample::plain(block, source));
        }

        if self.edits.is_removed(pos) {
            return None;
        }

        if let Some(cell) = self.structures.cell(pos) {
            let source = if cell.portal_to.is_some() {
                BlockSource::Portal
            } else if self.palette.is_special(cell.block) {
                BlockSource::Special
            } else {
                BlockSource::Monument
            };
            return Some(BlockSample {
                block: cell.block,
                source,
                portal_to: cell.portal_to,
            });
        }

        let biome = self.terrain.biome_at(pos.x, pos.z);
        let height = self.terrain.height_in(pos.x, pos.z, biome);

        if let Some(block) = self
            .decorator()
            .block_at(&self.terrain, &self.structures, biome, pos, height)
        {
            let source = if block == self.palette.lantern {
                BlockSource::Special
            } else {
                BlockSource::Flora
            };
            return Some(BlockSample::plain(block, source));
        }

        self.terrain_block_at(pos, biome, height)
            .map(|block| BlockSample::plain(block, BlockSource::Terrain))
    }

    pub fn block_at(&self, pos: IVec3) -> Option<BlockId> {
        self.block_sample_at(pos).map(|sample| sample.block)
    }

    fn terrain_block_at(&self, pos: IVec3, biome: &Biome, height: i32) -> Option<BlockId> {
        let IVec3 { x, y, z } = pos;
        if y == self.bounds().min_y {
            return Some(self.palette.bedrock);
        }

        if y > height {
            let water_level = biome.water_level();
            if water_level > 0 && y <= water_level {
                if y == water_level {
                    if let Some(surface) = biome.water_surface_block {
                        return Some(surface);
                    }
                }
                return Some(self.palette.water);
            }
            return None;
        }

        if y == height {
            return Some(biome.top_block);
        }
        if y >= height - 2 {
            return Some(biome.filler_block);
        }

        if let Some((ore, threshold)) = biome.ore {
            let noise = hash3(
                f64::from(x),
                f64::from(y),
                f64::from(z),
                biome.seed().wrapping_add(ORE_SEED),
            );
            if noise > threshold {
                return Some(ore);
            }
        }
        Some(biome.deep_block)
    }

    pub fn is_solid_for_collision(&self, block: Option<BlockId>) -> bool {
        block.is_some_and(|block| self.registry.is_solid(block))
    }

    pub fn is_opaque_block(&self, block: Option<BlockId>) -> bool {
        block.is_some_and(|block| self.registry.is_opaque(block))
    }

    /// Whether any face of `block` at `pos` is visible. Transparent blocks
    /// hide faces only against the same block type; opaque blocks hide faces
    /// against any opaque neighbor.
    pub fn should_render_block(&self, pos: IVec3, block: BlockId) -> bool {
        let Some(props) = self.registry.get_properties(block) else {
            return false;
        };

        Face::ALL.iter().any(|face| {
            let Some(neighbor) = self.block_at(face.neighbor_of(pos)) else {
                return true;
            };
            if props.transparent {
                neighbor != block
            } else {
                !self.registry.is_opaque(neighbor)
            }
        })
    }

    pub fn column_render_max_y(&self, x: i32, z: i32) -> i32 {
        let biome = self.terrain.biome_at(x, z);
        let terrain_top = self.terrain.height_in(x, z, biome);
        let structure_top = self
            .structures
            .column_max_y(x, z)
            .map_or(self.bounds().min_y, |top| top + 1);

        (terrain_top + self.config.decoration_scan_height)
            .max(biome.water_level() + 1)
            .max(structure_top)
    }

    pub fn top_block_for_layers(&self, x: i32, z: i32, layers: LayerMask) -> Option<ColumnTop> {
        let bounds = self.bounds();
        let max_y = bounds.max_y.min(self.column_render_max_y(x, z));

        (bounds.min_y..=max_y).rev().find_map(|y| {
            let sample = self.block_sample_at(IVec3::new(x, y, z))?;
            layers
                .intersects(sample.source.layer())
                .then_some(ColumnTop { y, sample })
        })
    }

    pub fn portal_target_at(&self, pos: IVec3) -> Option<BiomeId> {
        self.structures.cell(pos).and_then(|cell| cell.portal_to)
    }

    /// True for structure cells stamped as protected. Edits do not change it;
    /// callers must refuse to break or replace such cells.
    pub fn is_protected_block(&self, pos: IVec3) -> bool {
        self.structures.cell(pos).is_some_and(|cell| cell.protected)
    }

    fn biome_or_primary(&self, biome: BiomeId) -> &Biome {
        match self.biomes().get(biome) {
            Some(found) => found,
            None => {
                let primary = self.biomes().primary();
                warn!(
                    "Unknown biome {:?}, spawning in {} instead",
                    biome,
                    primary.key()
                );
                primary
            }
        }
    }

    pub fn find_spawn_position(&self, biome: BiomeId) -> Vec3 {
        let biome = self.biome_or_primary(biome);
        let center = biome.center();
        let x = center.x + SPAWN_OFFSET;
        let z = center.y + SPAWN_OFFSET;
        let ground = self.terrain.height_in(x, z, biome);

        Vec3::new(
            x as f32 + 0.5,
            ground as f32 + self.config.spawn_clearance,
            z as f32 + 0.5,
        )
    }

    pub fn portal_arrival(&self, biome: BiomeId) -> Vec3 {
        match self.structures.arrival(biome) {
            Some(arrival) => arrival,
            None => {
                warn!("No portal arrival recorded for {:?}, using spawn", biome);
                self.find_spawn_position(biome)
            }
        }
    }

    pub fn monument_distances(&self, x: f64, z: f64) -> Vec<MonumentDistance> {
        let mut distances: Vec<MonumentDistance> = self
            .biomes()
            .iter()
            .map(|biome| MonumentDistance {
                biome: biome.id,
                biome_name: biome.def.name.clone(),
                monument_name: biome.def.monument_name.clone(),
                distance: biome.distance_to_center(x, z),
            })
            .collect();
        distances.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        distances
    }

    pub fn remove_block(&mut self, pos: IVec3) {
        self.edits.remove(pos);
    }

    pub fn set_block(&mut self, pos: IVec3, block: BlockId) {
        self.edits.set(pos, block);
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use super::{BlockSource, LayerMask, World};
    use crate::biome::{BiomeId, DecorationStyle, OreVein};
    use crate::block::BlockId;
    use crate::config::RealmContent;
    use crate::decoration::{select_flora, Flora};
    use crate::error::RealmError;

    fn world() -> World {
        World::with_default_content().expect("default world")
    }

    fn stone(world: &World) -> BlockId {
        world.palette().stone
    }

    /// A cell with empty air in every direction for a few blocks.
    fn open_sky(world: &World) -> IVec3 {
        let (x, z) = (1_500, -1_300);
        let mut floor = 0;
        for dx in -3..=3 {
            for dz in -3..=3 {
                floor = floor.max(world.column_render_max_y(x + dx, z + dz));
            }
        }
        let y = floor + 4;
        assert!(y + 4 <= world.bounds().max_y, "no open sky at ({x}, {z})");
        IVec3::new(x, y, z)
    }

    #[test]
    fn center_belongs_to_the_first_biome() {
        let world = world();
        assert_eq!(world.biome_at(0, 0).key(), "ring-plains");
        let ring = world.biomes().get_by_key("ring-plains").expect("ring plains");
        let first = world.terrain_height_in(0, 0, ring);
        assert_eq!(first, world.terrain_height_in(0, 0, ring));
        assert!((3..=52).contains(&first));
    }

    #[test]
    fn floor_is_bedrock_everywhere() {
        let world = world();
        for x in (-400..=400).step_by(37) {
            for z in (-400..=400).step_by(41) {
                let sample = world
                    .block_sample_at(IVec3::new(x, 0, z))
                    .expect("bedrock sample");
                assert_eq!(sample.block, world.palette().bedrock);
                assert_eq!(sample.source, BlockSource::Terrain);
            }
        }
    }

    #[test]
    fn nothing_exists_outside_vertical_bounds() {
        let mut world = world();
        let below = IVec3::new(3, -1, 3);
        let above = IVec3::new(3, 57, 3);
        world.set_block(above, stone(&world));
        assert_eq!(world.block_sample_at(below), None);
        assert_eq!(world.block_sample_at(above), None);
    }

    #[test]
    fn ring_portal_leads_to_the_dunes() {
        let world = world();
        let ring = world.biomes().get_by_key("ring-plains").expect("ring plains");
        let dune = world.biomes().get_by_key("dune-pyramid").expect("dune pyramid");
        let anchor = ring.portal_anchor();
        let base_y = world.terrain_height_in(anchor.x, anchor.y, ring) + 1;
        let mid = IVec3::new(anchor.x, base_y + 3, anchor.y);

        assert_eq!(world.portal_target_at(mid), Some(dune.id));
        let sample = world.block_sample_at(mid).expect("portal core");
        assert_eq!(sample.block, world.palette().portal_core);
        assert_eq!(sample.source, BlockSource::Portal);
        assert_eq!(sample.portal_to, Some(dune.id));
        assert!(world.is_protected_block(mid));
    }

    #[test]
    fn set_then_remove_restores_generated_cell() {
        let mut world = world();
        let pos = IVec3::new(10, 20, 10);
        let before = world.block_sample_at(pos);

        world.set_block(pos, stone(&world));
        assert_eq!(world.block_at(pos), Some(stone(&world)));
        assert_eq!(
            world.block_sample_at(pos).map(|s| s.source),
            Some(BlockSource::Edit)
        );

        world.remove_block(pos);
        assert_eq!(world.block_sample_at(pos), before);
        assert_eq!(world.edits().added_len(), 0);
        assert_eq!(world.edits().removed_len(), 0);
    }

    #[test]
    fn placing_in_open_air_and_removing_leaves_air() {
        let mut world = world();
        let pos = open_sky(&world);
        assert_eq!(world.block_at(pos), None);

        world.set_block(pos, stone(&world));
        world.remove_block(pos);
        assert_eq!(world.block_sample_at(pos), None);
    }

    #[test]
    fn removal_masks_terrain_and_is_idempotent() {
        let mut world = world();
        let pos = IVec3::new(700, 1, -40);
        assert!(world.block_at(pos).is_some());

        for _ in 0..3 {
            world.remove_block(pos);
            assert_eq!(world.block_sample_at(pos), None);
        }
        assert_eq!(world.edits().removed_len(), 1);

        world.set_block(pos, world.palette().marble);
        assert_eq!(world.block_at(pos), Some(world.palette().marble));
        assert_eq!(world.edits().removed_len(), 0);
    }

    #[test]
    fn special_blocks_placed_by_players_stay_special() {
        let mut world = world();
        let pos = open_sky(&world);
        world.set_block(pos, world.palette().lantern);
        let sample = world.block_sample_at(pos).expect("lantern");
        assert_eq!(sample.source, BlockSource::Special);
        assert_eq!(sample.source.layer(), LayerMask::SPECIAL);
        assert_eq!(BlockSource::Edit.layer(), LayerMask::TERRAIN);
    }

    #[test]
    fn enclosed_opaque_block_is_culled() {
        let mut world = world();
        let center = open_sky(&world);
        let stone = stone(&world);

        world.set_block(center, stone);
        assert!(world.should_render_block(center, stone));

        for face in crate::coords::Face::ALL {
            world.set_block(face.neighbor_of(center), stone);
        }
        assert!(!world.should_render_block(center, stone));

        // A transparent neighbor exposes the face again.
        world.set_block(center + IVec3::Y, world.palette().water);
        assert!(world.should_render_block(center, stone));

        world.remove_block(center + IVec3::Y);
        assert!(world.should_render_block(center, stone));
    }

    #[test]
    fn matching_transparent_neighbors_hide_shared_faces() {
        let mut world = world();
        let center = open_sky(&world);
        let ice = world.palette().ice;

        world.set_block(center, ice);
        for face in crate::coords::Face::ALL {
            world.set_block(face.neighbor_of(center), ice);
        }
        assert!(!world.should_render_block(center, ice));

        // Against a different block type a transparent face still shows.
        world.set_block(center + IVec3::X, stone(&world));
        assert!(world.should_render_block(center, ice));
    }

    #[test]
    fn unknown_blocks_never_render() {
        let world = world();
        assert!(!world.should_render_block(open_sky(&world), BlockId(999)));
        assert!(!world.is_valid_block(BlockId(999)));
        assert!(!world.is_solid_for_collision(Some(BlockId(999))));
    }

    #[test]
    fn collision_and_opacity_follow_block_flags() {
        let world = world();
        let palette = *world.palette();
        assert!(world.is_solid_for_collision(Some(palette.stone)));
        assert!(world.is_solid_for_collision(Some(palette.ice)));
        assert!(!world.is_solid_for_collision(Some(palette.water)));
        assert!(!world.is_solid_for_collision(None));

        assert!(world.is_opaque_block(Some(palette.stone)));
        assert!(!world.is_opaque_block(Some(palette.ice)));
        assert!(!world.is_opaque_block(Some(palette.portal_core)));
        assert!(!world.is_opaque_block(None));
    }

    #[test]
    fn every_portal_core_is_protected_and_stays_so() {
        let mut world = world();
        let cores: Vec<IVec3> = world
            .structures()
            .iter()
            .filter(|(_, cell)| cell.portal_to.is_some())
            .map(|(pos, _)| pos)
            .collect();
        assert_eq!(cores.len(), 3 * world.biomes().len());

        for pos in &cores {
            world.remove_block(*pos);
        }
        for pos in cores {
            assert!(world.is_protected_block(pos));
        }
        assert!(!world.is_protected_block(IVec3::new(4_000, 10, 4_000)));
    }

    #[test]
    fn every_portal_lands_inside_the_world() {
        let world = world();
        let bounds = world.bounds();
        for biome in world.biomes().iter() {
            let target = world.biomes().get(biome.portal_target).expect("portal target");
            assert_ne!(target.id, biome.id);

            let arrival = world.portal_arrival(target.id);
            assert!(arrival.y > bounds.min_y as f32);
            assert!(arrival.y < bounds.max_y as f32);
            let feet = arrival.floor().as_ivec3();
            assert_eq!(world.biome_at(feet.x, feet.z).id, target.id);

            // Feet are in the air, the block below carries them.
            assert!(!world.is_solid_for_collision(world.block_at(feet)));
            assert!(world.is_solid_for_collision(world.block_at(feet - IVec3::Y)));
        }
    }

    #[test]
    fn spawn_sits_above_the_ground_near_the_center() {
        let world = world();
        let ring = world.biomes().primary();
        let spawn = world.find_spawn_position(ring.id);
        let ground = world.terrain_height_in(2, 2, ring);
        assert_eq!(spawn.x, 2.5);
        assert_eq!(spawn.z, 2.5);
        assert!((spawn.y - (ground as f32 + 2.1)).abs() < 1e-4);

        assert_eq!(world.find_spawn_position(BiomeId(77)), spawn);
        assert_eq!(world.portal_arrival(BiomeId(77)), spawn);
    }

    #[test]
    fn monument_distances_are_sorted_from_the_query_point() {
        let world = world();
        let from_origin = world.monument_distances(0.0, 0.0);
        assert_eq!(from_origin.len(), 4);
        assert_eq!(from_origin[0].biome_name, "Ring Plains");
        assert_eq!(from_origin[0].distance, 0.0);
        assert!(from_origin.windows(2).all(|w| w[0].distance <= w[1].distance));

        let from_dunes = world.monument_distances(220.0, 12.0);
        assert_eq!(from_dunes[0].biome_name, "Dune Pyramid");
    }

    #[test]
    fn column_queries_respect_layer_masks() {
        let world = world();
        let ring = world.biomes().primary();
        let anchor = ring.portal_anchor();
        let ground = world.terrain_height_in(anchor.x, anchor.y, ring);

        let portal = world
            .top_block_for_layers(anchor.x, anchor.y, LayerMask::PORTAL)
            .expect("portal layer");
        assert_eq!(portal.y, ground + 5);
        assert_eq!(portal.sample.source, BlockSource::Portal);

        let frame = world
            .top_block_for_layers(anchor.x, anchor.y, LayerMask::MONUMENT)
            .expect("monument layer");
        assert_eq!(frame.y, ground + 6);
        assert_eq!(frame.sample.block, world.palette().obsidian);

        let terrain = world
            .top_block_for_layers(anchor.x, anchor.y, LayerMask::TERRAIN)
            .expect("terrain layer");
        assert_eq!(terrain.sample.source, BlockSource::Terrain);
        assert!(terrain.y < frame.y);

        assert!(world.column_render_max_y(anchor.x, anchor.y) >= ground + 7);
        assert_eq!(
            world.top_block_for_layers(anchor.x, anchor.y, LayerMask::empty()),
            None
        );
    }

    #[test]
    fn worlds_do_not_share_edits() {
        let mut first = world();
        let second = world();
        let pos = open_sky(&first);
        first.set_block(pos, stone(&first));
        assert_eq!(second.block_at(pos), None);

        for x in (-60..=60).step_by(13) {
            for y in (0..=40).step_by(5) {
                let cell = IVec3::new(x, y, 17);
                if cell != pos {
                    assert_eq!(second.block_sample_at(cell), first.block_sample_at(cell));
                }
            }
        }
    }

    #[test]
    fn dangling_portals_fail_construction() {
        let mut content = RealmContent::default();
        content.biomes[2].portal_to = "atlantis".to_string();
        assert!(matches!(
            World::new(content),
            Err(RealmError::DanglingPortal { .. })
        ));
    }

    #[test]
    fn world_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<World>();
    }

    fn flooded_flat_world(ore_threshold: f64) -> World {
        let mut content = RealmContent::default();
        for def in &mut content.biomes {
            def.terrain.base = 10.0;
            def.terrain.amplitude = 0.0;
            def.terrain.detail_amp = 0.0;
            def.terrain.ridge_amp = 0.0;
            def.terrain.center_lift = 0.0;
            def.water_level = 14;
            def.water_surface_block = Some("ice".to_string());
            def.decoration = DecorationStyle::Barren;
            def.ore = Some(OreVein {
                block: "marble".to_string(),
                threshold: ore_threshold,
            });
        }
        World::new(content).expect("flat world")
    }

    #[test]
    fn terrain_column_is_layered_from_bedrock_to_ice() {
        let world = flooded_flat_world(-1.0);
        let (x, z) = (3_000, 3_000);
        let biome = world.biome_at(x, z);
        assert_eq!(world.terrain_height(x, z), 10);
        assert!(world.structures().column_max_y(x, z).is_none());

        let palette = *world.palette();
        let mut expected = vec![(0, Some(palette.bedrock))];
        expected.extend((1..=7).map(|y| (y, Some(palette.marble))));
        expected.extend([8, 9].map(|y| (y, Some(biome.filler_block))));
        expected.push((10, Some(biome.top_block)));
        expected.extend((11..=13).map(|y| (y, Some(palette.water))));
        expected.push((14, Some(palette.ice)));
        expected.extend((15..=world.bounds().max_y).map(|y| (y, None)));

        for (y, block) in expected {
            let sample = world.block_sample_at(IVec3::new(x, y, z));
            assert_eq!(sample.map(|s| s.block), block, "y={y}");
            if let Some(sample) = sample {
                assert_eq!(sample.source, BlockSource::Terrain, "y={y}");
            }
        }
    }

    #[test]
    fn unreachable_ore_threshold_leaves_deep_block() {
        let world = flooded_flat_world(1.0);
        let (x, z) = (3_000, 3_000);
        let deep = world.biome_at(x, z).deep_block;
        for y in 1..=7 {
            assert_eq!(world.block_at(IVec3::new(x, y, z)), Some(deep), "y={y}");
        }
        assert_eq!(
            world.block_at(IVec3::new(x, 8, z)),
            Some(world.biome_at(x, z).filler_block)
        );
    }

    #[test]
    fn lanterns_are_special_and_reeds_are_flora() {
        let world = world();
        let dune = world.biomes().get_by_key("dune-pyramid").expect("dune");
        let plaza = world.config().plaza_clear_radius;
        let center = dune.center();
        let (mut lanterns, mut reeds) = (0, 0);

        for x in center.x + 40..center.x + 200 {
            for z in center.y - 100..center.y + 100 {
                if world.biome_at(x, z).id != dune.id {
                    continue;
                }
                let ground = world.terrain_height_in(x, z, dune);
                let pos = match select_flora(dune, x, z, plaza) {
                    Some(Flora::Lantern) => IVec3::new(x, ground + 2, z),
                    Some(Flora::Reed) => IVec3::new(x, ground + 1, z),
                    _ => continue,
                };
                if world.structures().contains(pos) {
                    continue;
                }

                let sample = world.block_sample_at(pos).expect("decorated cell");
                if sample.block == world.palette().lantern {
                    assert_eq!(sample.source, BlockSource::Special);
                    lanterns += 1;
                } else {
                    assert_eq!(sample.block, world.palette().reed);
                    assert_eq!(sample.source, BlockSource::Flora);
                    reeds += 1;
                }
            }
        }
        assert!(lanterns > 0);
        assert!(reeds > 0);
    }
}
