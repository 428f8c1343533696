use std::path::PathBuf;

use glam::{IVec2, IVec3};
use realms_shared::{BiomeId, BlockSource, LayerMask, RealmContent, World};

fn heritage_content() -> RealmContent {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("content/heritage_sites.toml");
    RealmContent::load(&path).expect("heritage content should load")
}

fn heritage_world() -> World {
    World::new(heritage_content()).expect("heritage world should build")
}

#[test]
fn content_file_overrides_world_and_biomes() {
    let content = heritage_content();
    assert_eq!(content.world.max_y, 64);
    assert_eq!(content.world.min_y, 0);
    assert_eq!(content.world.plaza_clear_radius, 30.0);
    assert_eq!(content.biomes.len(), 4);
    assert_eq!(content.blocks, RealmContent::default().blocks);
}

#[test]
fn portals_form_a_closed_loop() {
    let world = heritage_world();
    let start = world.biomes().primary();
    assert_eq!(start.key(), "stonehenge-salisbury");

    let mut current = start;
    let mut visited = Vec::new();
    for _ in 0..world.biomes().len() {
        visited.push(current.key().to_string());
        current = world
            .biomes()
            .get(current.portal_target)
            .expect("portal target exists");
    }
    assert_eq!(current.id, start.id);
    assert_eq!(
        visited,
        ["stonehenge-salisbury", "colosseum-rome", "roman-aqueduct", "skara-brae"]
    );
}

#[test]
fn every_portal_core_points_at_its_biome_target() {
    let world = heritage_world();
    for biome in world.biomes().iter() {
        let anchor = biome.portal_anchor();
        let base_y = world.terrain_height_in(anchor.x, anchor.y, biome) + 1;
        for y in base_y + 2..=base_y + 4 {
            let pos = IVec3::new(anchor.x, y, anchor.y);
            assert_eq!(world.portal_target_at(pos), Some(biome.portal_target));
            assert!(world.is_protected_block(pos));
        }

        let arrival = world.portal_arrival(biome.portal_target);
        let landing = world.biome_at(arrival.x.floor() as i32, arrival.z.floor() as i32);
        assert_eq!(landing.id, biome.portal_target);
    }
}

#[test]
fn monuments_follow_their_recipes() {
    let world = heritage_world();
    let palette = *world.palette();

    let walls_near = |key: &str, block| {
        let biome = world.biomes().get_by_key(key).expect("biome");
        let center = biome.center();
        world.structures().iter().any(|(pos, cell)| {
            cell.protected
                && cell.block == block
                && (pos.x - center.x).abs() <= 28
                && (pos.z - center.y).abs() <= 12
        })
    };

    assert!(walls_near("colosseum-rome", palette.marble));
    assert!(walls_near("roman-aqueduct", palette.marble));
    assert!(walls_near("skara-brae", palette.skara_stone));
    assert!(walls_near("stonehenge-salisbury", palette.stone));
}

#[test]
fn taller_world_keeps_its_sky_empty() {
    let world = heritage_world();
    assert_eq!(world.bounds().max_y, 64);
    for x in (-300..=300).step_by(50) {
        assert_eq!(world.block_sample_at(IVec3::new(x, 62, 90)), None);
        assert_eq!(world.block_sample_at(IVec3::new(x, 65, 90)), None);
        let floor = world
            .block_sample_at(IVec3::new(x, 0, 90))
            .expect("bedrock floor");
        assert_eq!(floor.block, world.palette().bedrock);
        assert_eq!(floor.source, BlockSource::Terrain);
    }
}

#[test]
fn nearest_monument_matches_the_biome_underfoot() {
    let world = heritage_world();
    for (x, z) in [(0, 0), (240, -40), (-180, 210), (-220, -190), (60, 90)] {
        let nearest = &world.monument_distances(f64::from(x), f64::from(z))[0];
        assert_eq!(nearest.biome, world.biome_at(x, z).id);
    }

    let forum = &world.monument_distances(240.0, -40.0)[0];
    assert_eq!(forum.monument_name, "Colosseum");
    assert_eq!(forum.distance, 0.0);
}

#[test]
fn debug_layers_see_the_colosseum_from_above() {
    let world = heritage_world();
    let top = world
        .top_block_for_layers(240 + 14, -40, LayerMask::MONUMENT)
        .expect("arena wall column");
    assert!(matches!(
        world.registry().name_of(top.sample.block),
        "marble" | "sandstone" | "stone" | "dirt"
    ));
    assert_eq!(top.sample.source, BlockSource::Monument);
}

#[test]
fn barren_forum_grows_nothing() {
    let world = heritage_world();
    let forum = world.biomes().get_by_key("colosseum-rome").expect("forum");
    let henge = world.biomes().get_by_key("stonehenge-salisbury").expect("henge");

    let flora_columns = |center: IVec2, id: BiomeId| {
        let mut count = 0;
        for x in (center.x - 90..=center.x + 90).step_by(3) {
            for z in (center.y - 90..=center.y + 90).step_by(3) {
                if world.biome_at(x, z).id != id {
                    continue;
                }
                if world.top_block_for_layers(x, z, LayerMask::FLORA).is_some() {
                    count += 1;
                }
            }
        }
        count
    };

    assert_eq!(flora_columns(forum.center(), forum.id), 0);
    assert!(flora_columns(henge.center(), henge.id) > 0);
}
