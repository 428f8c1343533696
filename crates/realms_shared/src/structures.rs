use std::f64::consts::TAU;

use glam::{IVec2, IVec3, Vec3};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::biome::{Biome, BiomeId, BiomeTable, MonumentKind};
use crate::block::{BlockId, EnginePalette};
use crate::coords::{column_key, WorldBounds};
use crate::terrain::HeightSource;

const STONE_RING_PAD_RADIUS: i32 = 15;
const STONE_RING_RADIUS: f64 = 8.0;
const STONE_RING_POINTS: i32 = 14;
const PORTAL_PAD_RADIUS: i32 = 3;
const PORTAL_ARRIVAL_DISTANCE: i32 = 2;
const HUT_OFFSETS: [(i32, i32); 6] = [(-6, -3), (0, -6), (7, -2), (-7, 4), (1, 5), (8, 6)];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StructureCell {
    pub block: BlockId,
    /// Interaction code must refuse to break or replace this cell.
    pub protected: bool,
    pub portal_to: Option<BiomeId>,
}

#[derive(Clone, Debug, Default)]
pub struct StructureIndex {
    cells: FxHashMap<IVec3, StructureCell>,
    column_max_y: FxHashMap<IVec2, i32>,
    arrivals: FxHashMap<BiomeId, Vec3>,
}

impl StructureIndex {
    pub fn cell(&self, pos: IVec3) -> Option<&StructureCell> {
        self.cells.get(&pos)
    }

    pub fn contains(&self, pos: IVec3) -> bool {
        self.cells.contains_key(&pos)
    }

    pub fn column_max_y(&self, x: i32, z: i32) -> Option<i32> {
        self.column_max_y.get(&column_key(x, z)).copied()
    }

    pub fn arrival(&self, biome: BiomeId) -> Option<Vec3> {
        self.arrivals.get(&biome).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec3, &StructureCell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.column_max_y.len()
    }

    /// Drops every cell above `level_y` in the column and recomputes its top.
    fn clear_column_above(&mut self, x: i32, z: i32, level_y: i32, bounds: WorldBounds) {
        let key = column_key(x, z);
        let Some(top) = self.column_max_y.get(&key).copied() else {
            return;
        };
        if top <= level_y {
            return;
        }

        for y in level_y + 1..=top {
            self.cells.remove(&IVec3::new(x, y, z));
        }
        let lowest = bounds.min_y.min(level_y);
        match (lowest..=level_y.min(top))
            .rev()
            .find(|y| self.cells.contains_key(&IVec3::new(x, *y, z)))
        {
            Some(y) => {
                self.column_max_y.insert(key, y);
            }
            None => {
                self.column_max_y.remove(&key);
            }
        }
    }

    pub(crate) fn insert(&mut self, pos: IVec3, cell: StructureCell) {
        self.cells.insert(pos, cell);
        let top = self
            .column_max_y
            .entry(column_key(pos.x, pos.z))
            .or_insert(pos.y);
        if pos.y > *top {
            *top = pos.y;
        }
    }
}

pub fn build_structures<H: HeightSource + ?Sized>(
    biomes: &BiomeTable,
    heights: &H,
    palette: &EnginePalette,
    bounds: WorldBounds,
) -> StructureIndex {
    let mut builder = StructureBuilder {
        heights,
        palette,
        bounds,
        index: StructureIndex::default(),
    };

    for biome in biomes.iter() {
        builder.build_monument(biome);
        builder.build_portal(biome);
    }

    builder.index
}

/// Rounds halves toward positive infinity so stamped geometry is symmetric
/// under translation.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn hypot(dx: i32, dz: i32) -> f64 {
    f64::from(dx).hypot(f64::from(dz))
}

struct StructureBuilder<'a, H: ?Sized> {
    heights: &'a H,
    palette: &'a EnginePalette,
    bounds: WorldBounds,
    index: StructureIndex,
}

impl<H: HeightSource + ?Sized> StructureBuilder<'_, H> {
    fn ground(&self, x: i32, z: i32, biome: &Biome) -> i32 {
        self.heights.height_in(x, z, biome)
    }

    fn set(&mut self, x: i32, y: i32, z: i32, block: BlockId, protected: bool) {
        if !self.bounds.contains(y) {
            return;
        }
        self.index.insert(
            IVec3::new(x, y, z),
            StructureCell {
                block,
                protected,
                portal_to: None,
            },
        );
    }

    fn set_portal_core(&mut self, x: i32, y: i32, z: i32, target: BiomeId) {
        if !self.bounds.contains(y) {
            return;
        }
        self.index.insert(
            IVec3::new(x, y, z),
            StructureCell {
                block: self.palette.portal_core,
                protected: true,
                portal_to: Some(target),
            },
        );
    }

    fn flatten_pad(
        &mut self,
        cx: i32,
        cz: i32,
        radius: i32,
        level_y: i32,
        top: BlockId,
        fill: BlockId,
    ) {
        let limit = f64::from(radius) + 0.3;
        for x in cx - radius..=cx + radius {
            for z in cz - radius..=cz + radius {
                if hypot(x - cx, z - cz) > limit {
                    continue;
                }
                for y in level_y - 2..=level_y {
                    self.set(x, y, z, if y == level_y { top } else { fill }, false);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn flatten_ellipse(
        &mut self,
        cx: i32,
        cz: i32,
        rx: i32,
        rz: i32,
        level_y: i32,
        top: BlockId,
        fill: BlockId,
    ) {
        for x in cx - rx..=cx + rx {
            for z in cz - rz..=cz + rz {
                let nx = f64::from(x - cx) / f64::from(rx);
                let nz = f64::from(z - cz) / f64::from(rz);
                if nx * nx + nz * nz > 1.08 {
                    continue;
                }
                for y in level_y - 2..=level_y {
                    self.set(x, y, z, if y == level_y { top } else { fill }, false);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn carve_path(
        &mut self,
        start: IVec2,
        end: IVec2,
        width: i32,
        top: BlockId,
        fill: BlockId,
        biome: &Biome,
    ) {
        let dx = f64::from(end.x - start.x);
        let dz = f64::from(end.y - start.y);
        let steps = round_half_up(dx.hypot(dz) * 2.0).max(4);
        let limit = f64::from(width) + 0.2;

        for step in 0..=steps {
            let t = f64::from(step) / f64::from(steps);
            let px = round_half_up(f64::from(start.x) + dx * t);
            let pz = round_half_up(f64::from(start.y) + dz * t);
            let py = self.ground(px, pz, biome) + 1;

            for ox in -width..=width {
                for oz in -width..=width {
                    if hypot(ox, oz) > limit {
                        continue;
                    }
                    self.set(px + ox, py - 1, pz + oz, fill, false);
                    self.set(px + ox, py, pz + oz, top, false);
                }
            }
        }
    }

    fn build_monument(&mut self, biome: &Biome) {
        let kind = biome.def.monument;
        match kind {
            MonumentKind::StoneRing => self.build_stone_ring(biome),
            MonumentKind::Arena => self.build_arena(biome),
            MonumentKind::Aqueduct => self.build_aqueduct(biome),
            MonumentKind::HutSettlement => self.build_hut_settlement(biome),
        }
        debug!("Stamped {:?} monument for biome {}", kind, biome.key());
    }

    fn build_stone_ring(&mut self, biome: &Biome) {
        let p = *self.palette;
        let center = biome.center();
        let (cx, cz) = (center.x, center.y);
        let base_y = self.ground(cx, cz, biome) + 1;

        self.flatten_pad(cx, cz, STONE_RING_PAD_RADIUS, base_y, p.grass, p.dirt);

        let ring_point = |i: i32| {
            let angle = TAU * f64::from(i) / f64::from(STONE_RING_POINTS);
            (
                round_half_up(f64::from(cx) + angle.cos() * STONE_RING_RADIUS),
                round_half_up(f64::from(cz) + angle.sin() * STONE_RING_RADIUS),
            )
        };

        for i in 0..STONE_RING_POINTS {
            let (x, z) = ring_point(i);
            let height = if i % 3 == 0 { 5 } else { 4 };
            for y in base_y + 1..=base_y + height {
                self.set(x, y, z, p.stone, true);
            }
        }

        for i in (0..STONE_RING_POINTS).step_by(2) {
            let (x0, z0) = ring_point(i);
            let (x1, z1) = ring_point(i + 1);
            let lintel_steps = round_half_up(hypot(x1 - x0, z1 - z0)).max(1);
            for step in 0..=lintel_steps {
                let t = f64::from(step) / f64::from(lintel_steps);
                let x = round_half_up(f64::from(x0) + f64::from(x1 - x0) * t);
                let z = round_half_up(f64::from(z0) + f64::from(z1 - z0) * t);
                self.set(x, base_y + 5, z, p.stone, true);
            }
        }

        for x in cx - 1..=cx + 1 {
            for z in cz - 2..=cz + 2 {
                self.set(x, base_y + 1, z, p.sandstone, false);
            }
        }
    }

    fn build_arena(&mut self, biome: &Biome) {
        let p = *self.palette;
        let center = biome.center();
        let (cx, cz) = (center.x, center.y);
        let base_y = self.ground(cx, cz, biome) + 1;

        self.flatten_ellipse(cx, cz, 22, 16, base_y, p.stone, p.dirt);

        for y in base_y + 1..=base_y + 8 {
            for x in cx - 17..=cx + 17 {
                for z in cz - 12..=cz + 12 {
                    let dx = f64::from(x - cx);
                    let dz = f64::from(z - cz);
                    let outer = dx * dx / (17.0 * 17.0) + dz * dz / (12.0 * 12.0);
                    let inner = dx * dx / (12.0 * 12.0) + dz * dz / (7.0 * 7.0);
                    if outer > 1.03 || inner < 0.95 {
                        continue;
                    }

                    let (ax, az) = ((x - cx).abs(), (z - cz).abs());
                    let is_gate = y <= base_y + 3
                        && ((ax < 2 && (az > 10 || az < 2)) || (az < 2 && ax > 13));
                    if is_gate {
                        continue;
                    }

                    let block = if y >= base_y + 6 { p.marble } else { p.sandstone };
                    self.set(x, y, z, block, true);
                }
            }
        }

        for x in cx - 10..=cx + 10 {
            for z in cz - 6..=cz + 6 {
                let dx = f64::from(x - cx);
                let dz = f64::from(z - cz);
                if dx * dx / 100.0 + dz * dz / 36.0 > 1.0 {
                    continue;
                }
                self.set(x, base_y + 1, z, p.sand, false);
            }
        }
    }

    fn build_aqueduct(&mut self, biome: &Biome) {
        let p = *self.palette;
        let center = biome.center();
        let (cx, cz) = (center.x, center.y);
        let base_y = self.ground(cx, cz, biome) + 1;

        for x in cx - 28..=cx + 28 {
            for z in cz - 5..=cz + 5 {
                self.set(x, base_y - 1, z, p.sandstone, false);
                self.set(x, base_y, z, p.sand, false);
            }
        }

        for segment in (-24..=24).step_by(5) {
            let px = cx + segment;
            for y in base_y + 1..=base_y + 6 {
                self.set(px, y, cz - 3, p.sandstone, true);
                self.set(px, y, cz + 3, p.sandstone, true);
            }
            for z in cz - 3..=cz + 3 {
                self.set(px, base_y + 7, z, p.stone, true);
            }
            for z in cz - 2..=cz + 2 {
                self.set(px, base_y + 6, z, p.marble, true);
            }
        }

        let channel_y = base_y + 8;
        for x in cx - 24..=cx + 24 {
            self.set(x, channel_y, cz - 2, p.stone, true);
            self.set(x, channel_y, cz + 2, p.stone, true);
            for z in cz - 1..=cz + 1 {
                self.set(x, channel_y, z, p.aqueduct_water, false);
            }
        }

        self.carve_path(
            IVec2::new(cx - 30, cz + 8),
            IVec2::new(cx + 30, cz + 8),
            1,
            p.sandstone,
            p.sand,
            biome,
        );
    }

    fn build_hut_settlement(&mut self, biome: &Biome) {
        let p = *self.palette;
        let center = biome.center();
        let (cx, cz) = (center.x, center.y);
        let base_y = self.ground(cx, cz, biome) + 1;

        self.flatten_pad(cx, cz, 16, base_y, p.skara_earth, p.skara_earth);

        for (ox, oz) in HUT_OFFSETS {
            let hx = cx + ox;
            let hz = cz + oz;
            let hy = self.ground(hx, hz, biome) + 1;

            self.flatten_pad(hx, hz, 3, hy - 1, p.skara_hearth, p.skara_stone);

            for x in hx - 3..=hx + 3 {
                for z in hz - 3..=hz + 3 {
                    let doorway = z == hz - 3 && (x - hx).abs() <= 1;
                    if doorway {
                        continue;
                    }
                    let dist = hypot(x - hx, z - hz);
                    if (2.1..=3.05).contains(&dist) {
                        self.set(x, hy, z, p.skara_stone, true);
                        self.set(x, hy + 1, z, p.skara_stone, true);
                    }
                }
            }

            self.set(hx, hy, hz, p.skara_hearth, false);
        }

        for (ox, oz) in HUT_OFFSETS {
            self.carve_path(
                IVec2::new(cx + ox, cz + oz),
                center,
                1,
                p.skara_earth,
                p.skara_stone,
                biome,
            );
        }
    }

    /// Obsidian doorframe with three portal cores at `center + portal_offset`,
    /// a path back to the monument and an arrival point on the side facing it.
    fn build_portal(&mut self, biome: &Biome) {
        let anchor = biome.portal_anchor();
        let offset = biome.portal_offset();
        let (px, pz) = (anchor.x, anchor.y);
        let base_y = self.ground(px, pz, biome) + 1;

        // Anything already standing on the portal plaza is knocked down.
        let limit = f64::from(PORTAL_PAD_RADIUS) + 0.3;
        for x in px - PORTAL_PAD_RADIUS..=px + PORTAL_PAD_RADIUS {
            for z in pz - PORTAL_PAD_RADIUS..=pz + PORTAL_PAD_RADIUS {
                if hypot(x - px, z - pz) <= limit {
                    self.index.clear_column_above(x, z, base_y, self.bounds);
                }
            }
        }
        self.flatten_pad(
            px,
            pz,
            PORTAL_PAD_RADIUS,
            base_y,
            biome.top_block,
            biome.filler_block,
        );
        // The path goes down before the frame so it can never cut through it.
        self.carve_path(
            anchor,
            biome.center(),
            1,
            biome.filler_block,
            biome.filler_block,
            biome,
        );

        let axis_x = offset.x.abs() > offset.y.abs();
        let obsidian = self.palette.obsidian;
        for ix in -1..=1 {
            for iy in 0..=4 {
                let is_frame = ix == -1 || ix == 1 || iy == 0 || iy == 4;
                if !is_frame {
                    continue;
                }
                let (x, z) = if axis_x { (px, pz + ix) } else { (px + ix, pz) };
                self.set(x, base_y + 1 + iy, z, obsidian, true);
            }
        }

        for iy in 1..=3 {
            self.set_portal_core(px, base_y + 1 + iy, pz, biome.portal_target);
        }

        let back = |component: i32| {
            if component > 0 {
                -PORTAL_ARRIVAL_DISTANCE
            } else {
                PORTAL_ARRIVAL_DISTANCE
            }
        };
        let (ax, az) = if axis_x {
            (px + back(offset.x), pz)
        } else {
            (px, pz + back(offset.y))
        };
        let ground = self.ground(ax, az, biome);
        let standing = self
            .index
            .column_max_y(ax, az)
            .map_or(ground, |top| top.max(ground));
        let arrival = Vec3::new(ax as f32 + 0.5, standing as f32 + 1.1, az as f32 + 0.5);
        self.index.arrivals.insert(biome.id, arrival);

        debug!(
            "Stamped portal {} -> {:?} at ({}, {}, {}), arrival {}",
            biome.key(),
            biome.portal_target,
            px,
            base_y,
            pz,
            arrival
        );
    }
}
