//! # Dungeons
//!
//! Small cobble rooms stamped into solid rock, each with a few corridors.
//!
//! ```text
//!      ┌─────────┐
//!      │ . . . . │══════   corridor: 1 wide, 2 tall, ends at the
//!      │ . . . . │         first non-ground cell
//!      └─────────┘
//!   shell: cobble (mossy cobble at or below water level)
//! ```
//!
//! A site is only used if the room and its one-node shell are entirely
//! ground content, so rooms never cut into caves, liquids or each other.
//! A chunk with no acceptable site simply gets no dungeon.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_core::{MapNode, Vec3i, VoxelArea, VoxelBuffer, MAP_BLOCKSIZE};

use crate::caves::is_ground;
use crate::noise::NoiseField;
use crate::params::CaveParams;
use crate::shaper::ShapeContext;

/// Sites tried per dungeon before giving up.
const ROOM_TRIES: u32 = 8;

/// Most corridors leaving one room.
const MAX_CORRIDORS: u32 = 3;

const DIRECTIONS: [Vec3i; 4] = [
    Vec3i::new(1, 0, 0),
    Vec3i::new(-1, 0, 0),
    Vec3i::new(0, 0, 1),
    Vec3i::new(0, 0, -1),
];

/// Places dungeons in one chunk at a time.
pub struct DungeonGen {
    noise_dungeons: NoiseField,
    ymin: i32,
    ymax: i32,
}

impl DungeonGen {
    /// Builds the placer from the cave parameters.
    #[must_use]
    pub fn new(params: &CaveParams, world_seed: u64) -> Self {
        Self {
            noise_dungeons: NoiseField::new(params.np_dungeons, world_seed),
            ymin: i32::from(params.dungeon_ymin),
            ymax: i32::from(params.dungeon_ymax),
        }
    }

    /// Re-seeds the count noise.
    pub fn reseed(&mut self, world_seed: u64) {
        self.noise_dungeons.reseed(world_seed);
    }

    /// Dungeons wanted in the chunk starting at `node_min`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn dungeon_count(&self, node_min: Vec3i) -> u32 {
        let n = self
            .noise_dungeons
            .sample_3d(node_min.x as f32, node_min.y as f32, node_min.z as f32);
        n.floor().max(0.0) as u32
    }

    /// Stamps this chunk's dungeons and returns how many rooms were placed.
    ///
    /// Nothing happens unless the padded chunk lies inside the dungeon Y
    /// range and the terrain reaches the chunk.
    pub fn generate(
        &self,
        vm: &mut VoxelBuffer,
        ctx: &ShapeContext,
        ground: &[bool],
        max_stone_y: i32,
        blockseed: u64,
    ) -> u32 {
        let full_ymin = ctx.node_min.y - MAP_BLOCKSIZE;
        let full_ymax = ctx.node_max.y + MAP_BLOCKSIZE;
        if full_ymin < self.ymin || full_ymax > self.ymax || ctx.node_min.y > max_stone_y {
            return 0;
        }
        let count = self.dungeon_count(ctx.node_min);
        if count == 0 {
            return 0;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(blockseed.wrapping_add(2));
        let mut placed = 0;
        for _ in 0..count {
            for _ in 0..ROOM_TRIES {
                if let Some(room) = pick_site(&mut rng, ctx) {
                    if is_solid(vm, ground, &room.pad(Vec3i::splat(1))) {
                        stamp_room(vm, ctx, &room);
                        dig_corridors(vm, ground, &room, &mut rng);
                        placed += 1;
                        break;
                    }
                }
            }
        }
        placed
    }
}

/// A random room interior whose shell fits inside the chunk.
fn pick_site<R: Rng>(rng: &mut R, ctx: &ShapeContext) -> Option<VoxelArea> {
    let size = Vec3i::new(rng.gen_range(4..=8), rng.gen_range(3..=5), rng.gen_range(4..=8));
    let span = ctx.node_max - ctx.node_min + Vec3i::splat(1);
    if span.x < size.x + 2 || span.y < size.y + 2 || span.z < size.z + 2 {
        return None;
    }
    let min = ctx.node_min
        + Vec3i::splat(1)
        + Vec3i::new(
            rng.gen_range(0..=span.x - size.x - 2),
            rng.gen_range(0..=span.y - size.y - 2),
            rng.gen_range(0..=span.z - size.z - 2),
        );
    Some(VoxelArea::new(min, min + size - Vec3i::splat(1)))
}

fn is_solid(vm: &VoxelBuffer, ground: &[bool], shell: &VoxelArea) -> bool {
    let area = vm.area();
    area.contains_area(shell)
        && shell
            .iter()
            .all(|p| is_ground(ground, vm.node_at(area.index_p(p)).content))
}

fn stamp_room(vm: &mut VoxelBuffer, ctx: &ShapeContext, room: &VoxelArea) {
    let cobble = MapNode::new(ctx.ids.cobble);
    let mossy = MapNode::new(ctx.ids.mossycobble);
    let area = *vm.area();
    for p in room.pad(Vec3i::splat(1)).iter() {
        let node = if room.contains(p) {
            MapNode::AIR
        } else if p.y <= ctx.water_level {
            mossy
        } else {
            cobble
        };
        vm.set_at(area.index_p(p), node);
    }
}

/// Opens a door in a random wall and tunnels outward until the rock ends.
fn dig_corridors<R: Rng>(vm: &mut VoxelBuffer, ground: &[bool], room: &VoxelArea, rng: &mut R) {
    let area = *vm.area();
    let corridors = rng.gen_range(0..=MAX_CORRIDORS);
    let (min, max) = (room.min_edge, room.max_edge);
    for _ in 0..corridors {
        let dir = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];
        let door = Vec3i::new(
            if dir.x > 0 { max.x + 1 } else if dir.x < 0 { min.x - 1 } else { rng.gen_range(min.x..=max.x) },
            min.y,
            if dir.z > 0 { max.z + 1 } else if dir.z < 0 { min.z - 1 } else { rng.gen_range(min.z..=max.z) },
        );
        let up = Vec3i::new(0, 1, 0);
        vm.set(door, MapNode::AIR);
        vm.set(door + up, MapNode::AIR);

        let length = rng.gen_range(4..=16);
        let mut p = door;
        for _ in 0..length {
            p += dir;
            if !area.contains(p) || !area.contains(p + up) {
                break;
            }
            let i = area.index_p(p);
            if !is_ground(ground, vm.node_at(i).content) {
                break;
            }
            vm.set_at(i, MapNode::AIR);
            let j = area.index_p(p + up);
            if is_ground(ground, vm.node_at(j).content) {
                vm.set_at(j, MapNode::AIR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::TerrainContent;
    use crate::noise::{NoiseParams, Spread};
    use strata_core::ContentRegistry;

    fn setup(node_min: Vec3i, fill: Option<MapNode>) -> (ShapeContext, VoxelBuffer, Vec<bool>) {
        let reg = ContentRegistry::with_defaults();
        let ids = TerrainContent::resolve(&reg).unwrap();
        let node_max = node_min + Vec3i::splat(15);
        let ctx = ShapeContext {
            node_min,
            node_max,
            water_level: 1,
            mapgen_limit: 31000,
            ids,
        };
        let full = VoxelArea::new(node_min - Vec3i::splat(16), node_max + Vec3i::splat(16));
        let mut vm = VoxelBuffer::with_area(full);
        vm.fill_area(&full, fill.unwrap_or(MapNode::new(ids.stone)));
        (ctx, vm, reg.ground_content_table())
    }

    fn params(count: f32) -> CaveParams {
        CaveParams {
            np_dungeons: NoiseParams::new(count, 0.0, Spread::uniform(500.0), 0, 1, 0.5),
            ..CaveParams::v7_defaults()
        }
    }

    #[test]
    fn test_count_follows_noise() {
        let dungeons = DungeonGen::new(&params(2.7), 1);
        assert_eq!(dungeons.dungeon_count(Vec3i::new(0, -100, 0)), 2);
        let dungeons = DungeonGen::new(&params(-3.0), 1);
        assert_eq!(dungeons.dungeon_count(Vec3i::new(0, -100, 0)), 0);
    }

    #[test]
    fn test_rooms_in_solid_rock() {
        let (ctx, mut vm, ground) = setup(Vec3i::new(0, -100, 0), None);
        let dungeons = DungeonGen::new(&params(3.0), 1);
        let placed = dungeons.generate(&mut vm, &ctx, &ground, 0, 42);
        assert!(placed >= 1);
        // Below the water level every wall is mossy
        assert!(vm.nodes().iter().any(|n| n.content == ctx.ids.mossycobble));
        assert!(!vm.nodes().iter().any(|n| n.content == ctx.ids.cobble));
        assert!(vm.nodes().iter().any(|n| n.is_air()));
    }

    #[test]
    fn test_dry_rooms_use_cobble() {
        let (ctx, mut vm, ground) = setup(Vec3i::new(0, 100, 0), None);
        let dungeons = DungeonGen::new(&params(1.0), 1);
        assert_eq!(dungeons.generate(&mut vm, &ctx, &ground, 200, 42), 1);
        assert!(vm.nodes().iter().any(|n| n.content == ctx.ids.cobble));
    }

    #[test]
    fn test_no_site_in_open_air() {
        let (ctx, mut vm, ground) = setup(Vec3i::new(0, -100, 0), Some(MapNode::AIR));
        let dungeons = DungeonGen::new(&params(3.0), 1);
        assert_eq!(dungeons.generate(&mut vm, &ctx, &ground, 0, 42), 0);
        assert!(vm.nodes().iter().all(|n| n.is_air()));
    }

    #[test]
    fn test_outside_y_range() {
        let (ctx, mut vm, ground) = setup(Vec3i::new(0, -100, 0), None);
        let p = CaveParams {
            dungeon_ymax: -200,
            ..params(3.0)
        };
        assert_eq!(DungeonGen::new(&p, 1).generate(&mut vm, &ctx, &ground, 0, 42), 0);
    }

    #[test]
    fn test_chunk_above_terrain() {
        let (ctx, mut vm, ground) = setup(Vec3i::new(0, -100, 0), None);
        let dungeons = DungeonGen::new(&params(3.0), 1);
        assert_eq!(dungeons.generate(&mut vm, &ctx, &ground, -200, 42), 0);
    }

    #[test]
    fn test_deterministic_per_blockseed() {
        let (ctx, mut a, ground) = setup(Vec3i::new(0, -100, 0), None);
        let mut b = a.clone();
        let dungeons = DungeonGen::new(&params(2.0), 1);
        dungeons.generate(&mut a, &ctx, &ground, 0, 7);
        dungeons.generate(&mut b, &ctx, &ground, 0, 7);
        assert_eq!(a.nodes(), b.nodes());
    }
}
