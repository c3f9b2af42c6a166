use std::collections::VecDeque;

use glam::{IVec2, Vec2};
use proptest::prelude::*;

use dread_maze::GameConfig;
use dread_maze::sim::{
    Grid, LoopParams, Mulberry32, cast_ray, cell_center, generate, generate_seeded, is_clear,
    place_entities, try_move,
};

fn reachable_from(grid: &Grid, start: IVec2) -> usize {
    let mut seen = vec![false; grid.width() * grid.height()];
    let idx = |c: IVec2| c.y as usize * grid.width() + c.x as usize;
    let mut queue = VecDeque::from([start]);
    seen[idx(start)] = true;
    let mut count = 0;
    while let Some(c) = queue.pop_front() {
        count += 1;
        for d in [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y] {
            let n = c + d;
            if !grid.is_wall(n.x, n.y) && !seen[idx(n)] {
                seen[idx(n)] = true;
                queue.push_back(n);
            }
        }
    }
    count
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn same_seed_same_maze(seed in any::<u32>(), w in 5_usize..41, h in 5_usize..41) {
        let a = generate_seeded(w, h, seed);
        let b = generate_seeded(w, h, seed);
        prop_assert_eq!(a.grid, b.grid);
    }

    #[test]
    fn every_floor_cell_reachable_from_player(seed in any::<u32>()) {
        let cfg = GameConfig::default();
        let mut rng = Mulberry32::new(seed);
        let maze = generate(31, 31, seed, LoopParams::default(), &mut rng);
        let spawns = place_entities(&maze.grid, &mut rng, &cfg);
        let floor = maze.grid.floor_cells().count();
        prop_assert_eq!(reachable_from(&maze.grid, spawns.player), floor, "seed={}", seed);
    }

    #[test]
    fn spawns_keep_their_distance(seed in any::<u32>()) {
        let cfg = GameConfig::default();
        let mut rng = Mulberry32::new(seed);
        let maze = generate(31, 31, seed, LoopParams::default(), &mut rng);
        let s = place_entities(&maze.grid, &mut rng, &cfg);
        let dist = |a: IVec2, b: IVec2| (a - b).as_vec2().length();
        for key in s.keys {
            prop_assert!(dist(key, s.player) >= 8.0, "seed={}", seed);
            prop_assert_ne!(key, s.exit);
        }
        prop_assert!(dist(s.exit, s.player) >= 10.0, "seed={}", seed);
    }

    #[test]
    fn movement_never_enters_walls(
        seed in any::<u32>(),
        steps in prop::collection::vec((-0.4_f32..0.4, -0.4_f32..0.4), 1..80),
    ) {
        let maze = generate_seeded(21, 21, seed);
        let radius = 0.2;
        let mut pos = cell_center(IVec2::new(1, 1));
        for (dx, dy) in steps {
            pos = try_move(&maze.grid, pos, pos + Vec2::new(dx, dy), radius);
            prop_assert!(is_clear(&maze.grid, pos, radius), "pos={:?}", pos);
        }
    }

    #[test]
    fn rays_always_hit_inside_the_maze(seed in any::<u32>(), angle in -3.14_f32..3.14) {
        let maze = generate_seeded(21, 21, seed);
        let origin = cell_center(IVec2::new(1, 1));
        let hit = cast_ray(&maze.grid, origin, angle, angle);
        prop_assert!(hit.hit);
        prop_assert!(!hit.exhausted);
        prop_assert!(hit.distance.is_finite());
        prop_assert!(hit.distance > 0.0 && hit.distance < 128.0);
        prop_assert!(maze.grid.is_wall(hit.cell.x, hit.cell.y));
    }
}
