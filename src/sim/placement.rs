//! Spawn placement for player, keys, exit and enemy
//!
//! All sampling is rejection based with bounded budgets. A degenerate maze
//! never stalls the session: the last candidate (or a fixed cell) is used.

use glam::IVec2;

use super::maze::Grid;
use super::rng::Mulberry32;
use crate::consts::{FALLBACK_CELL, FLOOR_SAMPLE_ATTEMPTS, KEYS_REQUIRED};
use crate::settings::GameConfig;

/// Chosen spawn cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawns {
    pub player: IVec2,
    pub keys: [IVec2; KEYS_REQUIRED],
    pub exit: IVec2,
    pub enemy: IVec2,
}

#[inline]
fn cell_distance(a: IVec2, b: IVec2) -> f32 {
    (a - b).as_vec2().length()
}

/// Uniform random interior floor cell, or [`FALLBACK_CELL`] if none is found
pub fn find_random_floor(grid: &Grid, rng: &mut Mulberry32) -> IVec2 {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    if w > 2 && h > 2 {
        for _ in 0..FLOOR_SAMPLE_ATTEMPTS {
            let x = rng.range_i32(1, w - 1);
            let y = rng.range_i32(1, h - 1);
            if !grid.is_wall(x, y) {
                return IVec2::new(x, y);
            }
        }
    }
    log::warn!("No floor cell found by sampling, using fallback {:?}", FALLBACK_CELL);
    IVec2::new(FALLBACK_CELL.0, FALLBACK_CELL.1)
}

/// Resample until `accept` passes or the budget runs out (last candidate wins)
fn sample_until(
    grid: &Grid,
    rng: &mut Mulberry32,
    attempts: u32,
    what: &str,
    accept: impl Fn(IVec2) -> bool,
) -> IVec2 {
    let mut candidate = find_random_floor(grid, rng);
    for _ in 0..attempts {
        if accept(candidate) {
            return candidate;
        }
        candidate = find_random_floor(grid, rng);
    }
    if !accept(candidate) {
        log::warn!("Placement budget exhausted for {}, accepting {:?}", what, candidate);
    }
    candidate
}

/// Place everything in order: player, keys, exit, enemy
pub fn place_entities(grid: &Grid, rng: &mut Mulberry32, cfg: &GameConfig) -> Spawns {
    let player = find_random_floor(grid, rng);

    let mut keys: Vec<IVec2> = Vec::with_capacity(KEYS_REQUIRED);
    for _ in 0..KEYS_REQUIRED {
        let key = sample_until(grid, rng, cfg.placement_attempts, "key", |c| {
            !keys.contains(&c) && cell_distance(c, player) >= cfg.key_min_distance
        });
        keys.push(key);
    }
    let keys = [keys[0], keys[1], keys[2]];

    let exit = sample_until(grid, rng, cfg.placement_attempts, "exit", |c| {
        !keys.contains(&c) && cell_distance(c, player) >= cfg.exit_min_distance
    });

    let (near, far) = cfg.enemy_spawn_band;
    let mut enemy = None;
    for _ in 0..cfg.enemy_band_attempts {
        let c = find_random_floor(grid, rng);
        let d = cell_distance(c, player);
        if d >= near && d <= far {
            enemy = Some(c);
            break;
        }
    }
    let enemy = enemy.unwrap_or_else(|| {
        log::warn!("No enemy cell in band {}..{}, using any floor cell", near, far);
        find_random_floor(grid, rng)
    });

    Spawns {
        player,
        keys,
        exit,
        enemy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::maze::{LoopParams, generate};

    fn spawns_for(seed: u32) -> (Grid, Spawns) {
        let cfg = GameConfig::default();
        let mut rng = Mulberry32::new(seed);
        let maze = generate(cfg.maze_width, cfg.maze_height, seed, LoopParams::default(), &mut rng);
        let spawns = place_entities(&maze.grid, &mut rng, &cfg);
        (maze.grid, spawns)
    }

    #[test]
    fn test_spawns_are_floor() {
        let (grid, s) = spawns_for(2024);
        for c in [s.player, s.exit, s.enemy].iter().chain(s.keys.iter()) {
            assert!(!grid.is_wall(c.x, c.y), "{:?} is a wall", c);
        }
    }

    #[test]
    fn test_distances_respected() {
        for seed in [1, 17, 500, 65_535, 4_000_000_000] {
            let (_, s) = spawns_for(seed);
            for k in s.keys {
                assert!(cell_distance(k, s.player) >= 8.0);
                assert_ne!(k, s.exit);
            }
            assert!(cell_distance(s.exit, s.player) >= 10.0);
            assert_ne!(s.keys[0], s.keys[1]);
            assert_ne!(s.keys[1], s.keys[2]);
            assert_ne!(s.keys[0], s.keys[2]);
        }
    }

    #[test]
    fn test_enemy_in_band_on_default_maze() {
        let (_, s) = spawns_for(88);
        let d = cell_distance(s.enemy, s.player);
        assert!((6.0..=10.0).contains(&d), "enemy at distance {}", d);
    }

    #[test]
    fn test_single_cell_maze_falls_back() {
        let grid = Grid::from_rows(&["#####", "#.###", "#####"]);
        let mut rng = Mulberry32::new(3);
        assert_eq!(find_random_floor(&grid, &mut rng), IVec2::new(1, 1));
        let s = place_entities(&grid, &mut rng, &GameConfig::default());
        assert_eq!(s.player, IVec2::new(1, 1));
        assert_eq!(s.enemy, IVec2::new(1, 1));
    }

    #[test]
    fn test_solid_grid_uses_fallback_cell() {
        let grid = Grid::solid(5, 5);
        let mut rng = Mulberry32::new(3);
        assert_eq!(find_random_floor(&grid, &mut rng), IVec2::new(1, 1));
    }
}
