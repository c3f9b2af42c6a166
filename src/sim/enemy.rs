//! Enemy pursuit AI
//!
//! Two states: `Wander` drifts through corridors avoiding walls, `Chase`
//! heads straight for the player while it can see them. Sight that is lost
//! only briefly does not end a chase.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::maze::Grid;
use super::movement::try_move;
use super::rng::Mulberry32;
use crate::settings::GameConfig;
use crate::{angle_between, angle_to_dir, normalize_angle};

/// Facing within this of the target counts as done turning
const TURN_SETTLED: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyState {
    Wander,
    Chase,
}

/// What changed in the enemy's state this update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Spotted,
    LostTrack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    pub facing: f32,
    pub target_facing: f32,
    pub state: EnemyState,
    /// Session time (seconds) of the last confirmed sighting
    pub last_seen: Option<f32>,
}

impl Enemy {
    pub fn new(pos: Vec2, facing: f32) -> Self {
        Self {
            pos,
            facing,
            target_facing: facing,
            state: EnemyState::Wander,
            last_seen: None,
        }
    }

    pub fn speed(&self, cfg: &GameConfig) -> f32 {
        match self.state {
            EnemyState::Wander => cfg.enemy_wander_speed,
            EnemyState::Chase => cfg.enemy_chase_speed,
        }
    }

    /// Advance one frame. `now` is the session clock after this frame's dt.
    pub fn update(
        &mut self,
        grid: &Grid,
        player: Vec2,
        now: f32,
        dt: f32,
        cfg: &GameConfig,
        rng: &mut Mulberry32,
    ) -> Transition {
        let sees = line_of_sight(grid, self.pos, player, cfg.sight_range, cfg.sight_step);
        let transition = self.think(sees, now, cfg);

        match self.state {
            EnemyState::Chase => {
                if sees {
                    self.target_facing = angle_between(self.pos, player);
                }
            }
            EnemyState::Wander => self.wander_steer(grid, cfg, rng),
        }

        self.turn_toward_target(cfg.enemy_turn_rate * dt);

        let step = angle_to_dir(self.facing) * self.speed(cfg) * dt;
        self.pos = try_move(grid, self.pos, self.pos + step, cfg.collision_radius);

        transition
    }

    /// State transitions only
    fn think(&mut self, sees: bool, now: f32, cfg: &GameConfig) -> Transition {
        if sees {
            self.last_seen = Some(now);
        }
        match (self.state, sees) {
            (EnemyState::Wander, true) => {
                self.state = EnemyState::Chase;
                log::debug!("Enemy spotted player at t={:.2}", now);
                Transition::Spotted
            }
            (EnemyState::Chase, false)
                if self.last_seen.is_none_or(|seen| now - seen >= cfg.chase_cooldown) =>
            {
                self.state = EnemyState::Wander;
                log::debug!("Enemy lost track at t={:.2}", now);
                Transition::LostTrack
            }
            (EnemyState::Wander, false) | (EnemyState::Chase, _) => Transition::None,
        }
    }

    fn wander_steer(&mut self, grid: &Grid, cfg: &GameConfig, rng: &mut Mulberry32) {
        if rng.random_bool(cfg.wander_turn_chance) {
            let jitter: f32 = rng.random_range(-1.2..1.2);
            self.target_facing = normalize_angle(self.target_facing + jitter);
        }

        // A turn already in progress is kept until it completes
        if normalize_angle(self.target_facing - self.facing).abs() > TURN_SETTLED {
            return;
        }

        let blocked = |angle: f32| grid.is_wall_at(self.pos + angle_to_dir(angle) * cfg.wander_probe);
        if !blocked(self.facing) {
            return;
        }

        let left = normalize_angle(self.facing - FRAC_PI_2);
        let right = normalize_angle(self.facing + FRAC_PI_2);
        self.target_facing = match (blocked(left), blocked(right)) {
            (false, false) => {
                if rng.random_bool(0.5) {
                    left
                } else {
                    right
                }
            }
            (false, true) => left,
            (true, false) => right,
            // Dead end
            (true, true) => normalize_angle(self.facing + PI),
        };
    }

    /// Rotate toward the target by at most `max_step`, never past it
    fn turn_toward_target(&mut self, max_step: f32) {
        let diff = normalize_angle(self.target_facing - self.facing);
        self.facing = normalize_angle(self.facing + diff.clamp(-max_step, max_step));
    }

    pub fn distance_to(&self, p: Vec2) -> f32 {
        self.pos.distance(p)
    }
}

/// Fixed-step march from `from` to `to`; false if out of range or any sample
/// lands in a wall
pub fn line_of_sight(grid: &Grid, from: Vec2, to: Vec2, max_range: f32, step: f32) -> bool {
    let dist = from.distance(to);
    if dist > max_range {
        return false;
    }
    let steps = (dist / step.max(1e-3)).ceil() as u32;
    (1..steps).all(|i| {
        let t = i as f32 / steps as f32;
        !grid.is_wall_at(from.lerp(to, t))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_room() -> Grid {
        Grid::from_rows(&[
            "#########", //
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#########",
        ])
    }

    /// Enemy boxed in on the left, player on the right, solid wall between
    fn split_room() -> Grid {
        Grid::from_rows(&[
            "###########", //
            "#...#.....#",
            "#...#.....#",
            "#...#.....#",
            "###########",
        ])
    }

    #[test]
    fn test_line_of_sight_clear_and_blocked() {
        let room = open_room();
        assert!(line_of_sight(&room, Vec2::new(1.5, 1.5), Vec2::new(6.5, 6.5), 12.0, 0.1));
        let split = split_room();
        assert!(!line_of_sight(&split, Vec2::new(2.5, 2.5), Vec2::new(7.5, 2.5), 12.0, 0.1));
    }

    #[test]
    fn test_line_of_sight_range_limit() {
        let room = open_room();
        assert!(!line_of_sight(&room, Vec2::new(1.5, 1.5), Vec2::new(7.5, 7.5), 3.0, 0.1));
    }

    #[test]
    fn test_chase_within_one_update() {
        let grid = open_room();
        let cfg = GameConfig::default();
        let mut rng = Mulberry32::new(1);
        let mut enemy = Enemy::new(Vec2::new(2.5, 2.5), 0.0);
        let t = enemy.update(&grid, Vec2::new(6.5, 6.5), 0.016, 0.016, &cfg, &mut rng);
        assert_eq!(t, Transition::Spotted);
        assert_eq!(enemy.state, EnemyState::Chase);
        let expected = angle_between(Vec2::new(2.5, 2.5), Vec2::new(6.5, 6.5));
        assert!((enemy.target_facing - expected).abs() < 0.05);
    }

    #[test]
    fn test_chase_cools_down_after_sight_lost() {
        let grid = split_room();
        let cfg = GameConfig::default();
        let mut rng = Mulberry32::new(2);
        let mut enemy = Enemy::new(Vec2::new(2.5, 2.5), 0.0);
        enemy.state = EnemyState::Chase;
        enemy.last_seen = Some(0.0);

        let player = Vec2::new(7.5, 2.5);
        let dt = 0.05;
        let mut now = 0.0;
        // Still chasing inside the grace period
        while now + dt < 1.7 {
            now += dt;
            enemy.update(&grid, player, now, dt, &cfg, &mut rng);
            assert_eq!(enemy.state, EnemyState::Chase, "dropped chase early at {}", now);
        }
        let mut reverted = false;
        for _ in 0..10 {
            now += dt;
            if enemy.update(&grid, player, now, dt, &cfg, &mut rng) == Transition::LostTrack {
                reverted = true;
                break;
            }
        }
        assert!(reverted);
        assert_eq!(enemy.state, EnemyState::Wander);
        assert!(now >= 1.8);
    }

    #[test]
    fn test_turn_never_overshoots() {
        let mut enemy = Enemy::new(Vec2::ZERO, 0.0);
        enemy.target_facing = 0.1;
        enemy.turn_toward_target(1.0);
        assert!((enemy.facing - 0.1).abs() < 1e-6);
        enemy.target_facing = 3.0;
        enemy.turn_toward_target(0.5);
        assert!((enemy.facing - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_chase_is_faster() {
        let cfg = GameConfig::default();
        let mut enemy = Enemy::new(Vec2::ZERO, 0.0);
        let wander = enemy.speed(&cfg);
        enemy.state = EnemyState::Chase;
        assert!(enemy.speed(&cfg) > wander);
    }

    #[test]
    fn test_wander_turns_away_from_wall() {
        let grid = open_room();
        let cfg = GameConfig {
            wander_turn_chance: 0.0,
            ..Default::default()
        };
        let mut rng = Mulberry32::new(5);
        // Facing the east wall, half a cell away
        let mut enemy = Enemy::new(Vec2::new(7.5, 4.5), 0.0);
        enemy.wander_steer(&grid, &cfg, &mut rng);
        assert!((enemy.target_facing.abs() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_wander_escapes_dead_end() {
        let grid = Grid::from_rows(&[
            "#########", //
            "#.......#",
            "#########",
        ]);
        let cfg = GameConfig {
            wander_turn_chance: 0.0,
            ..Default::default()
        };
        let dt = 1.0 / 60.0;
        for seed in 0..5 {
            let mut rng = Mulberry32::new(seed);
            let mut enemy = Enemy::new(Vec2::new(7.6, 1.5), 0.0);
            let mut blocked_frames = 0;
            for i in 0..600 {
                enemy.update(&grid, Vec2::new(100.0, 100.0), i as f32 * dt, dt, &cfg, &mut rng);
                let ahead = enemy.pos + angle_to_dir(enemy.facing) * cfg.wander_probe;
                if !grid.is_wall_at(ahead) {
                    break;
                }
                blocked_frames += 1;
            }
            // A half turn at the configured rate, with some slack
            let turn_frames = (PI / cfg.enemy_turn_rate / dt).ceil() as u32 + 10;
            assert!(
                blocked_frames <= turn_frames,
                "seed {} stuck for {} frames",
                seed,
                blocked_frames
            );
        }
    }

    #[test]
    fn test_wander_prefers_open_side() {
        // Wall ahead and to the left (north), open to the right (south)
        let grid = Grid::from_rows(&[
            "#####", //
            "#..##",
            "#...#",
            "#####",
        ]);
        let cfg = GameConfig {
            wander_turn_chance: 0.0,
            ..Default::default()
        };
        for seed in 0..8 {
            let mut rng = Mulberry32::new(seed);
            let mut enemy = Enemy::new(Vec2::new(2.5, 1.5), 0.0);
            enemy.wander_steer(&grid, &cfg, &mut rng);
            assert!((enemy.target_facing - FRAC_PI_2).abs() < 1e-5);
        }
    }

    #[test]
    fn test_enemy_stays_out_of_walls() {
        let grid = open_room();
        let cfg = GameConfig::default();
        let mut rng = Mulberry32::new(11);
        let mut enemy = Enemy::new(Vec2::new(4.5, 4.5), 0.7);
        // Far away player so it keeps wandering
        for i in 0..2_000 {
            enemy.update(&grid, Vec2::new(100.0, 100.0), i as f32 * 0.016, 0.016, &cfg, &mut rng);
            assert!(crate::sim::movement::is_clear(&grid, enemy.pos, cfg.collision_radius));
        }
    }
}
