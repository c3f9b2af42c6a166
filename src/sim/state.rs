//! Session state and core simulation types
//!
//! Everything a session needs to be replayed from its seed lives here.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::maze::{Grid, LoopParams, cell_center, generate};
use super::placement::{Spawns, place_entities};
use super::rng::Mulberry32;
use crate::consts::KEYS_REQUIRED;
use crate::settings::GameConfig;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Frozen, resumable
    Paused,
    /// Escaped through the exit with every key
    Won,
    /// Caught by the enemy
    Lost,
}

/// Player-facing status, published as data for the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Searching for keys
    Exploring { keys: usize },
    /// Standing on the exit without enough keys
    ExitLocked { missing: usize },
    /// All keys found, exit is open
    ExitOpen,
    Paused,
    Escaped,
    Caught,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Exploring { keys } => {
                write!(f, "Keys {}/{} - find the keys", keys, KEYS_REQUIRED)
            }
            Status::ExitLocked { missing } => {
                let noun = if *missing == 1 { "key" } else { "keys" };
                write!(f, "The exit is locked - {} more {} needed", missing, noun)
            }
            Status::ExitOpen => write!(f, "Keys {0}/{0} - reach the exit", KEYS_REQUIRED),
            Status::Paused => write!(f, "Paused"),
            Status::Escaped => write!(f, "You escaped!"),
            Status::Caught => write!(f, "It caught you"),
        }
    }
}

/// Things that happened during a frame, drained by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    KeyCollected { index: usize, total: usize },
    ExitLocked { missing: usize },
    Won,
    Caught,
    Footstep,
    EnemySpotted,
    EnemyLostTrack,
}

/// The player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Facing angle (radians, 0 = +X, grid Y grows downward)
    pub facing: f32,
    pub speed: f32,
}

/// A key on the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub cell: IVec2,
    pub collected: bool,
}

/// Keys and the exit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickups {
    /// In spawn order
    pub keys: Vec<Key>,
    pub exit: IVec2,
}

impl Pickups {
    pub fn new(keys: [IVec2; KEYS_REQUIRED], exit: IVec2) -> Self {
        Self {
            keys: keys
                .iter()
                .map(|&cell| Key {
                    cell,
                    collected: false,
                })
                .collect(),
            exit,
        }
    }

    pub fn collected(&self) -> usize {
        self.keys.iter().filter(|k| k.collected).count()
    }

    pub fn exit_unlocked(&self) -> bool {
        self.collected() >= KEYS_REQUIRED
    }
}

/// Complete session state (deterministic from the seed and inputs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Maze seed, shown on the end screens
    pub seed: u32,
    pub grid: Grid,
    pub player: Player,
    pub enemy: Enemy,
    pub pickups: Pickups,
    pub phase: GamePhase,
    pub status: Status,
    /// Seconds of simulated (unpaused) time
    pub elapsed: f32,
    /// Field of view (radians)
    pub fov: f32,
    /// Distance walked since the last footstep
    pub stride: f32,
    /// Session RNG, continues from maze generation
    pub rng: Mulberry32,
    /// Events since the host last drained them
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Generate a maze from the seed and place everything on it
    pub fn new(seed: u32, cfg: &GameConfig) -> Self {
        let mut rng = Mulberry32::new(seed);
        let (w, h) = cfg.maze_size();
        let loops = LoopParams {
            fraction: cfg.loop_fraction,
            min_floor_neighbors: cfg.loop_min_floor_neighbors,
        };
        let maze = generate(w, h, seed, loops, &mut rng);
        let spawns = place_entities(&maze.grid, &mut rng, cfg);
        log::info!(
            "Session seed {}: player {:?}, exit {:?}, enemy {:?}",
            seed,
            spawns.player,
            spawns.exit,
            spawns.enemy
        );
        Self::from_parts(seed, maze.grid, spawns, rng, cfg)
    }

    /// Assemble a session from an explicit grid and spawns
    pub fn from_parts(seed: u32, grid: Grid, spawns: Spawns, rng: Mulberry32, cfg: &GameConfig) -> Self {
        let player_pos = cell_center(spawns.player);
        let enemy_pos = cell_center(spawns.enemy);
        let enemy_facing = crate::angle_between(enemy_pos, player_pos);
        let mut state = Self {
            seed,
            grid,
            player: Player {
                pos: player_pos,
                facing: 0.0,
                speed: cfg.player_speed,
            },
            enemy: Enemy::new(enemy_pos, enemy_facing),
            pickups: Pickups::new(spawns.keys, spawns.exit),
            phase: GamePhase::Running,
            status: Status::Exploring { keys: 0 },
            elapsed: 0.0,
            fov: cfg.fov,
            stride: 0.0,
            rng,
            events: Vec::new(),
        };
        state.player.facing = state.open_facing();
        state
    }

    /// Face down the first open corridor so the opening view is not a wall
    fn open_facing(&self) -> f32 {
        use std::f32::consts::{FRAC_PI_2, PI};
        let c = super::maze::cell_of(self.player.pos);
        [(0.0, (1, 0)), (FRAC_PI_2, (0, 1)), (PI, (-1, 0)), (-FRAC_PI_2, (0, -1))]
            .iter()
            .find(|(_, (dx, dy))| !self.grid.is_wall(c.x + dx, c.y + dy))
            .map_or(0.0, |(a, _)| *a)
    }

    pub fn player_cell(&self) -> IVec2 {
        super::maze::cell_of(self.player.pos)
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Player-enemy distance
    pub fn enemy_distance(&self) -> f32 {
        self.enemy.distance_to(self.player.pos)
    }

    /// Status derived from progress (not from end phases)
    pub fn progress_status(&self) -> Status {
        if self.pickups.exit_unlocked() {
            Status::ExitOpen
        } else {
            Status::Exploring {
                keys: self.pickups.collected(),
            }
        }
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// End-of-session record for the win/loss screens
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            seed: self.seed,
            outcome: self.phase,
            keys: self.pickups.collected(),
            elapsed: self.elapsed,
        }
    }
}

/// What the end screens show
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub seed: u32,
    pub outcome: GamePhase,
    pub keys: usize,
    pub elapsed: f32,
}

impl SessionSummary {
    pub fn headline(&self) -> String {
        match self.outcome {
            GamePhase::Won => format!("Escaped in {:.1}s - seed {}", self.elapsed, self.seed),
            GamePhase::Lost => format!(
                "Caught after {:.1}s with {}/{} keys - seed {}",
                self.elapsed, self.keys, KEYS_REQUIRED, self.seed
            ),
            GamePhase::Running | GamePhase::Paused => format!("Seed {}", self.seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_reproducible() {
        let cfg = GameConfig::default();
        let a = GameState::new(4242, &cfg);
        let b = GameState::new(4242, &cfg);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.pickups.exit, b.pickups.exit);
        assert_eq!(a.enemy.pos, b.enemy.pos);
        assert_eq!(a.pickups.keys.len(), KEYS_REQUIRED);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(Status::Exploring { keys: 1 }.to_string(), "Keys 1/3 - find the keys");
        assert_eq!(
            Status::ExitLocked { missing: 1 }.to_string(),
            "The exit is locked - 1 more key needed"
        );
        assert_eq!(Status::ExitOpen.to_string(), "Keys 3/3 - reach the exit");
    }

    #[test]
    fn test_summary_serializes_seed() {
        let cfg = GameConfig::default();
        let mut state = GameState::new(77, &cfg);
        state.phase = GamePhase::Lost;
        let json = serde_json::to_string(&state.summary()).unwrap();
        assert!(json.contains("\"seed\":77"));
        assert!(state.summary().headline().contains("seed 77"));
    }

    #[test]
    fn test_opening_view_faces_open_cell() {
        let cfg = GameConfig::default();
        let state = GameState::new(9, &cfg);
        let ahead = state.player.pos + crate::angle_to_dir(state.player.facing);
        assert!(!state.grid.is_wall_at(ahead));
    }
}
