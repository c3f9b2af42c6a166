//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded mulberry32 stream only
//! - Time advances only through `tick(dt)`
//! - No rendering or platform dependencies

pub mod enemy;
pub mod maze;
pub mod movement;
pub mod placement;
pub mod raycast;
pub mod rng;
pub mod state;
pub mod tick;

pub use enemy::{Enemy, EnemyState, line_of_sight};
pub use maze::{Cell, Grid, LoopParams, Maze, cell_center, cell_of, generate, generate_seeded};
pub use movement::{is_clear, try_move};
pub use placement::{Spawns, find_random_floor, place_entities};
pub use raycast::{RayHit, Side, cast_columns, cast_ray, column_angle};
pub use rng::Mulberry32;
pub use state::{GameEvent, GamePhase, GameState, Pickups, Player, SessionSummary, Status};
pub use tick::{FrameInput, shape_input, tick};
