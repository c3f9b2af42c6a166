//! Per-frame simulation step
//!
//! Order: pause toggle, dt clamp, look, player motion, pickups and exit,
//! enemy AI, loss check. Rendering happens after this, driven by the host.

use glam::Vec2;

use super::enemy::Transition;
use super::movement::try_move;
use super::state::{GameEvent, GamePhase, GameState, Status};
use crate::angle_to_dir;
use crate::consts::{KEYS_REQUIRED, MAX_FRAME_DT};
use crate::settings::GameConfig;

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Stick X (strafe right positive), roughly [-1, 1]
    pub move_x: f32,
    /// Stick Y (forward positive), roughly [-1, 1]
    pub move_y: f32,
    /// Accumulated look drag in pixels since the last frame (one-shot)
    pub look_dx: f32,
    /// Pause toggle (one-shot)
    pub pause: bool,
}

/// Deadzone filter and sub-linear boost. Returns (strafe, forward) with
/// magnitude in [0, 1].
pub fn shape_input(x: f32, y: f32, deadzone: f32, curve: f32) -> Vec2 {
    let v = Vec2::new(x, y);
    let mag = v.length();
    if mag < deadzone || mag == 0.0 {
        return Vec2::ZERO;
    }
    v / mag * mag.min(1.0).powf(curve)
}

/// Advance the session by one frame
pub fn tick(state: &mut GameState, input: &FrameInput, dt: f32, cfg: &GameConfig) {
    if input.pause {
        match state.phase {
            GamePhase::Running => {
                state.phase = GamePhase::Paused;
                state.status = Status::Paused;
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Running;
                state.status = state.progress_status();
            }
            GamePhase::Won | GamePhase::Lost => {}
        }
    }

    if !state.is_running() {
        return;
    }

    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    state.elapsed += dt;

    // Look
    if input.look_dx != 0.0 {
        state.player.facing =
            crate::normalize_angle(state.player.facing + input.look_dx * cfg.look_sensitivity);
    }

    move_player(state, input, dt, cfg);
    resolve_pickups(state);
    if !state.is_running() {
        return;
    }

    let now = state.elapsed;
    let player_pos = state.player.pos;
    match state.enemy.update(&state.grid, player_pos, now, dt, cfg, &mut state.rng) {
        Transition::Spotted => state.events.push(GameEvent::EnemySpotted),
        Transition::LostTrack => state.events.push(GameEvent::EnemyLostTrack),
        Transition::None => {}
    }

    if state.enemy_distance() < cfg.catch_radius {
        state.phase = GamePhase::Lost;
        state.status = Status::Caught;
        state.events.push(GameEvent::Caught);
        log::info!("Caught at t={:.1}s (seed {})", state.elapsed, state.seed);
    }
}

fn move_player(state: &mut GameState, input: &FrameInput, dt: f32, cfg: &GameConfig) {
    let stick = shape_input(input.move_x, input.move_y, cfg.input_deadzone, cfg.input_curve);
    if stick == Vec2::ZERO {
        return;
    }

    let forward = angle_to_dir(state.player.facing);
    let right = Vec2::new(-forward.y, forward.x);
    let step = (forward * stick.y + right * stick.x) * state.player.speed * dt;

    let before = state.player.pos;
    state.player.pos = try_move(&state.grid, before, before + step, cfg.collision_radius);

    state.stride += state.player.pos.distance(before);
    if state.stride >= cfg.stride_length {
        state.stride -= cfg.stride_length;
        state.events.push(GameEvent::Footstep);
    }
}

fn resolve_pickups(state: &mut GameState) {
    let cell = state.player_cell();

    if let Some(index) = state
        .pickups
        .keys
        .iter()
        .position(|k| !k.collected && k.cell == cell)
    {
        state.pickups.keys[index].collected = true;
        let total = state.pickups.collected();
        state.events.push(GameEvent::KeyCollected { index, total });
        log::info!("Key {}/{} collected", total, KEYS_REQUIRED);
    }

    if cell == state.pickups.exit {
        if state.pickups.exit_unlocked() {
            state.phase = GamePhase::Won;
            state.status = Status::Escaped;
            state.events.push(GameEvent::Won);
            log::info!("Escaped at t={:.1}s (seed {})", state.elapsed, state.seed);
        } else {
            let missing = KEYS_REQUIRED - state.pickups.collected();
            // Announce once per visit
            if state.status != (Status::ExitLocked { missing }) {
                state.events.push(GameEvent::ExitLocked { missing });
            }
            state.status = Status::ExitLocked { missing };
        }
    } else {
        state.status = state.progress_status();
    }
}
