//! First-person scene: walls, billboards and overlays
//!
//! One ray per framebuffer column. Wall distances fill a depth buffer that
//! sprites are tested against column by column.

use glam::Vec2;

use super::framebuffer::{Framebuffer, Rgba};
use crate::normalize_angle;
use crate::settings::GameConfig;
use crate::sim::maze::cell_center;
use crate::sim::raycast::{RayHit, Side, cast_columns};
use crate::sim::rng::Mulberry32;
use crate::sim::state::GameState;

const CEILING_TOP: Rgba = Rgba::rgb(14, 12, 20);
const CEILING_HORIZON: Rgba = Rgba::rgb(4, 4, 8);
const FLOOR_HORIZON: Rgba = Rgba::rgb(6, 5, 6);
const FLOOR_NEAR: Rgba = Rgba::rgb(34, 28, 26);
const WALL: Rgba = Rgba::rgb(118, 104, 128);
const WALL_SEAM: Rgba = Rgba::rgb(62, 54, 70);
const FOG: Rgba = Rgba::rgb(3, 2, 6);
const DANGER: Rgba = Rgba::rgb(190, 0, 10);

/// Billboard kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Key,
    Exit { unlocked: bool },
    Enemy,
}

impl SpriteKind {
    /// Size relative to a full-height wall at the same distance
    fn scale(self) -> f32 {
        match self {
            SpriteKind::Key => 0.3,
            SpriteKind::Exit { .. } => 0.85,
            SpriteKind::Enemy => 0.9,
        }
    }

    /// Vertical offset of the sprite center, in sprite heights (positive = down)
    fn v_offset(self) -> f32 {
        match self {
            SpriteKind::Key => 1.1,
            SpriteKind::Exit { .. } => 0.08,
            SpriteKind::Enemy => 0.05,
        }
    }

    /// Procedural texel at (u, v) in [0, 1)², or None where transparent
    fn texel(self, u: f32, v: f32, time: f32) -> Option<Rgba> {
        match self {
            SpriteKind::Key => {
                let d = (u - 0.5).abs() + (v - 0.5).abs();
                if d < 0.22 {
                    Some(Rgba::rgb(255, 226, 90))
                } else if d < 0.34 {
                    Some(Rgba::rgb(190, 140, 30))
                } else {
                    None
                }
            }
            SpriteKind::Exit { unlocked } => {
                if !(0.15..0.85).contains(&u) {
                    return None;
                }
                let frame = u < 0.22 || u > 0.78 || v < 0.07;
                let color = match (frame, unlocked) {
                    (true, _) => Rgba::rgb(70, 60, 50),
                    (false, true) => {
                        let glow = 0.75 + 0.25 * (time * 3.0).sin();
                        Rgba::rgb(60, 230, 120).scale(glow)
                    }
                    (false, false) => Rgba::rgb(110, 30, 24),
                };
                Some(color)
            }
            SpriteKind::Enemy => {
                let (dx, dy) = (u - 0.5, v - 0.5);
                let eye = |ex: f32| (u - ex).powi(2) + (v - 0.4).powi(2) < 0.07 * 0.07;
                if eye(0.36) || eye(0.64) {
                    Some(Rgba::rgb(255, 30, 20))
                } else if dx * dx + dy * dy < 0.45 * 0.45 {
                    let edge = (dx * dx + dy * dy).sqrt() / 0.45;
                    Some(Rgba::rgb(26, 18, 22).mix(Rgba::rgb(60, 10, 14), edge))
                } else {
                    None
                }
            }
        }
    }
}

/// A billboard to draw this frame
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub pos: Vec2,
    pub kind: SpriteKind,
}

/// Billboards for the current state (collected keys excluded)
pub fn collect_sprites(state: &GameState) -> Vec<Sprite> {
    let mut sprites: Vec<Sprite> = state
        .pickups
        .keys
        .iter()
        .filter(|k| !k.collected)
        .map(|k| Sprite {
            pos: cell_center(k.cell),
            kind: SpriteKind::Key,
        })
        .collect();
    sprites.push(Sprite {
        pos: cell_center(state.pickups.exit),
        kind: SpriteKind::Exit {
            unlocked: state.pickups.exit_unlocked(),
        },
    });
    sprites.push(Sprite {
        pos: state.enemy.pos,
        kind: SpriteKind::Enemy,
    });
    sprites
}

/// Sort far-to-near so nearer billboards overdraw farther ones
pub fn sort_far_to_near(sprites: &mut [Sprite], eye: Vec2) {
    sprites.sort_by(|a, b| {
        let da = a.pos.distance_squared(eye);
        let db = b.pos.distance_squared(eye);
        db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Screen-space placement of a billboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Center column
    pub screen_x: f32,
    /// Side length in pixels
    pub size: f32,
    /// Perpendicular depth (for the depth test)
    pub depth: f32,
}

/// Project a world point; None if behind the camera or outside the cull cone
pub fn project(
    eye: Vec2,
    facing: f32,
    fov: f32,
    cull_fraction: f32,
    point: Vec2,
    width: u32,
    height: u32,
) -> Option<Projection> {
    let offset = normalize_angle(crate::angle_between(eye, point) - facing);
    if offset.abs() > fov * cull_fraction {
        return None;
    }
    let depth = eye.distance(point) * offset.cos();
    if depth < 0.1 {
        return None;
    }
    let half_tan = (fov * 0.5).tan();
    Some(Projection {
        screen_x: (0.5 + offset.tan() / (2.0 * half_tan)) * width as f32,
        size: height as f32 / depth,
        depth,
    })
}

/// Danger level in [0, 1]: 1 when the enemy is on top of the player
pub fn danger_level(distance: f32, range: f32) -> f32 {
    if range <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / range).clamp(0.0, 1.0)
}

pub struct SceneRenderer {
    zbuffer: Vec<f32>,
    frame: u32,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self {
            zbuffer: Vec::new(),
            frame: 0,
        }
    }

    /// Depth of the nearest wall per column from the last render
    pub fn depth_buffer(&self) -> &[f32] {
        &self.zbuffer
    }

    /// Draw the whole frame
    pub fn render(&mut self, fb: &mut Framebuffer, state: &GameState, cfg: &GameConfig) {
        self.frame = self.frame.wrapping_add(1);
        draw_background(fb);

        let hits = cast_columns(&state.grid, state.player.pos, state.player.facing, state.fov, fb.width);
        self.zbuffer.clear();
        self.zbuffer.extend(hits.iter().map(|h| h.distance));
        for (col, hit) in hits.iter().enumerate() {
            draw_wall_column(fb, col as i32, hit, cfg);
        }

        let mut sprites = collect_sprites(state);
        sort_far_to_near(&mut sprites, state.player.pos);
        for sprite in &sprites {
            self.draw_sprite(fb, state, cfg, sprite);
        }

        draw_crosshair(fb);
        let danger = danger_level(state.enemy_distance(), cfg.danger_range);
        self.draw_danger(fb, danger, state.elapsed, cfg);
    }

    fn draw_sprite(&self, fb: &mut Framebuffer, state: &GameState, cfg: &GameConfig, sprite: &Sprite) {
        let Some(proj) = project(
            state.player.pos,
            state.player.facing,
            state.fov,
            cfg.sprite_cull_fraction,
            sprite.pos,
            fb.width,
            fb.height,
        ) else {
            return;
        };

        let size = (proj.size * sprite.kind.scale()).min(fb.height as f32 * 2.0);
        if size < 1.0 {
            return;
        }
        let fog = 1.0 - (proj.depth / cfg.fog_distance).min(1.0);
        let left = proj.screen_x - size * 0.5;
        let center_y = fb.height as f32 * 0.5 + size * sprite.kind.v_offset();
        let top = center_y - size * 0.5;

        let x0 = left.max(0.0) as i32;
        let x1 = (left + size).min(fb.width as f32) as i32;
        let y0 = top.max(0.0) as i32;
        let y1 = (top + size).min(fb.height as f32) as i32;

        for x in x0..x1 {
            if self.zbuffer.get(x as usize).is_some_and(|&z| proj.depth >= z) {
                continue;
            }
            let u = (x as f32 - left) / size;
            for y in y0..y1 {
                let v = (y as f32 - top) / size;
                if let Some(c) = sprite.kind.texel(u, v, state.elapsed) {
                    fb.set_pixel(x, y, FOG.mix(c, fog));
                }
            }
        }
    }

    fn draw_danger(&self, fb: &mut Framebuffer, danger: f32, time: f32, cfg: &GameConfig) {
        if danger <= 0.0 {
            return;
        }
        let pulse = 0.5 + 0.5 * (time * (4.0 + 6.0 * danger)).sin();
        let alpha = danger * (0.12 + 0.2 * pulse);

        let (w, h) = (fb.width as f32, fb.height as f32);
        let (cx, cy) = (w * 0.5, h * 0.5);
        let max_r = (cx * cx + cy * cy).sqrt().max(1.0);
        for y in 0..fb.height as i32 {
            for x in 0..fb.width as i32 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let edge = (dx * dx + dy * dy).sqrt() / max_r;
                fb.blend_pixel(x, y, DANGER, alpha * (0.4 + 0.6 * edge));
            }
        }

        if !cfg.quality.flicker_enabled() {
            return;
        }
        let mut rng = Mulberry32::new(self.frame.wrapping_mul(0x9E37_79B9));
        let count = (danger * w * h * 0.003) as usize;
        for i in 0..count {
            let x = rng.index(fb.width.max(1) as usize) as i32;
            let y = rng.index(fb.height.max(1) as usize) as i32;
            let c = if i % 2 == 0 { DANGER } else { Rgba::BLACK };
            fb.set_pixel(x, y, c);
        }
    }
}

fn draw_background(fb: &mut Framebuffer) {
    let h = fb.height;
    let half = h / 2;
    for y in 0..h {
        let color = if y < half {
            CEILING_TOP.mix(CEILING_HORIZON, y as f32 / half.max(1) as f32)
        } else {
            FLOOR_HORIZON.mix(FLOOR_NEAR, (y - half) as f32 / (h - half).max(1) as f32)
        };
        fb.fill_rows(y, y + 1, color);
    }
}

/// Wall color for a hit: side shading, seams at cell edges, fog
pub fn wall_shade(hit: &RayHit, cfg: &GameConfig) -> Rgba {
    let seam = hit.wall_u < 0.04 || hit.wall_u > 0.96;
    let base = if seam { WALL_SEAM } else { WALL };
    let side = match hit.side {
        Side::X => 1.0,
        Side::Y => cfg.side_shade,
    };
    let fog = 1.0 - (hit.distance / cfg.fog_distance).min(1.0);
    FOG.mix(base.scale(side), fog)
}

fn draw_wall_column(fb: &mut Framebuffer, x: i32, hit: &RayHit, cfg: &GameConfig) {
    let h = fb.height as f32;
    let slice = h / hit.distance;
    let top = (h * 0.5 - slice * 0.5).floor() as i32;
    let bottom = (h * 0.5 + slice * 0.5).ceil() as i32;
    fb.vline(x, top, bottom, wall_shade(hit, cfg));
}

fn draw_crosshair(fb: &mut Framebuffer) {
    let cx = fb.width as i32 / 2;
    let cy = fb.height as i32 / 2;
    let color = Rgba::rgb(220, 220, 220);
    for d in 2..5 {
        fb.blend_pixel(cx + d, cy, color, 0.7);
        fb.blend_pixel(cx - d, cy, color, 0.7);
        fb.blend_pixel(cx, cy + d, color, 0.7);
        fb.blend_pixel(cx, cy - d, color, 0.7);
    }
}
