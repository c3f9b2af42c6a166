//! Axis-separated collision against the grid
//!
//! X and Y are resolved independently so actors slide along walls instead of
//! sticking at corners.

use glam::Vec2;

use super::maze::Grid;

/// True if all four corner probes of a square of half-extent `radius` are floor
pub fn is_clear(grid: &Grid, p: Vec2, radius: f32) -> bool {
    [
        Vec2::new(p.x - radius, p.y - radius),
        Vec2::new(p.x + radius, p.y - radius),
        Vec2::new(p.x - radius, p.y + radius),
        Vec2::new(p.x + radius, p.y + radius),
    ]
    .iter()
    .all(|&probe| !grid.is_wall_at(probe))
}

/// Move from `pos` toward `target`, applying each axis only if it stays clear.
/// Returns the resolved position.
pub fn try_move(grid: &Grid, pos: Vec2, target: Vec2, radius: f32) -> Vec2 {
    let mut out = pos;
    let along_x = Vec2::new(target.x, out.y);
    if is_clear(grid, along_x, radius) {
        out = along_x;
    }
    let along_y = Vec2::new(out.x, target.y);
    if is_clear(grid, along_y, radius) {
        out = along_y;
    }
    out
}
