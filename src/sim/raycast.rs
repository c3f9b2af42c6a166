//! DDA ray march through the grid
//!
//! Distances are perpendicular to the view plane so walls do not bow
//! (no fisheye).

use glam::{IVec2, Vec2};

use super::maze::{Grid, cell_of};
use crate::angle_to_dir;
use crate::consts::MAX_RAY_STEPS;

/// Which axis the ray crossed when it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Crossed a vertical grid line (stepped in X)
    X,
    /// Crossed a horizontal grid line (stepped in Y)
    Y,
}

/// Result of one ray
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Perpendicular distance to the wall face
    pub distance: f32,
    /// Distance along the ray itself
    pub ray_length: f32,
    pub side: Side,
    /// Cell the ray stopped in
    pub cell: IVec2,
    /// Always true: a ray either finds a wall or exhausts its budget,
    /// and exhaustion counts as a hit
    pub hit: bool,
    /// The step budget ran out before a wall was found
    pub exhausted: bool,
    /// Position of the hit along the wall face, in [0, 1)
    pub wall_u: f32,
}

/// Ray angle for a screen column. Column 0 is the left edge.
pub fn column_angle(column: u32, width: u32, facing: f32, fov: f32) -> f32 {
    let camera_x = 2.0 * (column as f32 + 0.5) / width.max(1) as f32 - 1.0;
    facing + (camera_x * (fov * 0.5).tan()).atan()
}

/// Cast a ray at `angle` from `origin`; `facing` is used for the
/// perpendicular correction.
pub fn cast_ray(grid: &Grid, origin: Vec2, angle: f32, facing: f32) -> RayHit {
    let dir = angle_to_dir(angle);
    let mut map = cell_of(origin);

    let delta_x = if dir.x == 0.0 { f32::INFINITY } else { (1.0 / dir.x).abs() };
    let delta_y = if dir.y == 0.0 { f32::INFINITY } else { (1.0 / dir.y).abs() };

    let (step_x, mut side_x) = if dir.x < 0.0 {
        (-1, (origin.x - map.x as f32) * delta_x)
    } else if dir.x > 0.0 {
        (1, (map.x as f32 + 1.0 - origin.x) * delta_x)
    } else {
        (0, f32::INFINITY)
    };
    let (step_y, mut side_y) = if dir.y < 0.0 {
        (-1, (origin.y - map.y as f32) * delta_y)
    } else if dir.y > 0.0 {
        (1, (map.y as f32 + 1.0 - origin.y) * delta_y)
    } else {
        (0, f32::INFINITY)
    };

    let mut side = Side::X;
    let mut ray_length = 0.0;
    let mut exhausted = true;
    for _ in 0..MAX_RAY_STEPS {
        if side_x < side_y {
            ray_length = side_x;
            side_x += delta_x;
            map.x += step_x;
            side = Side::X;
        } else {
            ray_length = side_y;
            side_y += delta_y;
            map.y += step_y;
            side = Side::Y;
        }
        if grid.is_wall(map.x, map.y) {
            exhausted = false;
            break;
        }
    }

    let hit_point = origin + dir * ray_length;
    let along = match side {
        Side::X => hit_point.y,
        Side::Y => hit_point.x,
    };
    let distance = (ray_length * (angle - facing).cos()).max(1e-4);

    RayHit {
        distance,
        ray_length,
        side,
        cell: map,
        hit: true,
        exhausted,
        wall_u: along - along.floor(),
    }
}

/// Cast one ray per screen column
pub fn cast_columns(grid: &Grid, origin: Vec2, facing: f32, fov: f32, width: u32) -> Vec<RayHit> {
    (0..width)
        .map(|col| cast_ray(grid, origin, column_angle(col, width, facing, fov), facing))
        .collect()
}
