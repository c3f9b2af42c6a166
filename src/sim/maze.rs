//! Maze grid and generator
//!
//! Randomized depth-first carving on odd "anchor" cells, followed by a loop
//! injection pass so the maze is not a pure tree.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::rng::Mulberry32;
use crate::consts::MIN_MAZE_SIZE;

/// A single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Floor,
}

/// Row-major maze grid. Anything outside the grid reads as a wall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Grid of solid wall
    pub fn solid(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Wall; width * height],
        }
    }

    /// Build from ASCII rows: `#` is wall, anything else floor.
    /// Short rows are padded with wall.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Self::solid(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch != '#' {
                    grid.set(x as i32, y as i32, Cell::Floor);
                }
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }

    pub fn cell(&self, x: i32, y: i32) -> Cell {
        self.idx(x, y).map_or(Cell::Wall, |i| self.cells[i])
    }

    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(i) = self.idx(x, y) {
            self.cells[i] = cell;
        }
    }

    #[inline]
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) == Cell::Wall
    }

    /// Wall test for a continuous position
    #[inline]
    pub fn is_wall_at(&self, p: Vec2) -> bool {
        let c = cell_of(p);
        self.is_wall(c.x, c.y)
    }

    pub fn is_interior(&self, x: i32, y: i32) -> bool {
        x > 0 && y > 0 && x as usize + 1 < self.width && y as usize + 1 < self.height
    }

    /// Iterator over every floor cell
    pub fn floor_cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| IVec2::new(x, y)))
            .filter(|c| !self.is_wall(c.x, c.y))
    }

    /// Count of orthogonal floor neighbors
    pub fn floor_neighbors(&self, x: i32, y: i32) -> u8 {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .filter(|(dx, dy)| !self.is_wall(x + dx, y + dy))
            .count() as u8
    }

    /// `#` / `.` rendering, one line per row
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                out.push(if self.is_wall(x, y) { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

/// Grid cell containing a continuous position
#[inline]
pub fn cell_of(p: Vec2) -> IVec2 {
    IVec2::new(p.x.floor() as i32, p.y.floor() as i32)
}

/// Center of a grid cell in continuous coordinates
#[inline]
pub fn cell_center(c: IVec2) -> Vec2 {
    Vec2::new(c.x as f32 + 0.5, c.y as f32 + 0.5)
}

/// Round a requested dimension up to the next odd size of at least 5
pub fn valid_dimension(n: usize) -> usize {
    let n = n.max(MIN_MAZE_SIZE);
    if n % 2 == 0 { n + 1 } else { n }
}

/// Loop injection tuning
#[derive(Debug, Clone, Copy)]
pub struct LoopParams {
    /// Fraction of all cells sampled
    pub fraction: f32,
    /// Floor neighbors a wall needs to be opened
    pub min_floor_neighbors: u8,
}

impl Default for LoopParams {
    fn default() -> Self {
        Self {
            fraction: 0.02,
            min_floor_neighbors: 2,
        }
    }
}

/// A generated maze and the seed that produced it
#[derive(Debug, Clone)]
pub struct Maze {
    pub grid: Grid,
    pub seed: u32,
}

/// Generate a maze. Dimensions are normalized with [`valid_dimension`].
/// The rng is left positioned after the last draw so placement can continue
/// on the same stream.
pub fn generate(width: usize, height: usize, seed: u32, loops: LoopParams, rng: &mut Mulberry32) -> Maze {
    let (w, h) = (valid_dimension(width), valid_dimension(height));
    if (w, h) != (width, height) {
        log::warn!("Maze size {}x{} normalized to {}x{}", width, height, w, h);
    }

    let mut grid = Grid::solid(w, h);
    carve(&mut grid, rng);
    let opened = inject_loops(&mut grid, loops, rng);
    log::debug!("Maze {}x{} seed {} carved, {} loop cells opened", w, h, seed, opened);

    Maze { grid, seed }
}

/// Convenience: fresh rng from the seed
pub fn generate_seeded(width: usize, height: usize, seed: u32) -> Maze {
    let mut rng = Mulberry32::new(seed);
    generate(width, height, seed, LoopParams::default(), &mut rng)
}

const ANCHOR_STEPS: [(i32, i32); 4] = [(2, 0), (-2, 0), (0, 2), (0, -2)];

fn carve(grid: &mut Grid, rng: &mut Mulberry32) {
    let start = IVec2::new(1, 1);
    grid.set(start.x, start.y, Cell::Floor);
    let mut stack = vec![start];
    let mut options: Vec<(IVec2, IVec2)> = Vec::with_capacity(4);

    while let Some(&current) = stack.last() {
        options.clear();
        for (dx, dy) in ANCHOR_STEPS {
            let next = IVec2::new(current.x + dx, current.y + dy);
            let link = IVec2::new(current.x + dx / 2, current.y + dy / 2);
            if grid.is_interior(next.x, next.y)
                && grid.is_wall(next.x, next.y)
                && grid.is_wall(link.x, link.y)
            {
                options.push((link, next));
            }
        }

        if options.is_empty() {
            stack.pop();
            continue;
        }

        let (link, next) = options[rng.index(options.len())];
        grid.set(link.x, link.y, Cell::Floor);
        grid.set(next.x, next.y, Cell::Floor);
        stack.push(next);
    }
}

fn inject_loops(grid: &mut Grid, loops: LoopParams, rng: &mut Mulberry32) -> usize {
    let samples = (grid.width() as f32 * grid.height() as f32 * loops.fraction) as usize;
    let mut opened = 0;
    for _ in 0..samples {
        let x = rng.range_i32(1, grid.width() as i32 - 1);
        let y = rng.range_i32(1, grid.height() as i32 - 1);
        if grid.is_wall(x, y) && grid.floor_neighbors(x, y) >= loops.min_floor_neighbors {
            grid.set(x, y, Cell::Floor);
            opened += 1;
        }
    }
    opened
}
