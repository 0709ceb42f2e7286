//! Course layouts
//!
//! Nine hand-shaped obstacle patterns, three per difficulty tier. Each one
//! partitions the canvas into a `cols × rows` grid, encloses it with four
//! border walls, and places pillars and bars on grid cells. The player starts
//! near the bottom-left corner and the goal waits near the top-right.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::Aabb;
use super::tone::{Tone, ToneRegistry};
use crate::consts::*;
use crate::error::MapError;
use crate::{Rgba, rgb};

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    /// Grid partition as (cols, rows)
    pub fn grid(&self) -> (u32, u32) {
        match self {
            Difficulty::Easy => (8, 5),
            Difficulty::Normal => (12, 8),
            Difficulty::Hard => (18, 12),
        }
    }

    /// Resting wall color; darker as the tier rises
    pub fn wall_color(&self) -> Rgba {
        match self {
            Difficulty::Easy => rgb(0x33, 0x41, 0x55),
            Difficulty::Normal => rgb(0x1e, 0x29, 0x3b),
            Difficulty::Hard => rgb(0x0f, 0x17, 0x2a),
        }
    }

    /// Canvas background
    pub fn background(&self) -> Rgba {
        let [r, g, b, _] = rgb(0x0f, 0x17, 0x2a);
        match self {
            Difficulty::Easy => [r, g, b, 0.5],
            Difficulty::Normal => [r, g, b, 0.7],
            Difficulty::Hard => [r, g, b, 1.0],
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(MapError::InvalidMode(s.to_string())),
        }
    }
}

/// Identity of a wall within one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallId(pub u32);

/// A wall produced by a generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallSpec {
    pub id: WallId,
    pub shape: Aabb,
    pub tone: Tone,
}

/// Number of border walls every layout starts with
pub const BORDER_WALLS: usize = 4;

/// A generated course
#[derive(Debug, Clone)]
pub struct MapLayout {
    /// Generator name, e.g. `split-lane`
    pub name: &'static str,
    pub difficulty: Difficulty,
    pub width: f32,
    pub height: f32,
    /// Border walls first (top, bottom, left, right), then obstacles
    pub walls: Vec<WallSpec>,
    /// Player spawn box
    pub start: Aabb,
    pub start_restitution: f32,
    pub goal: Aabb,
    /// Tone assignments for `walls`
    pub tones: ToneRegistry,
}

impl MapLayout {
    pub fn border_walls(&self) -> &[WallSpec] {
        &self.walls[..BORDER_WALLS]
    }

    pub fn obstacles(&self) -> &[WallSpec] {
        &self.walls[BORDER_WALLS..]
    }
}

/// Incremental layout construction on a cell grid
pub struct MapBuilder {
    name: &'static str,
    difficulty: Difficulty,
    width: f32,
    height: f32,
    cell: Vec2,
    walls: Vec<WallSpec>,
    tones: ToneRegistry,
}

impl MapBuilder {
    /// Start a layout for `difficulty`'s grid and emit the four borders
    pub fn new(
        name: &'static str,
        difficulty: Difficulty,
        width: f32,
        height: f32,
        tones: ToneRegistry,
    ) -> Self {
        let (cols, rows) = difficulty.grid();
        let mut map = Self {
            name,
            difficulty,
            width,
            height,
            cell: Vec2::new(width / cols as f32, height / rows as f32),
            walls: Vec::new(),
            tones,
        };

        let t = BORDER_THICKNESS;
        map.wall(width / 2.0, t / 2.0, width, t);
        map.wall(width / 2.0, height - t / 2.0, width, t);
        map.wall(t / 2.0, height / 2.0, t, height);
        map.wall(width - t / 2.0, height / 2.0, t, height);
        map
    }

    /// Cell size in pixels
    pub fn cell(&self) -> Vec2 {
        self.cell
    }

    /// Add a static wall centered on `(x, y)` and give it a tone
    pub fn wall(&mut self, x: f32, y: f32, width: f32, height: f32) -> WallId {
        let id = WallId(self.walls.len() as u32);
        let tone = self.tones.assign(id);
        self.walls.push(WallSpec {
            id,
            shape: Aabb::new(x, y, width, height),
            tone,
        });
        id
    }

    /// Vertical pillar centered in grid column `col`
    fn pillar(&mut self, col: u32, y: f32, height: f32) -> WallId {
        let x = col as f32 * self.cell.x + self.cell.x / 2.0;
        self.wall(x, y, OBSTACLE_THICKNESS, height)
    }

    /// Horizontal bar centered in grid cell (`col`, `row`)
    fn bar(&mut self, col: u32, row: u32, width: f32) -> WallId {
        let x = col as f32 * self.cell.x + self.cell.x / 2.0;
        let y = row as f32 * self.cell.y + self.cell.y / 2.0;
        self.wall(x, y, width, OBSTACLE_THICKNESS)
    }

    pub fn finish(self, start: Vec2, goal: Vec2) -> MapLayout {
        MapLayout {
            name: self.name,
            difficulty: self.difficulty,
            width: self.width,
            height: self.height,
            walls: self.walls,
            start: Aabb::new(start.x, start.y, PLAYER_SIZE, PLAYER_SIZE),
            start_restitution: PLAYER_RESTITUTION,
            goal: Aabb::new(goal.x, goal.y, GOAL_SIZE, GOAL_SIZE),
            tones: self.tones,
        }
    }
}

/// A layout generator: canvas width, height and a tone source
pub type MapGenerator = fn(f32, f32, ToneRegistry) -> MapLayout;

pub const EASY_MAPS: [MapGenerator; 3] = [split_lane, zigzag_pillars, overhead_bars];
pub const NORMAL_MAPS: [MapGenerator; 3] = [checker_rows, shelf_tower, staggered_posts];
pub const HARD_MAPS: [MapGenerator; 3] = [diagonal_lattice, twin_colonnade, bracket_grid];

/// The three generators for a tier
pub fn generators(difficulty: Difficulty) -> &'static [MapGenerator; 3] {
    match difficulty {
        Difficulty::Easy => &EASY_MAPS,
        Difficulty::Normal => &NORMAL_MAPS,
        Difficulty::Hard => &HARD_MAPS,
    }
}

/// Corner spawn and goal points `inset` cells in from the sides
fn corners(width: f32, height: f32, cell: Vec2, inset_x: f32, inset_y: f32) -> (Vec2, Vec2) {
    (
        Vec2::new(cell.x * inset_x, height - cell.y * inset_y),
        Vec2::new(width - cell.x * inset_x, cell.y * inset_y),
    )
}

// === Easy (8 × 5) ===

/// Mid-height pillars with one open lane in column 3, plus two tall posts
pub fn split_lane(width: f32, height: f32, tones: ToneRegistry) -> MapLayout {
    let mut map = MapBuilder::new("split-lane", Difficulty::Easy, width, height, tones);
    let (cols, _) = Difficulty::Easy.grid();
    let cell = map.cell();

    for i in (1..cols - 1).filter(|&i| i != 3) {
        map.pillar(i, height / 2.0, cell.y);
    }
    map.wall(cell.x * 2.0, cell.y * 2.0, OBSTACLE_THICKNESS, cell.y * 2.0);
    map.wall(cell.x * 5.0, cell.y * 3.0, OBSTACLE_THICKNESS, cell.y * 2.0);

    let (start, goal) = corners(width, height, cell, 0.5, 0.5);
    map.finish(start, goal)
}

/// Pillars alternating between rows 2 and 3
pub fn zigzag_pillars(width: f32, height: f32, tones: ToneRegistry) -> MapLayout {
    let mut map = MapBuilder::new("zigzag-pillars", Difficulty::Easy, width, height, tones);
    let (cols, _) = Difficulty::Easy.grid();
    let cell = map.cell();

    for i in 1..cols - 1 {
        let y = if i % 2 == 0 { cell.y * 2.0 } else { cell.y * 3.0 };
        map.pillar(i, y, cell.y);
    }

    let (start, goal) = corners(width, height, cell, 1.0, 1.0);
    map.finish(start, goal)
}

/// A row of hanging pillars across the middle columns
pub fn overhead_bars(width: f32, height: f32, tones: ToneRegistry) -> MapLayout {
    let mut map = MapBuilder::new("overhead-bars", Difficulty::Easy, width, height, tones);
    let (cols, _) = Difficulty::Easy.grid();
    let cell = map.cell();

    for i in 2..cols - 2 {
        map.pillar(i, cell.y * 2.0, cell.y * 1.5);
    }

    let (start, goal) = corners(width, height, cell, 1.0, 1.0);
    map.finish(start, goal)
}

// === Normal (12 × 8) ===

/// Pillar rows on even grid rows with every third cell left open
pub fn checker_rows(width: f32, height: f32, tones: ToneRegistry) -> MapLayout {
    let mut map = MapBuilder::new("checker-rows", Difficulty::Normal, width, height, tones);
    let (cols, rows) = Difficulty::Normal.grid();
    let cell = map.cell();

    for y in (2..rows - 2).filter(|y| y % 2 == 0) {
        for x in (1..cols - 1).filter(|x| (x + y) % 3 != 0) {
            map.pillar(x, y as f32 * cell.y + cell.y / 2.0, cell.y);
        }
    }

    let (start, goal) = corners(width, height, cell, 1.0, 1.0);
    map.finish(start, goal)
}

/// Stepped pillars plus a column of short shelves at x = 6 cells
pub fn shelf_tower(width: f32, height: f32, tones: ToneRegistry) -> MapLayout {
    let mut map = MapBuilder::new("shelf-tower", Difficulty::Normal, width, height, tones);
    let (cols, rows) = Difficulty::Normal.grid();
    let cell = map.cell();

    for x in 2..cols - 2 {
        let row = if x % 2 == 0 { 3 } else { 4 };
        map.pillar(x, row as f32 * cell.y + cell.y / 2.0, cell.y);
    }
    for y in (1..rows - 1).filter(|y| y % 2 != 0) {
        map.wall(
            cell.x * 6.0,
            y as f32 * cell.y + cell.y / 2.0,
            cell.x * 0.5,
            OBSTACLE_THICKNESS,
        );
    }

    let (start, goal) = corners(width, height, cell, 1.0, 1.0);
    map.finish(start, goal)
}

/// Tall posts high in odd columns and low in the column after
pub fn staggered_posts(width: f32, height: f32, tones: ToneRegistry) -> MapLayout {
    let mut map = MapBuilder::new("staggered-posts", Difficulty::Normal, width, height, tones);
    let (cols, _) = Difficulty::Normal.grid();
    let cell = map.cell();

    for i in (1..cols - 1).step_by(2) {
        map.pillar(i, cell.y * 2.0, cell.y * 2.0);
        if i < cols - 3 {
            map.pillar(i + 1, cell.y * 5.0, cell.y * 2.0);
        }
    }

    let (start, goal) = corners(width, height, cell, 1.0, 1.0);
    map.finish(start, goal)
}

// === Hard (18 × 12) ===

/// Short bars on every fourth diagonal
pub fn diagonal_lattice(width: f32, height: f32, tones: ToneRegistry) -> MapLayout {
    let mut map = MapBuilder::new("diagonal-lattice", Difficulty::Hard, width, height, tones);
    let (cols, rows) = Difficulty::Hard.grid();
    let cell = map.cell();

    for y in 2..rows - 2 {
        for x in (1..cols - 1).filter(|x| (x + y) % 4 == 0) {
            map.bar(x, y, cell.x * 0.8);
        }
    }

    let (start, goal) = corners(width, height, cell, 1.5, 1.0);
    map.finish(start, goal)
}

/// Two rows of tall posts in every odd column
pub fn twin_colonnade(width: f32, height: f32, tones: ToneRegistry) -> MapLayout {
    let mut map = MapBuilder::new("twin-colonnade", Difficulty::Hard, width, height, tones);
    let (cols, _) = Difficulty::Hard.grid();
    let cell = map.cell();

    for i in (1..cols - 1).step_by(2) {
        map.pillar(i, cell.y * 3.0, cell.y * 2.0);
        map.pillar(i, cell.y * 8.0, cell.y * 2.0);
    }

    let (start, goal) = corners(width, height, cell, 1.0, 1.0);
    map.finish(start, goal)
}

/// Bars on a sparse grid: even columns, every third row
pub fn bracket_grid(width: f32, height: f32, tones: ToneRegistry) -> MapLayout {
    let mut map = MapBuilder::new("bracket-grid", Difficulty::Hard, width, height, tones);
    let (cols, rows) = Difficulty::Hard.grid();
    let cell = map.cell();

    for x in (2..cols - 2).step_by(2) {
        for y in (1..rows - 1).step_by(3) {
            map.bar(x, y, cell.x * 0.8);
        }
    }

    let (start, goal) = corners(width, height, cell, 2.0, 1.0);
    map.finish(start, goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn tones() -> ToneRegistry {
        ToneRegistry::new(Pcg32::seed_from_u64(11))
    }

    fn all_generators() -> impl Iterator<Item = (Difficulty, MapGenerator)> {
        Difficulty::ALL
            .into_iter()
            .flat_map(|d| generators(d).iter().map(move |&g| (d, g)))
    }

    fn assert_borders(layout: &MapLayout) {
        let (w, h) = (layout.width, layout.height);
        let borders = layout.border_walls();
        assert_eq!(borders.len(), 4);

        let top = borders[0].shape;
        let bottom = borders[1].shape;
        let left = borders[2].shape;
        let right = borders[3].shape;
        assert!(top.min().y.abs() < 1e-3 && (top.width() - w).abs() < 1e-3);
        assert!((bottom.max().y - h).abs() < 1e-3 && (bottom.width() - w).abs() < 1e-3);
        assert!(left.min().x.abs() < 1e-3 && (left.height() - h).abs() < 1e-3);
        assert!((right.max().x - w).abs() < 1e-3 && (right.height() - h).abs() < 1e-3);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" Hard ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(
            "expert".parse::<Difficulty>(),
            Err(MapError::InvalidMode("expert".to_string()))
        );
    }

    #[test]
    fn test_nine_distinct_layouts() {
        let mut names: Vec<_> = all_generators()
            .map(|(_, g)| g(1280.0, 720.0, tones()).name)
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn test_layout_tier_matches_catalog() {
        for (difficulty, generator) in all_generators() {
            assert_eq!(generator(1280.0, 720.0, tones()).difficulty, difficulty);
        }
    }

    #[test]
    fn test_every_wall_has_recorded_tone() {
        for (_, generator) in all_generators() {
            let layout = generator(1280.0, 720.0, tones());
            assert_eq!(layout.tones.len(), layout.walls.len());
            for wall in &layout.walls {
                assert_eq!(layout.tones.lookup(wall.id), wall.tone);
            }
        }
    }

    #[test]
    fn test_split_lane_leaves_column_three_open() {
        let layout = split_lane(800.0, 500.0, tones());
        // Five mid-height pillars (columns 1,2,4,5,6) plus two posts
        assert_eq!(layout.obstacles().len(), 7);
        let lane_x = 3.0 * 100.0 + 50.0;
        assert!(
            layout
                .obstacles()
                .iter()
                .all(|w| (w.shape.center.x - lane_x).abs() > 1.0)
        );
    }

    #[test]
    fn test_hard_layouts_are_denser_than_easy() {
        let easy = split_lane(1280.0, 720.0, tones()).obstacles().len();
        let hard = diagonal_lattice(1280.0, 720.0, tones()).obstacles().len();
        assert!(hard > easy);
    }

    #[test]
    fn test_start_is_bouncy_and_below_goal() {
        for (_, generator) in all_generators() {
            let layout = generator(1280.0, 720.0, tones());
            assert!(layout.start_restitution > 0.0);
            assert!(layout.start.center.x < layout.goal.center.x);
            assert!(layout.start.center.y > layout.goal.center.y);
        }
    }

    proptest! {
        #[test]
        fn prop_layouts_are_enclosed(width in 320.0f32..3840.0, height in 240.0f32..2160.0) {
            for (_, generator) in all_generators() {
                let layout = generator(width, height, tones());
                assert_borders(&layout);
                let bounds = Aabb::new(width / 2.0, height / 2.0, width, height);
                prop_assert!(bounds.contains(layout.start.center));
                prop_assert!(bounds.contains(layout.goal.center));
                for wall in &layout.walls {
                    prop_assert!(Tone::ALL.contains(&wall.tone));
                }
            }
        }
    }
}
