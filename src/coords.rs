use serde::{Deserialize, Serialize};

/// A point in city space. The ground is the X/Z plane, Y points up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const ZERO: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn ground(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    /// True when `other` lies within `radius` of `self` on both ground axes.
    pub fn near_on_ground(&self, other: Point3, radius: f32) -> bool {
        (self.x - other.x).abs() < radius && (self.z - other.z).abs() < radius
    }
}

/// Integer grid cell, in cell units (cell `(1, -2)` is centred at
/// `(cell_size, 0, -2 * cell_size)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub z: i32,
}

impl GridCell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Nearest cell to a ground point.
    pub fn snap(p: Point3, cell_size: f32) -> Self {
        Self {
            x: (p.x / cell_size).round() as i32,
            z: (p.z / cell_size).round() as i32,
        }
    }

    pub fn center(&self, cell_size: f32) -> Point3 {
        Point3::ground(self.x as f32 * cell_size, self.z as f32 * cell_size)
    }
}

/// Square block of cells, both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min: GridCell, // inclusive
    pub max: GridCell, // inclusive
}

impl GridBounds {
    pub fn new(min: GridCell, max: GridCell) -> Self {
        assert!(min.x <= max.x && min.z <= max.z, "Invalid GridBounds");
        Self { min, max }
    }

    /// Bounds of a `size`x`size` grid centred on the origin, matching cells
    /// `-size/2 .. size/2`.
    pub fn centered(size: i32) -> Self {
        let half = size / 2;
        Self::new(GridCell::new(-half, -half), GridCell::new(half - 1, half - 1))
    }

    pub fn contains(&self, c: GridCell) -> bool {
        c.x >= self.min.x && c.x <= self.max.x && c.z >= self.min.z && c.z <= self.max.z
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    pub fn depth(&self) -> i32 {
        self.max.z - self.min.z + 1
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = GridCell> {
        let min = self.min;
        let max = self.max;
        (min.z..=max.z).flat_map(move |z| (min.x..=max.x).map(move |x| GridCell { x, z }))
    }
}
