//! Spatial model - chunked world partition

mod camera;

pub use camera::Camera2D;

use cgmath::Vector2;
use serde::{Deserialize, Serialize};

/// World-space position in pixels.
pub type Position = Vector2<f32>;

pub const DEFAULT_CHUNK_PIXEL_WIDTH: u32 = 4096;
pub const DEFAULT_CHUNK_PIXEL_HEIGHT: u32 = 4096;

/// Chunk coordinate in the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkSize {
    pub width: u32,
    pub height: u32,
}

impl ChunkSize {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "chunk size must be non-zero");
        Self { width, height }
    }

    /// Chunk containing `position` (floor division, so negative positions
    /// map to negative chunks).
    pub fn chunk_of(&self, position: Position) -> ChunkCoord {
        ChunkCoord {
            x: (position.x / self.width as f32).floor() as i32,
            y: (position.y / self.height as f32).floor() as i32,
        }
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHUNK_PIXEL_WIDTH,
            height: DEFAULT_CHUNK_PIXEL_HEIGHT,
        }
    }
}

/// Chunks around a center for offsets in `[-r, r-1]` on both axes, x-major.
/// Clone before consuming to walk the same sequence twice.
#[derive(Debug, Clone)]
pub struct VisibleChunks {
    center: ChunkCoord,
    radius: i32,
    dx: i32,
    dy: i32,
}

impl VisibleChunks {
    pub fn new(center: ChunkCoord, radius: u16) -> Self {
        let radius = i32::from(radius);
        Self {
            center,
            radius,
            dx: -radius,
            dy: -radius,
        }
    }

    pub fn center(&self) -> ChunkCoord {
        self.center
    }

    fn remaining(&self) -> usize {
        if self.dx >= self.radius {
            return 0;
        }
        let side = (2 * self.radius) as usize;
        let rows_left = (self.radius - self.dx) as usize;
        let consumed_in_row = (self.dy + self.radius) as usize;
        rows_left * side - consumed_in_row
    }
}

impl Iterator for VisibleChunks {
    type Item = ChunkCoord;

    fn next(&mut self) -> Option<ChunkCoord> {
        if self.dx >= self.radius {
            return None;
        }
        // chunk grids near the i32 edge clamp instead of wrapping
        let chunk = ChunkCoord::new(
            self.center.x.saturating_add(self.dx),
            self.center.y.saturating_add(self.dy),
        );
        self.dy += 1;
        if self.dy >= self.radius {
            self.dy = -self.radius;
            self.dx += 1;
        }
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for VisibleChunks {}
