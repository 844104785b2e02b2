use super::constants::TILE_SIZE;
use super::error::LevelError;
use serde::Deserialize;

/// Static level geometry. A cell value of 0 is empty, anything else is solid.
/// Level files may use any integer tile code; only solidity is kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawTileMap")]
pub struct TileMap {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct RawTileMap {
    width: usize,
    height: usize,
    cells: Vec<i64>,
}

impl TryFrom<RawTileMap> for TileMap {
    type Error = LevelError;

    fn try_from(raw: RawTileMap) -> Result<Self, Self::Error> {
        let cells = raw.cells.into_iter().map(|code| u8::from(code != 0)).collect();
        TileMap::new(raw.width, raw.height, cells)
    }
}

impl TileMap {
    pub fn new(width: usize, height: usize, cells: Vec<u8>) -> Result<Self, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::EmptyLevel);
        }
        let expected = width
            .checked_mul(height)
            .filter(|count| i32::try_from(*count).is_ok())
            .ok_or(LevelError::TooLarge { width, height })?;
        if cells.len() != expected {
            return Err(LevelError::CellCount {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Off-map coordinates read as empty.
    pub fn cell_at(&self, tile_x: i32, tile_y: i32) -> u8 {
        if tile_x < 0 || tile_y < 0 {
            return 0;
        }
        let (tx, ty) = (tile_x as usize, tile_y as usize);
        if tx >= self.width || ty >= self.height {
            return 0;
        }
        self.cells[tx + ty * self.width]
    }

    pub fn is_solid(&self, tile_x: i32, tile_y: i32) -> bool {
        self.cell_at(tile_x, tile_y) != 0
    }

    /// Largest `x` a player may occupy.
    pub fn max_x(&self) -> f32 {
        tile_to_world((self.width - 1) as i32)
    }

    /// `y` of the bottom-most tile row.
    pub fn ground_level(&self) -> f32 {
        tile_to_world((self.height - 1) as i32)
    }
}

pub fn world_to_tile(p: f32) -> i32 {
    (p / TILE_SIZE).floor() as i32
}

pub fn tile_to_world(t: i32) -> f32 {
    t as f32 * TILE_SIZE
}
