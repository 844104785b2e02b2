use super::constants::{SPAWN_POSITIONS, TILE_SIZE};
use super::tile_map::{world_to_tile, TileMap};
use anyhow::Context;
use std::path::Path;

#[rustfmt::skip]
const DEFAULT_LEVEL: [&str; 12] = [
  "....................",
  "....................",
  "....................",
  "....................",
  "...........###......",
  "....................",
  "......###.......##..",
  "....................",
  "..##............#...",
  "..........###...#...",
  "....................",
  "####################",
];

/// Built-in level used when no level file is configured.
pub fn default_level() -> TileMap {
  let width = DEFAULT_LEVEL[0].len();
  let height = DEFAULT_LEVEL.len();
  let cells = DEFAULT_LEVEL
    .iter()
    .flat_map(|row| row.bytes().map(|tile| u8::from(tile == b'#')))
    .collect();
  match TileMap::new(width, height, cells) {
    Ok(map) => map,
    Err(error) => unreachable!("built-in level is malformed: {error}"),
  }
}

/// Reads a `{width, height, cells}` JSON level.
pub fn load_level(path: &Path) -> anyhow::Result<TileMap> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read level {}", path.display()))?;
  let map: TileMap = serde_json::from_str(&raw)
    .with_context(|| format!("failed to parse level {}", path.display()))?;
  ensure_spawns_clear(&map, &SPAWN_POSITIONS)?;
  Ok(map)
}

/// Rejects spawns whose tile-sized box touches a solid tile.
fn ensure_spawns_clear(map: &TileMap, spawns: &[(f32, f32)]) -> anyhow::Result<()> {
  for &(x, y) in spawns {
    let (tx, ty) = (world_to_tile(x), world_to_tile(y));
    let overlap_x = x.rem_euclid(TILE_SIZE) > 0.0;
    let overlap_y = y.rem_euclid(TILE_SIZE) > 0.0;
    let blocked = map.is_solid(tx, ty)
      || (overlap_x && map.is_solid(tx + 1, ty))
      || (overlap_y && map.is_solid(tx, ty + 1))
      || (overlap_x && overlap_y && map.is_solid(tx + 1, ty + 1));
    if blocked {
      anyhow::bail!("spawn position ({x}, {y}) is inside a solid tile");
    }
  }
  Ok(())
}
