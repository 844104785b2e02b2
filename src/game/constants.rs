pub const TILE_SIZE: f32 = 20.0;
pub const GRAVITY: f32 = 0.8;
pub const JUMP_VELOCITY: f32 = -12.0;
pub const MOVE_SPEED: f32 = 3.0;
pub const MAX_FALL_SPEED: f32 = 15.0;

pub const TICK_MS: u64 = 16;
pub const MAX_DT: f32 = 5.0;
/// Largest slice of `dt` resolved at once; keeps a max-speed fall under one tile.
pub const MAX_SUBSTEP: f32 = 1.0;
pub const SYNC_INTERVAL_TICKS: u64 = 120;

pub const CONTROLLER_SLOTS: usize = 4;
pub const DEFAULT_ROOM_MAX: usize = 10;
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

pub const SPAWN_POSITIONS: [(f32, f32); 4] = [
  (40.0, 40.0),
  (100.0, 40.0),
  (160.0, 40.0),
  (220.0, 40.0),
];
