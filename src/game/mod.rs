pub mod constants;
pub mod controllers;
pub mod error;
pub mod level;
pub mod physics;
pub mod room;
pub mod tile_map;
pub mod types;
