use super::types::ControllerId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
  #[error("room is full ({controllers} controllers, max {max})")]
  RoomFull { controllers: usize, max: usize },

  #[error("no free spawn slot for controller {0}")]
  NoFreeSpawn(ControllerId),

  #[error("session {0} already joined")]
  AlreadyJoined(String),

  #[error("unknown session {0}")]
  UnknownSession(String),

  #[error("join roster has no controllers")]
  EmptyRoster,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no free controller slot (capacity {capacity})")]
pub struct CapacityError {
  pub capacity: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
  #[error("malformed control message: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unknown message type {0:?}")]
  UnknownType(String),

  #[error("message type {0:?} is missing its data")]
  MissingData(&'static str),

  #[error("frame truncated")]
  Truncated,

  #[error("unsupported frame version {0}")]
  BadVersion(u8),

  #[error("unexpected frame type {0:#04x}")]
  BadFrameType(u8),

  #[error("unknown action code {0}")]
  BadAction(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
  #[error("level must have non-zero width and height")]
  EmptyLevel,

  #[error("level of {width}x{height} tiles is too large")]
  TooLarge { width: usize, height: usize },

  #[error("level has {actual} cells, expected {expected}")]
  CellCount { expected: usize, actual: usize },
}
