use crate::shared::colors::random_color;
use crate::shared::names::{generate_name, sanitize_player_name};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  Up,
  Left,
  Right,
  Down,
}

impl Action {
  pub fn code(self) -> u8 {
    match self {
      Action::Up => 0,
      Action::Left => 1,
      Action::Right => 2,
      Action::Down => 3,
    }
  }

  pub fn from_code(code: u8) -> Option<Self> {
    match code {
      0 => Some(Action::Up),
      1 => Some(Action::Left),
      2 => Some(Action::Right),
      3 => Some(Action::Down),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
  pub x: f32,
  pub y: f32,
  pub dx: f32,
  pub dy: f32,
  actions: Vec<Action>,
  pub is_grounded: bool,
  is_dead: bool,
  pub score: i64,
  spawn_x: f32,
  spawn_y: f32,
}

impl Player {
  pub fn new(spawn_x: f32, spawn_y: f32) -> Self {
    Self {
      x: spawn_x,
      y: spawn_y,
      dx: 0.0,
      dy: 0.0,
      actions: Vec::new(),
      is_grounded: false,
      is_dead: false,
      score: 0,
      spawn_x,
      spawn_y,
    }
  }

  pub fn actions(&self) -> &[Action] {
    &self.actions
  }

  /// Returns false when the action is already queued.
  pub fn add_action(&mut self, action: Action) -> bool {
    if self.actions.contains(&action) {
      return false;
    }
    self.actions.push(action);
    true
  }

  pub fn remove_action(&mut self, action: Action) {
    self.actions.retain(|queued| *queued != action);
  }

  /// Replaces the queue, keeping the first occurrence of each action.
  pub fn set_actions(&mut self, actions: impl IntoIterator<Item = Action>) {
    self.actions.clear();
    for action in actions {
      self.add_action(action);
    }
  }

  pub fn is_dead(&self) -> bool {
    self.is_dead
  }

  pub fn die(&mut self) {
    self.is_dead = true;
  }

  pub fn set_dead(&mut self, is_dead: bool) {
    self.is_dead = is_dead;
  }

  pub fn spawn(&self) -> (f32, f32) {
    (self.spawn_x, self.spawn_y)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerId(Uuid);

impl ControllerId {
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }
}

impl fmt::Display for ControllerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keybinding {
  #[default]
  Arrows,
  Wasd,
}

impl Keybinding {
  /// Keys for up, down, left, right.
  pub fn keys(self) -> [&'static str; 4] {
    match self {
      Keybinding::Arrows => [" ", "ArrowDown", "ArrowLeft", "ArrowRight"],
      Keybinding::Wasd => ["w", "s", "a", "d"],
    }
  }
}

/// Roster entry sent by a client in its `join` message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerDescriptor {
  pub name: Option<String>,
  pub color: Option<String>,
  #[serde(default)]
  pub keybinding: Keybinding,
}

#[derive(Debug, Clone, Serialize)]
pub struct Controller {
  pub id: ControllerId,
  pub name: String,
  pub color: String,
  pub keybinding: Keybinding,
  pub keys: [&'static str; 4],
  pub player: Option<Player>,
}

impl PartialEq for Controller {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for Controller {}

impl Controller {
  pub fn new(name: String, color: String, keybinding: Keybinding) -> Self {
    Self {
      id: ControllerId::new(),
      name,
      color,
      keybinding,
      keys: keybinding.keys(),
      player: None,
    }
  }

  pub fn from_descriptor(descriptor: ControllerDescriptor) -> Self {
    let name = match descriptor.name {
      Some(raw) => sanitize_player_name(&raw, &generate_name()),
      None => generate_name(),
    };
    let color = descriptor
      .color
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty())
      .unwrap_or_else(random_color);
    Self::new(name, color, descriptor.keybinding)
  }

  pub fn seat(&mut self, player: Player) {
    self.player = Some(player);
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot<'a> {
  pub max: usize,
  pub connections: usize,
  pub controllers: &'a [Controller],
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnedController {
  pub id: ControllerId,
  pub index: usize,
  pub name: String,
  pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MePayload {
  pub controllers: Vec<OwnedController>,
}
