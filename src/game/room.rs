mod session;

pub use session::{Outbound, SessionIo};

use super::constants::{MAX_DT, SPAWN_POSITIONS, SYNC_INTERVAL_TICKS, TICK_MS};
use super::controllers::ControllerSet;
use super::error::RoomError;
use super::physics::{crush_between, step_player, Crushed};
use super::tile_map::TileMap;
use super::types::{
  Action, Controller, ControllerId, MePayload, OwnedController, Player, RoomSnapshot,
};
use crate::protocol::{self, ActionFrame, ClientMessage, MessageType};
use serde::Serialize;
use session::{outbound_channel, SendOutcome, SessionEntry};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

#[derive(Debug)]
pub struct Room {
  state: Mutex<RoomState>,
  running: AtomicBool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoomStats {
  pub connections: usize,
  pub players: usize,
}

#[derive(Debug, Default, PartialEq)]
pub struct JoinReport {
  pub seated: Vec<ControllerId>,
  pub refused: Vec<RoomError>,
}

#[derive(Debug)]
struct RoomState {
  sessions: HashMap<String, SessionEntry>,
  connections: Vec<String>,
  controllers: Vec<Controller>,
  map: TileMap,
  max: usize,
  spawn_positions: Vec<(f32, f32)>,
  tick_count: u64,
}

#[derive(Debug, Serialize)]
struct DieEvent {
  id: ControllerId,
}

impl Room {
  pub fn new(map: TileMap, max: usize) -> Self {
    Self::with_spawn_positions(map, max, SPAWN_POSITIONS.to_vec())
  }

  pub fn with_spawn_positions(map: TileMap, max: usize, spawn_positions: Vec<(f32, f32)>) -> Self {
    Self {
      state: Mutex::new(RoomState::new(map, max, spawn_positions)),
      running: AtomicBool::new(false),
    }
  }

  /// Spawns the tick loop. Returns `None` if it is already running.
  pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
    if self
      .running
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return None;
    }

    let room = Arc::clone(self);
    Some(tokio::spawn(async move {
      let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
      interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
      let mut last_tick = Instant::now();
      loop {
        interval.tick().await;
        let now = Instant::now();
        let dt = frame_dt(now.duration_since(last_tick));
        last_tick = now;
        let mut state = room.state.lock().await;
        state.tick(dt);
      }
    }))
  }

  pub async fn add_session(&self) -> SessionIo {
    let session_id = Uuid::new_v4().to_string();
    let (sender, outbound_rx) = outbound_channel();
    let mut state = self.state.lock().await;
    state
      .sessions
      .insert(session_id.clone(), SessionEntry::new(sender));
    tracing::debug!(%session_id, "session opened");
    SessionIo {
      session_id,
      outbound_rx,
    }
  }

  pub async fn remove_session(&self, session_id: &str) {
    let mut state = self.state.lock().await;
    state.disconnect_session(session_id);
  }

  pub async fn handle_text_message(&self, session_id: &str, text: &str) {
    let message = match protocol::decode_client_message(text) {
      Ok(message) => message,
      Err(error) => {
        tracing::debug!(session_id, %error, "dropping control message");
        return;
      }
    };
    let mut state = self.state.lock().await;
    match message {
      ClientMessage::Join { roster } => {
        let roster = ControllerSet::from_roster(roster);
        if let Err(error) = state.join(session_id, roster) {
          tracing::warn!(session_id, %error, "join refused");
        }
      }
      ClientMessage::Actions { id, actions } => {
        state.handle_actions(session_id, id, actions);
      }
    }
  }

  pub async fn handle_binary_message(&self, session_id: &str, data: &[u8]) {
    let frame = match protocol::decode_action_frame(data) {
      Ok(frame) => frame,
      Err(error) => {
        tracing::debug!(session_id, %error, "dropping action frame");
        return;
      }
    };
    let mut state = self.state.lock().await;
    let Some(id) = state.controller_id_at(frame.index as usize) else {
      tracing::debug!(session_id, index = frame.index, "action frame for empty index");
      return;
    };
    state.handle_actions(session_id, id, frame.actions);
  }

  pub async fn stats(&self) -> RoomStats {
    let state = self.state.lock().await;
    RoomStats {
      connections: state.connections.len(),
      players: state.seated_count(),
    }
  }
}

/// Converts elapsed wall time into frame units, clamped to `[0, MAX_DT]`.
pub fn frame_dt(elapsed: Duration) -> f32 {
  let frames = elapsed.as_secs_f32() * 1000.0 / TICK_MS as f32;
  frames.clamp(0.0, MAX_DT)
}

impl RoomState {
  fn new(map: TileMap, max: usize, spawn_positions: Vec<(f32, f32)>) -> Self {
    Self {
      sessions: HashMap::new(),
      connections: Vec::new(),
      controllers: Vec::new(),
      map,
      max,
      spawn_positions,
      tick_count: 0,
    }
  }

  fn seated_count(&self) -> usize {
    self
      .controllers
      .iter()
      .filter(|controller| controller.player.is_some())
      .count()
  }

  fn controller_id_at(&self, index: usize) -> Option<ControllerId> {
    self.controllers.get(index).map(|controller| controller.id)
  }

  fn controller_index(&self, id: ControllerId) -> Option<usize> {
    self
      .controllers
      .iter()
      .position(|controller| controller.id == id)
  }

  fn free_spawn_positions(&self) -> VecDeque<(f32, f32)> {
    let occupied: Vec<(f32, f32)> = self
      .controllers
      .iter()
      .filter_map(|controller| controller.player.as_ref())
      .map(Player::spawn)
      .collect();
    self
      .spawn_positions
      .iter()
      .copied()
      .filter(|position| !occupied.contains(position))
      .collect()
  }

  /// Seats every controller in `roster` that can still get a spawn slot.
  /// Nothing changes when the room is full or no controller can be seated.
  fn join(&mut self, session_id: &str, mut roster: ControllerSet) -> Result<JoinReport, RoomError> {
    let Some(entry) = self.sessions.get(session_id) else {
      return Err(RoomError::UnknownSession(session_id.to_string()));
    };
    if entry.joined {
      return Err(RoomError::AlreadyJoined(session_id.to_string()));
    }
    if roster.is_empty() {
      return Err(RoomError::EmptyRoster);
    }
    if self.controllers.len() > self.max {
      return Err(RoomError::RoomFull {
        controllers: self.controllers.len(),
        max: self.max,
      });
    }

    let mut available = self.free_spawn_positions();
    let mut seated = Vec::new();
    let mut refused = Vec::new();
    for controller in roster.iter() {
      match available.pop_front() {
        Some((x, y)) => {
          let mut controller = controller.clone();
          controller.seat(Player::new(x, y));
          seated.push(controller);
        }
        None => {
          let error = RoomError::NoFreeSpawn(controller.id);
          tracing::warn!(session_id, controller_id = %controller.id, %error, "controller not seated");
          refused.push(error);
        }
      }
    }

    if seated.is_empty() {
      return Err(refused
        .into_iter()
        .next()
        .unwrap_or(RoomError::EmptyRoster));
    }

    for error in &refused {
      if let RoomError::NoFreeSpawn(id) = error {
        roster.remove_controller(*id);
      }
    }

    let report = JoinReport {
      seated: seated.iter().map(|controller| controller.id).collect(),
      refused,
    };
    self.controllers.extend(seated);
    if let Some(entry) = self.sessions.get_mut(session_id) {
      entry.roster = roster;
      entry.joined = true;
    }
    self.connections.push(session_id.to_string());
    tracing::info!(session_id, seated = report.seated.len(), "session joined");

    self.send_me(session_id);
    self.sync();
    Ok(report)
  }

  /// Removes the session's controllers and re-syncs. Safe to repeat.
  fn leave(&mut self, session_id: &str, roster: &ControllerSet) {
    self
      .controllers
      .retain(|controller| !roster.contains(controller.id));
    self.connections.retain(|connection| connection != session_id);
    tracing::info!(session_id, "session left");
    self.sync();
  }

  fn disconnect_session(&mut self, session_id: &str) {
    let Some(entry) = self.sessions.remove(session_id) else { return };
    tracing::debug!(session_id, "session closed");
    if entry.joined {
      self.leave(session_id, &entry.roster);
    }
  }

  fn handle_actions(&mut self, session_id: &str, id: ControllerId, actions: Vec<Action>) {
    let owns = self
      .sessions
      .get(session_id)
      .is_some_and(|entry| entry.joined && entry.roster.contains(id));
    let index = self.controller_index(id);
    let (true, Some(index)) = (owns, index) else {
      tracing::debug!(session_id, controller_id = %id, "stale action reference");
      return;
    };
    let Some(player) = self.controllers[index].player.as_mut() else { return };
    player.set_actions(actions);

    let payload = protocol::build_payload(MessageType::Position, &*player, Some(index));
    self.broadcast_control(Some(session_id), payload);
  }

  fn tick(&mut self, dt: f32) {
    self.tick_count += 1;
    let mut crushes: Vec<(usize, usize)> = Vec::new();

    for index in 0..self.controllers.len() {
      let Some(player) = self.controllers[index].player.as_mut() else { continue };
      step_player(player, &self.map, dt);

      for other in 0..self.controllers.len() {
        if other == index {
          continue;
        }
        let (Some(a), Some(b)) = (
          self.controllers[index].player.as_ref(),
          self.controllers[other].player.as_ref(),
        ) else {
          continue;
        };
        let (victim, crusher) = match crush_between(a, b) {
          Some(Crushed::First) => (index, other),
          Some(Crushed::Second) => (other, index),
          None => continue,
        };
        if let Some(player) = self.controllers[victim].player.as_mut() {
          player.die();
        }
        if let Some(player) = self.controllers[crusher].player.as_mut() {
          player.score += 1;
        }
        crushes.push((victim, crusher));
      }
    }

    for (victim, crusher) in crushes {
      let id = self.controllers[victim].id;
      tracing::debug!(controller_id = %id, index = victim, crusher, "player crushed");
      let payload = protocol::build_payload(MessageType::Die, &DieEvent { id }, Some(victim));
      self.broadcast_control(None, payload);
    }

    self.broadcast_frames();

    if self.tick_count % SYNC_INTERVAL_TICKS == 0 && !self.connections.is_empty() {
      self.sync();
    }
  }

  fn broadcast_frames(&mut self) {
    if self.connections.is_empty() {
      return;
    }
    let frames: Vec<Vec<u8>> = self
      .controllers
      .iter()
      .enumerate()
      .filter_map(|(index, controller)| {
        let player = controller.player.as_ref()?;
        Some(ActionFrame::from_player(index, player).encode())
      })
      .collect();
    for frame in frames {
      self.broadcast(None, Outbound::Binary(frame));
    }
  }

  fn snapshot(&self) -> RoomSnapshot<'_> {
    RoomSnapshot {
      max: self.max,
      connections: self.connections.len(),
      controllers: &self.controllers,
    }
  }

  fn sync(&mut self) {
    let payload = protocol::build_payload(MessageType::Sync, &self.snapshot(), None);
    self.broadcast_control(None, payload);
  }

  fn send_me(&mut self, session_id: &str) {
    let Some(entry) = self.sessions.get(session_id) else { return };
    let controllers = self
      .controllers
      .iter()
      .enumerate()
      .filter(|(_, controller)| entry.roster.contains(controller.id))
      .map(|(index, controller)| OwnedController {
        id: controller.id,
        index,
        name: controller.name.clone(),
        color: controller.color.clone(),
      })
      .collect();
    let payload = match protocol::build_payload(MessageType::Me, &MePayload { controllers }, None) {
      Ok(payload) => payload,
      Err(error) => {
        tracing::warn!(session_id, %error, "failed to encode me payload");
        return;
      }
    };
    if entry.send(Outbound::Text(payload)) == SendOutcome::Closed {
      self.disconnect_session(session_id);
    }
  }

  fn broadcast_control(
    &mut self,
    exclude: Option<&str>,
    payload: Result<String, crate::game::error::ProtocolError>,
  ) {
    match payload {
      Ok(payload) => self.broadcast(exclude, Outbound::Text(payload)),
      Err(error) => tracing::warn!(%error, "failed to encode control message"),
    }
  }

  /// Fans out to every joined connection except `exclude`. Connections whose
  /// writer has gone away are disconnected afterwards.
  fn broadcast(&mut self, exclude: Option<&str>, payload: Outbound) {
    let mut stale = Vec::new();
    for session_id in &self.connections {
      if exclude == Some(session_id.as_str()) {
        continue;
      }
      let Some(entry) = self.sessions.get(session_id) else { continue };
      match entry.send(payload.clone()) {
        SendOutcome::Sent => {}
        SendOutcome::Dropped => {
          tracing::debug!(%session_id, "outbound queue full, dropping payload");
        }
        SendOutcome::Closed => stale.push(session_id.clone()),
      }
    }
    for session_id in stale {
      self.disconnect_session(&session_id);
    }
  }
}
