use crate::game::error::ProtocolError;
use crate::game::types::{Action, ControllerDescriptor, ControllerId, Player};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const VERSION: u8 = 1;

pub const TYPE_ACTIONS_FRAME: u8 = 0x01;

pub const FLAG_GROUNDED: u8 = 1 << 0;
pub const FLAG_DEAD: u8 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
  Join,
  Sync,
  Actions,
  Position,
  Me,
  Die,
}

impl MessageType {
  pub fn as_str(self) -> &'static str {
    match self {
      MessageType::Join => "join",
      MessageType::Sync => "sync",
      MessageType::Actions => "actions",
      MessageType::Position => "position",
      MessageType::Me => "me",
      MessageType::Die => "die",
    }
  }
}

#[derive(Debug)]
pub enum ClientMessage {
  Join {
    roster: Vec<Option<ControllerDescriptor>>,
  },
  Actions {
    id: ControllerId,
    actions: Vec<Action>,
  },
}

#[derive(Debug, Deserialize)]
struct Envelope {
  #[serde(rename = "type")]
  kind: String,
  #[serde(default)]
  data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Roster {
  List(Vec<Option<ControllerDescriptor>>),
  Set {
    controllers: Vec<Option<ControllerDescriptor>>,
  },
}

#[derive(Debug, Deserialize)]
struct ActionsData {
  id: ControllerId,
  #[serde(default)]
  actions: Vec<Action>,
}

pub fn decode_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
  let envelope: Envelope = serde_json::from_str(text)?;
  match envelope.kind.as_str() {
    "join" => {
      let data = unwrap_data(envelope.data, "join")?;
      let roster = match serde_json::from_value::<Roster>(data)? {
        Roster::List(roster) => roster,
        Roster::Set { controllers } => controllers,
      };
      Ok(ClientMessage::Join { roster })
    }
    "actions" => {
      let data = unwrap_data(envelope.data, "actions")?;
      let ActionsData { id, actions } = serde_json::from_value(data)?;
      Ok(ClientMessage::Actions { id, actions })
    }
    _ => Err(ProtocolError::UnknownType(envelope.kind)),
  }
}

/// Clients may send `data` either inline or as a JSON-encoded string.
fn unwrap_data(data: Option<Value>, kind: &'static str) -> Result<Value, ProtocolError> {
  match data {
    None | Some(Value::Null) => Err(ProtocolError::MissingData(kind)),
    Some(Value::String(inner)) => Ok(serde_json::from_str(&inner)?),
    Some(value) => Ok(value),
  }
}

#[derive(Debug, Serialize)]
struct OutboundEnvelope<'a, T: Serialize> {
  #[serde(rename = "type")]
  kind: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  path: Option<usize>,
  data: &'a T,
}

pub fn build_payload<T: Serialize>(
  kind: MessageType,
  data: &T,
  path: Option<usize>,
) -> Result<String, ProtocolError> {
  let envelope = OutboundEnvelope {
    kind: kind.as_str(),
    path,
    data,
  };
  Ok(serde_json::to_string(&envelope)?)
}

/// Per-player state carried on the binary channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionFrame {
  pub index: u32,
  pub x: f32,
  pub y: f32,
  pub dy: f32,
  pub actions: Vec<Action>,
  pub is_grounded: bool,
  pub is_dead: bool,
}

impl ActionFrame {
  pub fn from_player(index: usize, player: &Player) -> Self {
    Self {
      index: index as u32,
      x: player.x,
      y: player.y,
      dy: player.dy,
      actions: player.actions().to_vec(),
      is_grounded: player.is_grounded,
      is_dead: player.is_dead(),
    }
  }

  /// Overwrites the frame's fields on the player it describes. Score, `dx`
  /// and the spawn slot are not carried on the wire and stay as they are.
  pub fn apply_to(&self, player: &mut Player) {
    player.x = self.x;
    player.y = self.y;
    player.dy = self.dy;
    player.set_actions(self.actions.iter().copied());
    player.is_grounded = self.is_grounded;
    player.set_dead(self.is_dead);
  }

  pub fn encode(&self) -> Vec<u8> {
    let action_count = self.actions.len().min(u8::MAX as usize);
    let mut encoder = Encoder::with_capacity(2 + 4 + 12 + 1 + action_count + 1);
    encoder.write_header(TYPE_ACTIONS_FRAME);
    encoder.write_u32(self.index);
    encoder.write_f32(self.x);
    encoder.write_f32(self.y);
    encoder.write_f32(self.dy);
    encoder.write_u8(action_count as u8);
    for action in self.actions.iter().take(action_count) {
      encoder.write_u8(action.code());
    }
    let mut flags = 0;
    if self.is_grounded {
      flags |= FLAG_GROUNDED;
    }
    if self.is_dead {
      flags |= FLAG_DEAD;
    }
    encoder.write_u8(flags);
    encoder.into_vec()
  }
}

pub fn decode_action_frame(data: &[u8]) -> Result<ActionFrame, ProtocolError> {
  let mut reader = Reader::new(data);
  let version = reader.read_u8().ok_or(ProtocolError::Truncated)?;
  if version != VERSION {
    return Err(ProtocolError::BadVersion(version));
  }
  let message_type = reader.read_u8().ok_or(ProtocolError::Truncated)?;
  if message_type != TYPE_ACTIONS_FRAME {
    return Err(ProtocolError::BadFrameType(message_type));
  }
  let index = reader.read_u32().ok_or(ProtocolError::Truncated)?;
  let x = reader.read_f32().ok_or(ProtocolError::Truncated)?;
  let y = reader.read_f32().ok_or(ProtocolError::Truncated)?;
  let dy = reader.read_f32().ok_or(ProtocolError::Truncated)?;
  let action_count = reader.read_u8().ok_or(ProtocolError::Truncated)?;
  let mut actions = Vec::with_capacity(action_count as usize);
  for _ in 0..action_count {
    let code = reader.read_u8().ok_or(ProtocolError::Truncated)?;
    actions.push(Action::from_code(code).ok_or(ProtocolError::BadAction(code))?);
  }
  let flags = reader.read_u8().ok_or(ProtocolError::Truncated)?;
  Ok(ActionFrame {
    index,
    x,
    y,
    dy,
    actions,
    is_grounded: flags & FLAG_GROUNDED != 0,
    is_dead: flags & FLAG_DEAD != 0,
  })
}

pub struct Encoder {
  buffer: Vec<u8>,
}

impl Encoder {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      buffer: Vec::with_capacity(capacity),
    }
  }

  pub fn into_vec(self) -> Vec<u8> {
    self.buffer
  }

  pub fn write_header(&mut self, message_type: u8) {
    self.write_u8(VERSION);
    self.write_u8(message_type);
  }

  pub fn write_u8(&mut self, value: u8) {
    self.buffer.push(value);
  }

  pub fn write_u32(&mut self, value: u32) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_f32(&mut self, value: f32) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }
}

struct Reader<'a> {
  data: &'a [u8],
  offset: usize,
}

impl<'a> Reader<'a> {
  fn new(data: &'a [u8]) -> Self {
    Self { data, offset: 0 }
  }

  fn read_u8(&mut self) -> Option<u8> {
    let value = *self.data.get(self.offset)?;
    self.offset += 1;
    Some(value)
  }

  fn read_u32(&mut self) -> Option<u32> {
    let bytes = self.read_bytes::<4>()?;
    Some(u32::from_le_bytes(bytes))
  }

  fn read_f32(&mut self) -> Option<f32> {
    let bytes = self.read_bytes::<4>()?;
    Some(f32::from_le_bytes(bytes))
  }

  fn read_bytes<const N: usize>(&mut self) -> Option<[u8; N]> {
    if self.offset + N > self.data.len() {
      return None;
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&self.data[self.offset..self.offset + N]);
    self.offset += N;
    Some(out)
  }
}
