use crate::game::constants::OUTBOUND_QUEUE_CAPACITY;
use crate::game::controllers::ControllerSet;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// A message queued for one connection's socket writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SendOutcome {
    Sent,
    Dropped,
    Closed,
}

#[derive(Debug)]
pub(crate) struct SessionEntry {
    sender: mpsc::Sender<Outbound>,
    pub(crate) roster: ControllerSet,
    pub(crate) joined: bool,
}

impl SessionEntry {
    pub(crate) fn new(sender: mpsc::Sender<Outbound>) -> Self {
        Self {
            sender,
            roster: ControllerSet::new(),
            joined: false,
        }
    }

    /// Never waits on the socket writer: a full queue drops the payload.
    pub(crate) fn send(&self, payload: Outbound) -> SendOutcome {
        match self.sender.try_send(payload) {
            Ok(()) => SendOutcome::Sent,
            Err(TrySendError::Full(_)) => SendOutcome::Dropped,
            Err(TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }
}

pub struct SessionIo {
    pub session_id: String,
    pub outbound_rx: mpsc::Receiver<Outbound>,
}

pub(crate) fn outbound_channel() -> (mpsc::Sender<Outbound>, mpsc::Receiver<Outbound>) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}
