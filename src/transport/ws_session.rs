use crate::game::room::{Outbound, Room};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

pub async fn handle_socket(socket: WebSocket, room: Arc<Room>) {
    let (mut sender, mut receiver) = socket.split();
    let session = room.add_session().await;
    let session_id = session.session_id;
    let mut outbound_rx = session.outbound_rx;

    let send_task = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            let message = match payload {
                Outbound::Text(text) => Message::Text(text),
                Outbound::Binary(bytes) => Message::Binary(bytes),
            };
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let message = match result {
            Ok(message) => message,
            Err(error) => {
                tracing::debug!(%session_id, %error, "websocket read failed");
                break;
            }
        };
        match message {
            Message::Text(text) => room.handle_text_message(&session_id, &text).await,
            Message::Binary(data) => room.handle_binary_message(&session_id, &data).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    room.remove_session(&session_id).await;
    send_task.abort();
}
