//! WebSocket protocol adapter.
//!
//! Framing only, no business logic: binary frames feed the session buffer,
//! text frames parse into control messages, result events serialize back as
//! JSON. Every teardown path, normal or not, closes the session.

use crate::protocol::{ClientMessage, ErrorKind, ServerMessage};
use crate::server::AppState;
use crate::session::SessionConfig;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Outbound event queue depth per connection.
///
/// Sized for several windows' worth of partial/final events; the pipeline
/// awaits on send, so a slow client backpressures its own session only.
const EVENT_QUEUE_DEPTH: usize = 64;

/// GET /ws/transcribe
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drives one connection from accept to teardown.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, stream) = socket.split();
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

    // All outbound traffic goes through one writer task so pipeline events
    // and direct replies stay ordered.
    let writer = tokio::spawn(forward_events(events_rx, sink));

    let session_id = match state.manager.create_session(events_tx.clone()).await {
        Ok(id) => id,
        Err(e) => {
            // Admission refused: report and hang up
            warn!(error = %e, "connection refused");
            let _ = events_tx.send(ServerMessage::from_error(&e)).await;
            drop(events_tx);
            let _ = writer.await;
            return;
        }
    };

    let _ = events_tx
        .send(ServerMessage::status("connected", Some(session_id.clone())))
        .await;

    read_loop(stream, &state, &session_id, &events_tx).await;

    state.manager.close_session(&session_id).await;
    drop(events_tx);
    let _ = writer.await;
}

/// Consumes inbound frames until the peer disconnects or errors.
async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    state: &AppState,
    session_id: &str,
    events: &mpsc::Sender<ServerMessage>,
) {
    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                debug!(session = %session_id, error = %e, "connection error");
                break;
            }
        };

        match message {
            Message::Binary(bytes) => {
                if let Err(e) = state.manager.process_audio(session_id, &bytes).await {
                    let _ = events.send(ServerMessage::from_error(&e)).await;
                }
            }
            Message::Text(text) => {
                handle_control(state, session_id, &text, events).await;
            }
            Message::Close(_) => break,
            // Transport-level ping/pong is answered by the websocket layer
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

/// Dispatches one JSON control frame.
async fn handle_control(
    state: &AppState,
    session_id: &str,
    text: &str,
    events: &mpsc::Sender<ServerMessage>,
) {
    // Control messages count as activity even when they change nothing
    let _ = state.manager.touch_session(session_id).await;

    match ClientMessage::from_json(text) {
        Ok(ClientMessage::Ping) => {
            let _ = events.send(ServerMessage::Pong).await;
        }
        Ok(ClientMessage::Config {
            model,
            language,
            vad_enabled,
            beam_size,
        }) => {
            let config = SessionConfig {
                model,
                language,
                vad_enabled,
                beam_size,
            };
            match state.manager.configure(session_id, config).await {
                Ok(()) => {
                    let _ = events
                        .send(ServerMessage::status(
                            "configured",
                            Some(session_id.to_string()),
                        ))
                        .await;
                }
                Err(e) => {
                    let _ = events.send(ServerMessage::from_error(&e)).await;
                }
            }
        }
        Err(e) => {
            // Unparseable JSON is reported; the connection stays open
            debug!(session = %session_id, error = %e, "malformed control message");
            let _ = events
                .send(ServerMessage::Error {
                    error: ErrorKind::MalformedControlMessage,
                    detail: Some(e.to_string()),
                })
                .await;
        }
    }
}

/// Serializes queued events onto the socket until the queue closes.
async fn forward_events(
    mut events: mpsc::Receiver<ServerMessage>,
    mut sink: SplitSink<WebSocket, Message>,
) {
    while let Some(event) = events.recv().await {
        match event.to_json() {
            Ok(json) => {
                if sink.send(Message::Text(json)).await.is_err() {
                    // Peer is gone; drain and drop remaining events
                    break;
                }
            }
            Err(e) => {
                error!(error = %e, "failed to serialize result event");
            }
        }
    }
    let _ = sink.close().await;
}
