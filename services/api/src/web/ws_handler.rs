//! services/api/src/web/ws_handler.rs
//!
//! This is the entry point for a candidate's live interview connection.
//! The shareable link resolves here without authentication; the socket is
//! bridged to a `ParticipantRunner` through a pair of channels.

use crate::web::{
    participant_task::{ParticipantCommand, ParticipantRunner},
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use interview_core::domain::InterviewStatus;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Path(interview_id): Path<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, interview_id))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!("Failed to encode server message: {}", e);
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, interview_id: Uuid) {
    info!("New participant connection for interview: {}", interview_id);
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // --- 1. Validate the interview before anything else ---
    let refusal = match app_state.interviews.get(interview_id).await {
        None => Some(ServerMessage::Error {
            message: "Interview not found".to_string(),
        }),
        Some(interview) if interview.status.is_terminal() => match interview.status {
            InterviewStatus::Completed => Some(ServerMessage::Completed { interview_id }),
            _ => Some(ServerMessage::Error {
                message: format!("This interview has been {}", interview.status),
            }),
        },
        Some(_) => None,
    };
    if let Some(message) = refusal {
        if let Some(frame) = encode(&message) {
            let _ = ws_sender.send(frame).await;
        }
        let _ = ws_sender.close().await;
        return;
    }

    // --- 2. Spawn the participant runner ---
    let (command_tx, command_rx) = mpsc::channel::<ParticipantCommand>(32);
    let (update_tx, mut update_rx) = mpsc::channel::<ServerMessage>(64);
    let cancel = CancellationToken::new();

    let runner = ParticipantRunner::new(
        interview_id,
        app_state.interviews.clone(),
        app_state.voice.clone(),
        app_state.config.voice_agent_id.clone(),
    );
    let runner_task = tokio::spawn(runner.run(
        command_rx,
        update_tx,
        app_state.config.session_timeout,
        cancel.clone(),
    ));

    // --- 3. Forward runner updates to the socket ---
    let writer_task = tokio::spawn(async move {
        while let Some(message) = update_rx.recv().await {
            let Some(frame) = encode(&message) else { continue };
            if ws_sender.send(frame).await.is_err() {
                warn!("Failed to send update to participant.");
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    // --- 4. Main Message Loop ---
    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    let command = match client_msg {
                        ClientMessage::Start { microphone_granted } => {
                            ParticipantCommand::Start(ClientMessage::permission(microphone_granted))
                        }
                        ClientMessage::Speak { text } => ParticipantCommand::Speak(text),
                        ClientMessage::ToggleMicrophone => ParticipantCommand::ToggleMicrophone,
                        ClientMessage::ToggleAudio => ParticipantCommand::ToggleAudio,
                        ClientMessage::Finish => ParticipantCommand::Finish,
                    };
                    if command_tx.send(command).await.is_err() {
                        info!("Participant session already finished.");
                        break;
                    }
                }
                Err(e) => warn!("Failed to deserialize client message: {}", e),
            },
            Message::Close(_) => {
                info!("Participant sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- 5. Cleanup ---
    cancel.cancel();
    drop(command_tx);
    if let Err(e) = runner_task.await {
        error!("Participant runner panicked: {:?}", e);
    }
    let _ = writer_task.await;
    info!("Participant connection for {} closed.", interview_id);
}
