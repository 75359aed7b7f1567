//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the candidate's browser and
//! the API server for a live interview session.

use interview_core::domain::{Speaker, TranscriptEntry};
use interview_core::participant::{MicrophonePermission, ParticipantStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts the interview. The browser reports whether microphone access was granted.
    Start { microphone_granted: bool },

    /// A candidate turn, already transcribed by the browser.
    Speak { text: String },

    ToggleMicrophone,

    ToggleAudio,

    /// The candidate ends the interview before the timeout.
    Finish,
}

impl ClientMessage {
    pub fn permission(microphone_granted: bool) -> MicrophonePermission {
        if microphone_granted {
            MicrophonePermission::Granted
        } else {
            MicrophonePermission::Denied
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The participant session moved to a new state.
    Status { status: ParticipantStatus },

    /// A line was appended to the live transcript.
    Transcript { speaker: Speaker, text: String },

    Microphone { enabled: bool },

    Audio { enabled: bool },

    /// Reports an error to the client, which should display it.
    Error { message: String },

    /// The interview was completed and its results stored.
    Completed { interview_id: Uuid },
}

impl From<TranscriptEntry> for ServerMessage {
    fn from(entry: TranscriptEntry) -> Self {
        ServerMessage::Transcript {
            speaker: entry.speaker,
            text: entry.text,
        }
    }
}
