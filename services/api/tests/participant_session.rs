//! services/api/tests/participant_session.rs
//!
//! Drives `ParticipantRunner` against the scripted voice agent and an
//! in-memory repository.

use api_lib::adapters::{MemoryStore, MockVoiceAgent};
use api_lib::stores::InterviewRepository;
use api_lib::web::participant_task::{ParticipantCommand, ParticipantRunner};
use api_lib::web::protocol::ServerMessage;
use interview_core::domain::{Interview, InterviewDraft, InterviewStatus, Language};
use interview_core::participant::{MicrophonePermission, ParticipantStatus};
use interview_core::ports::{VoiceAgentService, VoiceEvent};
use interview_core::prompts::build_opening_line;
use interview_core::ServiceError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Fixture {
    interviews: Arc<InterviewRepository>,
    voice: Arc<MockVoiceAgent>,
    interview: Interview,
}

impl Fixture {
    async fn new() -> Self {
        let kv = Arc::new(MemoryStore::new());
        let interviews = Arc::new(
            InterviewRepository::load(kv, "http://localhost:3000")
                .await
                .unwrap(),
        );
        let mut draft = InterviewDraft::new(
            Uuid::new_v4(),
            "Jane Roe",
            "jane.roe@example.com",
            "Backend Engineer",
        );
        draft.questions = vec![
            "Tell me about yourself".to_string(),
            "Why this role?".to_string(),
        ];
        draft.max_duration = 30;
        draft.language = Language::Fr;
        let interview = interviews.create(draft).await.unwrap();
        Self {
            interviews,
            voice: Arc::new(MockVoiceAgent::new()),
            interview,
        }
    }

    fn runner(&self) -> ParticipantRunner {
        let voice: Arc<dyn VoiceAgentService> = self.voice.clone();
        ParticipantRunner::new(self.interview.id, self.interviews.clone(), voice, "test-agent")
    }
}

#[tokio::test]
async fn test_completed_session_stores_joined_transcript() {
    let fixture = Fixture::new().await;
    assert_eq!(fixture.interviews.len().await, 1);
    assert_eq!(
        fixture.interviews.get(fixture.interview.id).await.unwrap().status,
        InterviewStatus::Scheduled
    );
    let mut runner = fixture.runner();

    let messages = runner.start(MicrophonePermission::Granted).await.unwrap();
    assert_eq!(
        messages[0],
        ServerMessage::Status {
            status: ParticipantStatus::Connecting
        }
    );
    assert_eq!(runner.controller().transcript().len(), 1);

    let event = runner.next_event().await.unwrap();
    assert_eq!(event, VoiceEvent::Connected);
    runner.handle_event(event).await;
    assert_eq!(runner.controller().status(), ParticipantStatus::Connected);

    let handle = runner.session_handle().unwrap().clone();
    fixture
        .voice
        .inject(&handle, VoiceEvent::AgentMessage("Tell me about yourself".to_string()))
        .unwrap();
    let event = runner.next_event().await.unwrap();
    runner.handle_event(event).await;
    assert_eq!(runner.controller().status(), ParticipantStatus::Speaking);

    let completed = runner.finish().await.unwrap();
    assert_eq!(runner.controller().status(), ParticipantStatus::Completed);
    assert!(!fixture.voice.is_live(&handle));

    let expected = format!(
        "AI: {}\nAI: Tell me about yourself",
        build_opening_line("Jane Roe", "Backend Engineer")
    );
    assert_eq!(completed.status, InterviewStatus::Completed);
    assert_eq!(completed.transcript.as_deref(), Some(expected.as_str()));
    assert!(completed.summary.is_some());
    assert_eq!(
        fixture.interviews.get(fixture.interview.id).await,
        Some(completed)
    );
}

#[tokio::test]
async fn test_agent_answers_candidate_with_next_question() {
    let fixture = Fixture::new().await;
    let mut runner = fixture.runner();
    runner.start(MicrophonePermission::Granted).await.unwrap();
    let connected = runner.next_event().await.unwrap();
    runner.handle_event(connected).await;

    runner.speak("I build payment systems").await.unwrap();

    let heard = runner.next_event().await.unwrap();
    runner.handle_event(heard).await;
    assert_eq!(runner.controller().status(), ParticipantStatus::Listening);

    let thinking = runner.next_event().await.unwrap();
    runner.handle_event(thinking).await;
    assert_eq!(runner.controller().status(), ParticipantStatus::Processing);

    let reply = runner.next_event().await.unwrap();
    assert_eq!(
        reply,
        VoiceEvent::AgentMessage("Tell me about yourself".to_string())
    );
    runner.handle_event(reply).await;
    assert_eq!(runner.controller().status(), ParticipantStatus::Speaking);
    assert_eq!(runner.controller().transcript().len(), 3);
}

#[tokio::test]
async fn test_denied_microphone_opens_no_session() {
    let fixture = Fixture::new().await;
    let mut runner = fixture.runner();

    let result = runner.start(MicrophonePermission::Denied).await;
    assert!(matches!(result, Err(ServiceError::PermissionDenied)));
    assert_eq!(runner.controller().status(), ParticipantStatus::Idle);
    assert!(runner.controller().transcript().is_empty());
    assert_eq!(fixture.voice.live_sessions(), 0);
}

#[tokio::test]
async fn test_voice_error_moves_to_error_and_ends_session() {
    let fixture = Fixture::new().await;
    let mut runner = fixture.runner();
    runner.start(MicrophonePermission::Granted).await.unwrap();
    let connected = runner.next_event().await.unwrap();
    runner.handle_event(connected).await;

    let handle = runner.session_handle().unwrap().clone();
    fixture
        .voice
        .inject(&handle, VoiceEvent::Error("network".to_string()))
        .unwrap();
    let event = runner.next_event().await.unwrap();
    let messages = runner.handle_event(event).await;

    assert_eq!(runner.controller().status(), ParticipantStatus::Error);
    assert!(messages
        .iter()
        .any(|m| matches!(m, ServerMessage::Error { .. })));
    assert!(!fixture.voice.is_live(&handle));
    assert!(matches!(
        runner.finish().await,
        Err(ServiceError::InvalidSessionState { .. })
    ));
    assert_eq!(
        fixture.interviews.get(fixture.interview.id).await.unwrap().status,
        InterviewStatus::Scheduled
    );
}

#[tokio::test]
async fn test_restart_after_error_opens_fresh_session() {
    let fixture = Fixture::new().await;
    let mut runner = fixture.runner();
    runner.start(MicrophonePermission::Granted).await.unwrap();
    let connected = runner.next_event().await.unwrap();
    runner.handle_event(connected).await;

    let first = runner.session_handle().unwrap().clone();
    fixture
        .voice
        .inject(&first, VoiceEvent::AgentMessage("Tell me about yourself".to_string()))
        .unwrap();
    fixture
        .voice
        .inject(&first, VoiceEvent::Error("network".to_string()))
        .unwrap();
    let question = runner.next_event().await.unwrap();
    runner.handle_event(question).await;
    let failure = runner.next_event().await.unwrap();
    runner.handle_event(failure).await;
    assert_eq!(runner.controller().status(), ParticipantStatus::Error);

    let denied = runner.start(MicrophonePermission::Denied).await;
    assert!(matches!(denied, Err(ServiceError::PermissionDenied)));
    assert_eq!(runner.controller().status(), ParticipantStatus::Idle);

    runner.start(MicrophonePermission::Granted).await.unwrap();
    let second = runner.session_handle().unwrap().clone();
    assert_ne!(first, second);
    assert!(!fixture.voice.is_live(&first));
    assert_eq!(fixture.voice.live_sessions(), 1);
    assert_eq!(runner.controller().transcript().len(), 1);

    let completed = runner.finish().await.unwrap();
    let expected = format!(
        "AI: {}",
        build_opening_line("Jane Roe", "Backend Engineer")
    );
    assert_eq!(completed.transcript.as_deref(), Some(expected.as_str()));
    assert_eq!(fixture.voice.live_sessions(), 0);
}

#[tokio::test]
async fn test_provider_disconnect_ends_session() {
    let fixture = Fixture::new().await;
    let mut runner = fixture.runner();
    runner.start(MicrophonePermission::Granted).await.unwrap();
    let connected = runner.next_event().await.unwrap();
    runner.handle_event(connected).await;

    let first = runner.session_handle().unwrap().clone();
    fixture.voice.inject(&first, VoiceEvent::Disconnected).unwrap();
    let event = runner.next_event().await.unwrap();
    let messages = runner.handle_event(event).await;

    assert_eq!(
        messages,
        vec![ServerMessage::Status {
            status: ParticipantStatus::Idle
        }]
    );
    assert!(runner.session_handle().is_none());
    assert!(!fixture.voice.is_live(&first));
    assert_eq!(fixture.voice.live_sessions(), 0);

    runner.start(MicrophonePermission::Granted).await.unwrap();
    assert_eq!(fixture.voice.live_sessions(), 1);
    assert_eq!(runner.controller().transcript().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_denied_start_does_not_arm_time_limit() {
    let fixture = Fixture::new().await;
    let runner = fixture.runner();
    let (command_tx, command_rx) = mpsc::channel(8);
    let (update_tx, mut update_rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(runner.run(
        command_rx,
        update_tx,
        Duration::from_secs(60),
        cancel.clone(),
    ));

    command_tx
        .send(ParticipantCommand::Start(MicrophonePermission::Denied))
        .await
        .unwrap();
    assert_eq!(
        update_rx.recv().await,
        Some(ServerMessage::Status {
            status: ParticipantStatus::Idle
        })
    );
    assert!(matches!(
        update_rx.recv().await,
        Some(ServerMessage::Error { .. })
    ));

    tokio::time::sleep(Duration::from_secs(120)).await;
    cancel.cancel();
    task.await.unwrap();

    assert_eq!(
        fixture.interviews.get(fixture.interview.id).await.unwrap().status,
        InterviewStatus::Scheduled
    );
    assert_eq!(fixture.voice.live_sessions(), 0);
}

#[tokio::test]
async fn test_cancelled_interview_cannot_start() {
    let fixture = Fixture::new().await;
    fixture.interviews.cancel(fixture.interview.id).await.unwrap();
    let mut runner = fixture.runner();

    let result = runner.start(MicrophonePermission::Granted).await;
    assert!(matches!(result, Err(ServiceError::InvalidTransition { .. })));
    assert_eq!(fixture.voice.live_sessions(), 0);
}

#[tokio::test]
async fn test_toggle_audio_sets_session_volume() {
    let fixture = Fixture::new().await;
    let mut runner = fixture.runner();
    runner.start(MicrophonePermission::Granted).await.unwrap();
    let handle = runner.session_handle().unwrap().clone();

    assert!(!runner.toggle_audio().await.unwrap());
    assert_eq!(fixture.voice.volume(&handle), Some(0.0));
    assert!(runner.toggle_audio().await.unwrap());
    assert_eq!(fixture.voice.volume(&handle), Some(1.0));
}

#[tokio::test(start_paused = true)]
async fn test_session_is_completed_when_time_runs_out() {
    let fixture = Fixture::new().await;
    let runner = fixture.runner();
    let (command_tx, command_rx) = mpsc::channel(8);
    let (update_tx, mut update_rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(runner.run(
        command_rx,
        update_tx,
        Duration::from_secs(60),
        cancel.clone(),
    ));

    command_tx
        .send(ParticipantCommand::Start(MicrophonePermission::Granted))
        .await
        .unwrap();

    let mut updates = Vec::new();
    while let Some(message) = update_rx.recv().await {
        updates.push(message);
    }
    task.await.unwrap();

    assert_eq!(
        updates.last(),
        Some(&ServerMessage::Completed {
            interview_id: fixture.interview.id
        })
    );
    let stored = fixture.interviews.get(fixture.interview.id).await.unwrap();
    assert_eq!(stored.status, InterviewStatus::Completed);
    assert!(stored
        .transcript
        .unwrap()
        .starts_with("AI: Hello Jane Roe"));
    assert_eq!(fixture.voice.live_sessions(), 0);
}

#[tokio::test]
async fn test_cancelled_runner_leaves_interview_scheduled() {
    let fixture = Fixture::new().await;
    let runner = fixture.runner();
    let (command_tx, command_rx) = mpsc::channel(8);
    let (update_tx, mut update_rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(runner.run(
        command_rx,
        update_tx,
        Duration::from_secs(3600),
        cancel.clone(),
    ));

    command_tx
        .send(ParticipantCommand::Start(MicrophonePermission::Granted))
        .await
        .unwrap();
    assert_eq!(
        update_rx.recv().await,
        Some(ServerMessage::Status {
            status: ParticipantStatus::Connecting
        })
    );

    cancel.cancel();
    task.await.unwrap();

    assert_eq!(fixture.voice.live_sessions(), 0);
    assert_eq!(
        fixture.interviews.get(fixture.interview.id).await.unwrap().status,
        InterviewStatus::Scheduled
    );
}
