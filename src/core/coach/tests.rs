use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::protocol::frame::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use super::*;
use crate::core::channel::{ChannelConfig, ConnectionState, ReconnectPolicy};
use crate::core::elevenlabs::ConversationConfig;
use crate::core::emotion::Emotion;
use crate::core::interview::{InterviewConfig, InterviewStatus, MessageRole};
use crate::core::playback::{AudioSegment, AudioSink, PlaybackError};

#[derive(Default)]
struct CollectingSink {
    segments: Mutex<Vec<AudioSegment>>,
}

#[async_trait]
impl AudioSink for CollectingSink {
    async fn play(&self, segment: AudioSegment) -> Result<(), PlaybackError> {
        self.segments.lock().push(segment);
        Ok(())
    }
}

/// Mock agent socket. Sends `greeting` frames after the client's first
/// frame, then forwards every client frame to the returned receiver.
async fn spawn_agent(greeting: Vec<Value>) -> (String, mpsc::UnboundedReceiver<Value>) {
    spawn_agent_with_replies(greeting, HashMap::new()).await
}

/// Like [`spawn_agent`], and also answers client frames of the keyed type.
async fn spawn_agent_with_replies(
    greeting: Vec<Value>,
    replies: HashMap<&'static str, Vec<Value>>,
) -> (String, mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let mut greeted = false;

        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let value: Value = serde_json::from_str(text.as_str()).unwrap();
                let reply = value["type"]
                    .as_str()
                    .and_then(|kind| replies.get(kind))
                    .cloned()
                    .unwrap_or_default();
                let _ = tx.send(value);
                if !greeted {
                    greeted = true;
                    for frame in &greeting {
                        ws.send(Message::Text(frame.to_string().into())).await.unwrap();
                    }
                }
                for frame in reply {
                    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
                }
            }
        }
    });

    (format!("http://{addr}"), rx)
}

fn coach_config(base_url: &str) -> CoachConfig {
    let mut conversation = ConversationConfig::new("agent_1");
    conversation.api_base_url = base_url.to_string();

    CoachConfig::new(InterviewConfig::new("Backend Engineer"), conversation).with_channel_config(
        ChannelConfig {
            connect_timeout: Duration::from_secs(2),
            reconnect: ReconnectPolicy::disabled(),
            shutdown_timeout: Duration::from_secs(1),
            ..Default::default()
        },
    )
}

async fn next_of_type(rx: &mut mpsc::UnboundedReceiver<Value>, kind: &str) -> Value {
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let value = rx.recv().await.unwrap();
            if value["type"] == kind {
                return value;
            }
        }
    })
    .await
    .unwrap()
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..300 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn test_interview_flow() {
    let (base_url, mut frames) = spawn_agent(vec![
        json!({
            "type": "conversation_initiation_metadata",
            "conversation_initiation_metadata_event": {"conversation_id": "conv_1"}
        }),
        json!({
            "type": "agent_response",
            "agent_response_event": {"agent_response": "Welcome, tell me about yourself."}
        }),
        json!({"type": "audio", "audio_event": {"audio_base_64": "AQIDBA==", "event_id": 1}}),
    ])
    .await;

    let sink = Arc::new(CollectingSink::default());
    let coach = InterviewCoach::new(coach_config(&base_url), sink.clone()).unwrap();

    let updates = Arc::new(Mutex::new(Vec::new()));
    let recorded = updates.clone();
    coach.on_update(move |update| {
        let recorded = recorded.clone();
        async move {
            recorded.lock().push(update);
        }
    });

    coach.start().await.unwrap();
    assert_eq!(coach.status(), InterviewStatus::InProgress);

    let init = next_of_type(&mut frames, "conversation_initiation_client_data").await;
    assert_eq!(init["dynamic_variables"]["role"], "Backend Engineer");

    assert!(wait_until(|| !coach.transcript().is_empty()).await);
    let first = &coach.transcript()[0];
    assert_eq!(first.role, MessageRole::Interviewer);
    assert_eq!(first.text, "Welcome, tell me about yourself.");

    assert!(wait_until(|| sink.segments.lock().len() == 1).await);
    assert_eq!(sink.segments.lock()[0].data.as_ref(), &[1, 2, 3, 4]);

    coach.send_text("I build data pipelines").await.unwrap();
    let sent = next_of_type(&mut frames, "user_message").await;
    assert_eq!(sent["text"], "I build data pipelines");
    assert_eq!(coach.transcript().last().unwrap().role, MessageRole::Candidate);

    coach.finish().await.unwrap();
    assert_eq!(coach.status(), InterviewStatus::Completed);
    assert!(
        updates
            .lock()
            .contains(&CoachUpdate::Status(InterviewStatus::Completed))
    );
}

#[tokio::test]
async fn test_start_failure_sets_error_status() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let coach = InterviewCoach::new(
        coach_config(&format!("http://{addr}")),
        Arc::new(CollectingSink::default()),
    )
    .unwrap();

    let err = coach.start().await.unwrap_err();
    assert!(matches!(err, CoachError::Channel(_)));
    assert!(matches!(coach.status(), InterviewStatus::Error(_)));

    // Input is refused once the interview has failed
    assert!(matches!(
        coach.send_text("hello").await,
        Err(CoachError::NotActive(_))
    ));
}

#[tokio::test]
async fn test_significant_emotion_change_updates_agent() {
    let (base_url, mut frames) = spawn_agent(Vec::new()).await;
    let coach = InterviewCoach::new(coach_config(&base_url), Arc::new(CollectingSink::default()))
        .unwrap();
    coach.start().await.unwrap();

    let expressions = HashMap::from([("fearful".to_string(), 0.9), ("neutral".to_string(), 0.1)]);
    let summary = coach.submit_expressions(&expressions).await.unwrap();
    assert_eq!(summary.overall_mood, Emotion::Fearful);
    assert_eq!(coach.emotion_summary(), summary);

    let update = next_of_type(&mut frames, "contextual_update").await;
    assert!(update["text"].as_str().unwrap().contains("fearful"));

    coach.finish().await.unwrap();
}

#[tokio::test]
async fn test_audio_dropped_while_paused() {
    let (base_url, mut frames) = spawn_agent(Vec::new()).await;
    let coach = InterviewCoach::new(coach_config(&base_url), Arc::new(CollectingSink::default()))
        .unwrap();
    coach.start().await.unwrap();

    // 100ms at 16kHz is 3200 bytes per chunk
    let sent = coach.send_audio_pcm(&vec![0u8; 6400]).await.unwrap();
    assert_eq!(sent, 2);
    let chunk = tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let value = frames.recv().await.unwrap();
            if value.get("user_audio_chunk").is_some() {
                return value;
            }
        }
    })
    .await
    .unwrap();
    assert!(chunk["user_audio_chunk"].as_str().unwrap().len() > 4000);

    coach.pause().await.unwrap();
    assert_eq!(coach.send_audio_f32(&vec![0.0f32; 3200]).await.unwrap(), 0);

    coach.resume().await.unwrap();
    assert_eq!(coach.send_audio_f32(&vec![0.0f32; 1600]).await.unwrap(), 1);

    coach.finish().await.unwrap();
}

#[tokio::test]
async fn test_video_frame_requires_emotion_channel() {
    let (base_url, _frames) = spawn_agent(Vec::new()).await;
    let coach = InterviewCoach::new(coach_config(&base_url), Arc::new(CollectingSink::default()))
        .unwrap();
    coach.start().await.unwrap();

    assert!(matches!(
        coach.submit_video_frame(bytes::Bytes::from_static(&[0xff, 0xd8])).await,
        Err(CoachError::EmotionDisabled)
    ));
    assert!(coach.emotion_state().is_none());

    coach.finish().await.unwrap();
}

/// Sink that holds every segment far longer than a test runs.
#[derive(Default)]
struct StallingSink {
    started: AtomicUsize,
}

#[async_trait]
impl AudioSink for StallingSink {
    async fn play(&self, _segment: AudioSegment) -> Result<(), PlaybackError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_interruption_clears_playback() {
    let (base_url, _frames) = spawn_agent_with_replies(
        vec![
            json!({"type": "audio", "audio_event": {"audio_base_64": "AQIDBA==", "event_id": 1}}),
            json!({"type": "audio", "audio_event": {"audio_base_64": "BQYHCA==", "event_id": 2}}),
            json!({"type": "audio", "audio_event": {"audio_base_64": "CQoLDA==", "event_id": 3}}),
        ],
        HashMap::from([(
            "user_message",
            vec![json!({"type": "interruption", "interruption_event": {"event_id": 3}})],
        )]),
    )
    .await;

    let sink = Arc::new(StallingSink::default());
    let coach = InterviewCoach::new(coach_config(&base_url), sink.clone()).unwrap();
    let updates = Arc::new(Mutex::new(Vec::new()));
    let recorded = updates.clone();
    coach.on_update(move |update| {
        let recorded = recorded.clone();
        async move {
            recorded.lock().push(update);
        }
    });

    coach.start().await.unwrap();
    assert!(wait_until(|| coach.playback().pending() == 3 && coach.playback().is_playing()).await);

    coach.send_text("Sorry, can I stop you there?").await.unwrap();

    assert!(wait_until(|| updates.lock().contains(&CoachUpdate::Interrupted)).await);
    assert!(wait_until(|| coach.playback().pending() == 0 && !coach.playback().is_playing()).await);
    assert_eq!(coach.playback().played_count(), 0);
    assert_eq!(sink.started.load(Ordering::SeqCst), 1);

    coach.finish().await.unwrap();
}

#[tokio::test]
async fn test_agent_correction_rewrites_transcript() {
    let (base_url, _frames) = spawn_agent(vec![
        json!({
            "type": "agent_response",
            "agent_response_event": {"agent_response": "Walk me through your last project and its"}
        }),
        json!({
            "type": "agent_response_correction",
            "agent_response_correction_event": {
                "original_agent_response": "Walk me through your last project and its",
                "corrected_agent_response": "Walk me through your last project."
            }
        }),
    ])
    .await;

    let coach = InterviewCoach::new(coach_config(&base_url), Arc::new(CollectingSink::default()))
        .unwrap();
    let updates = Arc::new(Mutex::new(Vec::new()));
    let recorded = updates.clone();
    coach.on_update(move |update| {
        let recorded = recorded.clone();
        async move {
            recorded.lock().push(update);
        }
    });

    coach.start().await.unwrap();

    assert!(
        wait_until(|| coach
            .transcript()
            .first()
            .is_some_and(|m| m.text == "Walk me through your last project."))
        .await
    );
    assert_eq!(coach.transcript().len(), 1);
    assert!(updates.lock().iter().any(|u| matches!(
        u,
        CoachUpdate::MessageCorrected { corrected, .. } if corrected == "Walk me through your last project."
    )));

    coach.finish().await.unwrap();
}

#[tokio::test]
async fn test_conversation_error_fails_interview() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        // Wait for the initiation payload, then refuse the session
        let _ = ws.next().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        ws.close(Some(CloseFrame {
            code: CloseCode::Policy,
            reason: "quota exceeded".into(),
        }))
        .await
        .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let coach = InterviewCoach::new(
        coach_config(&format!("http://{addr}")),
        Arc::new(CollectingSink::default()),
    )
    .unwrap();
    let updates = Arc::new(Mutex::new(Vec::new()));
    let recorded = updates.clone();
    coach.on_update(move |update| {
        let recorded = recorded.clone();
        async move {
            recorded.lock().push(update);
        }
    });

    coach.start().await.unwrap();

    assert!(wait_until(|| matches!(coach.status(), InterviewStatus::Error(_))).await);
    assert!(matches!(
        coach.conversation_state(),
        ConnectionState::Error(_)
    ));
    assert!(
        updates
            .lock()
            .iter()
            .any(|u| matches!(u, CoachUpdate::Status(InterviewStatus::Error(_))))
    );
    assert!(matches!(
        coach.send_text("hello?").await,
        Err(CoachError::NotActive(_))
    ));
}
