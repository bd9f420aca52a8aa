//! End-to-end: camera frame to Gemini, detected emotion forwarded to the
//! conversational agent as a contextual update.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use parley::core::channel::{ChannelConfig, ConnectionState, ReconnectPolicy};
use parley::core::coach::{CoachConfig, InterviewCoach};
use parley::core::elevenlabs::ConversationConfig;
use parley::core::emotion::Emotion;
use parley::core::gemini::GeminiEmotionConfig;
use parley::core::interview::{InterviewConfig, InterviewStatus};
use parley::core::playback::{AudioSegment, AudioSink, PlaybackError};

struct SilentSink;

#[async_trait]
impl AudioSink for SilentSink {
    async fn play(&self, _segment: AudioSegment) -> Result<(), PlaybackError> {
        Ok(())
    }
}

/// Agent socket that records every client frame.
async fn spawn_agent() -> (String, mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let _ = tx.send(serde_json::from_str(text.as_str()).unwrap());
            }
        }
    });

    (format!("http://{addr}"), rx)
}

/// Gemini socket: acknowledges setup, then answers the first media chunk
/// with an emotion turn.
async fn spawn_gemini() -> (String, mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let mut answered = false;

        while let Some(Ok(msg)) = ws.next().await {
            let Message::Text(text) = msg else { continue };
            let value: Value = serde_json::from_str(text.as_str()).unwrap();

            if value.get("setup").is_some() {
                ws.send(Message::Text(json!({"setupComplete": {}}).to_string().into()))
                    .await
                    .unwrap();
            } else if value.get("realtimeInput").is_some() && !answered {
                answered = true;
                let emotions = r#"```json
[{"emotion": "nervous", "intensity": 0.9, "confidence": 0.9}]
```"#;
                let turn = json!({
                    "serverContent": {"modelTurn": {"parts": [{"text": emotions}]}}
                });
                ws.send(Message::Text(turn.to_string().into())).await.unwrap();
                ws.send(Message::Text(
                    json!({"serverContent": {"turnComplete": true}}).to_string().into(),
                ))
                .await
                .unwrap();
            }
            let _ = tx.send(value);
        }
    });

    (format!("ws://{addr}/"), rx)
}

#[tokio::test]
async fn test_video_frame_emotion_reaches_agent() {
    let (agent_url, mut agent_frames) = spawn_agent().await;
    let (gemini_url, mut gemini_frames) = spawn_gemini().await;

    let mut conversation = ConversationConfig::new("agent_1");
    conversation.api_base_url = agent_url;
    let mut emotion = GeminiEmotionConfig::new("test-key");
    emotion.url = gemini_url;

    let config = CoachConfig::new(InterviewConfig::new("Data Scientist"), conversation)
        .with_emotion(emotion)
        .with_channel_config(ChannelConfig {
            connect_timeout: Duration::from_secs(2),
            reconnect: ReconnectPolicy::disabled(),
            shutdown_timeout: Duration::from_secs(1),
            ..Default::default()
        });

    let coach = InterviewCoach::new(config, Arc::new(SilentSink)).unwrap();
    coach.start().await.unwrap();
    assert_eq!(coach.status(), InterviewStatus::InProgress);
    assert_eq!(coach.emotion_state(), Some(ConnectionState::Connected));

    coach
        .submit_video_frame(Bytes::from_static(&[0xff, 0xd8, 0xff, 0xe0]))
        .await
        .unwrap();

    let media = tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let value = gemini_frames.recv().await.unwrap();
            if value.get("realtimeInput").is_some() {
                return value;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(
        media["realtimeInput"]["mediaChunks"][0]["mimeType"],
        "image/jpeg"
    );

    let update = tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let value = agent_frames.recv().await.unwrap();
            if value["type"] == "contextual_update" {
                return value;
            }
        }
    })
    .await
    .unwrap();
    assert!(update["text"].as_str().unwrap().contains("nervous"));
    assert_eq!(coach.emotion_summary().overall_mood, Emotion::Nervous);

    coach.finish().await.unwrap();
    assert_eq!(coach.status(), InterviewStatus::Completed);
    assert_eq!(coach.conversation_state(), ConnectionState::Disconnected);
}
