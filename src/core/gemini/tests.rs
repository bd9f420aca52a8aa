use bytes::Bytes;
use serde_json::{Value, json};

use super::*;
use crate::core::channel::{ChannelProtocol, ControlAction, InboundEvent, OutboundMessage};
use crate::core::emotion::Emotion;

fn protocol() -> GeminiEmotionProtocol {
    GeminiEmotionProtocol::new(GeminiEmotionConfig::new("test-key"))
}

fn encode(protocol: &GeminiEmotionProtocol, message: OutboundMessage) -> Value {
    serde_json::from_str(&protocol.encode(&message).unwrap().unwrap()).unwrap()
}

fn model_text(text: &str, turn_complete: bool) -> String {
    json!({
        "serverContent": {
            "modelTurn": {"parts": [{"text": text}]},
            "turnComplete": turn_complete
        }
    })
    .to_string()
}

#[test]
fn test_setup_payload() {
    let payload: Value = serde_json::from_str(&protocol().setup_payload().unwrap()).unwrap();
    let setup = &payload["setup"];
    assert_eq!(setup["model"], "models/gemini-2.0-flash-exp");
    assert_eq!(setup["generationConfig"]["responseModalities"], json!(["TEXT"]));
    assert!(
        setup["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("JSON array")
    );
    assert!(setup["systemInstruction"].get("role").is_none());
}

#[test]
fn test_build_request_requires_key() {
    let protocol = GeminiEmotionProtocol::new(GeminiEmotionConfig::new(""));
    assert!(protocol.build_request().is_err());

    let request = GeminiEmotionProtocol::new(GeminiEmotionConfig::new("k"))
        .build_request()
        .unwrap();
    assert_eq!(request.uri().query(), Some("key=k"));
}

#[test]
fn test_encode_media() {
    let protocol = protocol();

    let audio = encode(&protocol, OutboundMessage::AudioChunk(Bytes::from_static(&[1, 2, 3])));
    assert_eq!(
        audio,
        json!({"realtimeInput": {"mediaChunks": [{"mimeType": "audio/pcm;rate=16000", "data": "AQID"}]}})
    );

    let frame = encode(
        &protocol,
        OutboundMessage::Media {
            mime_type: VIDEO_FRAME_MIME_TYPE.to_string(),
            data: Bytes::from_static(&[0xff, 0xd8]),
        },
    );
    assert_eq!(frame["realtimeInput"]["mediaChunks"][0]["mimeType"], "image/jpeg");
}

#[test]
fn test_encode_text_and_controls() {
    let protocol = protocol();

    let text = encode(&protocol, OutboundMessage::UserText("hello".to_string()));
    assert_eq!(
        text,
        json!({"clientContent": {"turns": [{"role": "user", "parts": [{"text": "hello"}]}], "turnComplete": true}})
    );

    let end = encode(&protocol, OutboundMessage::Control(ControlAction::EndOfAudio));
    assert_eq!(end, json!({"realtimeInput": {"audioStreamEnd": true}}));

    let turn = encode(&protocol, OutboundMessage::Control(ControlAction::TurnComplete));
    assert_eq!(turn, json!({"clientContent": {"turnComplete": true}}));

    assert!(
        protocol
            .encode(&OutboundMessage::Pong { event_id: 1 })
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_setup_complete_starts_session() {
    let events = protocol().decode(r#"{"setupComplete": {}}"#).unwrap();
    assert_eq!(
        events,
        vec![InboundEvent::SessionStarted {
            session_id: None,
            audio_format: None,
        }]
    );
}

#[test]
fn test_fragments_accumulate_until_turn_complete() {
    let protocol = protocol();

    let first = protocol
        .decode(&model_text(r#"[{"emotion":"nervous","#, false))
        .unwrap();
    assert!(first.is_empty());

    let second = protocol
        .decode(&model_text(r#""intensity":0.7,"confidence":0.9}]"#, true))
        .unwrap();
    assert_eq!(second.len(), 2);
    match &second[0] {
        InboundEvent::Emotion(samples) => {
            assert_eq!(samples.len(), 1);
            assert_eq!(samples[0].emotion, Emotion::Nervous);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(second[1], InboundEvent::TurnComplete);
}

#[test]
fn test_non_json_turn_becomes_text() {
    let events = protocol()
        .decode(&model_text("I cannot see the candidate.", true))
        .unwrap();
    assert_eq!(
        events,
        vec![
            InboundEvent::AgentResponse("I cannot see the candidate.".to_string()),
            InboundEvent::TurnComplete,
        ]
    );
}

#[test]
fn test_interruption_discards_partial_text() {
    let protocol = protocol();
    protocol.decode(&model_text("[{\"emotion\":", false)).unwrap();

    let events = protocol
        .decode(r#"{"serverContent": {"interrupted": true}}"#)
        .unwrap();
    assert_eq!(events, vec![InboundEvent::Interruption { event_id: None }]);

    let events = protocol
        .decode(r#"{"serverContent": {"turnComplete": true}}"#)
        .unwrap();
    assert_eq!(events, vec![InboundEvent::TurnComplete]);
}

#[test]
fn test_reset_clears_pending_text() {
    let protocol = protocol();
    protocol.decode(&model_text("partial", false)).unwrap();
    protocol.reset();

    let events = protocol
        .decode(r#"{"serverContent": {"turnComplete": true}}"#)
        .unwrap();
    assert_eq!(events, vec![InboundEvent::TurnComplete]);
}

#[test]
fn test_error_frame() {
    let events = protocol()
        .decode(r#"{"error": {"message": "quota exhausted"}}"#)
        .unwrap();
    assert_eq!(
        events,
        vec![InboundEvent::ServerError {
            message: "quota exhausted".to_string()
        }]
    );
}

#[test]
fn test_malformed_frame() {
    assert!(protocol().decode("not json").is_err());
    assert!(protocol().decode(r#"{"usageMetadata": {}}"#).unwrap().is_empty());
}
