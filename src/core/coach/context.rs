//! Shared state reachable from channel callbacks.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::updates::{CoachUpdate, CoachUpdateCallback};
use crate::core::channel::{ConnectionState, RealtimeChannel};
use crate::core::elevenlabs::ElevenLabsProtocol;
use crate::core::emotion::{
    EmotionAggregator, EmotionSample, EmotionSummary, context_update_text, is_significant_change,
};
use crate::core::gemini::GeminiEmotionProtocol;
use crate::core::interview::{InterviewSession, InterviewStatus, MessageRole};
use crate::core::playback::PlaybackQueue;

pub(crate) type ConversationChannel = RealtimeChannel<ElevenLabsProtocol>;
pub(crate) type EmotionChannel = RealtimeChannel<GeminiEmotionProtocol>;

/// Handles cloned into every channel callback.
///
/// The conversation channel is held weakly since its own callbacks hold a
/// context.
#[derive(Clone)]
pub(crate) struct CoachContext {
    pub session: Arc<RwLock<InterviewSession>>,
    pub aggregator: Arc<Mutex<EmotionAggregator>>,
    /// Last summary reported to the conversational agent
    pub last_reported: Arc<Mutex<EmotionSummary>>,
    pub playback: Arc<PlaybackQueue>,
    pub updates: Arc<RwLock<Option<CoachUpdateCallback>>>,
    pub conversation: Weak<ConversationChannel>,
}

impl CoachContext {
    pub async fn emit(&self, update: CoachUpdate) {
        let callback = self.updates.read().clone();
        if let Some(cb) = callback {
            cb(update).await;
        }
    }

    pub async fn emit_status(&self) {
        let status = self.session.read().status.clone();
        self.emit(CoachUpdate::Status(status)).await;
    }

    pub async fn record(&self, role: MessageRole, text: String) {
        if text.trim().is_empty() {
            return;
        }
        let message = self.session.write().push_message(role, text).clone();
        self.emit(CoachUpdate::Message(message)).await;
    }

    pub async fn correct(&self, original: String, corrected: String) {
        let applied = self.session.write().apply_correction(&original, &corrected);
        if applied {
            self.emit(CoachUpdate::MessageCorrected { original, corrected })
                .await;
        } else {
            debug!("Agent correction did not match the last interviewer message");
        }
    }

    /// Feed samples from either emotion path into the aggregator.
    ///
    /// Significant changes are forwarded to the agent as a contextual update
    /// while the interview is live.
    pub async fn ingest(&self, samples: Vec<EmotionSample>) -> EmotionSummary {
        if samples.is_empty() {
            return self.aggregator.lock().last_summary().clone();
        }

        let summary = {
            let mut aggregator = self.aggregator.lock();
            aggregator.extend(samples);
            aggregator.summarize()
        };
        self.emit(CoachUpdate::Emotion(summary.clone())).await;

        let report = {
            let mut last = self.last_reported.lock();
            if is_significant_change(&last, &summary) {
                *last = summary.clone();
                true
            } else {
                false
            }
        };

        let live = self.session.read().status.is_live();
        if report && live {
            match self.conversation.upgrade() {
                Some(channel) => {
                    info!(
                        "Candidate mood {} (stress {:.2}, engagement {:.2}), updating agent",
                        summary.overall_mood, summary.stress_level, summary.engagement_level
                    );
                    if let Err(e) = channel
                        .send_contextual_update(context_update_text(&summary))
                        .await
                    {
                        warn!("Failed to send emotion context: {}", e);
                    }
                }
                None => debug!("Conversation channel dropped, skipping emotion context"),
            }
        }

        summary
    }

    /// A live interview fails when its conversation channel gives up.
    pub async fn conversation_failed(&self, reason: &str) {
        let failed = {
            let mut session = self.session.write();
            matches!(
                session.status,
                InterviewStatus::InProgress | InterviewStatus::Paused
            ) && session.fail(reason).is_ok()
        };
        if failed {
            self.playback.clear();
            self.emit_status().await;
        }
    }
}

/// Register the coach's handlers on the conversation channel.
pub(crate) fn wire_conversation(channel: &ConversationChannel, ctx: &CoachContext) {
    channel.on_session_started(|id| async move {
        info!("Conversation started: {}", id.as_deref().unwrap_or("unknown"));
    });

    let c = ctx.clone();
    channel.on_transcript(move |text| {
        let c = c.clone();
        async move { c.record(MessageRole::Candidate, text).await }
    });

    let c = ctx.clone();
    channel.on_agent_response(move |text| {
        let c = c.clone();
        async move { c.record(MessageRole::Interviewer, text).await }
    });

    let c = ctx.clone();
    channel.on_agent_correction(move |correction| {
        let c = c.clone();
        async move { c.correct(correction.original, correction.corrected).await }
    });

    let c = ctx.clone();
    channel.on_audio(move |audio| {
        let c = c.clone();
        async move {
            if c.session.read().status == InterviewStatus::Paused {
                debug!("Dropping agent audio while paused");
                return;
            }
            if let Err(e) = c.playback.enqueue(audio.data) {
                warn!("Failed to queue agent audio: {}", e);
            }
        }
    });

    let c = ctx.clone();
    channel.on_interruption(move |_| {
        let c = c.clone();
        async move {
            c.playback.clear();
            c.emit(CoachUpdate::Interrupted).await;
        }
    });

    let c = ctx.clone();
    channel.on_status(move |state| {
        let c = c.clone();
        async move {
            if let ConnectionState::Error(reason) = &state {
                c.conversation_failed(reason).await;
            }
            c.emit(CoachUpdate::Connection {
                channel: "conversation",
                state,
            })
            .await;
        }
    });

    let c = ctx.clone();
    channel.on_error(move |err| {
        let c = c.clone();
        async move { c.emit(CoachUpdate::Error(err.to_string())).await }
    });
}

/// Register the coach's handlers on the emotion channel.
pub(crate) fn wire_emotion(channel: &EmotionChannel, ctx: &CoachContext) {
    let c = ctx.clone();
    channel.on_emotion(move |samples| {
        let c = c.clone();
        async move {
            c.ingest(samples).await;
        }
    });

    channel.on_agent_response(|text| async move {
        debug!("Emotion model replied with text: {}", text);
    });

    let c = ctx.clone();
    channel.on_status(move |state| {
        let c = c.clone();
        async move {
            if let ConnectionState::Error(reason) = &state {
                warn!("Emotion channel failed, continuing without it: {}", reason);
            }
            c.emit(CoachUpdate::Connection {
                channel: "emotion",
                state,
            })
            .await;
        }
    });

    let c = ctx.clone();
    channel.on_error(move |err| {
        let c = c.clone();
        async move { c.emit(CoachUpdate::Error(err.to_string())).await }
    });
}
