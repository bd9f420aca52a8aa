//! InterviewCoach: one interview's channels, playback and emotion state.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::CoachConfig;
use super::context::{
    CoachContext, ConversationChannel, EmotionChannel, wire_conversation, wire_emotion,
};
use super::errors::{CoachError, CoachResult};
use super::updates::CoachUpdate;
use crate::core::audio::{AudioChunker, f32_to_pcm16};
use crate::core::channel::{ConnectionState, ControlAction, RealtimeChannel, into_callback};
use crate::core::elevenlabs::ElevenLabsProtocol;
use crate::core::emotion::{EmotionAggregator, EmotionSummary, now_ms, samples_from_expressions};
use crate::core::gemini::{GeminiEmotionProtocol, VIDEO_FRAME_MIME_TYPE};
use crate::core::interview::{InterviewMessage, InterviewSession, InterviewStatus, MessageRole};
use crate::core::playback::{AudioSink, PlaybackQueue};

/// Runs one practice interview.
///
/// Owns the conversation channel (ElevenLabs), the optional emotion channel
/// (Gemini), the playback queue for agent audio, the emotion aggregator and
/// the session transcript. Channel events are routed into the session and
/// out to the registered [`CoachUpdate`] observer.
pub struct InterviewCoach {
    conversation: Arc<ConversationChannel>,
    emotion: Option<Arc<EmotionChannel>>,
    chunker: Mutex<AudioChunker>,
    ctx: CoachContext,
}

impl InterviewCoach {
    /// Build the coach and wire its channels. Must be called inside a tokio runtime.
    pub fn new(config: CoachConfig, sink: Arc<dyn AudioSink>) -> CoachResult<Self> {
        config.interview.validate()?;

        let mut conversation_config = config.conversation.clone();
        for (key, value) in config.interview.agent_variables() {
            conversation_config
                .dynamic_variables
                .entry(key.to_string())
                .or_insert(value);
        }
        if conversation_config.overrides.language.is_none() {
            conversation_config.overrides.language = Some(config.interview.language.clone());
        }

        let conversation = Arc::new(RealtimeChannel::new(
            ElevenLabsProtocol::new(conversation_config),
            config.channel.clone(),
        ));
        let emotion = config.emotion.clone().map(|emotion_config| {
            Arc::new(RealtimeChannel::new(
                GeminiEmotionProtocol::new(emotion_config),
                config.channel.clone(),
            ))
        });

        let ctx = CoachContext {
            session: Arc::new(RwLock::new(InterviewSession::new(config.interview.clone()))),
            aggregator: Arc::new(Mutex::new(EmotionAggregator::new(
                config.emotion_window,
                config.emotion_max_samples,
            ))),
            last_reported: Arc::new(Mutex::new(EmotionSummary::default())),
            playback: Arc::new(PlaybackQueue::new(sink)),
            updates: Arc::new(RwLock::new(None)),
            conversation: Arc::downgrade(&conversation),
        };

        wire_conversation(&conversation, &ctx);
        if let Some(channel) = &emotion {
            wire_emotion(channel, &ctx);
        }

        Ok(Self {
            conversation,
            emotion,
            chunker: Mutex::new(AudioChunker::for_duration(config.sample_rate, config.chunk_ms)),
            ctx,
        })
    }

    /// Register the observer for [`CoachUpdate`]s.
    pub fn on_update<F, Fut>(&self, callback: F)
    where
        F: Fn(CoachUpdate) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        *self.ctx.updates.write() = Some(into_callback(callback));
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Connect the channels and go live.
    pub async fn start(&self) -> CoachResult<()> {
        self.ctx.session.write().begin()?;
        self.ctx.emit_status().await;

        if let Err(e) = self.conversation.connect().await {
            return Err(self.abort_start(e.into()).await);
        }

        if let Some(emotion) = &self.emotion
            && let Err(e) = emotion.connect().await
        {
            let _ = self.conversation.disconnect().await;
            return Err(self.abort_start(e.into()).await);
        }

        self.ctx.session.write().mark_in_progress()?;
        self.ctx.emit_status().await;
        info!("Interview {} started", self.session_id());

        // The channel may have failed before the interview went live
        if let ConnectionState::Error(reason) = self.conversation.state() {
            self.ctx.conversation_failed(&reason).await;
        }
        Ok(())
    }

    async fn abort_start(&self, error: CoachError) -> CoachError {
        warn!("Interview failed to start: {}", error);
        let _ = self.ctx.session.write().fail(error.to_string());
        self.ctx.emit_status().await;
        error
    }

    /// Stop forwarding candidate input. Agent audio is silenced.
    pub async fn pause(&self) -> CoachResult<()> {
        self.ctx.session.write().pause()?;
        self.chunker.lock().clear();
        self.ctx.playback.clear();

        if let Some(emotion) = &self.emotion
            && let Err(e) = emotion.send_control(ControlAction::EndOfAudio).await
        {
            debug!("Could not signal end of audio to emotion channel: {}", e);
        }

        self.ctx.emit_status().await;
        Ok(())
    }

    pub async fn resume(&self) -> CoachResult<()> {
        self.ctx.session.write().resume()?;
        self.ctx.emit_status().await;
        Ok(())
    }

    /// End the interview: disconnect both channels and stop playback.
    ///
    /// Resources are released even when the interview already failed; the
    /// status error is returned afterwards.
    pub async fn finish(&self) -> CoachResult<()> {
        let completed = self.ctx.session.write().complete();

        if let Err(e) = self.conversation.disconnect().await {
            warn!("Error disconnecting conversation channel: {}", e);
        }
        if let Some(emotion) = &self.emotion
            && let Err(e) = emotion.disconnect().await
        {
            warn!("Error disconnecting emotion channel: {}", e);
        }
        self.ctx.playback.shutdown().await;
        self.chunker.lock().clear();

        completed?;
        self.ctx.emit_status().await;
        info!(
            "Interview {} completed with {} messages",
            self.session_id(),
            self.ctx.session.read().messages.len()
        );
        Ok(())
    }

    // =========================================================================
    // Candidate input
    // =========================================================================

    /// Returns `Ok(false)` when input should be dropped (paused).
    fn accepts_input(&self) -> CoachResult<bool> {
        match self.status() {
            InterviewStatus::InProgress => Ok(true),
            InterviewStatus::Paused => Ok(false),
            other => Err(CoachError::NotActive(other)),
        }
    }

    /// Forward PCM16LE microphone audio. Returns the number of chunks sent.
    pub async fn send_audio_pcm(&self, pcm: &[u8]) -> CoachResult<usize> {
        if !self.accepts_input()? {
            return Ok(0);
        }

        let chunks = self.chunker.lock().push(pcm);
        for chunk in &chunks {
            self.conversation.send_audio(chunk.clone()).await?;
            if let Some(emotion) = &self.emotion
                && let Err(e) = emotion.send_audio(chunk.clone()).await
            {
                debug!("Emotion channel dropped audio chunk: {}", e);
            }
        }
        Ok(chunks.len())
    }

    /// Forward float microphone samples in -1..1.
    pub async fn send_audio_f32(&self, samples: &[f32]) -> CoachResult<usize> {
        let pcm = f32_to_pcm16(samples);
        self.send_audio_pcm(&pcm).await
    }

    /// Send a typed candidate message.
    pub async fn send_text(&self, text: &str) -> CoachResult<()> {
        if !self.accepts_input()? {
            return Err(CoachError::NotActive(self.status()));
        }
        self.ctx
            .record(MessageRole::Candidate, text.to_string())
            .await;
        self.conversation.send_text(text).await?;
        Ok(())
    }

    /// Face-expression probabilities from a client-side classifier.
    pub async fn submit_expressions(
        &self,
        expressions: &HashMap<String, f32>,
    ) -> CoachResult<EmotionSummary> {
        if !self.accepts_input()? {
            return Ok(self.emotion_summary());
        }
        let samples = samples_from_expressions(expressions, now_ms());
        Ok(self.ctx.ingest(samples).await)
    }

    /// A JPEG camera frame for the emotion model.
    pub async fn submit_video_frame(&self, jpeg: Bytes) -> CoachResult<()> {
        let emotion = self.emotion.as_ref().ok_or(CoachError::EmotionDisabled)?;
        if !self.accepts_input()? {
            return Ok(());
        }
        emotion.send_media(VIDEO_FRAME_MIME_TYPE, jpeg).await?;
        Ok(())
    }

    // =========================================================================
    // Info
    // =========================================================================

    pub fn session_id(&self) -> Uuid {
        self.ctx.session.read().id
    }

    pub fn status(&self) -> InterviewStatus {
        self.ctx.session.read().status.clone()
    }

    pub fn transcript(&self) -> Vec<InterviewMessage> {
        self.ctx.session.read().messages.clone()
    }

    /// Snapshot of the whole session.
    pub fn session(&self) -> InterviewSession {
        self.ctx.session.read().clone()
    }

    /// Summary from the most recent emotion input.
    pub fn emotion_summary(&self) -> EmotionSummary {
        self.ctx.aggregator.lock().last_summary().clone()
    }

    pub fn conversation_state(&self) -> ConnectionState {
        self.conversation.state()
    }

    pub fn emotion_state(&self) -> Option<ConnectionState> {
        self.emotion.as_ref().map(|channel| channel.state())
    }

    pub fn playback(&self) -> &PlaybackQueue {
        &self.ctx.playback
    }
}
