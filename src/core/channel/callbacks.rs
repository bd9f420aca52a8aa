//! Callback slots for realtime channel events

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::errors::ChannelError;
use super::messages::{AgentCorrection, AudioEvent, InboundEvent, PingEvent};
use super::state::ConnectionState;
use crate::core::emotion::EmotionSample;

/// Async callback receiving one value
pub type ChannelCallback<T> =
    Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Wrap an async closure into a [`ChannelCallback`].
pub fn into_callback<T, F, Fut>(f: F) -> ChannelCallback<T>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |value: T| Box::pin(f(value)) as Pin<Box<dyn Future<Output = ()> + Send>>)
}

/// Registered callbacks, one optional slot per event kind.
#[derive(Default, Clone)]
pub struct ChannelHandlers {
    pub session_started: Option<ChannelCallback<Option<String>>>,
    pub transcript: Option<ChannelCallback<String>>,
    pub agent_response: Option<ChannelCallback<String>>,
    pub agent_correction: Option<ChannelCallback<AgentCorrection>>,
    pub audio: Option<ChannelCallback<AudioEvent>>,
    pub ping: Option<ChannelCallback<PingEvent>>,
    pub vad_score: Option<ChannelCallback<f32>>,
    pub interruption: Option<ChannelCallback<Option<u64>>>,
    pub turn_complete: Option<ChannelCallback<()>>,
    pub emotion: Option<ChannelCallback<Vec<EmotionSample>>>,
    pub status: Option<ChannelCallback<ConnectionState>>,
    pub error: Option<ChannelCallback<ChannelError>>,
}

/// Work item for the dispatcher task.
#[derive(Debug)]
pub(crate) enum Dispatch {
    Event(InboundEvent),
    Status(ConnectionState),
    Error(ChannelError),
}

/// Route one dispatch item to its callback.
///
/// Callbacks are cloned out of the lock before being awaited.
pub(crate) async fn dispatch(handlers: &RwLock<ChannelHandlers>, item: Dispatch) {
    match item {
        Dispatch::Status(state) => {
            let callback = handlers.read().status.clone();
            if let Some(cb) = callback {
                cb(state).await;
            }
        }
        Dispatch::Error(error) => {
            let callback = handlers.read().error.clone();
            match callback {
                Some(cb) => cb(error).await,
                None => debug!("Channel error (no callback registered): {}", error),
            }
        }
        Dispatch::Event(event) => dispatch_event(handlers, event).await,
    }
}

async fn dispatch_event(handlers: &RwLock<ChannelHandlers>, event: InboundEvent) {
    let kind = event.kind();
    let delivered = match event {
        InboundEvent::SessionStarted { session_id, .. } => {
            let cb = handlers.read().session_started.clone();
            call(cb, session_id).await
        }
        InboundEvent::UserTranscript(text) => {
            let cb = handlers.read().transcript.clone();
            call(cb, text).await
        }
        InboundEvent::AgentResponse(text) => {
            let cb = handlers.read().agent_response.clone();
            call(cb, text).await
        }
        InboundEvent::AgentResponseCorrection(correction) => {
            let cb = handlers.read().agent_correction.clone();
            call(cb, correction).await
        }
        InboundEvent::Audio(audio) => {
            let cb = handlers.read().audio.clone();
            call(cb, audio).await
        }
        InboundEvent::Ping(ping) => {
            let cb = handlers.read().ping.clone();
            call(cb, ping).await
        }
        InboundEvent::VadScore(score) => {
            let cb = handlers.read().vad_score.clone();
            call(cb, score).await
        }
        InboundEvent::Interruption { event_id } => {
            let cb = handlers.read().interruption.clone();
            call(cb, event_id).await
        }
        InboundEvent::TurnComplete => {
            let cb = handlers.read().turn_complete.clone();
            call(cb, ()).await
        }
        InboundEvent::Emotion(samples) => {
            let cb = handlers.read().emotion.clone();
            call(cb, samples).await
        }
        InboundEvent::ServerError { message } => {
            let cb = handlers.read().error.clone();
            call(cb, ChannelError::ProviderError(message)).await
        }
    };

    if !delivered {
        debug!("No callback registered for {} event", kind);
    }
}

async fn call<T>(callback: Option<ChannelCallback<T>>, value: T) -> bool {
    match callback {
        Some(cb) => {
            cb(value).await;
            true
        }
        None => false,
    }
}
