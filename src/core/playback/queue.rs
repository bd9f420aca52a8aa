//! Sequential playback of agent audio.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::errors::{PlaybackError, PlaybackResult};
use super::sink::{AudioSegment, AudioSink};

/// Callback invoked when a segment fails to play
pub type PlaybackErrorCallback = Arc<dyn Fn(PlaybackError) + Send + Sync>;

struct QueueShared {
    pending: AtomicUsize,
    playing: AtomicBool,
    played: AtomicU64,
    next_id: AtomicU64,
    on_error: RwLock<Option<PlaybackErrorCallback>>,
}

/// FIFO queue that plays at most one segment at a time.
///
/// A single worker task owns the sink and drains the queue in order.
/// [`clear`](PlaybackQueue::clear) bumps the queue generation: the segment
/// currently playing is stopped and every segment queued before the call is
/// skipped. A failing segment is reported and the queue moves on.
pub struct PlaybackQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<AudioSegment>>>,
    generation: watch::Sender<u64>,
    shared: Arc<QueueShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackQueue {
    /// Create the queue and spawn its worker. Must be called inside a tokio runtime.
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (generation, generation_rx) = watch::channel(0u64);
        let shared = Arc::new(QueueShared {
            pending: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            played: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
            on_error: RwLock::new(None),
        });

        let worker = tokio::spawn(run_worker(sink, rx, generation_rx, shared.clone()));

        Self {
            tx: Mutex::new(Some(tx)),
            generation,
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue raw audio. Returns the segment id.
    pub fn enqueue(&self, data: Bytes) -> PlaybackResult<u64> {
        if data.is_empty() {
            return Err(PlaybackError::EmptySegment);
        }

        let segment = AudioSegment {
            id: self.shared.next_id.fetch_add(1, Ordering::SeqCst),
            data,
            generation: *self.generation.borrow(),
        };
        let id = segment.id;

        let guard = self.tx.lock();
        let tx = guard.as_ref().ok_or(PlaybackError::Closed)?;
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        if tx.send(segment).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(PlaybackError::Closed);
        }
        Ok(id)
    }

    /// Queue base64-encoded audio as received from the conversation channel.
    pub fn enqueue_base64(&self, encoded: &str) -> PlaybackResult<u64> {
        let data = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;
        self.enqueue(Bytes::from(data))
    }

    /// Stop the current segment and drop everything queued so far.
    pub fn clear(&self) {
        let mut cleared = 0u64;
        self.generation.send_modify(|g| {
            *g += 1;
            cleared = *g;
        });
        debug!("Playback queue cleared (generation {})", cleared);
    }

    /// Segments queued or playing.
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::SeqCst)
    }

    /// Segments that finished playing successfully.
    pub fn played_count(&self) -> u64 {
        self.shared.played.load(Ordering::SeqCst)
    }

    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(PlaybackError) + Send + Sync + 'static,
    {
        *self.shared.on_error.write() = Some(Arc::new(callback));
    }

    /// Stop playback, discard queued audio and wait for the worker to exit.
    pub async fn shutdown(&self) {
        self.tx.lock().take();
        self.clear();

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let abort = handle.abort_handle();
            if tokio::time::timeout(Duration::from_secs(2), handle).await.is_err() {
                warn!("Playback worker did not stop in time, aborting");
                abort.abort();
            }
        }
    }
}

impl Drop for PlaybackQueue {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.lock().take() {
            handle.abort();
        }
    }
}

async fn run_worker(
    sink: Arc<dyn AudioSink>,
    mut rx: mpsc::UnboundedReceiver<AudioSegment>,
    mut generation: watch::Receiver<u64>,
    shared: Arc<QueueShared>,
) {
    while let Some(segment) = rx.recv().await {
        let current = *generation.borrow_and_update();

        if segment.generation < current {
            debug!("Skipping stale audio segment {}", segment.id);
            shared.pending.fetch_sub(1, Ordering::SeqCst);
            continue;
        }

        let id = segment.id;
        shared.playing.store(true, Ordering::SeqCst);

        let outcome = tokio::select! {
            result = sink.play(segment) => Some(result),
            _ = generation.changed() => None,
        };

        shared.playing.store(false, Ordering::SeqCst);
        shared.pending.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            Some(Ok(())) => {
                shared.played.fetch_add(1, Ordering::SeqCst);
            }
            Some(Err(e)) => {
                warn!("Audio segment {} failed: {}", id, e);
                let callback = shared.on_error.read().clone();
                if let Some(cb) = callback {
                    cb(e);
                }
            }
            None => debug!("Audio segment {} interrupted", id),
        }
    }

    debug!("Playback worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Sink that records play order and the peak number of concurrent plays.
    struct RecordingSink {
        delay: Duration,
        active: AtomicUsize,
        peak: AtomicUsize,
        started: Mutex<Vec<u64>>,
        fail_ids: Vec<u64>,
    }

    impl RecordingSink {
        fn new(delay: Duration) -> Arc<Self> {
            Self::failing(delay, Vec::new())
        }

        fn failing(delay: Duration, fail_ids: Vec<u64>) -> Arc<Self> {
            Arc::new(Self {
                delay,
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                started: Mutex::new(Vec::new()),
                fail_ids,
            })
        }
    }

    struct ActiveGuard<'a>(&'a AtomicUsize);

    impl Drop for ActiveGuard<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AudioSink for RecordingSink {
        async fn play(&self, segment: AudioSegment) -> Result<(), PlaybackError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            let _guard = ActiveGuard(&self.active);
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.started.lock().push(segment.id);

            tokio::time::sleep(self.delay).await;

            if self.fail_ids.contains(&segment.id) {
                return Err(PlaybackError::Sink("device lost".to_string()));
            }
            Ok(())
        }
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..300 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    fn chunk() -> Bytes {
        Bytes::from_static(&[0, 1, 2, 3])
    }

    #[tokio::test]
    async fn test_plays_in_order_one_at_a_time() {
        let sink = RecordingSink::new(Duration::from_millis(20));
        let queue = PlaybackQueue::new(sink.clone());

        let ids: Vec<u64> = (0..4).map(|_| queue.enqueue(chunk()).unwrap()).collect();

        assert!(wait_for(|| queue.played_count() == 4).await);
        assert_eq!(*sink.started.lock(), ids);
        assert_eq!(sink.peak.load(Ordering::SeqCst), 1);
        assert_eq!(queue.pending(), 0);
        assert!(!queue.is_playing());
    }

    #[tokio::test]
    async fn test_clear_stops_current_and_skips_queued() {
        let sink = RecordingSink::new(Duration::from_millis(500));
        let queue = PlaybackQueue::new(sink.clone());

        let first = queue.enqueue(chunk()).unwrap();
        queue.enqueue(chunk()).unwrap();
        queue.enqueue(chunk()).unwrap();

        assert!(wait_for(|| queue.is_playing()).await);
        queue.clear();

        assert!(wait_for(|| queue.pending() == 0).await);
        assert_eq!(*sink.started.lock(), vec![first]);
        assert_eq!(queue.played_count(), 0);

        // New audio after an interruption still plays
        let next = queue.enqueue(chunk()).unwrap();
        assert!(wait_for(|| sink.started.lock().contains(&next)).await);
    }

    #[tokio::test]
    async fn test_sink_error_does_not_stop_queue() {
        let sink = RecordingSink::failing(Duration::from_millis(5), vec![1]);
        let queue = PlaybackQueue::new(sink.clone());
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = errors.clone();
        queue.on_error(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        queue.enqueue(chunk()).unwrap();
        queue.enqueue(chunk()).unwrap();

        assert!(wait_for(|| queue.played_count() == 1).await);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(sink.started.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_enqueue_base64() {
        let sink = RecordingSink::new(Duration::from_millis(1));
        let queue = PlaybackQueue::new(sink);

        assert!(queue.enqueue_base64("AQID").is_ok());
        assert!(matches!(
            queue.enqueue_base64("not base64!"),
            Err(PlaybackError::Decode(_))
        ));
        assert_eq!(queue.enqueue_base64(""), Err(PlaybackError::EmptySegment));
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_fails() {
        let sink = RecordingSink::new(Duration::from_millis(1));
        let queue = PlaybackQueue::new(sink);
        queue.shutdown().await;
        assert_eq!(queue.enqueue(chunk()), Err(PlaybackError::Closed));
    }
}
