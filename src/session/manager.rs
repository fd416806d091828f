//! Process-wide session registry and orchestration.
//!
//! The registry is the one piece of state shared by every connection task,
//! the HTTP handlers, and the idle sweep; all mutations go through its lock.
//! Lock order is registry → session, and neither lock is ever held across
//! an inference await.

use crate::audio::AudioBuffer;
use crate::config::Config;
use crate::error::{Result, ScribedError};
use crate::models::ModelRegistry;
use crate::pipeline::TranscriptionPipeline;
use crate::protocol::ServerMessage;
use crate::session::{Clock, Session, SessionConfig, SessionState, SystemClock};
use crate::vad::VoiceActivityGate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

type SessionHandle = Arc<Mutex<Session>>;

/// Manages the set of active transcription sessions.
pub struct SessionManager {
    config: Config,
    default_session_config: SessionConfig,
    registry: Mutex<HashMap<String, SessionHandle>>,
    models: Arc<ModelRegistry>,
    gate: VoiceActivityGate,
    pipeline: TranscriptionPipeline,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Creates a manager with an empty registry.
    ///
    /// Fails if `stt.default_model` names an unknown model variant.
    pub fn new(
        config: Config,
        models: Arc<ModelRegistry>,
        gate: VoiceActivityGate,
    ) -> Result<Self> {
        let default_session_config = SessionConfig {
            model: config.stt.default_model.parse()?,
            language: config.stt.language.clone(),
            vad_enabled: true,
            beam_size: config.stt.beam_size,
        };
        let pipeline = TranscriptionPipeline::new(config.limits.max_concurrent_transcriptions);

        Ok(Self {
            config,
            default_session_config,
            registry: Mutex::new(HashMap::new()),
            models,
            gate,
            pipeline,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the clock (test hook).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Count of active sessions.
    pub async fn active_sessions(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Configured session cap.
    pub fn max_sessions(&self) -> usize {
        self.config.limits.max_sessions
    }

    /// The model registry backing this manager.
    pub fn models(&self) -> &Arc<ModelRegistry> {
        &self.models
    }

    /// Creates a new session and returns its id.
    ///
    /// Admission control happens here, under the registry lock: once the cap
    /// is reached the attempt is refused, never queued.
    pub async fn create_session(&self, events: mpsc::Sender<ServerMessage>) -> Result<String> {
        let mut registry = self.registry.lock().await;
        if registry.len() >= self.config.limits.max_sessions {
            return Err(ScribedError::CapacityExceeded {
                max: self.config.limits.max_sessions,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let buffer = AudioBuffer::new(
            self.config.audio.window_bytes(),
            self.config.audio.max_buffer_bytes(),
            self.config.audio.sample_rate,
        );
        let session = Session::new(
            id.clone(),
            self.default_session_config.clone(),
            buffer,
            events,
            self.clock.now(),
        );
        registry.insert(id.clone(), Arc::new(Mutex::new(session)));

        info!(session = %id, "session created");
        Ok(id)
    }

    /// Closes and removes a session.
    ///
    /// Idempotent: closing an already-closed or unknown id is a no-op so
    /// cleanup paths may race with timeout eviction.
    pub async fn close_session(&self, id: &str) {
        let removed = self.registry.lock().await.remove(id);
        if let Some(handle) = removed {
            let mut session = handle.lock().await;
            session.begin_close();
            session.finish_close();
            info!(session = %id, "session closed");
        }
    }

    /// Routes inbound audio bytes to a session.
    ///
    /// Appends to the session buffer and, once a full window is ready,
    /// flushes it through the gate and pipeline. Runs on the connection
    /// task, so operations on one session never overlap; inference itself
    /// is offloaded to the shared worker pool.
    pub async fn process_audio(&self, id: &str, bytes: &[u8]) -> Result<()> {
        let handle = self.get(id).await?;
        let now = self.clock.now();

        let (window, config, events, is_active) = {
            let mut session = handle.lock().await;
            session.touch(now);
            session.buffer.append(bytes);
            if !session.buffer.ready_to_flush() && !session.buffer.at_capacity() {
                return Ok(());
            }
            (
                session.buffer.flush(),
                session.config.clone(),
                session.events.clone(),
                session.is_active.clone(),
            )
        };

        if window.is_empty() {
            return Ok(());
        }

        let spans = self.gate.evaluate(&window, config.vad_enabled);
        if spans.is_empty() {
            debug!(session = %id, "window discarded as silence");
            return Ok(());
        }

        let recognizer = match self.models.get_or_load(config.model).await {
            Ok(recognizer) => recognizer,
            Err(e) => {
                // The window is dropped but the session survives
                warn!(session = %id, error = %e, "model unavailable for flush");
                let _ = events.send(ServerMessage::from_error(&e)).await;
                return Ok(());
            }
        };

        handle.lock().await.begin_streaming();

        for span in spans {
            self.pipeline
                .run_span(
                    recognizer.clone(),
                    &window,
                    span,
                    config.decode_options(),
                    &is_active,
                    &events,
                )
                .await;
        }

        Ok(())
    }

    /// Applies a configuration message to a session.
    ///
    /// The requested model is loaded before the configuration takes effect;
    /// on failure the session keeps its previous configuration. The load may
    /// block this session's connection task but runs on the blocking pool,
    /// never stalling other sessions.
    pub async fn configure(&self, id: &str, new_config: SessionConfig) -> Result<()> {
        let handle = self.get(id).await?;

        self.models.get_or_load(new_config.model).await?;

        let mut session = handle.lock().await;
        session.touch(self.clock.now());
        session.config = new_config;
        session.mark_configured();
        debug!(session = %id, model = %session.config.model, "session configured");
        Ok(())
    }

    /// Records activity for a session without touching its buffer.
    ///
    /// Used for control messages (e.g. ping) that must keep a session from
    /// being evicted as idle.
    pub async fn touch_session(&self, id: &str) -> Result<()> {
        let handle = self.get(id).await?;
        handle.lock().await.touch(self.clock.now());
        Ok(())
    }

    /// Current state of a session.
    pub async fn session_state(&self, id: &str) -> Result<SessionState> {
        let handle = self.get(id).await?;
        let session = handle.lock().await;
        Ok(session.state)
    }

    /// Closes every session idle longer than the configured timeout.
    ///
    /// Activity is read with the registry lock held, the same lock that
    /// guards creation and close, so eviction cannot race destructively
    /// with in-flight calls for the same id.
    pub async fn sweep_idle(&self) -> Vec<String> {
        let now = self.clock.now();
        let timeout = self.config.limits.session_timeout();

        let mut expired = Vec::new();
        {
            let registry = self.registry.lock().await;
            for (id, handle) in registry.iter() {
                let session = handle.lock().await;
                if session.idle_for(now) > timeout {
                    expired.push(id.clone());
                }
            }
        }

        for id in &expired {
            info!(session = %id, "evicting idle session");
            self.close_session(id).await;
        }
        expired
    }

    /// Spawns the background idle sweep.
    pub fn spawn_idle_sweep(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = self.config.limits.sweep_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                let evicted = self.sweep_idle().await;
                if !evicted.is_empty() {
                    debug!(count = evicted.len(), "idle sweep evicted sessions");
                }
            }
        })
    }

    async fn get(&self, id: &str) -> Result<SessionHandle> {
        self.registry
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ScribedError::SessionNotFound { id: id.to_string() })
    }
}
