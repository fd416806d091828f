//! Registry of loaded speech recognizers.
//!
//! Model loading can take seconds, so it runs on the blocking thread pool
//! through a [`RecognizerLoader`]; the session that requested the load waits,
//! other sessions keep using already-loaded models.

use crate::error::{Result, ScribedError};
use crate::models::catalog::ModelSize;
use crate::stt::recognizer::SpeechRecognizer;
use crate::stt::whisper::WhisperRecognizer;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Factory producing a recognizer for a model variant. Blocking.
pub trait RecognizerLoader: Send + Sync {
    /// Load a recognizer for the given model.
    fn load(&self, model: ModelSize) -> Result<Arc<dyn SpeechRecognizer>>;
}

/// Loads ggml weight files from a model directory via whisper-rs.
#[derive(Debug, Clone)]
pub struct WhisperLoader {
    model_dir: PathBuf,
}

impl WhisperLoader {
    /// Creates a loader resolving models inside `model_dir`.
    pub fn new(model_dir: PathBuf) -> Self {
        Self { model_dir }
    }
}

impl RecognizerLoader for WhisperLoader {
    fn load(&self, model: ModelSize) -> Result<Arc<dyn SpeechRecognizer>> {
        let path = self.model_dir.join(model.file_name());
        let recognizer = WhisperRecognizer::new(&path)?;
        Ok(Arc::new(recognizer))
    }
}

/// Mock loader for testing
#[derive(Default)]
pub struct MockLoader {
    recognizers: HashMap<ModelSize, Arc<dyn SpeechRecognizer>>,
    failing: Vec<ModelSize>,
    load_count: std::sync::atomic::AtomicUsize,
}

impl MockLoader {
    /// Create a loader that hands out empty mock recognizers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a specific recognizer for a model.
    pub fn with_recognizer(
        mut self,
        model: ModelSize,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Self {
        self.recognizers.insert(model, recognizer);
        self
    }

    /// Fail any load of the given model.
    pub fn with_failure(mut self, model: ModelSize) -> Self {
        self.failing.push(model);
        self
    }

    /// Number of load calls performed.
    pub fn load_count(&self) -> usize {
        self.load_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl RecognizerLoader for MockLoader {
    fn load(&self, model: ModelSize) -> Result<Arc<dyn SpeechRecognizer>> {
        self.load_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.failing.contains(&model) {
            return Err(ScribedError::ModelLoadFailed {
                model: model.to_string(),
                message: "mock load failure".to_string(),
            });
        }
        if let Some(recognizer) = self.recognizers.get(&model) {
            return Ok(recognizer.clone());
        }
        Ok(Arc::new(crate::stt::recognizer::MockRecognizer::new(
            model.as_str(),
        )))
    }
}

/// Caches loaded recognizers keyed by model variant.
pub struct ModelRegistry {
    loader: Arc<dyn RecognizerLoader>,
    loaded: Mutex<HashMap<ModelSize, Arc<dyn SpeechRecognizer>>>,
}

impl ModelRegistry {
    /// Creates an empty registry backed by the given loader.
    pub fn new(loader: Arc<dyn RecognizerLoader>) -> Self {
        Self {
            loader,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached recognizer for a model, loading it if necessary.
    ///
    /// The load itself runs on the blocking pool; the cache lock is not held
    /// across it, so sessions using already-loaded models never wait.
    pub async fn get_or_load(&self, model: ModelSize) -> Result<Arc<dyn SpeechRecognizer>> {
        if let Some(recognizer) = self.loaded.lock().await.get(&model) {
            return Ok(recognizer.clone());
        }

        info!(model = %model, "loading model");
        let loader = self.loader.clone();
        let recognizer = tokio::task::spawn_blocking(move || loader.load(model))
            .await
            .map_err(|e| ScribedError::ModelLoadFailed {
                model: model.to_string(),
                message: format!("load task panicked: {}", e),
            })??;
        info!(model = %model, "model loaded");

        // A concurrent load may have won the race; keep the first entry.
        let mut loaded = self.loaded.lock().await;
        Ok(loaded.entry(model).or_insert(recognizer).clone())
    }

    /// Returns true if the model is already loaded.
    pub async fn is_loaded(&self, model: ModelSize) -> bool {
        self.loaded.lock().await.contains_key(&model)
    }

    /// Returns true if any model is loaded.
    pub async fn any_loaded(&self) -> bool {
        !self.loaded.lock().await.is_empty()
    }
}
