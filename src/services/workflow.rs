// src/services/workflow.rs
use crate::errors::StitchScanError;
use crate::models::WorkflowState;
use crate::services::analysis_client::PatternAnalyzer;
use crate::services::image_codec::ImageCodec;
use bytes::Bytes;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Shown when a failure carries no display text of its own.
const FALLBACK_MESSAGE: &str = "We couldn't quite see the details. Try taking a photo in better lighting or focusing on a single row.";

/// Drives the upload -> encode -> analyze pipeline as a four-state
/// workflow: Idle, Analyzing, Result, Error. At most one cycle is current
/// at a time; a newer upload or a reset supersedes whatever is in flight
/// and the superseded cycle's late outcome is discarded.
pub struct WorkflowController {
    analyzer: Arc<dyn PatternAnalyzer>,
    codec: Arc<ImageCodec>,
    state: RwLock<WorkflowState>,
    generation: AtomicU64,
}

impl WorkflowController {
    pub fn new(analyzer: Arc<dyn PatternAnalyzer>, codec: Arc<ImageCodec>) -> Self {
        Self {
            analyzer,
            codec,
            state: RwLock::new(WorkflowState::Idle),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state for observers.
    pub async fn state(&self) -> WorkflowState {
        self.state.read().await.clone()
    }

    /// Runs one full analysis cycle for a freshly uploaded image and
    /// returns the state the cycle left behind.
    pub async fn submit(&self, data: Bytes, media_type: String) -> WorkflowState {
        let generation = self.begin_cycle().await;

        let image = match self.codec.encode(data, &media_type).await {
            Ok(image) => image,
            Err(err) => {
                warn!("Image encoding failed: {}", err);
                self.commit(
                    generation,
                    WorkflowState::Error {
                        message: user_message(&err),
                    },
                )
                .await;
                return self.state().await;
            }
        };

        if !self
            .commit(
                generation,
                WorkflowState::Analyzing {
                    image: image.clone(),
                },
            )
            .await
        {
            // Superseded before the cycle even got going; nothing else
            // will release this preview.
            self.codec.release(&image.id).await;
            return self.state().await;
        }

        debug!("Analyzing upload {} ({})", image.id, image.media_type);

        match self
            .analyzer
            .analyze(&image.encoded_payload, &image.media_type)
            .await
        {
            Ok(result) => {
                self.commit(generation, WorkflowState::Result { result, image })
                    .await;
            }
            Err(err) => {
                warn!("Analysis failed: {}", err);
                let committed = self
                    .commit(
                        generation,
                        WorkflowState::Error {
                            message: user_message(&err),
                        },
                    )
                    .await;
                if committed {
                    self.codec.release(&image.id).await;
                }
            }
        }

        self.state().await
    }

    /// Records an upload whose bytes never made it off the wire: a cycle
    /// that fails before encoding starts.
    pub async fn fail(&self, err: StitchScanError) -> WorkflowState {
        let generation = self.begin_cycle().await;
        self.commit(
            generation,
            WorkflowState::Error {
                message: user_message(&err),
            },
        )
        .await;
        self.state().await
    }

    /// Discards any result or error and returns the workflow to Idle,
    /// releasing held image resources. Supersedes an in-flight cycle.
    pub async fn reset(&self) -> WorkflowState {
        let mut state = self.state.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(image) = state.image() {
            self.codec.release(&image.id).await;
        }
        *state = WorkflowState::Idle;
        state.clone()
    }

    /// Starts a new cycle: supersedes whatever is in flight, releases the
    /// previous preview, and clears any prior result or error.
    async fn begin_cycle(&self) -> u64 {
        let mut state = self.state.write().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(image) = state.image() {
            self.codec.release(&image.id).await;
        }
        *state = WorkflowState::Idle;
        generation
    }

    /// Applies `next` only if no newer cycle has started since
    /// `generation` was taken.
    async fn commit(&self, generation: u64, next: WorkflowState) -> bool {
        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *state = next;
        true
    }
}

fn user_message(err: &StitchScanError) -> String {
    let message = err.to_string();
    if message.is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        message
    }
}
