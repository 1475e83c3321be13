// src/services/mod.rs
pub mod analysis_client;
pub mod image_codec;
pub mod workflow;

pub use analysis_client::{GeminiClient, PatternAnalyzer};
pub use image_codec::ImageCodec;
pub use workflow::WorkflowController;
