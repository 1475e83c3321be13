// src/services/image_codec.rs
use crate::errors::StitchScanError;
use crate::models::UploadedImage;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use image::GenericImageView;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A held copy of an upload's bytes, resolvable through `/preview/{id}`
/// until the workflow releases it.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub data: Bytes,
    pub media_type: String,
}

pub struct ImageCodec {
    previews: RwLock<HashMap<Uuid, PreviewImage>>,
}

impl ImageCodec {
    pub fn new() -> Self {
        Self {
            previews: RwLock::new(HashMap::new()),
        }
    }

    /// Encodes an upload for transport and registers a preview reference
    /// for it. The payload is the bare base64 body, no data-URI prefix.
    pub async fn encode(
        &self,
        data: Bytes,
        media_type: &str,
    ) -> Result<UploadedImage, StitchScanError> {
        let img = image::load_from_memory(&data)
            .map_err(|e| StitchScanError::Read(format!("Invalid image format: {}", e)))?;

        let (width, height) = img.dimensions();
        if width > 4096 || height > 4096 {
            return Err(StitchScanError::Validation(
                "Image dimensions exceed 4096x4096".to_string(),
            ));
        }

        let encoded_payload = general_purpose::STANDARD.encode(&data);

        let id = Uuid::new_v4();
        let preview = PreviewImage {
            data,
            media_type: media_type.to_string(),
        };
        self.previews.write().await.insert(id, preview);

        Ok(UploadedImage {
            id,
            preview_url: format!("/preview/{}", id),
            encoded_payload,
            media_type: media_type.to_string(),
            uploaded_at: chrono::Utc::now(),
        })
    }

    pub async fn preview(&self, id: &Uuid) -> Option<PreviewImage> {
        self.previews.read().await.get(id).cloned()
    }

    /// Drops a held preview. Releasing an already-released id is a no-op.
    pub async fn release(&self, id: &Uuid) {
        self.previews.write().await.remove(id);
    }

    #[cfg(test)]
    pub async fn preview_count(&self) -> usize {
        self.previews.read().await.len()
    }
}
