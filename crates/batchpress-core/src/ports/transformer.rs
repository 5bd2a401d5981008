//! ImageTransformer port - the pluggable derivation step.

use std::io::Cursor;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;

use crate::error::PipelineError;

#[async_trait]
pub trait ImageTransformer: Send + Sync {
    /// Derive output bytes from input bytes. Replaceable without touching the
    /// aggregation path.
    async fn transform(&self, bytes: &[u8]) -> Result<Vec<u8>, PipelineError>;
}

/// Re-encodes any supported input as JPEG at a fixed quality.
pub struct JpegCompressor {
    quality: u8,
}

impl JpegCompressor {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }
}

#[async_trait]
impl ImageTransformer for JpegCompressor {
    async fn transform(&self, bytes: &[u8]) -> Result<Vec<u8>, PipelineError> {
        let quality = self.quality;
        let input = bytes.to_vec();

        // Decode + encode is CPU work; keep it off the async workers.
        let encoded = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, PipelineError> {
            let img = image::load_from_memory(&input)
                .map_err(|e| PipelineError::Transform(format!("decode: {e}")))?;
            let mut out = Cursor::new(Vec::new());
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
                .map_err(|e| PipelineError::Transform(format!("encode: {e}")))?;
            Ok(out.into_inner())
        })
        .await
        .map_err(|e| PipelineError::Transform(format!("join: {e}")))??;

        Ok(encoded)
    }
}
