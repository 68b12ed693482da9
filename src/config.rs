//! # Configuration Module
//!
//! Questo modulo definisce le opzioni di una singola esecuzione e il profilo
//! di codifica fisso usato dal motore.
//!
//! ## Responsabilità:
//! - Definisce `CompressionOptions`, passata per valore ad ogni chiamata
//! - Definisce `OversizePolicy` per i file che crescono dopo la compressione
//! - Definisce `CodecProfile` con i parametri fissi di JPEG, PNG, WebP e video
//! - Espone le costanti del pool di worker
//!
//! Non esiste uno store di configurazione persistente: ogni chiamata è
//! autocontenuta.
//!
//! ## Esempio:
//! ```rust,ignore
//! let options = CompressionOptions {
//!     generate_video_poster: true,
//!     ..Default::default()
//! };
//! ```

use crate::error::{CompressError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on concurrent workers regardless of available parallelism
pub const MAX_WORKERS: usize = 8;

/// Concurrent ffmpeg processes allowed inside the worker pool
pub const VIDEO_SLOTS: usize = 2;

/// Capacity of the worker → aggregator completion channel
pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Suffix appended to a video's stem to name its poster image
pub const POSTER_SUFFIX: &str = "-poster";

/// What to do when the encoded output is larger than its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Report the encoded output as-is
    #[default]
    Keep,
    /// Overwrite the output with a byte copy of the source
    CopyOriginal,
}

/// Options for one orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionOptions {
    /// Re-encode images as WebP
    pub convert_images_to_webp: bool,
    /// Extract a WebP poster from the first frame of each video
    pub generate_video_poster: bool,
    #[serde(default)]
    pub oversize_policy: OversizePolicy,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            convert_images_to_webp: true,
            generate_video_poster: false,
            oversize_policy: OversizePolicy::Keep,
        }
    }
}

/// Fixed codec parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecProfile {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Lossy WebP quality (1-100)
    pub webp_quality: u8,
    /// Video CRF value (0-51, lower = better quality)
    pub video_crf: u8,
    /// x264 preset
    pub video_preset: String,
    /// Video audio bitrate
    pub audio_bitrate: String,
    /// Output container extension for transcoded videos
    pub video_container: String,
}

impl Default for CodecProfile {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            webp_quality: 80,
            video_crf: 23,
            video_preset: "medium".to_string(),
            audio_bitrate: "128k".to_string(),
            video_container: "mp4".to_string(),
        }
    }
}

impl CodecProfile {
    /// Validate profile parameters
    pub fn validate(&self) -> Result<()> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(CompressError::UnsupportedCodec(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        if self.webp_quality == 0 || self.webp_quality > 100 {
            return Err(CompressError::UnsupportedCodec(
                "WebP quality must be between 1 and 100".to_string(),
            ));
        }

        if self.video_crf > 51 {
            return Err(CompressError::UnsupportedCodec(
                "Video CRF must be between 0 and 51".to_string(),
            ));
        }

        if self.audio_bitrate.is_empty() || self.video_preset.is_empty() {
            return Err(CompressError::UnsupportedCodec(
                "Audio bitrate and video preset must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Number of worker slots for a batch
pub fn pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_validation() {
        let mut profile = CodecProfile::default();
        assert!(profile.validate().is_ok());

        profile.jpeg_quality = 0;
        assert!(profile.validate().is_err());

        profile.jpeg_quality = 80;
        profile.webp_quality = 101;
        assert!(profile.validate().is_err());

        profile.webp_quality = 80;
        profile.video_crf = 52;
        assert!(profile.validate().is_err());

        profile.video_crf = 23;
        profile.audio_bitrate.clear();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_options_default() {
        let options = CompressionOptions::default();
        assert!(options.convert_images_to_webp);
        assert!(!options.generate_video_poster);
        assert_eq!(options.oversize_policy, OversizePolicy::Keep);
    }

    #[test]
    fn test_options_deserialize_without_policy() {
        let options: CompressionOptions =
            serde_json::from_str(r#"{"convertImagesToWebp":false,"generateVideoPoster":true}"#).unwrap();
        assert!(!options.convert_images_to_webp);
        assert!(options.generate_video_poster);
        assert_eq!(options.oversize_policy, OversizePolicy::Keep);
    }

    #[test]
    fn test_pool_size_bounds() {
        let size = pool_size();
        assert!(size >= 1);
        assert!(size <= MAX_WORKERS);
    }
}
