//! # Poster Extraction Module
//!
//! Estrae il primo frame decodificabile di un video e lo codifica come WebP.
//!
//! Il frame viene decodificato da FFmpeg partendo dall'inizio dello stream
//! (nessun seek), quindi è sempre il frame 0 anche se non è un keyframe.
//! Un video senza frame decodificabili fallisce con `Decode`.

use crate::args;
use crate::config::{CodecProfile, POSTER_SUFFIX};
use crate::error::{CompressError, Result};
use crate::file_manager::FileDescriptor;
use crate::image_processor::{write_webp, ImageCompressor};
use crate::platform::PlatformCommands;
use crate::video_processor::run_ffmpeg;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extracts still posters from videos
#[derive(Debug, Clone)]
pub struct PosterExtractor {
    webp_quality: u8,
}

impl PosterExtractor {
    pub fn new(profile: &CodecProfile) -> Self {
        Self {
            webp_quality: profile.webp_quality,
        }
    }

    /// Poster path next to a (transcoded) video: `<stem>-poster.webp`
    pub fn poster_path_for(video_output: &Path) -> PathBuf {
        let stem = video_output.file_stem().unwrap_or_default().to_string_lossy();
        video_output.with_file_name(format!("{}{}.webp", stem, POSTER_SUFFIX))
    }

    /// Decode frame 0 of `descriptor` and write it as WebP at `dest_path`
    /// (extension forced to `.webp`). Returns the poster path.
    pub fn extract_poster(&self, descriptor: &FileDescriptor, dest_path: &Path) -> Result<PathBuf> {
        let ffmpeg = PlatformCommands::instance().require_tool("ffmpeg")?;
        let output_path = dest_path.with_extension("webp");

        let scratch = tempfile::TempDir::new().map_err(|e| CompressError::Io(e.to_string()))?;
        let frame = scratch.path().join("frame.png");

        run_ffmpeg(&ffmpeg, &Self::frame_args(&descriptor.path, &frame))?;

        let frame_size = fs::metadata(&frame).map(|m| m.len()).unwrap_or(0);
        if frame_size == 0 {
            return Err(CompressError::Decode(format!(
                "{} has no decodable frames",
                descriptor.path.display()
            )));
        }

        let img = ImageCompressor::decode(&frame)?;
        let size = write_webp(&img, &output_path, self.webp_quality)?;
        debug!(
            "Poster for {}: {} ({} bytes)",
            descriptor.name,
            output_path.display(),
            size
        );

        Ok(output_path)
    }

    /// ffmpeg arguments decoding exactly the first video frame into `frame`
    pub fn frame_args(input: &Path, frame: &Path) -> Vec<OsString> {
        args![
            "-hide_banner",
            "-nostdin",
            "-loglevel", "error",
            "-i", input,
            "-map", "0:v:0",
            "-frames:v", "1",
            "-y", frame,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poster_path_naming() {
        assert_eq!(
            PosterExtractor::poster_path_for(Path::new("/out/trip/c.mp4")),
            PathBuf::from("/out/trip/c-poster.webp")
        );
    }

    #[test]
    fn test_frame_args_decode_from_start() {
        let args = PosterExtractor::frame_args(Path::new("/in/c.mp4"), Path::new("/tmp/frame.png"));
        assert!(!args.iter().any(|a| a == "-ss"));
        let pos = args.iter().position(|a| a == "-frames:v").unwrap();
        assert_eq!(args[pos + 1], "1");
        assert_eq!(args.last().unwrap(), "/tmp/frame.png");
    }
}
