//! # Video Processing Module
//!
//! Questo modulo gestisce la transcodifica di un singolo video tramite FFmpeg.
//!
//! ## Responsabilità:
//! - Compressione video con FFmpeg (libx264 + AAC)
//! - Normalizzazione del container (MP4)
//! - Analisi proprietà video con ffprobe (se disponibile)
//! - Classificazione degli errori FFmpeg (`Decode` / `UnsupportedCodec`)
//!
//! ## Formati supportati:
//! - **Input**: MP4, MOV, AVI, MKV, WebM
//! - **Output**: MP4 (H.264 + AAC) per massima compatibilità
//!
//! ## Pipeline di compressione:
//! 1. Risolve ffmpeg (`MissingDependency` se assente)
//! 2. Analizza il video con ffprobe: nessuno stream video → `Decode`
//! 3. Transcodifica in una directory temporanea accanto alla destinazione:
//!    - Codec video: libx264, CRF fisso, preset `medium`, `yuv420p`
//!    - Risoluzione preservata (arrotondata a dimensioni pari)
//!    - Codec audio: AAC a bitrate fisso
//!    - `+faststart` per lo streaming
//! 4. Rename sul path finale: un errore non lascia mai file parziali
//!
//! ## Esempio:
//! ```rust,ignore
//! let compressor = VideoCompressor::new(CodecProfile::default());
//! let (size, path) = compressor.compress(&descriptor, &dest)?;
//! ```

use crate::args;
use crate::config::CodecProfile;
use crate::error::{CompressError, Result};
use crate::file_manager::FileDescriptor;
use crate::platform::PlatformCommands;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Transcodes single videos with ffmpeg
#[derive(Debug, Clone)]
pub struct VideoCompressor {
    profile: CodecProfile,
}

impl VideoCompressor {
    pub fn new(profile: CodecProfile) -> Self {
        Self { profile }
    }

    /// Final path of a transcoded video for `dest_path`
    pub fn output_path_for(&self, dest_path: &Path) -> PathBuf {
        dest_path.with_extension(&self.profile.video_container)
    }

    /// Transcode `descriptor` into `dest_path` with the container normalized.
    /// Returns the size of the written file and its final path.
    pub fn compress(&self, descriptor: &FileDescriptor, dest_path: &Path) -> Result<(u64, PathBuf)> {
        let platform = PlatformCommands::instance();
        let ffmpeg = platform.require_tool("ffmpeg")?;

        fs::metadata(&descriptor.path).map_err(|e| CompressError::from_io(e, &descriptor.path))?;

        match platform.get_tool_path("ffprobe") {
            Some(ffprobe) => {
                let info = probe(&ffprobe, &descriptor.path)?;
                debug!(
                    "Probed {}: {}x{} {} {:.1}s @ {} bps",
                    descriptor.name, info.width, info.height, info.codec, info.duration, info.bitrate
                );
            }
            None => debug!("ffprobe not available, skipping probe of {}", descriptor.name),
        }

        let output_path = self.output_path_for(dest_path);
        let parent = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|e| CompressError::from_io(e, parent))?;

        // ffmpeg picks the muxer from the extension, so the temp file keeps it
        let staging = tempfile::Builder::new()
            .prefix(".transcode-")
            .tempdir_in(parent)
            .map_err(|e| CompressError::from_io(e, parent))?;
        let staged = staging
            .path()
            .join(format!("video.{}", self.profile.video_container));

        let start_time = std::time::Instant::now();
        run_ffmpeg(&ffmpeg, &self.transcode_args(&descriptor.path, &staged))?;
        debug!(
            "Transcoded {} in {:.1}s",
            descriptor.name,
            start_time.elapsed().as_secs_f64()
        );

        fs::rename(&staged, &output_path).map_err(|e| CompressError::from_io(e, &output_path))?;

        let size = fs::metadata(&output_path)
            .map_err(|e| CompressError::from_io(e, &output_path))?
            .len();

        Ok((size, output_path))
    }

    /// ffmpeg arguments for the fixed transcode profile
    pub fn transcode_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        args![
            "-hide_banner",
            "-nostdin",
            "-loglevel", "error",
            "-i", input,
            "-map", "0:v:0",
            "-map", "0:a?",
            "-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2",
            "-c:v", "libx264",
            "-crf", self.profile.video_crf,
            "-preset", self.profile.video_preset,
            "-pix_fmt", "yuv420p",
            "-c:a", "aac",
            "-b:a", self.profile.audio_bitrate,
            "-map_metadata", "0",
            "-movflags", "+faststart",
            "-max_muxing_queue_size", "1024",
            "-y", output,
        ]
    }
}

/// Run ffmpeg to completion, mapping a failed exit to a classified error
pub(crate) fn run_ffmpeg(ffmpeg: &Path, args: &[OsString]) -> Result<()> {
    debug!("Running {} {:?}", ffmpeg.display(), args);

    let output = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CompressError::MissingDependency(format!("failed to execute {}: {}", ffmpeg.display(), e)))?;

    if !output.status.success() {
        return Err(classify_ffmpeg_error(&String::from_utf8_lossy(&output.stderr)));
    }

    Ok(())
}

/// Map ffmpeg's stderr to an error category
pub fn classify_ffmpeg_error(stderr: &str) -> CompressError {
    const CODEC_MARKERS: &[&str] = &[
        "unknown encoder",
        "unknown decoder",
        "decoder not found",
        "encoder not found",
        "unsupported codec",
        "not currently supported",
    ];

    let message = stderr.trim();
    let lower = message.to_lowercase();
    let is_codec_problem = CODEC_MARKERS.iter().any(|m| lower.contains(m))
        || (lower.contains("decoder (codec") && lower.contains("not found"));

    let message = if message.is_empty() {
        "ffmpeg exited with an error".to_string()
    } else {
        message.lines().last().unwrap_or(message).to_string()
    };

    if is_codec_problem {
        CompressError::UnsupportedCodec(message)
    } else {
        CompressError::Decode(message)
    }
}

/// Get video information using ffprobe
pub fn probe(ffprobe: &Path, video_path: &Path) -> Result<VideoInfo> {
    let output = Command::new(ffprobe)
        .args(args![
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
            video_path,
        ])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| CompressError::MissingDependency(format!("failed to execute ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(CompressError::Decode(format!(
            "ffprobe could not read {}",
            video_path.display()
        )));
    }

    VideoInfo::from_ffprobe_json(&String::from_utf8_lossy(&output.stdout))
}

/// Video file information
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub duration: f64,
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
}

impl VideoInfo {
    /// Parse `ffprobe -print_format json -show_format -show_streams` output
    pub fn from_ffprobe_json(json: &str) -> Result<Self> {
        let info: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| CompressError::Decode(format!("invalid ffprobe output: {}", e)))?;

        let format = &info["format"];
        let duration = format["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);
        let bitrate = format["bit_rate"]
            .as_str()
            .and_then(|b| b.parse::<u64>().ok())
            .unwrap_or(0);

        let video_stream = info["streams"]
            .as_array()
            .and_then(|streams| streams.iter().find(|s| s["codec_type"] == "video"))
            .ok_or_else(|| CompressError::Decode("no video stream".to_string()))?;

        Ok(Self {
            duration,
            bitrate,
            width: video_stream["width"].as_u64().unwrap_or(0) as u32,
            height: video_stream["height"].as_u64().unwrap_or(0) as u32,
            codec: video_stream["codec_name"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_output_path_normalizes_container() {
        let compressor = VideoCompressor::new(CodecProfile::default());
        assert_eq!(
            compressor.output_path_for(Path::new("/out/clips/a.MOV")),
            PathBuf::from("/out/clips/a.mp4")
        );
        assert_eq!(
            compressor.output_path_for(Path::new("/out/b.mp4")),
            PathBuf::from("/out/b.mp4")
        );
    }

    #[test]
    fn test_transcode_args_use_profile() {
        let compressor = VideoCompressor::new(CodecProfile::default());
        let args = compressor.transcode_args(Path::new("/in/a.mov"), Path::new("/tmp/video.mp4"));

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-i") + 1], "/in/a.mov");
        assert_eq!(args[pos("-crf") + 1], "23");
        assert_eq!(args[pos("-c:v") + 1], "libx264");
        assert_eq!(args[pos("-b:a") + 1], "128k");
        assert_eq!(args.last().unwrap(), "/tmp/video.mp4");
    }

    #[test]
    fn test_classify_ffmpeg_error() {
        let err = classify_ffmpeg_error("Unknown encoder 'libx264'");
        assert_eq!(err.kind(), ErrorKind::UnsupportedCodec);

        let err = classify_ffmpeg_error("[matroska] Decoder (codec none) not found for input stream #0:0");
        assert_eq!(err.kind(), ErrorKind::UnsupportedCodec);

        let err = classify_ffmpeg_error("in.mp4: Invalid data found when processing input\n");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("Invalid data found"));

        let err = classify_ffmpeg_error("");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_video_info_from_ffprobe_json() {
        let json = r#"{
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "hevc", "width": 1920, "height": 1080}
            ],
            "format": {"duration": "12.5", "bit_rate": "4000000"}
        }"#;

        let info = VideoInfo::from_ffprobe_json(json).unwrap();
        assert_eq!(info.codec, "hevc");
        assert_eq!((info.width, info.height), (1920, 1080));
        assert_eq!(info.duration, 12.5);
        assert_eq!(info.bitrate, 4_000_000);
    }

    #[test]
    fn test_video_info_without_video_stream() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
        let err = VideoInfo::from_ffprobe_json(json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = VideoInfo::from_ffprobe_json("not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
