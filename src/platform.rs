//! # Platform-specific utilities
//!
//! Questo modulo centralizza la gestione cross-platform dei tool esterni
//! (ffmpeg, ffprobe) e il controllo della loro disponibilità.

use crate::error::{CompressError, Result};
use crate::tool_resolver::ToolPathResolver;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tracing::debug;

/// Platform-specific command manager with tool resolution
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    tool_resolver: ToolPathResolver,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut commands = HashMap::new();
        if cfg!(windows) {
            commands.insert("ffmpeg", "ffmpeg.exe");
            commands.insert("ffprobe", "ffprobe.exe");
        } else {
            commands.insert("ffmpeg", "ffmpeg");
            commands.insert("ffprobe", "ffprobe");
        }

        Self {
            commands,
            tool_resolver: ToolPathResolver::new(),
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    /// Get the resolved path to a tool
    pub fn get_tool_path(&self, base_name: &str) -> Option<PathBuf> {
        self.tool_resolver.resolve_tool(self.get_command(base_name))
    }

    /// Resolve a tool or fail with `MissingDependency`
    pub fn require_tool(&self, base_name: &str) -> Result<PathBuf> {
        self.get_tool_path(base_name).ok_or_else(|| {
            CompressError::MissingDependency(format!("{} is required for video processing", base_name))
        })
    }
}

/// Installation state of ffmpeg
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FfmpegStatus {
    pub installed: bool,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Report whether ffmpeg is available and which version it is
pub fn ffmpeg_status() -> FfmpegStatus {
    match PlatformCommands::instance().get_tool_path("ffmpeg") {
        Some(path) => {
            let version = tool_version(&path);
            debug!("ffmpeg at {} ({:?})", path.display(), version);
            FfmpegStatus {
                installed: true,
                version,
                path: Some(path),
            }
        }
        None => FfmpegStatus {
            installed: false,
            version: None,
            path: None,
        },
    }
}

/// First line of `<tool> -version`, e.g. "ffmpeg version 6.1 ..."
fn tool_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("-version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
}
