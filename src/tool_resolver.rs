//! # Tool Path Resolver
//!
//! Locates the external codec tools (ffmpeg, ffprobe) in, by priority:
//! - the directory named by `MEDIA_COMPRESS_TOOLS_DIR`
//! - the application data directory (`<data_dir>/media-compress/bin`)
//! - the system `PATH`

use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable overriding the tools directory
pub const TOOLS_DIR_ENV: &str = "MEDIA_COMPRESS_TOOLS_DIR";

const APP_DIR_NAME: &str = "media-compress";

/// Tool path resolver for bundled and system-installed tools
pub struct ToolPathResolver {
    /// Directories searched before `PATH`
    search_dirs: Vec<PathBuf>,
    use_system_path: bool,
}

impl ToolPathResolver {
    pub fn new() -> Self {
        let mut search_dirs = Vec::new();

        if let Some(dir) = env::var_os(TOOLS_DIR_ENV) {
            search_dirs.push(PathBuf::from(dir));
        }
        if let Some(app_dir) = Self::app_tools_dir() {
            search_dirs.push(app_dir);
        }

        Self {
            search_dirs,
            use_system_path: true,
        }
    }

    /// Resolver that only looks in the given directories, never in `PATH`
    pub fn with_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            use_system_path: false,
        }
    }

    /// Application data directory holding downloaded tools
    pub fn app_tools_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(APP_DIR_NAME).join("bin"))
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, executable: &str) -> Option<PathBuf> {
        let bundled = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(executable))
            .find(|path| path.is_file());
        if let Some(path) = bundled {
            debug!("Using bundled tool: {} -> {}", executable, path.display());
            return Some(path);
        }

        if !self.use_system_path {
            return None;
        }

        let path = self.find_in_system_path(executable);
        if let Some(ref p) = path {
            debug!("Using system tool: {} -> {}", executable, p.display());
        } else {
            debug!("Tool not found: {}", executable);
        }
        path
    }

    /// Find tool in system PATH
    fn find_in_system_path(&self, executable: &str) -> Option<PathBuf> {
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths)
            .map(|dir| dir.join(executable))
            .find(|path| path.is_file())
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_from_search_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ffmpeg"), b"#!/bin/sh\n").unwrap();

        let resolver = ToolPathResolver::with_dirs(vec![dir.path().to_path_buf()]);
        assert_eq!(resolver.resolve_tool("ffmpeg"), Some(dir.path().join("ffmpeg")));
        assert_eq!(resolver.resolve_tool("ffprobe"), None);
    }

    #[test]
    fn test_directories_are_not_tools() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("ffmpeg")).unwrap();

        let resolver = ToolPathResolver::with_dirs(vec![dir.path().to_path_buf()]);
        assert_eq!(resolver.resolve_tool("ffmpeg"), None);
    }
}
