//! # File Management Module
//!
//! Questo modulo gestisce la classificazione dei file e la scansione delle directory.
//!
//! ## Responsabilità:
//! - Classificazione per estensione (immagine / video / altro)
//! - Scansione ricorsiva di una directory in `FileDescriptor`
//! - Scansione di un singolo file con rifiuto dei tipi non classificati
//! - Utilità per dimensioni human-readable e percentuali di riduzione
//!
//! ## Formati riconosciuti:
//! - **Immagini**: JPG, JPEG, PNG, WebP, GIF, BMP
//! - **Video**: MP4, MOV, AVI, MKV, WebM
//! - Tutto il resto è `Other` e viene copiato byte per byte dal batch
//!
//! ## Politica di scansione:
//! - I link simbolici non vengono seguiti (niente cicli)
//! - Le entry non leggibili vengono saltate e registrate in `ScanReport::skipped`
//! - Un root inesistente è un errore fatale
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = scan_folder(Path::new("/path/to/media"))?;
//! for file in files {
//!     if file.kind == FileKind::Image {
//!         // process image
//!     }
//! }
//! ```

use crate::error::{CompressError, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Semantic kind of a file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Other,
}

impl FileKind {
    /// Classify a lower-cased extension (without the leading dot)
    pub fn from_extension(ext: &str) -> Self {
        if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else {
            Self::Other
        }
    }

    /// Classify a path by its extension
    pub fn classify(path: &Path) -> Self {
        Self::from_extension(&extension_of(path))
    }
}

/// Immutable description of one file found by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub path: PathBuf,
    /// Path relative to the scan root, or the bare file name for single-file scans
    pub name: String,
    pub size: u64,
    pub kind: FileKind,
    /// Lower-cased, without leading dot
    pub extension: String,
}

/// Full result of a folder scan
#[derive(Debug, Default)]
pub struct ScanReport {
    pub descriptors: Vec<FileDescriptor>,
    /// Entries that could not be read, with the reason
    pub skipped: Vec<(PathBuf, ErrorKind)>,
}

impl ScanReport {
    pub fn total_size(&self) -> u64 {
        self.descriptors.iter().map(|d| d.size).sum()
    }
}

/// Lower-cased extension of `path`, empty when there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Recursively scan `root` and return every regular file found.
///
/// Unreadable entries below the root are skipped; use [`FileManager::scan`]
/// to get them back in [`ScanReport::skipped`].
pub fn scan_folder(root: &Path) -> Result<Vec<FileDescriptor>> {
    Ok(FileManager::scan(root)?.descriptors)
}

/// Describe a single file, rejecting unclassified kinds
pub fn scan_file(path: &Path) -> Result<FileDescriptor> {
    FileManager::describe_file(path)
}

/// Manages file discovery
pub struct FileManager;

impl FileManager {
    /// Walk `root` without following symlinks
    pub fn scan(root: &Path) -> Result<ScanReport> {
        fs::symlink_metadata(root).map_err(|e| CompressError::from_io(e, root))?;

        let mut report = ScanReport::default();

        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    let kind = match e.io_error().map(|io| io.kind()) {
                        Some(std::io::ErrorKind::PermissionDenied) => ErrorKind::Permission,
                        Some(std::io::ErrorKind::NotFound) => ErrorKind::NotFound,
                        _ => ErrorKind::Io,
                    };

                    // The root itself must be readable
                    if e.depth() == 0 {
                        return Err(match kind {
                            ErrorKind::Permission => CompressError::Permission(path),
                            ErrorKind::NotFound => CompressError::NotFound(path),
                            _ => CompressError::Io(e.to_string()),
                        });
                    }

                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    report.skipped.push((path, kind));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("Skipping {}: cannot read metadata: {}", path.display(), e);
                    let kind = match e.io_error().map(|io| io.kind()) {
                        Some(std::io::ErrorKind::PermissionDenied) => ErrorKind::Permission,
                        _ => ErrorKind::Io,
                    };
                    report.skipped.push((path.to_path_buf(), kind));
                    continue;
                }
            };

            let name = path
                .strip_prefix(root)
                .ok()
                .filter(|rel| !rel.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new(path.file_name().unwrap_or_default()))
                .to_string_lossy()
                .to_string();

            let extension = extension_of(path);
            report.descriptors.push(FileDescriptor {
                path: path.to_path_buf(),
                name,
                size,
                kind: FileKind::from_extension(&extension),
                extension,
            });
        }

        debug!(
            "Scanned {}: {} files ({}), {} skipped",
            root.display(),
            report.descriptors.len(),
            Self::format_size(report.total_size()),
            report.skipped.len()
        );

        Ok(report)
    }

    /// Build a descriptor for one file
    pub fn describe_file(path: &Path) -> Result<FileDescriptor> {
        let metadata = fs::metadata(path).map_err(|e| CompressError::from_io(e, path))?;
        if !metadata.is_file() {
            return Err(CompressError::UnsupportedType(path.to_path_buf()));
        }

        let extension = extension_of(path);
        let kind = FileKind::from_extension(&extension);
        if kind == FileKind::Other {
            return Err(CompressError::UnsupportedType(path.to_path_buf()));
        }

        Ok(FileDescriptor {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            size: metadata.len(),
            kind,
            extension,
        })
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction (negative when the file grew)
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classification_table() {
        for ext in ["jpg", "jpeg", "png", "webp", "gif", "bmp"] {
            assert_eq!(FileKind::from_extension(ext), FileKind::Image, "{ext}");
        }
        for ext in ["mp4", "mov", "avi", "mkv", "webm"] {
            assert_eq!(FileKind::from_extension(ext), FileKind::Video, "{ext}");
        }
        assert_eq!(FileKind::from_extension("txt"), FileKind::Other);
        assert_eq!(FileKind::from_extension(""), FileKind::Other);
        assert_eq!(FileKind::classify(Path::new("/a/B.JPG")), FileKind::Image);
        assert_eq!(FileKind::classify(Path::new("/a/clip.MoV")), FileKind::Video);
        assert_eq!(FileKind::classify(Path::new("/a/README")), FileKind::Other);
    }

    #[test]
    fn test_scan_folder_recursive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("a.JPG"), b"12345").unwrap();
        fs::write(dir.path().join("sub/b.mp4"), b"123").unwrap();
        fs::write(dir.path().join("sub/deeper/notes.txt"), b"1").unwrap();

        let files = scan_folder(dir.path()).unwrap();
        assert_eq!(files.len(), 3);

        let jpg = files.iter().find(|f| f.name == "a.JPG").unwrap();
        assert_eq!(jpg.kind, FileKind::Image);
        assert_eq!(jpg.extension, "jpg");
        assert_eq!(jpg.size, 5);

        let video = files.iter().find(|f| f.extension == "mp4").unwrap();
        assert_eq!(video.kind, FileKind::Video);
        assert_eq!(Path::new(&video.name), Path::new("sub").join("b.mp4"));

        let other = files.iter().find(|f| f.extension == "txt").unwrap();
        assert_eq!(other.kind, FileKind::Other);
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = scan_folder(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_scan_empty_folder() {
        let dir = TempDir::new().unwrap();
        let report = FileManager::scan(dir.path()).unwrap();
        assert!(report.descriptors.is_empty());
        assert_eq!(report.total_size(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_does_not_follow_symlinks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("real.png"), b"x").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.png"), dir.path().join("alias.png")).unwrap();

        let files = scan_folder(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "real.png");
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_unreadable_directories() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), b"x").unwrap();
        fs::write(dir.path().join("b.txt"), b"y").unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.jpg"), b"z").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = FileManager::scan(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let report = report.unwrap();

        let names: Vec<_> = report.descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.txt"]);
        assert_eq!(report.skipped, vec![(locked, ErrorKind::Permission)]);
    }

    #[test]
    fn test_scan_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Photo.PNG");
        fs::write(&path, b"abc").unwrap();

        let file = scan_file(&path).unwrap();
        assert_eq!(file.name, "Photo.PNG");
        assert_eq!(file.kind, FileKind::Image);
        assert_eq!(file.extension, "png");
        assert_eq!(file.size, 3);

        let txt = dir.path().join("doc.txt");
        fs::write(&txt, b"abc").unwrap();
        assert_eq!(scan_file(&txt).unwrap_err().kind(), ErrorKind::UnsupportedType);

        assert_eq!(
            scan_file(&dir.path().join("ghost.jpg")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(2048), "2.00 KB");
        assert_eq!(FileManager::format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_calculate_reduction() {
        assert_eq!(FileManager::calculate_reduction(0, 10), 0.0);
        assert_eq!(FileManager::calculate_reduction(100, 25), 75.0);
        assert_eq!(FileManager::calculate_reduction(100, 150), -50.0);
    }
}
