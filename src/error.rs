//! # Error Types Module
//!
//! Questo modulo definisce la tassonomia degli errori del motore di compressione.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` per categorizzare tutti gli errori possibili
//! - Espone `ErrorKind`, la forma serializzabile usata nei risultati batch
//! - Converte errori di I/O e del crate `image` nella categoria corretta
//!
//! ## Categorie di errori:
//! - `NotFound`: Path di input inesistente
//! - `Permission`: Entry non leggibile
//! - `Io`: Errori di creazione/scrittura output
//! - `Decode`: Media corrotto o non leggibile
//! - `UnsupportedCodec`: Codec non supportato da encoder/decoder
//! - `UnsupportedType`: Estensione non classificabile (modalità file singolo)
//! - `MissingDependency`: Tool esterno mancante (ffmpeg)
//! - `Worker`: Task di lavoro terminato in modo anomalo
//!
//! ## Esempio:
//! ```rust,ignore
//! if kind == FileKind::Other {
//!     return Err(CompressError::UnsupportedType(path.to_path_buf()));
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Custom error types for media compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    Permission(PathBuf),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedType(PathBuf),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Serializable category of a [`CompressError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Permission,
    Io,
    Decode,
    UnsupportedCodec,
    UnsupportedType,
    MissingDependency,
    Worker,
}

impl CompressError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Permission(_) => ErrorKind::Permission,
            Self::Io(_) => ErrorKind::Io,
            Self::Decode(_) => ErrorKind::Decode,
            Self::UnsupportedCodec(_) => ErrorKind::UnsupportedCodec,
            Self::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Self::MissingDependency(_) => ErrorKind::MissingDependency,
            Self::Worker(_) => ErrorKind::Worker,
        }
    }

    /// Map an I/O error that happened while touching `path`
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::Permission(path),
            _ => Self::Io(format!("{}: {}", path.display(), err)),
        }
    }
}

impl From<image::ImageError> for CompressError {
    fn from(err: image::ImageError) -> Self {
        use image::ImageError;

        match err {
            ImageError::IoError(e) => Self::Io(e.to_string()),
            ImageError::Encoding(e) => Self::UnsupportedCodec(e.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotFound => "not_found",
            Self::Permission => "permission",
            Self::Io => "io",
            Self::Decode => "decode",
            Self::UnsupportedCodec => "unsupported_codec",
            Self::UnsupportedType => "unsupported_type",
            Self::MissingDependency => "missing_dependency",
            Self::Worker => "worker",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
