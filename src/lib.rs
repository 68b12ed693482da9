//! # Media Compress Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare del motore di compressione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Opzioni di esecuzione, profilo codec e costanti del pool
//! - `error`: Tassonomia degli errori (`CompressError`, `ErrorKind`)
//! - `file_manager`: Classificazione dei path e scansione ricorsiva
//! - `image_processor`: Compressione immagini in-process (JPEG/PNG/WebP)
//! - `video_processor`: Transcodifica video tramite ffmpeg
//! - `poster_extractor`: Estrazione del primo frame come poster WebP
//! - `platform` / `tool_resolver`: Individuazione di ffmpeg e ffprobe
//! - `optimizer`: Orchestratore batch e file singolo
//! - `progress` / `json_output`: Eventi di progresso e sink
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use media_compress::{compress_folder, CompressionOptions, NoopReporter};
//! use std::path::Path;
//!
//! # async fn run() -> media_compress::Result<()> {
//! let result = compress_folder(
//!     Path::new("photos"),
//!     Path::new("photos-compressed"),
//!     CompressionOptions::default(),
//!     &NoopReporter,
//! )
//! .await?;
//! println!("{}", result.format_summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod optimizer;
pub mod platform;
pub mod poster_extractor;
pub mod progress;
pub mod tool_resolver;
pub mod utils;
pub mod video_processor;

pub use config::{CodecProfile, CompressionOptions, OversizePolicy};
pub use error::{CompressError, ErrorKind, Result};
pub use file_manager::{scan_file, scan_folder, FileDescriptor, FileKind, FileManager, ScanReport};
pub use optimizer::{
    compress_file, compress_folder, compress_folder_quiet, BatchResult, FileFailure, MediaOptimizer, SingleResult,
};
pub use platform::{ffmpeg_status, FfmpegStatus};
pub use progress::{ConsoleReporter, NoopReporter, ProgressEvent, ProgressReporter};
