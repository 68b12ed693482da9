//! # Task Optimizer Module
//!
//! Worker per la compressione di un singolo file.
//! Sceglie il compressore in base al `FileKind`, estrae il poster se
//! richiesto e applica la `OversizePolicy`. Tutte le chiamate sono
//! sincrone: il chiamante le esegue su un thread bloccante.

use crate::config::{CodecProfile, CompressionOptions, OversizePolicy};
use crate::error::{CompressError, Result};
use crate::file_manager::{FileDescriptor, FileKind};
use crate::image_processor::ImageCompressor;
use crate::optimizer::outcome::{CompressedFile, FileOutcome};
use crate::optimizer::path_resolver::PathResolver;
use crate::poster_extractor::PosterExtractor;
use crate::video_processor::VideoCompressor;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Per-file worker shared by every task of a run
pub struct TaskOptimizer {
    pub options: CompressionOptions,
    pub image_processor: ImageCompressor,
    pub video_processor: VideoCompressor,
    pub poster_extractor: PosterExtractor,
}

impl TaskOptimizer {
    pub fn new(options: CompressionOptions, profile: CodecProfile) -> Self {
        Self {
            options,
            image_processor: ImageCompressor::new(profile.clone()),
            poster_extractor: PosterExtractor::new(&profile),
            video_processor: VideoCompressor::new(profile),
        }
    }

    /// Compress one file into `dest` (the mirrored path, original extension)
    pub fn process(&self, descriptor: &FileDescriptor, dest: &Path) -> FileOutcome {
        debug!("Processing {} ({:?}) -> {}", descriptor.name, descriptor.kind, dest.display());

        let result = self
            .compress(descriptor, dest)
            .and_then(|(size, path)| self.apply_oversize_policy(descriptor, dest, size, path))
            .map(|(compressed_bytes, output_path)| CompressedFile {
                compressed_bytes,
                output_path,
            });

        if let Err(ref e) = result {
            warn!("Failed to compress {}: {}", descriptor.path.display(), e);
        }

        let poster = (descriptor.kind == FileKind::Video && self.options.generate_video_poster).then(|| {
            let poster_dest = PathResolver::poster_path(dest, &self.video_processor);
            let poster = self.poster_extractor.extract_poster(descriptor, &poster_dest);
            if let Err(ref e) = poster {
                warn!("Failed to extract poster for {}: {}", descriptor.path.display(), e);
            }
            poster
        });

        FileOutcome {
            descriptor: descriptor.clone(),
            original_bytes: descriptor.size,
            result,
            poster,
        }
    }

    /// Dispatch on the file kind
    fn compress(&self, descriptor: &FileDescriptor, dest: &Path) -> Result<(u64, PathBuf)> {
        match descriptor.kind {
            FileKind::Image => {
                self.image_processor
                    .compress(descriptor, dest, self.options.convert_images_to_webp)
            }
            FileKind::Video => self.video_processor.compress(descriptor, dest),
            FileKind::Other => copy_file(&descriptor.path, dest).map(|size| (size, dest.to_path_buf())),
        }
    }

    /// With `CopyOriginal`, replace an output larger than its source by a
    /// copy of the source at `dest`
    fn apply_oversize_policy(
        &self,
        descriptor: &FileDescriptor,
        dest: &Path,
        size: u64,
        output_path: PathBuf,
    ) -> Result<(u64, PathBuf)> {
        if self.options.oversize_policy == OversizePolicy::Keep
            || descriptor.kind == FileKind::Other
            || size <= descriptor.size
        {
            return Ok((size, output_path));
        }

        debug!(
            "{} grew from {} to {} bytes, keeping the original",
            descriptor.name, descriptor.size, size
        );
        let copied = copy_file(&descriptor.path, dest)?;
        if output_path != dest {
            fs::remove_file(&output_path).map_err(|e| CompressError::from_io(e, &output_path))?;
        }
        Ok((copied, dest.to_path_buf()))
    }
}

/// Byte-for-byte copy through a temp file next to `dest`
pub fn copy_file(source: &Path, dest: &Path) -> Result<u64> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| CompressError::from_io(e, parent))?;

    let mut reader = File::open(source).map_err(|e| CompressError::from_io(e, source))?;
    let mut temp = NamedTempFile::new_in(parent).map_err(|e| CompressError::from_io(e, parent))?;
    let copied = io::copy(&mut reader, temp.as_file_mut()).map_err(|e| CompressError::from_io(e, dest))?;
    temp.persist(dest)
        .map_err(|e| CompressError::from_io(e.error, dest))?;

    Ok(copied)
}
