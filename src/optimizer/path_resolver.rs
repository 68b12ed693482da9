//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path di output e la preparazione della root
//! di output.
//!
//! - I path vengono rispecchiati relativamente alla root di input
//! - La root di output non può mai trovarsi dentro l'albero di input
//! - Nessun output di un batch può cadere dentro l'albero di input
//! - Due file che producono lo stesso output vengono disambiguati con
//!   l'estensione originale (`a.png` -> `a_png.webp`), nell'ordine di scan

use crate::config::{CompressionOptions, OversizePolicy};
use crate::error::{CompressError, Result};
use crate::file_manager::{FileDescriptor, FileKind};
use crate::poster_extractor::PosterExtractor;
use crate::video_processor::VideoCompressor;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Output path computations
pub struct PathResolver;

impl PathResolver {
    /// Rebase `descriptor` under `output_root`, keeping its path relative to
    /// `input_root`. The extension is left untouched.
    pub fn mirror(descriptor: &FileDescriptor, input_root: &Path, output_root: &Path) -> PathBuf {
        let relative = descriptor
            .path
            .strip_prefix(input_root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(descriptor.path.file_name().unwrap_or_default()));

        output_root.join(relative)
    }

    /// Final output path for `dest`, with the extension rewritten the way the
    /// compressor for `descriptor.kind` will rewrite it
    pub fn final_output_path(
        descriptor: &FileDescriptor,
        dest: &Path,
        options: &CompressionOptions,
        video: &VideoCompressor,
    ) -> PathBuf {
        match descriptor.kind {
            FileKind::Image if options.convert_images_to_webp => dest.with_extension("webp"),
            FileKind::Image => dest.with_extension(&descriptor.extension),
            FileKind::Other => dest.to_path_buf(),
            FileKind::Video => video.output_path_for(dest),
        }
    }

    /// Poster path for a video destined to `dest`
    pub fn poster_path(dest: &Path, video: &VideoCompressor) -> PathBuf {
        PosterExtractor::poster_path_for(&video.output_path_for(dest))
    }

    /// Every path a worker may write for `descriptor` destined to `dest`
    fn claims(
        descriptor: &FileDescriptor,
        dest: &Path,
        options: &CompressionOptions,
        video: &VideoCompressor,
    ) -> Vec<PathBuf> {
        let mut claims = vec![Self::final_output_path(descriptor, dest, options, video)];
        if descriptor.kind == FileKind::Video && options.generate_video_poster {
            claims.push(Self::poster_path(dest, video));
        }
        if options.oversize_policy == OversizePolicy::CopyOriginal && descriptor.kind != FileKind::Other {
            claims.push(dest.to_path_buf());
        }
        claims
    }

    /// `a.png` becomes `a_png.png`; a name without extension gets `_1`
    fn disambiguate(dest: &Path) -> PathBuf {
        let stem = dest.file_stem().unwrap_or_default().to_string_lossy();
        let name = match dest.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy();
                format!("{}_{}.{}", stem, ext.to_lowercase(), ext)
            }
            None => format!("{}_1", stem),
        };
        dest.with_file_name(name)
    }

    /// Mirrored destination of every descriptor, in order.
    ///
    /// A file whose outputs would land inside the input tree gets an error
    /// entry. When a file claims an output already taken by an earlier one it
    /// is renamed once with [`disambiguate`](Self::disambiguate); if that also
    /// collides, it gets an error entry. Error entries are never handed to a
    /// worker.
    pub fn plan_destinations(
        descriptors: &[FileDescriptor],
        input_dir: &Path,
        output_dir: &Path,
        options: &CompressionOptions,
        video: &VideoCompressor,
    ) -> Result<Vec<Result<PathBuf>>> {
        let input_abs = input_dir
            .canonicalize()
            .map_err(|e| CompressError::from_io(e, input_dir))?;
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let mut plan = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let absolute_claims = |dest: &Path| -> Result<Vec<PathBuf>> {
                Self::claims(descriptor, dest, options, video)
                    .iter()
                    .map(|p| Self::absolute(p))
                    .collect()
            };

            let mut dest = Self::mirror(descriptor, input_dir, output_dir);
            let mut outputs = absolute_claims(&dest)?;

            if let Some(inside) = outputs.iter().find(|p| p.starts_with(&input_abs)) {
                warn!("Output {} for {} is inside the input tree", inside.display(), descriptor.name);
                plan.push(Err(CompressError::Io(format!(
                    "output {} is inside the input tree {}",
                    inside.display(),
                    input_dir.display()
                ))));
                continue;
            }

            if outputs.iter().any(|p| claimed.contains(p)) {
                let renamed = Self::disambiguate(&dest);
                debug!("{} collides, writing it as {}", descriptor.name, renamed.display());
                outputs = absolute_claims(&renamed)?;
                dest = renamed;

                if let Some(taken) = outputs.iter().find(|p| claimed.contains(*p)) {
                    warn!("Output {} for {} is already taken", taken.display(), descriptor.name);
                    plan.push(Err(CompressError::Io(format!(
                        "output path collides with another file: {}",
                        taken.display()
                    ))));
                    continue;
                }
            }

            claimed.extend(outputs);
            plan.push(Ok(dest));
        }

        Ok(plan)
    }

    /// Validate and create the output root for a batch over `input_dir`
    pub fn prepare_output_root(input_dir: &Path, output_dir: &Path) -> Result<()> {
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(CompressError::Io(format!(
                "output path exists and is not a directory: {}",
                output_dir.display()
            )));
        }

        let input_abs = input_dir
            .canonicalize()
            .map_err(|e| CompressError::from_io(e, input_dir))?;
        let output_abs = Self::absolute(output_dir)?;
        debug!("Output root {} for input {}", output_abs.display(), input_abs.display());

        if output_abs.starts_with(&input_abs) {
            return Err(CompressError::Io(format!(
                "output directory {} is inside the input tree {}",
                output_dir.display(),
                input_dir.display()
            )));
        }

        Self::ensure_dir(output_dir)
    }

    /// Create `dir` (and parents) if absent
    pub fn ensure_dir(dir: &Path) -> Result<()> {
        if dir.exists() && !dir.is_dir() {
            return Err(CompressError::Io(format!(
                "output path exists and is not a directory: {}",
                dir.display()
            )));
        }
        fs::create_dir_all(dir).map_err(|e| {
            CompressError::Io(format!("cannot create output directory {}: {}", dir.display(), e))
        })
    }

    /// Fail if writing to `output` would overwrite `input`
    pub fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
        let input_abs = input.canonicalize().map_err(|e| CompressError::from_io(e, input))?;
        if Self::absolute(output)? == input_abs {
            return Err(CompressError::Io(format!(
                "output {} would overwrite its source",
                output.display()
            )));
        }
        Ok(())
    }

    /// Absolute form of `path`, resolving symlinks in the longest existing prefix
    fn absolute(path: &Path) -> Result<PathBuf> {
        let path = if path.is_relative() {
            std::env::current_dir()
                .map_err(|e| CompressError::Io(e.to_string()))?
                .join(path)
        } else {
            path.to_path_buf()
        };

        for ancestor in path.ancestors() {
            if let Ok(canonical) = ancestor.canonicalize() {
                let rest = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
                return Ok(canonical.join(rest));
            }
        }

        Ok(path)
    }
}
