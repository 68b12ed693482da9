//! # Outcome Module
//!
//! Risultati per file (`FileOutcome`) e loro aggregazione in `BatchResult`
//! o `SingleResult`.
//!
//! ## Regole di aggregazione:
//! - `file_count` conta i file tentati, non solo quelli riusciti
//! - I file falliti sono esclusi dai totali ma inclusi in `failures`
//! - Un poster fallito non invalida il video, e viceversa

use crate::error::{CompressError, ErrorKind};
use crate::file_manager::{FileDescriptor, FileManager};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Successful compression of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedFile {
    pub compressed_bytes: u64,
    pub output_path: PathBuf,
}

/// Per-file result of a compression attempt
#[derive(Debug)]
pub struct FileOutcome {
    pub descriptor: FileDescriptor,
    pub original_bytes: u64,
    pub result: Result<CompressedFile, CompressError>,
    /// `None` when no poster was requested for this file
    pub poster: Option<Result<PathBuf, CompressError>>,
}

impl FileOutcome {
    pub fn failed(descriptor: FileDescriptor, error: CompressError) -> Self {
        Self {
            original_bytes: descriptor.size,
            descriptor,
            result: Err(error),
            poster: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn compressed_bytes(&self) -> Option<u64> {
        self.result.as_ref().ok().map(|c| c.compressed_bytes)
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.result.as_ref().ok().map(|c| c.output_path.as_path())
    }

    pub fn poster_path(&self) -> Option<&Path> {
        match &self.poster {
            Some(Ok(path)) => Some(path.as_path()),
            _ => None,
        }
    }
}

/// A file that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, error: &CompressError) -> Self {
        Self {
            path: path.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Aggregate result of a folder compression
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub total_original_bytes: u64,
    pub total_compressed_bytes: u64,
    /// Files attempted, successful or not
    pub file_count: usize,
    pub output_root_path: PathBuf,
    pub failures: Vec<FileFailure>,
    /// Posters that failed for videos that may have succeeded
    pub poster_failures: Vec<FileFailure>,
    pub posters: Vec<PathBuf>,
    /// Entries the scanner could not read; not counted in `file_count`
    pub skipped: Vec<FileFailure>,
}

impl BatchResult {
    /// Empty result for a batch with no files
    pub fn empty(output_root_path: PathBuf) -> Self {
        Self {
            output_root_path,
            ..Default::default()
        }
    }

    /// Reduce per-file outcomes into the batch totals
    pub fn from_outcomes(
        outcomes: Vec<FileOutcome>,
        output_root_path: PathBuf,
        skipped: Vec<(PathBuf, ErrorKind)>,
    ) -> Self {
        let mut result = Self::empty(output_root_path);
        result.file_count = outcomes.len();
        result.skipped = skipped
            .into_iter()
            .map(|(path, kind)| FileFailure {
                message: format!("skipped during scan ({})", kind),
                path,
                kind,
            })
            .collect();

        for outcome in outcomes {
            match &outcome.result {
                Ok(compressed) => {
                    result.total_original_bytes += outcome.original_bytes;
                    result.total_compressed_bytes += compressed.compressed_bytes;
                }
                Err(e) => result.failures.push(FileFailure::new(&outcome.descriptor.path, e)),
            }

            match outcome.poster {
                Some(Ok(path)) => result.posters.push(path),
                Some(Err(e)) => result
                    .poster_failures
                    .push(FileFailure::new(&outcome.descriptor.path, &e)),
                None => {}
            }
        }

        // Completion order is unspecified; keep the report stable
        result.failures.sort_by(|a, b| a.path.cmp(&b.path));
        result.poster_failures.sort_by(|a, b| a.path.cmp(&b.path));
        result.posters.sort();

        result
    }

    pub fn succeeded(&self) -> usize {
        self.file_count - self.failures.len()
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Succeeded: {} | Failed: {} | {} -> {} ({:.2}% saved)",
            self.file_count,
            self.succeeded(),
            self.failures.len(),
            FileManager::format_size(self.total_original_bytes),
            FileManager::format_size(self.total_compressed_bytes),
            FileManager::calculate_reduction(self.total_original_bytes, self.total_compressed_bytes)
        )
    }
}

/// Result of a single-file compression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleResult {
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub output_path: PathBuf,
    pub poster_path: Option<PathBuf>,
}

impl TryFrom<FileOutcome> for SingleResult {
    type Error = CompressError;

    fn try_from(outcome: FileOutcome) -> Result<Self, Self::Error> {
        let poster_path = outcome.poster_path().map(Path::to_path_buf);
        let compressed = outcome.result?;
        Ok(Self {
            original_bytes: outcome.original_bytes,
            compressed_bytes: compressed.compressed_bytes,
            output_path: compressed.output_path,
            poster_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_manager::FileKind;

    fn descriptor(name: &str, size: u64, kind: FileKind) -> FileDescriptor {
        FileDescriptor {
            path: PathBuf::from("/in").join(name),
            name: name.to_string(),
            size,
            kind,
            extension: name.rsplit('.').next().unwrap_or("").to_string(),
        }
    }

    fn success(name: &str, size: u64, compressed: u64) -> FileOutcome {
        FileOutcome {
            descriptor: descriptor(name, size, FileKind::Image),
            original_bytes: size,
            result: Ok(CompressedFile {
                compressed_bytes: compressed,
                output_path: PathBuf::from("/out").join(name),
            }),
            poster: None,
        }
    }

    #[test]
    fn test_failures_excluded_from_totals() {
        let outcomes = vec![
            success("a.jpg", 2_000, 500),
            FileOutcome::failed(
                descriptor("bad.png", 700, FileKind::Image),
                CompressError::Decode("corrupt".to_string()),
            ),
            success("b.png", 1_000, 400),
        ];

        let result = BatchResult::from_outcomes(outcomes, PathBuf::from("/out"), Vec::new());
        assert_eq!(result.file_count, 3);
        assert_eq!(result.total_original_bytes, 3_000);
        assert_eq!(result.total_compressed_bytes, 900);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].kind, ErrorKind::Decode);
        assert_eq!(result.succeeded(), 2);
    }

    #[test]
    fn test_poster_failure_is_independent() {
        let mut video = success("c.mp4", 10_000, 4_000);
        video.descriptor.kind = FileKind::Video;
        video.poster = Some(Err(CompressError::Decode("no frames".to_string())));

        let result = BatchResult::from_outcomes(vec![video], PathBuf::from("/out"), Vec::new());
        assert!(result.failures.is_empty());
        assert_eq!(result.poster_failures.len(), 1);
        assert_eq!(result.total_compressed_bytes, 4_000);
    }

    #[test]
    fn test_skipped_entries_reported_separately() {
        let skipped = vec![(PathBuf::from("/in/locked"), ErrorKind::Permission)];
        let result = BatchResult::from_outcomes(Vec::new(), PathBuf::from("/out"), skipped);
        assert_eq!(result.file_count, 0);
        assert!(result.failures.is_empty());
        assert_eq!(result.skipped[0].kind, ErrorKind::Permission);
    }

    #[test]
    fn test_single_result_propagates_error() {
        let failed = FileOutcome::failed(
            descriptor("x.jpg", 0, FileKind::Image),
            CompressError::Decode("empty".to_string()),
        );
        let err = SingleResult::try_from(failed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let mut ok = success("y.mp4", 10, 5);
        ok.poster = Some(Ok(PathBuf::from("/out/y-poster.webp")));
        let single = SingleResult::try_from(ok).unwrap();
        assert_eq!(single.compressed_bytes, 5);
        assert_eq!(single.poster_path, Some(PathBuf::from("/out/y-poster.webp")));
    }

    #[test]
    fn test_summary_format() {
        let result = BatchResult::from_outcomes(vec![success("a.jpg", 2048, 1024)], PathBuf::from("/out"), Vec::new());
        assert_eq!(
            result.format_summary(),
            "Processed: 1 files | Succeeded: 1 | Failed: 0 | 2.00 KB -> 1.00 KB (50.00% saved)"
        );
    }
}
