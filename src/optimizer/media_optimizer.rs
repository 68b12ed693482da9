//! # Media Optimizer Main Orchestrator
//!
//! Orchestratore principale: scansiona la cartella di input, distribuisce
//! i file su un pool limitato di worker e aggrega i risultati.
//!
//! ## Concorrenza:
//! - Un semaforo generale limita i worker attivi a `pool_size()`
//! - I video prendono anche un permesso dal semaforo video (`VIDEO_SLOTS`)
//! - I permessi vengono acquisiti dentro il task, mai dal loop di spawn
//! - Gli eventi di progresso passano per un canale limitato verso un
//!   unico aggregatore che gira nel future chiamante

use crate::{
    config::{
        pool_size, CodecProfile, CompressionOptions, OversizePolicy, PROGRESS_CHANNEL_CAPACITY, VIDEO_SLOTS,
    },
    error::{CompressError, Result},
    file_manager::{FileDescriptor, FileKind, FileManager},
    optimizer::{
        outcome::{BatchResult, FileOutcome, SingleResult},
        path_resolver::PathResolver,
        progress_tracker::{Completion, ProgressTracker},
        task_optimizer::TaskOptimizer,
    },
    progress::{NoopReporter, ProgressReporter},
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info};

/// Worker slots shared by every task of a batch
#[derive(Clone)]
struct ConcurrencyManager {
    /// General pool (every file takes one permit)
    pool: Arc<Semaphore>,
    /// Videos also hold one of these while ffmpeg runs
    video: Arc<Semaphore>,
}

impl ConcurrencyManager {
    fn new(workers: usize, video_slots: usize) -> Self {
        debug!("Concurrency: {} workers, {} video slots", workers, video_slots);

        Self {
            pool: Arc::new(Semaphore::new(workers.max(1))),
            video: Arc::new(Semaphore::new(video_slots.max(1))),
        }
    }

    /// Acquire the permits for a file of `kind`; video slot first, then pool
    async fn acquire(&self, kind: FileKind) -> std::result::Result<ConcurrencyPermits, AcquireError> {
        if kind == FileKind::Video {
            let video = self.video.clone().acquire_owned().await?;
            let pool = self.pool.clone().acquire_owned().await?;
            return Ok(ConcurrencyPermits {
                _pool: pool,
                _video: Some(video),
            });
        }

        let pool = self.pool.clone().acquire_owned().await?;
        Ok(ConcurrencyPermits {
            _pool: pool,
            _video: None,
        })
    }
}

/// Held for the lifetime of one unit of work
struct ConcurrencyPermits {
    _pool: OwnedSemaphorePermit,
    _video: Option<OwnedSemaphorePermit>,
}

/// Batch and single-file orchestrator
#[derive(Debug, Clone)]
pub struct MediaOptimizer {
    profile: CodecProfile,
    workers: usize,
    video_slots: usize,
}

impl Default for MediaOptimizer {
    fn default() -> Self {
        Self::new(CodecProfile::default())
    }
}

impl MediaOptimizer {
    pub fn new(profile: CodecProfile) -> Self {
        Self {
            profile,
            workers: pool_size(),
            video_slots: VIDEO_SLOTS,
        }
    }

    #[cfg(test)]
    fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Compress every file under `input_dir` into a mirrored tree at `output_dir`.
    ///
    /// Per-file failures are collected in the result; only a missing or
    /// unreadable root and an unusable output directory abort the batch.
    pub async fn compress_folder(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        options: CompressionOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchResult> {
        self.profile.validate()?;

        let scan = FileManager::scan(input_dir)?;
        PathResolver::prepare_output_root(input_dir, output_dir)?;

        let output_root = output_dir.to_path_buf();
        if scan.descriptors.is_empty() {
            info!("No files found in {}", input_dir.display());
            return Ok(BatchResult::from_outcomes(Vec::new(), output_root, scan.skipped));
        }

        info!(
            "Compressing {} files ({}) from {} into {}",
            scan.descriptors.len(),
            FileManager::format_size(scan.total_size()),
            input_dir.display(),
            output_dir.display()
        );

        let worker = Arc::new(TaskOptimizer::new(options, self.profile.clone()));
        let plan = PathResolver::plan_destinations(
            &scan.descriptors,
            input_dir,
            output_dir,
            &options,
            &worker.video_processor,
        )?;
        let jobs = scan.descriptors.into_iter().zip(plan).collect();

        let work = move |descriptor: &FileDescriptor, dest: &Path| worker.process(descriptor, dest);
        let outcomes = self.run_batch(jobs, Arc::new(work), reporter).await;

        let result = BatchResult::from_outcomes(outcomes, output_root, scan.skipped);
        info!("{}", result.format_summary());

        Ok(result)
    }

    /// Run `work` over every job on the bounded pool and collect one outcome
    /// per job, in job order. Jobs whose destination is an error fail without
    /// taking a slot. Every job reports exactly one progress event.
    async fn run_batch<F>(
        &self,
        jobs: Vec<(FileDescriptor, Result<PathBuf>)>,
        work: Arc<F>,
        reporter: &dyn ProgressReporter,
    ) -> Vec<FileOutcome>
    where
        F: Fn(&FileDescriptor, &Path) -> FileOutcome + Send + Sync + 'static,
    {
        let tracker = ProgressTracker::new(jobs.len(), reporter);
        let concurrency = ConcurrencyManager::new(self.workers, self.video_slots);
        let (tx, rx) = mpsc::channel::<Completion>(PROGRESS_CHANNEL_CAPACITY);

        let (descriptors, handles): (Vec<_>, Vec<_>) = jobs
            .into_iter()
            .map(|(descriptor, dest)| {
                let handle = tokio::spawn(run_task(
                    descriptor.clone(),
                    dest,
                    Arc::clone(&work),
                    concurrency.clone(),
                    tx.clone(),
                ));
                (descriptor, handle)
            })
            .unzip();

        // The aggregator stops once every task has dropped its sender
        drop(tx);
        tracker.drain(rx).await;

        join_all(handles)
            .await
            .into_iter()
            .zip(descriptors)
            .map(|(joined, descriptor)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Worker for {} aborted: {}", descriptor.path.display(), e);
                    let outcome = FileOutcome::failed(descriptor, CompressError::Worker(e.to_string()));
                    tracker.record(Completion::from(&outcome));
                    outcome
                }
            })
            .collect()
    }

    /// Compress one file into `output_dir/<file name>` (extension rewritten
    /// per kind). Any failure is returned as the error.
    pub async fn compress_file(
        &self,
        input_path: &Path,
        output_dir: &Path,
        options: CompressionOptions,
    ) -> Result<SingleResult> {
        self.profile.validate()?;

        let descriptor = FileManager::describe_file(input_path)?;
        PathResolver::ensure_dir(output_dir)?;

        let dest = output_dir.join(input_path.file_name().unwrap_or_default());
        let worker = TaskOptimizer::new(options, self.profile.clone());
        let final_path = PathResolver::final_output_path(&descriptor, &dest, &options, &worker.video_processor);
        PathResolver::ensure_distinct(input_path, &final_path)?;
        if options.oversize_policy == OversizePolicy::CopyOriginal {
            PathResolver::ensure_distinct(input_path, &dest)?;
        }

        debug!("Compressing {} into {}", input_path.display(), final_path.display());

        let outcome = tokio::task::spawn_blocking(move || worker.process(&descriptor, &dest))
            .await
            .map_err(|e| CompressError::Worker(e.to_string()))?;

        if let Some(Err(e)) = &outcome.poster {
            error!("Poster extraction failed for {}: {}", input_path.display(), e);
        }

        let single = SingleResult::try_from(outcome)?;
        info!(
            "{} -> {} ({:.1}% saved)",
            FileManager::format_size(single.original_bytes),
            FileManager::format_size(single.compressed_bytes),
            FileManager::calculate_reduction(single.original_bytes, single.compressed_bytes)
        );

        Ok(single)
    }
}

/// One unit of work: wait for a slot, compress on a blocking thread, report
async fn run_task<F>(
    descriptor: FileDescriptor,
    dest: Result<PathBuf>,
    work: Arc<F>,
    concurrency: ConcurrencyManager,
    progress: mpsc::Sender<Completion>,
) -> FileOutcome
where
    F: Fn(&FileDescriptor, &Path) -> FileOutcome + Send + Sync + 'static,
{
    let dest = match dest {
        Ok(dest) => dest,
        Err(e) => {
            let outcome = FileOutcome::failed(descriptor, e);
            let _ = progress.send(Completion::from(&outcome)).await;
            return outcome;
        }
    };

    let outcome = match concurrency.acquire(descriptor.kind).await {
        Ok(permits) => {
            let job = descriptor.clone();
            let joined = tokio::task::spawn_blocking(move || (*work)(&job, &dest)).await;
            drop(permits);

            match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Worker for {} panicked: {}", descriptor.path.display(), e);
                    FileOutcome::failed(descriptor, CompressError::Worker(e.to_string()))
                }
            }
        }
        Err(e) => FileOutcome::failed(descriptor, CompressError::Worker(e.to_string())),
    };

    // The receiver lives until every sender is gone
    let _ = progress.send(Completion::from(&outcome)).await;
    outcome
}

/// Compress a folder with the default profile and pool
pub async fn compress_folder(
    input_dir: &Path,
    output_dir: &Path,
    options: CompressionOptions,
    reporter: &dyn ProgressReporter,
) -> Result<BatchResult> {
    MediaOptimizer::default()
        .compress_folder(input_dir, output_dir, options, reporter)
        .await
}

/// Compress one file with the default profile
pub async fn compress_file(
    input_path: &Path,
    output_dir: &Path,
    options: CompressionOptions,
) -> Result<SingleResult> {
    MediaOptimizer::default()
        .compress_file(input_path, output_dir, options)
        .await
}

/// Compress a folder without progress reporting
pub async fn compress_folder_quiet(
    input_dir: &Path,
    output_dir: &Path,
    options: CompressionOptions,
) -> Result<BatchResult> {
    compress_folder(input_dir, output_dir, options, &NoopReporter).await
}
