//! # Progress Tracking Module
//!
//! Aggregatore unico degli eventi di completamento: i worker inviano un
//! `Completion` su un canale limitato, il tracker assegna `completed_count`
//! e inoltra l'evento al sink esterno. Un solo chiamante del sink alla volta.

use crate::optimizer::outcome::FileOutcome;
use crate::progress::{ProgressEvent, ProgressReporter};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Message sent by a worker when its file is done
#[derive(Debug, Clone)]
pub struct Completion {
    pub file_name: String,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub failed: bool,
}

/// Failed files report zero for both sizes, matching the batch totals
impl From<&FileOutcome> for Completion {
    fn from(outcome: &FileOutcome) -> Self {
        match outcome.compressed_bytes() {
            Some(compressed_bytes) => Self {
                file_name: outcome.descriptor.name.clone(),
                original_bytes: outcome.original_bytes,
                compressed_bytes,
                failed: false,
            },
            None => Self {
                file_name: outcome.descriptor.name.clone(),
                original_bytes: 0,
                compressed_bytes: 0,
                failed: true,
            },
        }
    }
}

/// Turns completions into numbered progress events
pub struct ProgressTracker<'a> {
    total_files: usize,
    completed: AtomicUsize,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(total_files: usize, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            total_files,
            completed: AtomicUsize::new(0),
            reporter,
        }
    }

    /// Number the completion and forward it to the reporter
    pub fn record(&self, completion: Completion) -> ProgressEvent {
        let completed_count = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let event = ProgressEvent {
            file_name: completion.file_name,
            completed_count,
            total_count: self.total_files,
            original_bytes: completion.original_bytes,
            compressed_bytes: completion.compressed_bytes,
            failed: completion.failed,
        };
        self.reporter.report(&event);
        event
    }

    /// Consume completions until every sender is dropped
    pub async fn drain(&self, mut receiver: mpsc::Receiver<Completion>) {
        while let Some(completion) = receiver.recv().await {
            self.record(completion);
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompressError;
    use crate::file_manager::{FileDescriptor, FileKind};
    use crate::optimizer::outcome::CompressedFile;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn completion(name: &str, failed: bool) -> Completion {
        Completion {
            file_name: name.to_string(),
            original_bytes: 100,
            compressed_bytes: if failed { 0 } else { 40 },
            failed,
        }
    }

    #[tokio::test]
    async fn test_drain_numbers_events() {
        let seen = Mutex::new(Vec::new());
        let reporter = |e: &ProgressEvent| seen.lock().unwrap().push(e.clone());
        let tracker = ProgressTracker::new(3, &reporter);

        let (tx, rx) = mpsc::channel(1);
        let producer = tokio::spawn(async move {
            for (name, failed) in [("a", false), ("b", true), ("c", false)] {
                tx.send(completion(name, failed)).await.unwrap();
            }
        });

        tracker.drain(rx).await;
        producer.await.unwrap();

        let events = seen.lock().unwrap().clone();
        let counts: Vec<_> = events.iter().map(|e| e.completed_count).collect();
        assert_eq!(counts, vec![1, 2, 3]);
        assert!(events.iter().all(|e| e.total_count == 3));
        assert!(events[1].failed);
        assert_eq!(events[1].compressed_bytes, 0);
        assert_eq!(tracker.completed(), 3);
    }

    #[test]
    fn test_failed_completion_carries_zero_sizes() {
        let descriptor = FileDescriptor {
            path: PathBuf::from("/in/bad.png"),
            name: "bad.png".to_string(),
            size: 700,
            kind: FileKind::Image,
            extension: "png".to_string(),
        };

        let failed = FileOutcome::failed(descriptor.clone(), CompressError::Decode("corrupt".to_string()));
        let completion = Completion::from(&failed);
        assert!(completion.failed);
        assert_eq!((completion.original_bytes, completion.compressed_bytes), (0, 0));

        let ok = FileOutcome {
            descriptor,
            original_bytes: 700,
            result: Ok(CompressedFile {
                compressed_bytes: 300,
                output_path: PathBuf::from("/out/bad.webp"),
            }),
            poster: None,
        };
        let completion = Completion::from(&ok);
        assert!(!completion.failed);
        assert_eq!((completion.original_bytes, completion.compressed_bytes), (700, 300));
    }
}
