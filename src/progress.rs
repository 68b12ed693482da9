//! # Progress Reporting Module
//!
//! Questo modulo definisce gli eventi di progresso e i sink che li ricevono.
//!
//! ## Responsabilità:
//! - `ProgressEvent`: un evento per ogni file completato (successo o errore)
//! - `ProgressReporter`: interfaccia del sink esterno
//! - `ConsoleReporter`: progress bar visuale con `indicatif`
//! - `NoopReporter` e closure come sink minimali
//!
//! ## Garanzie di consegna:
//! - Esattamente un evento per file tentato
//! - `completed_count` strettamente crescente, da 1 a `total_count`
//! - L'ordine dei file NON corrisponde all'ordine di scansione
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 150/150 (100%) [OK] photo.jpg: 45.2% saved
//! ```

use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One finished unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub file_name: String,
    /// 1-based, strictly increasing across a batch
    pub completed_count: usize,
    pub total_count: usize,
    /// Zero for failed files, like `compressed_bytes`
    pub original_bytes: u64,
    /// Zero for failed files
    pub compressed_bytes: u64,
    pub failed: bool,
}

/// Sink for progress events
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Progress bar on stderr
#[derive(Clone)]
pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Status line shown next to the bar for `event`
    pub fn describe(event: &ProgressEvent) -> String {
        if event.failed {
            format!("[ERROR] {}", event.file_name)
        } else {
            format!(
                "[OK] {}: {:.1}% saved",
                event.file_name,
                FileManager::calculate_reduction(event.original_bytes, event.compressed_bytes)
            )
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: &ProgressEvent) {
        self.bar.set_length(event.total_count as u64);
        self.bar.set_position(event.completed_count as u64);
        self.bar.set_message(Self::describe(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn event(failed: bool) -> ProgressEvent {
        ProgressEvent {
            file_name: "a.jpg".to_string(),
            completed_count: 1,
            total_count: 2,
            original_bytes: 200,
            compressed_bytes: if failed { 0 } else { 50 },
            failed,
        }
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Mutex::new(Vec::new());
        let reporter = |e: &ProgressEvent| seen.lock().unwrap().push(e.completed_count);
        reporter.report(&event(false));
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_console_messages() {
        assert_eq!(ConsoleReporter::describe(&event(false)), "[OK] a.jpg: 75.0% saved");
        assert_eq!(ConsoleReporter::describe(&event(true)), "[ERROR] a.jpg");
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(event(false)).unwrap();
        assert_eq!(json["fileName"], "a.jpg");
        assert_eq!(json["completedCount"], 1);
        assert_eq!(json["compressedBytes"], 50);
    }
}
