//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per la comunicazione
//! con un'interfaccia esterna (una riga JSON per messaggio su stdout).
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch con numero di file
//! - `progress`: Un `ProgressEvent` per file completato
//! - `complete`: Risultato finale (batch o file singolo)
//! - `error`: Errore fatale (root inesistente, tipo non supportato, ...)

use crate::optimizer::outcome::{BatchResult, SingleResult};
use crate::progress::{ProgressEvent, ProgressReporter};
use serde::Serialize;
use std::path::PathBuf;

/// JSON message written to stdout
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage<'a> {
    Start {
        input: PathBuf,
        output: PathBuf,
        total_files: usize,
    },
    Progress(&'a ProgressEvent),
    Complete(&'a BatchResult),
    CompleteSingle(&'a SingleResult),
    Error {
        message: String,
        kind: Option<crate::error::ErrorKind>,
    },
}

impl JsonMessage<'_> {
    /// Serialize to a single JSON line
    pub fn to_line(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Emit the message on stdout
    pub fn emit(&self) {
        if let Some(line) = self.to_line() {
            println!("{}", line);
        }
    }
}

/// Reporter that prints one `progress` line per event
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter;

impl ProgressReporter for JsonReporter {
    fn report(&self, event: &ProgressEvent) {
        JsonMessage::Progress(event).emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_progress_line() {
        let event = ProgressEvent {
            file_name: "b.png".to_string(),
            completed_count: 2,
            total_count: 3,
            original_bytes: 500,
            compressed_bytes: 100,
            failed: false,
        };
        let line = JsonMessage::Progress(&event).to_line().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["fileName"], "b.png");
        assert_eq!(value["totalCount"], 3);
    }

    #[test]
    fn test_error_line() {
        let line = JsonMessage::Error {
            message: "Path not found: /x".to_string(),
            kind: Some(ErrorKind::NotFound),
        }
        .to_line()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["kind"], "not_found");
    }
}
