//! # Optimizer Module
//!
//! Separa le responsabilità dell'orchestrazione in sottomoduli:
//! - `media_optimizer`: Orchestratore principale (batch e file singolo)
//! - `task_optimizer`: Worker per singoli file
//! - `progress_tracker`: Aggregatore unico degli eventi di progresso
//! - `path_resolver`: Logica di calcolo path centralizzata
//! - `outcome`: Risultati per file e loro aggregazione

pub mod media_optimizer;
pub mod outcome;
pub mod path_resolver;
pub mod progress_tracker;
pub mod task_optimizer;

pub use media_optimizer::{compress_file, compress_folder, compress_folder_quiet, MediaOptimizer};
pub use outcome::{BatchResult, CompressedFile, FileFailure, FileOutcome, SingleResult};
pub use path_resolver::PathResolver;
pub use progress_tracker::ProgressTracker;
pub use task_optimizer::TaskOptimizer;
