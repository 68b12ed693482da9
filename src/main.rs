//! # Media Compress - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Scelta del sink di progresso (barra visuale o JSON)
//! - Avvio della compressione di una cartella o di un file singolo
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-compress compress /path/to/photos -o /path/to/out --poster --verbose
//! media-compress scan /path/to/photos --json
//! media-compress check-ffmpeg
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use media_compress::json_output::{JsonMessage, JsonReporter};
use media_compress::{
    compress_file, compress_folder, ffmpeg_status, scan_folder, CompressError, CompressionOptions, ConsoleReporter,
    FileManager, OversizePolicy,
};

#[derive(Parser)]
#[command(name = "media-compress")]
#[command(about = "Compress images and videos into a mirrored output tree")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the files that would be processed
    Scan {
        /// Folder to scan
        path: PathBuf,

        /// Print one JSON document instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Compress a folder or a single file
    Compress(CompressArgs),
    /// Report whether ffmpeg is available
    CheckFfmpeg,
}

#[derive(Args)]
struct CompressArgs {
    /// Folder or file to compress
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Keep original image formats instead of converting to WebP
    #[arg(long)]
    no_webp: bool,

    /// Extract a WebP poster from the first frame of each video
    #[arg(long)]
    poster: bool,

    /// Replace outputs larger than their source with a copy of the source
    #[arg(long)]
    copy_if_larger: bool,

    /// Emit JSON lines on stdout
    #[arg(long)]
    json: bool,
}

impl CompressArgs {
    fn options(&self) -> CompressionOptions {
        CompressionOptions {
            convert_images_to_webp: !self.no_webp,
            generate_video_poster: self.poster,
            oversize_policy: if self.copy_if_larger {
                OversizePolicy::CopyOriginal
            } else {
                OversizePolicy::Keep
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs on stderr so that stdout stays parseable in JSON mode
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Scan { path, json } => scan(path, json),
        Command::Compress(args) => compress(args).await,
        Command::CheckFfmpeg => {
            let status = ffmpeg_status();
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
    }
}

fn scan(path: PathBuf, json: bool) -> Result<()> {
    let report = FileManager::scan(&path)?;
    for (skipped, kind) in &report.skipped {
        warn!("Skipped {} ({})", skipped.display(), kind);
    }
    let files = report.descriptors;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    for file in &files {
        println!("{:<7} {:>12}  {}", format!("{:?}", file.kind), FileManager::format_size(file.size), file.name);
    }
    info!(
        "{} files, {}",
        files.len(),
        FileManager::format_size(files.iter().map(|f| f.size).sum())
    );

    Ok(())
}

async fn compress(args: CompressArgs) -> Result<()> {
    let options = args.options();

    let outcome = if args.input.is_dir() {
        compress_dir(&args, options).await
    } else {
        compress_single(&args, options).await
    };

    if let Err(ref e) = outcome {
        if args.json {
            JsonMessage::Error {
                message: e.to_string(),
                kind: Some(e.kind()),
            }
            .emit();
        }
    }

    Ok(outcome?)
}

async fn compress_dir(args: &CompressArgs, options: CompressionOptions) -> Result<(), CompressError> {
    let total_files = scan_folder(&args.input)?.len();

    if args.json {
        JsonMessage::Start {
            input: args.input.clone(),
            output: args.output.clone(),
            total_files,
        }
        .emit();

        let result = compress_folder(&args.input, &args.output, options, &JsonReporter).await?;
        JsonMessage::Complete(&result).emit();
        return Ok(());
    }

    info!("Compressing {} into {}", args.input.display(), args.output.display());
    let reporter = ConsoleReporter::new(total_files as u64);
    let result = compress_folder(&args.input, &args.output, options, &reporter).await?;
    reporter.finish(&result.format_summary());

    for failure in &result.failures {
        info!("[ERROR] {} ({}): {}", failure.path.display(), failure.kind, failure.message);
    }
    for failure in &result.poster_failures {
        info!("[POSTER] {} ({}): {}", failure.path.display(), failure.kind, failure.message);
    }
    info!("Output written to {}", result.output_root_path.display());

    Ok(())
}

async fn compress_single(args: &CompressArgs, options: CompressionOptions) -> Result<(), CompressError> {
    let result = compress_file(&args.input, &args.output, options).await?;

    if args.json {
        JsonMessage::CompleteSingle(&result).emit();
    } else {
        info!(
            "{} -> {}: {} -> {} ({:.1}% saved)",
            args.input.display(),
            result.output_path.display(),
            FileManager::format_size(result.original_bytes),
            FileManager::format_size(result.compressed_bytes),
            FileManager::calculate_reduction(result.original_bytes, result.compressed_bytes)
        );
        if let Some(poster) = &result.poster_path {
            info!("Poster: {}", poster.display());
        }
    }

    Ok(())
}
