//! # Image Processing Module
//!
//! Questo modulo ricodifica una singola immagine, opzionalmente convertendola in WebP.
//!
//! ## Pipeline di compressione
//!
//! 1. **Lettura**: Il sorgente viene letto in sola lettura, mai modificato
//! 2. **Decodifica**: Formato rilevato dal contenuto (magic bytes), non dall'estensione
//! 3. **Normalizzazione**: Pixel convertiti in RGB8 o RGBA8 (se c'è trasparenza)
//! 4. **Codifica**: In un file temporaneo nella directory di destinazione
//! 5. **Persistenza**: Rename atomico sul path finale
//!
//! ## Profili di codifica
//!
//! | Formato output | Encoder | Parametri |
//! |----------------|---------|-----------|
//! | WebP           | libwebp lossy | qualità `CodecProfile::webp_quality` |
//! | JPEG           | baseline | qualità `CodecProfile::jpeg_quality` |
//! | PNG            | deflate | `Best` + filtro adattivo |
//! | GIF / BMP      | default | - |
//!
//! ## Error Handling
//!
//! - **Dati corrotti o file vuoto**: `Decode`
//! - **Encoder che rifiuta i pixel**: `UnsupportedCodec`
//! - **Scrittura fallita**: `Io`, nessun file parziale sul path finale
//!
//! ## Esempio
//!
//! ```rust,ignore
//! let compressor = ImageCompressor::new(CodecProfile::default());
//! let (size, path) = compressor.compress(&descriptor, &dest, true)?;
//! ```

use crate::config::CodecProfile;
use crate::error::{CompressError, Result};
use crate::file_manager::FileDescriptor;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Re-encodes single images in-process
#[derive(Debug, Clone)]
pub struct ImageCompressor {
    profile: CodecProfile,
}

impl ImageCompressor {
    pub fn new(profile: CodecProfile) -> Self {
        Self { profile }
    }

    /// Compress `descriptor` into `dest_path`.
    ///
    /// With `to_webp` the extension of `dest_path` is rewritten to `.webp`,
    /// otherwise the image is re-encoded in its original format under the
    /// lower-cased extension. Returns the
    /// size of the written file and its final path.
    pub fn compress(
        &self,
        descriptor: &FileDescriptor,
        dest_path: &Path,
        to_webp: bool,
    ) -> Result<(u64, PathBuf)> {
        let output_path = if to_webp {
            dest_path.with_extension("webp")
        } else {
            dest_path.with_extension(&descriptor.extension)
        };

        let target = if to_webp {
            ImageFormat::WebP
        } else {
            ImageFormat::from_extension(&descriptor.extension).ok_or_else(|| {
                CompressError::UnsupportedCodec(format!("no encoder for .{}", descriptor.extension))
            })?
        };

        let img = Self::decode(&descriptor.path)?;
        debug!(
            "Decoded {} ({}x{}), encoding as {:?}",
            descriptor.name,
            img.width(),
            img.height(),
            target
        );

        let size = write_atomically(&output_path, |writer| self.encode(&img, target, writer))?;
        Ok((size, output_path))
    }

    /// Decode an image from disk, detecting the format from its content
    pub fn decode(path: &Path) -> Result<DynamicImage> {
        let bytes = fs::read(path).map_err(|e| CompressError::from_io(e, path))?;
        if bytes.is_empty() {
            return Err(CompressError::Decode(format!("{} is empty", path.display())));
        }
        image::load_from_memory(&bytes)
            .map_err(|e| CompressError::Decode(format!("{}: {}", path.display(), e)))
    }

    /// Encode `img` as `format` with the fixed profile
    fn encode<W: Write + std::io::Seek>(
        &self,
        img: &DynamicImage,
        format: ImageFormat,
        writer: &mut W,
    ) -> Result<()> {
        let img = normalize(img);

        match format {
            ImageFormat::WebP => {
                let bytes = encode_webp(&img, self.profile.webp_quality)?;
                writer.write_all(&bytes).map_err(|e| CompressError::Io(e.to_string()))?;
            }
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, self.profile.jpeg_quality))?
            }
            ImageFormat::Png => img.write_with_encoder(PngEncoder::new_with_quality(
                writer,
                CompressionType::Best,
                FilterType::Adaptive,
            ))?,
            other => img.write_to(writer, other)?,
        }

        Ok(())
    }
}

/// Convert to 8-bit RGB, or RGBA when the source has transparency
fn normalize(img: &DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Lossy WebP bytes for `img` at `quality` (1-100)
fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let img = normalize(img);
    let encoder = webp::Encoder::from_image(&img)
        .map_err(|e| CompressError::UnsupportedCodec(format!("webp: {}", e)))?;
    Ok(encoder.encode(f32::from(quality)).to_vec())
}

/// Encode an already decoded image as lossy WebP at `output_path`
pub fn write_webp(img: &DynamicImage, output_path: &Path, quality: u8) -> Result<u64> {
    write_atomically(output_path, |writer| {
        let bytes = encode_webp(img, quality)?;
        writer
            .write_all(&bytes)
            .map_err(|e| CompressError::from_io(e, output_path))
    })
}

/// Run `encode` against a temp file next to `output_path`, then rename it
/// into place. Returns the size of the persisted file.
fn write_atomically<F>(output_path: &Path, encode: F) -> Result<u64>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let parent = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| CompressError::from_io(e, parent))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| CompressError::from_io(e, parent))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        encode(&mut writer)?;
        writer
            .flush()
            .map_err(|e| CompressError::from_io(e, output_path))?;
    }
    temp.persist(output_path)
        .map_err(|e| CompressError::from_io(e.error, output_path))?;

    Ok(fs::metadata(output_path)
        .map_err(|e| CompressError::from_io(e, output_path))?
        .len())
}
