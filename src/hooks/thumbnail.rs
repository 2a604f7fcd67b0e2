use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{RecordError, Result};
use crate::media::{split_name, MediaRoot, THUMBNAIL_DIR};
use crate::signals::{Reaction, Receiver, Signal};
use crate::state::data::{ImageRecord, ThumbnailSlot};

/// Output dimensions for an image of `width`x`height` fitted inside
/// `max_width`x`max_height`, keeping the aspect ratio.
///
/// Never upscales: an image already inside the box keeps its size.
/// Each side is at least 1 pixel.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let ratio = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let scaled = |side: u32, max: u32| ((side as f64 * ratio).round() as u32).clamp(1, max);

    (scaled(width, max_width), scaled(height, max_height))
}

/// Reference of a variant: `thumbnails/<basename>_<w>x<h><ext>`
pub fn thumbnail_name(original: &str, slot: ThumbnailSlot) -> String {
    let file_name = Path::new(original)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let (stem, ext) = split_name(&file_name);
    let (width, height) = slot.bounds();
    format!("{}/{}_{}x{}{}", THUMBNAIL_DIR, stem, width, height, ext)
}

/// One encoded variant waiting to be written
struct Rendered {
    slot: ThumbnailSlot,
    reference: String,
    bytes: Vec<u8>,
}

/// Generates the small, medium and large thumbnails of a newly created image.
///
/// All-or-nothing: if decoding, encoding or any write fails, files already
/// written for the record are removed and no thumbnail field is set.
#[derive(Debug, Clone)]
pub struct DerivedAssetGenerator {
    media: MediaRoot,
}

impl DerivedAssetGenerator {
    pub fn new(media: MediaRoot) -> Self {
        Self { media }
    }

    /// Render, store and attach all three variants to `record`
    pub fn generate(&self, record: &mut ImageRecord) -> Result<()> {
        let source_path = self.media.path(&record.original_image);
        let (original, format) = decode_original(&source_path)?;
        debug!(
            "Decoded {} ({}x{}, {:?})",
            source_path.display(),
            original.width(),
            original.height(),
            format
        );

        // Encode everything before touching storage
        let rendered = ThumbnailSlot::ALL
            .iter()
            .map(|slot| render(&original, format, &record.original_image, *slot, &self.media))
            .collect::<Result<Vec<_>>>()?;

        self.media.ensure_dir(THUMBNAIL_DIR)?;

        let mut written: Vec<&str> = Vec::with_capacity(rendered.len());
        for variant in &rendered {
            if let Err(e) = self.media.write(&variant.reference, &variant.bytes) {
                self.discard(&written);
                return Err(e);
            }
            written.push(&variant.reference);
        }

        for variant in rendered {
            record.set_thumbnail(variant.slot, variant.reference);
        }

        info!(
            "📸 Generated {} thumbnails for {}",
            ThumbnailSlot::ALL.len(),
            record.original_image
        );
        Ok(())
    }

    /// Best-effort removal of the variants written before a failure
    fn discard(&self, written: &[&str]) {
        for reference in written {
            if let Err(e) = self.media.remove(reference) {
                warn!("⚠️  Could not remove partial thumbnail {}: {}", reference, e);
            }
        }
    }
}

impl Receiver<ImageRecord> for DerivedAssetGenerator {
    fn name(&self) -> &'static str {
        "derived_asset_generator"
    }

    fn receive(&self, signal: &mut Signal<'_, ImageRecord>) -> Result<Reaction> {
        let Signal::PostSave { instance, created: true } = signal else {
            return Ok(Reaction::Unchanged);
        };
        if !instance.has_no_thumbnails() {
            return Ok(Reaction::Unchanged);
        }

        self.generate(instance)?;
        Ok(Reaction::Modified)
    }
}

/// Read and decode the original, keeping its format for re-encoding
fn decode_original(path: &Path) -> Result<(DynamicImage, ImageFormat)> {
    let decode_error = |reason: String| RecordError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = fs::read(path).map_err(|e| decode_error(e.to_string()))?;
    let format = image::guess_format(&bytes).map_err(|e| decode_error(e.to_string()))?;
    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| decode_error(e.to_string()))?;

    Ok((img, format))
}

/// Resize and encode one variant in memory
fn render(
    original: &DynamicImage,
    format: ImageFormat,
    original_name: &str,
    slot: ThumbnailSlot,
    media: &MediaRoot,
) -> Result<Rendered> {
    let (max_width, max_height) = slot.bounds();
    let (width, height) = fit_within(original.width(), original.height(), max_width, max_height);

    let resized = if (width, height) == (original.width(), original.height()) {
        original.clone()
    } else {
        original.resize_exact(width, height, FilterType::Lanczos3)
    };

    let reference = thumbnail_name(original_name, slot);
    let mut bytes = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut bytes), format)
        .map_err(|source| RecordError::Encode {
            path: media.path(&reference),
            source,
        })?;

    Ok(Rendered {
        slot,
        reference,
        bytes,
    })
}
