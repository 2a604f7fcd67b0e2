//! Bulk import of every image found under a folder.

use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::state::catalog::Catalog;

/// Image extensions picked up by an import (lowercase)
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// Result of a folder import operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported_count: usize,
    /// Files already imported from the same path
    pub skipped_count: usize,
    /// Files that were stored but could not be processed
    pub failed_count: usize,
}

/// Walk `folder` recursively and create an image record for each image file.
///
/// A file that fails to process is counted and logged, the walk goes on.
/// Database errors while checking for duplicates abort the import.
pub fn import_folder(catalog: &Catalog, folder: &Path) -> Result<ImportResult> {
    let mut result = ImportResult::default();
    info!("🔍 Scanning folder: {}", folder.display());

    for entry in WalkDir::new(folder)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !is_image(path) {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        if catalog.has_source(path)? {
            result.skipped_count += 1;
            continue;
        }

        match catalog.create_image(path) {
            Ok(_) => {
                result.imported_count += 1;
                if result.imported_count % 100 == 0 {
                    info!("⏳ Imported {} files...", result.imported_count);
                }
            }
            Err(e) => {
                warn!("⚠️  Error importing {}: {}", file_name, e);
                result.failed_count += 1;
            }
        }
    }

    info!(
        "✅ Import complete: {} new, {} skipped, {} failed",
        result.imported_count, result.skipped_count, result.failed_count
    );
    Ok(result)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaRoot;
    use crate::signals::Signals;
    use image::{Rgb, RgbImage};
    use std::fs;

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("a/b/photo.JPG")));
        assert!(is_image(Path::new("photo.png")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("README")));
    }

    #[test]
    fn test_import_counts_and_skips_duplicates() {
        let source = tempfile::tempdir().unwrap();
        fs::create_dir_all(source.path().join("nested")).unwrap();
        RgbImage::from_pixel(40, 30, Rgb([0, 0, 255]))
            .save(source.path().join("one.png"))
            .unwrap();
        RgbImage::from_pixel(40, 30, Rgb([0, 255, 0]))
            .save(source.path().join("nested").join("two.png"))
            .unwrap();
        fs::write(source.path().join("broken.png"), b"garbage").unwrap();
        fs::write(source.path().join("notes.txt"), b"ignored").unwrap();

        let media_dir = tempfile::tempdir().unwrap();
        let media = MediaRoot::new(media_dir.path());
        let catalog = Catalog::open_in_memory(media.clone(), Signals::standard(media)).unwrap();

        let first = import_folder(&catalog, source.path()).unwrap();
        assert_eq!(
            first,
            ImportResult {
                imported_count: 2,
                skipped_count: 0,
                failed_count: 1,
            }
        );

        let second = import_folder(&catalog, source.path()).unwrap();
        assert_eq!(second.imported_count, 0);
        // The broken file was stored before it failed, so it counts as known too
        assert_eq!(second.skipped_count, 3);
        assert_eq!(catalog.image_count().unwrap(), 3);
    }

    #[test]
    fn test_same_file_name_in_subfolders_imports_both() {
        let source = tempfile::tempdir().unwrap();
        for folder in ["2023", "2024"] {
            fs::create_dir_all(source.path().join(folder)).unwrap();
            RgbImage::from_pixel(20, 20, Rgb([255, 0, 0]))
                .save(source.path().join(folder).join("cat.png"))
                .unwrap();
        }
        // Same name as the renamed copy of the second cat.png
        RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]))
            .save(source.path().join("cat_1.png"))
            .unwrap();

        let media_dir = tempfile::tempdir().unwrap();
        let media = MediaRoot::new(media_dir.path());
        let catalog = Catalog::open_in_memory(media.clone(), Signals::standard(media)).unwrap();

        let result = import_folder(&catalog, source.path()).unwrap();

        assert_eq!(result.imported_count, 3);
        assert_eq!(result.skipped_count, 0);
        assert_eq!(catalog.image_count().unwrap(), 3);
    }
}
