use image::{GenericImageView, Rgb, RgbImage};
use record_signals::{Catalog, Gender, MediaRoot, RecordError, Signals, ThumbnailSlot};
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    uploads: PathBuf,
    media: MediaRoot,
    catalog: Catalog,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let uploads = dir.path().join("uploads");
    std::fs::create_dir_all(&uploads).unwrap();
    let media = MediaRoot::new(dir.path().join("media"));
    let catalog = Catalog::open(
        &dir.path().join("catalog.db"),
        media.clone(),
        Signals::standard(media.clone()),
    )
    .unwrap();

    Harness {
        _dir: dir,
        uploads,
        media,
        catalog,
    }
}

impl Harness {
    fn upload(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.uploads.join(name);
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
            .save(&path)
            .unwrap();
        path
    }
}

#[test]
fn student_identifier_follows_key() {
    let h = harness();

    for n in 1..=7 {
        let student = h
            .catalog
            .create_student(&format!("Student {n}"), Gender::Male)
            .unwrap();
        assert_eq!(student.id, Some(n));
    }

    let alice = h.catalog.create_student("Alice", Gender::Female).unwrap();
    assert_eq!(alice.id, Some(8));
    assert_eq!(alice.identifier.as_deref(), Some("STU-0008"));

    let seventh = h.catalog.get_student(7).unwrap().unwrap();
    assert_eq!(seventh.identifier.as_deref(), Some("STU-0007"));
}

#[test]
fn identifier_keeps_literal_format_past_nine() {
    let h = harness();
    let mut last = None;
    for n in 0..10 {
        last = Some(h.catalog.create_student(&format!("S{n}"), Gender::Female).unwrap());
    }

    let tenth = last.unwrap();
    assert_eq!(tenth.id, Some(10));
    assert_eq!(tenth.identifier.as_deref(), Some("STU-00010"));
}

#[test]
fn every_created_student_has_an_identifier() {
    let h = harness();
    for name in ["Alice", "Bob", "Chloé", "李雷", "x"] {
        let student = h.catalog.create_student(name, Gender::Male).unwrap();
        assert!(!student.identifier.unwrap_or_default().is_empty());
    }

    let identifiers: HashSet<_> = h
        .catalog
        .list_students()
        .unwrap()
        .into_iter()
        .map(|s| s.identifier.unwrap())
        .collect();
    assert_eq!(identifiers.len(), 5);
}

#[test]
fn empty_name_persists_nothing() {
    let h = harness();

    let result = h.catalog.create_student("", Gender::Female);

    assert!(matches!(result, Err(RecordError::Validation(_))));
    assert_eq!(h.catalog.student_count().unwrap(), 0);

    // The rejected attempt did not consume a key
    let student = h.catalog.create_student("Alice", Gender::Female).unwrap();
    assert_eq!(student.id, Some(1));
}

#[test]
fn updates_never_change_identifier() {
    let h = harness();
    let mut student = h.catalog.create_student("Alice", Gender::Female).unwrap();
    let identifier = student.identifier.clone();

    for name in ["Alicia", "Ali"] {
        student.name = name.to_string();
        h.catalog.save_student(&mut student).unwrap();
        assert_eq!(student.identifier, identifier);
    }

    student.identifier = None;
    h.catalog.save_student(&mut student).unwrap();
    assert_eq!(student.identifier, identifier);
    assert_eq!(h.catalog.get_student(1).unwrap().unwrap().identifier, identifier);
}

#[test]
fn deleting_a_student_leaves_others_alone() {
    let h = harness();
    let alice = h.catalog.create_student("Alice", Gender::Female).unwrap();
    let bob = h.catalog.create_student("Bob", Gender::Male).unwrap();
    let image = h.catalog.create_image(&h.upload("cat.png", 200, 100)).unwrap();

    h.catalog.delete_student(alice.id.unwrap()).unwrap();

    let remaining = h.catalog.get_student(bob.id.unwrap()).unwrap().unwrap();
    assert_eq!(remaining.identifier, bob.identifier);
    assert_eq!(h.catalog.get_image(image.id.unwrap()).unwrap().unwrap(), image);

    // A new student gets a fresh key, never a reused identifier
    let carol = h.catalog.create_student("Carol", Gender::Female).unwrap();
    assert_eq!(carol.identifier.as_deref(), Some("STU-0003"));
}

#[test]
fn image_gets_three_thumbnails_within_bounds() {
    let h = harness();

    let record = h.catalog.create_image(&h.upload("landscape.png", 1000, 800)).unwrap();

    let mut seen = HashSet::new();
    for slot in ThumbnailSlot::ALL {
        let reference = record.thumbnail(slot).unwrap();
        assert!(seen.insert(reference.to_string()), "duplicate reference {reference}");
        assert!(h.media.exists(reference));

        let (max_width, max_height) = slot.bounds();
        let (width, height) = image::open(h.media.path(reference)).unwrap().dimensions();
        assert!(width <= max_width && height <= max_height);
        assert_eq!(width.max(height), max_width);
        // 5:4 aspect ratio, allowing for rounding
        assert!((width as f64 / height as f64 - 1.25).abs() < 0.02);
    }

    assert_eq!(record.thumbnail_small.as_deref(), Some("thumbnails/landscape_100x100.png"));
    assert_eq!(record.thumbnail_medium.as_deref(), Some("thumbnails/landscape_300x300.png"));
    assert_eq!(record.thumbnail_large.as_deref(), Some("thumbnails/landscape_600x600.png"));

    let stored = h.catalog.get_image(record.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored, record);
}

#[test]
fn same_file_name_uploads_get_distinct_thumbnails() {
    let h = harness();
    let source = h.upload("cat.png", 400, 400);

    let first = h.catalog.create_image(&source).unwrap();
    let second = h.catalog.create_image(&source).unwrap();

    assert_eq!(second.original_image, "images/cat_1.png");
    assert_ne!(first.thumbnail_small, second.thumbnail_small);
    assert!(h.media.exists(second.thumbnail_small.as_deref().unwrap()));
}

#[test]
fn corrupt_upload_keeps_record_without_thumbnails() {
    let h = harness();
    let path = h.uploads.join("broken.jpg");
    std::fs::write(&path, b"\xFF\xD8 truncated").unwrap();

    let result = h.catalog.create_image(&path);

    assert!(matches!(result, Err(RecordError::Decode { .. })));
    let records = h.catalog.list_images().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].has_no_thumbnails());
}

#[test]
fn saving_an_image_again_does_not_regenerate() {
    let h = harness();
    let mut record = h.catalog.create_image(&h.upload("dog.png", 640, 480)).unwrap();
    let small = record.thumbnail_small.clone().unwrap();
    std::fs::remove_file(h.media.path(&small)).unwrap();

    h.catalog.save_image(&mut record).unwrap();

    assert_eq!(record.thumbnail_small.as_deref(), Some(small.as_str()));
    assert!(!h.media.exists(&small));
}

#[test]
fn deleting_an_image_keeps_files() {
    let h = harness();
    let record = h.catalog.create_image(&h.upload("bird.png", 300, 200)).unwrap();

    h.catalog.delete_image(record.id.unwrap()).unwrap();

    assert_eq!(h.catalog.image_count().unwrap(), 0);
    for slot in ThumbnailSlot::ALL {
        assert!(h.media.exists(record.thumbnail(slot).unwrap()));
    }
}

#[test]
fn whitespace_name_is_still_a_name() {
    let h = harness();

    let student = h.catalog.create_student("   ", Gender::Male).unwrap();

    assert_eq!(student.identifier.as_deref(), Some("STU-0001"));
    assert_eq!(h.catalog.student_count().unwrap(), 1);
}
