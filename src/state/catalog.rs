use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::data::{Gender, ImageRecord, Student};
use crate::error::{RecordError, Result};
use crate::media::MediaRoot;
use crate::signals::{MigrationSignal, Reaction, Signal, Signals};

/// App label carried by migration signals
pub const APP_LABEL: &str = "catalog";

const STUDENT_COLUMNS: &str = "id, name, gender, identifier, created_at";
const IMAGE_COLUMNS: &str = "id, original_image, source_path, thumbnail_small, \
     thumbnail_medium, thumbnail_large, created_at";

/// The Catalog manages the SQLite database of students and images.
///
/// Every construction, save and delete goes through the connected
/// [`Signals`], so receivers see the same lifecycle no matter who calls.
pub struct Catalog {
    conn: Connection,
    db_path: Option<PathBuf>,
    media: MediaRoot,
    signals: Signals,
}

impl Catalog {
    /// Open (or create) the catalog database at `db_path` and run migrations.
    pub fn open(db_path: &Path, media: MediaRoot, signals: Signals) -> Result<Self> {
        Self::open_with_verbosity(db_path, media, signals, 1)
    }

    /// Like [`Catalog::open`], with the verbosity the migration signals carry
    pub fn open_with_verbosity(
        db_path: &Path,
        media: MediaRoot,
        signals: Signals,
        verbosity: u8,
    ) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RecordError::storage(parent, e))?;
        }

        let conn = Connection::open(db_path)?;
        info!("📁 Database opened at: {}", db_path.display());

        let mut catalog = Catalog {
            conn,
            db_path: Some(db_path.to_path_buf()),
            media,
            signals,
        };
        catalog.migrate(verbosity)?;
        Ok(catalog)
    }

    /// In-memory catalog, mostly for tests
    pub fn open_in_memory(media: MediaRoot, signals: Signals) -> Result<Self> {
        let mut catalog = Catalog {
            conn: Connection::open_in_memory()?,
            db_path: None,
            media,
            signals,
        };
        catalog.migrate(1)?;
        Ok(catalog)
    }

    /// Open with the standard receivers wired to `media`
    pub fn open_standard(db_path: &Path, media: MediaRoot, verbosity: u8) -> Result<Self> {
        let signals = Signals::standard(media.clone());
        Self::open_with_verbosity(db_path, media, signals, verbosity)
    }

    /// Create all tables and indexes if they don't exist, surrounded by the
    /// pre/post migrate signals.
    pub fn migrate(&mut self, verbosity: u8) -> Result<()> {
        self.signals.send_migration(MigrationSignal::PreMigrate {
            app: APP_LABEL,
            verbosity,
        })?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS students (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                gender          TEXT NOT NULL,
                identifier      TEXT UNIQUE,
                created_at      INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS images (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                original_image      TEXT NOT NULL,
                source_path         TEXT,
                thumbnail_small     TEXT,
                thumbnail_medium    TEXT,
                thumbnail_large     TEXT,
                created_at          INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_images_created_at
             ON images(created_at DESC)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_images_source_path
             ON images(source_path)",
            [],
        )?;

        self.signals.send_migration(MigrationSignal::PostMigrate {
            app: APP_LABEL,
            verbosity,
        })?;
        Ok(())
    }

    /// Path of the database file (None when in memory)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn media(&self) -> &MediaRoot {
        &self.media
    }

    // ========== Students ==========

    /// Construct, validate and insert a new student.
    ///
    /// The returned student carries its key and identifier.
    pub fn create_student(&self, name: &str, gender: Gender) -> Result<Student> {
        self.signals.students.send(Signal::PreInit)?;
        let mut student = Student::new(name, gender);
        self.signals
            .students
            .send(Signal::PostInit { instance: &student })?;

        self.save_student(&mut student)?;
        Ok(student)
    }

    /// Insert the student if it has no key yet, update it otherwise.
    ///
    /// When post-save receivers modify a freshly inserted student, it is
    /// written once more as an update. That second pass never re-enters.
    /// An identifier that is already stored is never overwritten.
    ///
    /// The whole save runs in one transaction. On error nothing is stored
    /// and `student` is put back the way it was passed in.
    pub fn save_student(&self, student: &mut Student) -> Result<()> {
        let before = student.clone();
        let tx = self.conn.unchecked_transaction()?;

        let result = self
            .write_student(student)
            .and_then(|()| tx.commit().map_err(RecordError::from));
        if result.is_err() {
            *student = before;
        }
        result
    }

    fn write_student(&self, student: &mut Student) -> Result<()> {
        self.signals
            .students
            .send(Signal::PreSave { instance: &*student })?;

        let created = match student.id {
            None => {
                // Identifiers only ever come from the key
                student.identifier = None;
                self.conn.execute(
                    "INSERT INTO students (name, gender, identifier, created_at)
                     VALUES (?1, ?2, NULL, ?3)",
                    params![student.name, student.gender.as_str(), student.created_at],
                )?;
                student.id = Some(self.conn.last_insert_rowid());
                true
            }
            Some(id) => {
                let stored: Option<Option<String>> = self
                    .conn
                    .query_row(
                        "UPDATE students
                         SET name = ?1, gender = ?2, identifier = COALESCE(identifier, ?3)
                         WHERE id = ?4
                         RETURNING identifier",
                        params![student.name, student.gender.as_str(), student.identifier, id],
                        |row| row.get(0),
                    )
                    .optional()?;
                student.identifier = stored.ok_or(RecordError::NotFound {
                    model: "Student",
                    id,
                })?;
                false
            }
        };

        let reaction = self.signals.students.send(Signal::PostSave {
            instance: &mut *student,
            created,
        })?;
        if created && reaction == Reaction::Modified {
            self.write_student(student)?;
        }
        Ok(())
    }

    /// Load a student, sending the init signals for the loaded instance
    pub fn get_student(&self, id: i64) -> Result<Option<Student>> {
        let student = self
            .conn
            .query_row(
                &format!("SELECT {} FROM students WHERE id = ?1", STUDENT_COLUMNS),
                [id],
                student_from_row,
            )
            .optional()?;

        if let Some(student) = &student {
            self.announce_student(student)?;
        }
        Ok(student)
    }

    /// All students, oldest first
    pub fn list_students(&self) -> Result<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM students ORDER BY id",
            STUDENT_COLUMNS
        ))?;

        let students = stmt
            .query_map([], student_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for student in &students {
            self.announce_student(student)?;
        }
        Ok(students)
    }

    /// Delete a student and return what was removed
    pub fn delete_student(&self, id: i64) -> Result<Student> {
        let student = self.get_student(id)?.ok_or(RecordError::NotFound {
            model: "Student",
            id,
        })?;

        self.signals
            .students
            .send(Signal::PreDelete { instance: &student })?;
        self.conn
            .execute("DELETE FROM students WHERE id = ?1", [id])?;
        self.signals
            .students
            .send(Signal::PostDelete { instance: &student })?;

        Ok(student)
    }

    pub fn student_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    fn announce_student(&self, student: &Student) -> Result<()> {
        self.signals.students.send(Signal::PreInit)?;
        self.signals
            .students
            .send(Signal::PostInit { instance: student })?;
        Ok(())
    }

    // ========== Images ==========

    /// Store an uploaded image under the media root and insert a record for it.
    ///
    /// Thumbnails are generated by the post-save receivers before this returns.
    /// If that fails the record stays in the catalog without thumbnails and the
    /// error is returned.
    pub fn create_image(&self, source: &Path) -> Result<ImageRecord> {
        let reference = self.media.store_upload(source)?;

        self.signals.images.send(Signal::PreInit)?;
        let mut record = ImageRecord::new(reference);
        record.source_path = Some(source_key(source));
        self.signals
            .images
            .send(Signal::PostInit { instance: &record })?;

        self.save_image(&mut record)?;
        Ok(record)
    }

    /// Insert the image record if it has no key yet, update it otherwise.
    ///
    /// A new record is always inserted without thumbnails. Thumbnail columns
    /// are only written while they are still NULL.
    pub fn save_image(&self, record: &mut ImageRecord) -> Result<()> {
        self.signals
            .images
            .send(Signal::PreSave { instance: &*record })?;

        let created = match record.id {
            None => {
                // Thumbnails only ever come from the post-save receivers
                record.thumbnail_small = None;
                record.thumbnail_medium = None;
                record.thumbnail_large = None;
                self.conn.execute(
                    "INSERT INTO images
                     (original_image, source_path, thumbnail_small, thumbnail_medium,
                      thumbnail_large, created_at)
                     VALUES (?1, ?2, NULL, NULL, NULL, ?3)",
                    params![record.original_image, record.source_path, record.created_at],
                )?;
                record.id = Some(self.conn.last_insert_rowid());
                true
            }
            Some(id) => {
                type Thumbnails = (Option<String>, Option<String>, Option<String>);
                let stored: Option<Thumbnails> = self
                    .conn
                    .query_row(
                        "UPDATE images
                         SET original_image = ?1,
                             thumbnail_small = COALESCE(thumbnail_small, ?2),
                             thumbnail_medium = COALESCE(thumbnail_medium, ?3),
                             thumbnail_large = COALESCE(thumbnail_large, ?4)
                         WHERE id = ?5
                         RETURNING thumbnail_small, thumbnail_medium, thumbnail_large",
                        params![
                            record.original_image,
                            record.thumbnail_small,
                            record.thumbnail_medium,
                            record.thumbnail_large,
                            id
                        ],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()?;
                let (small, medium, large) = stored.ok_or(RecordError::NotFound {
                    model: "ImageRecord",
                    id,
                })?;
                record.thumbnail_small = small;
                record.thumbnail_medium = medium;
                record.thumbnail_large = large;
                false
            }
        };

        let reaction = self
            .signals
            .images
            .send(Signal::PostSave {
                instance: &mut *record,
                created,
            })
            .map_err(|e| {
                warn!("⚠️  Post-save processing failed for image {:?}: {}", record.id, e);
                e
            })?;
        if created && reaction == Reaction::Modified {
            self.save_image(record)?;
        }
        Ok(())
    }

    pub fn get_image(&self, id: i64) -> Result<Option<ImageRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM images WHERE id = ?1", IMAGE_COLUMNS),
                [id],
                image_from_row,
            )
            .optional()?;

        if let Some(record) = &record {
            self.announce_image(record)?;
        }
        Ok(record)
    }

    /// All image records, newest first
    pub fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM images ORDER BY created_at DESC, id DESC",
            IMAGE_COLUMNS
        ))?;

        let records = stmt
            .query_map([], image_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for record in &records {
            self.announce_image(record)?;
        }
        Ok(records)
    }

    /// Delete an image record. Stored files are left in place.
    pub fn delete_image(&self, id: i64) -> Result<ImageRecord> {
        let record = self.get_image(id)?.ok_or(RecordError::NotFound {
            model: "ImageRecord",
            id,
        })?;

        self.signals
            .images
            .send(Signal::PreDelete { instance: &record })?;
        self.conn.execute("DELETE FROM images WHERE id = ?1", [id])?;
        self.signals
            .images
            .send(Signal::PostDelete { instance: &record })?;

        Ok(record)
    }

    pub fn image_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
        Ok(count)
    }


    /// True if an upload copied from `source` is already in the catalog
    pub fn has_source(&self, source: &Path) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM images WHERE source_path = ?1)",
            [source_key(source)],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn announce_image(&self, record: &ImageRecord) -> Result<()> {
        self.signals.images.send(Signal::PreInit)?;
        self.signals
            .images
            .send(Signal::PostInit { instance: record })?;
        Ok(())
    }
}

/// Canonical form of an upload's source path, used to spot repeat imports
fn source_key(source: &Path) -> String {
    source
        .canonicalize()
        .unwrap_or_else(|_| source.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    let gender: String = row.get(2)?;
    let gender = gender.parse::<Gender>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        gender,
        identifier: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<ImageRecord> {
    Ok(ImageRecord {
        id: row.get(0)?,
        original_image: row.get(1)?,
        source_path: row.get(2)?,
        thumbnail_small: row.get(3)?,
        thumbnail_medium: row.get(4)?,
        thumbnail_large: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// Implement Debug for better error messages
impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("db_path", &self.db_path)
            .field("media", &self.media)
            .field("signals", &self.signals)
            .finish()
    }
}
