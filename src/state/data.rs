//! Shared data structures for the catalog
//!
//! These structs represent the data model that flows between
//! the database layer and the signal receivers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A persisted entity with a key assigned by the database on insert
pub trait Model: fmt::Debug + Send {
    /// Model name used in log lines and error messages
    const NAME: &'static str;

    /// Database key, `None` until the record has been inserted
    fn key(&self) -> Option<i64>;
}

/// Gender choices for a student
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Value stored in the `gender` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" | "male" => Ok(Gender::Male),
            "Female" | "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// Represents a single student in the catalog
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Student {
    /// Unique database ID (None before the first insert)
    pub id: Option<i64>,
    pub name: String,
    pub gender: Gender,
    /// Human-readable identifier, assigned once right after creation
    pub identifier: Option<String>,
    /// Unix timestamp (seconds) of construction
    pub created_at: i64,
}

impl Student {
    /// Build an unsaved student
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: None,
            name: name.into(),
            gender,
            identifier: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

impl Model for Student {
    const NAME: &'static str = "Student";

    fn key(&self) -> Option<i64> {
        self.id
    }
}

/// The three resized variants generated for every uploaded image
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailSlot {
    Small,
    Medium,
    Large,
}

impl ThumbnailSlot {
    pub const ALL: [ThumbnailSlot; 3] = [
        ThumbnailSlot::Small,
        ThumbnailSlot::Medium,
        ThumbnailSlot::Large,
    ];

    /// Bounding box (width, height) the variant must fit in
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            ThumbnailSlot::Small => (100, 100),
            ThumbnailSlot::Medium => (300, 300),
            ThumbnailSlot::Large => (600, 600),
        }
    }
}

/// Represents a single uploaded image and its derived thumbnails
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageRecord {
    /// Unique database ID (None before the first insert)
    pub id: Option<i64>,
    /// Original upload, relative to the media root (e.g. "images/cat.png")
    pub original_image: String,
    /// Canonical path the upload was copied from, if it came from a file
    pub source_path: Option<String>,
    pub thumbnail_small: Option<String>,
    pub thumbnail_medium: Option<String>,
    pub thumbnail_large: Option<String>,
    /// Unix timestamp (seconds) of construction
    pub created_at: i64,
}

impl ImageRecord {
    /// Build an unsaved image record for an already stored original
    pub fn new(original_image: impl Into<String>) -> Self {
        Self {
            id: None,
            original_image: original_image.into(),
            source_path: None,
            thumbnail_small: None,
            thumbnail_medium: None,
            thumbnail_large: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn thumbnail(&self, slot: ThumbnailSlot) -> Option<&str> {
        match slot {
            ThumbnailSlot::Small => self.thumbnail_small.as_deref(),
            ThumbnailSlot::Medium => self.thumbnail_medium.as_deref(),
            ThumbnailSlot::Large => self.thumbnail_large.as_deref(),
        }
    }

    pub fn set_thumbnail(&mut self, slot: ThumbnailSlot, reference: String) {
        let field = match slot {
            ThumbnailSlot::Small => &mut self.thumbnail_small,
            ThumbnailSlot::Medium => &mut self.thumbnail_medium,
            ThumbnailSlot::Large => &mut self.thumbnail_large,
        };
        *field = Some(reference);
    }

    /// True when no variant has been generated yet
    pub fn has_no_thumbnails(&self) -> bool {
        ThumbnailSlot::ALL.iter().all(|slot| self.thumbnail(*slot).is_none())
    }
}

impl Model for ImageRecord {
    const NAME: &'static str = "ImageRecord";

    fn key(&self) -> Option<i64> {
        self.id
    }
}
