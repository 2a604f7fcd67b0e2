//! Record lifecycle signals for a small SQLite catalog.
//!
//! Students get a human-readable identifier right after they are first
//! saved, uploaded images get small, medium and large thumbnails. Both are
//! receivers of the typed `PostSave` signal the [`Catalog`] sends.

pub mod config;
pub mod error;
pub mod hooks;
pub mod import;
pub mod media;
pub mod signals;
pub mod state;

pub use config::Config;
pub use error::{RecordError, Result};
pub use media::MediaRoot;
pub use signals::{Reaction, Receiver, Signal, SignalKind, Signals};
pub use state::catalog::Catalog;
pub use state::data::{Gender, ImageRecord, Model, Student, ThumbnailSlot};
