/// Lifecycle signal module
///
/// This module handles:
/// - The typed signal enums and their routing keys (dispatch.rs)
/// - The per-model dispatch tables the catalog sends through
/// - The standard wiring of receivers to signals
pub mod dispatch;

use std::sync::Arc;

use crate::error::Result;
use crate::hooks::{AuditLog, DerivedAssetGenerator, IdentifierAssigner, NameValidator};
use crate::media::MediaRoot;
use crate::state::data::{ImageRecord, Student};

pub use dispatch::{
    Dispatcher, MigrationReceiver, MigrationSignal, Reaction, Receiver, Signal, SignalKind,
};

/// All dispatch tables the catalog sends through
#[derive(Default)]
pub struct Signals {
    pub students: Dispatcher<Student>,
    pub images: Dispatcher<ImageRecord>,
    migration: Vec<Arc<dyn MigrationReceiver>>,
}

impl Signals {
    /// Empty tables, nothing connected
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard wiring:
    /// - every student signal and both migration signals are audited
    /// - student names are validated before saving
    /// - new students get an identifier
    /// - new images get their thumbnails
    pub fn standard(media: MediaRoot) -> Self {
        let mut signals = Self::new();

        let audit = Arc::new(AuditLog);
        signals.students.connect_all(&SignalKind::ALL, audit.clone());
        signals.connect_migration(audit);

        signals
            .students
            .connect(SignalKind::PreSave, Arc::new(NameValidator));
        signals
            .students
            .connect(SignalKind::PostSave, Arc::new(IdentifierAssigner));
        signals
            .images
            .connect(SignalKind::PostSave, Arc::new(DerivedAssetGenerator::new(media)));

        signals
    }

    pub fn connect_migration(&mut self, receiver: Arc<dyn MigrationReceiver>) {
        self.migration.push(receiver);
    }

    /// Deliver a migration signal to every migration receiver
    pub fn send_migration(&self, signal: MigrationSignal<'_>) -> Result<()> {
        for receiver in &self.migration {
            receiver.receive_migration(signal)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Signals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signals")
            .field("students", &self.students)
            .field("images", &self.images)
            .field("migration", &self.migration.len())
            .finish()
    }
}
