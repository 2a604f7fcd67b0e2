//! Human-readable student identifiers.

use tracing::info;

use crate::error::Result;
use crate::signals::{Reaction, Receiver, Signal};
use crate::state::data::Student;

/// Literal identifier format: `STU-000` followed by the key.
///
/// Only keys below 10 come out four digits wide (7 gives `STU-0007`, 10 gives
/// `STU-00010`). Existing identifiers depend on this exact output, so it is
/// not padded to a fixed width.
pub fn student_identifier(key: i64) -> String {
    format!("STU-000{}", key)
}

/// Gives a newly created student its identifier.
///
/// Acts only on `PostSave` with `created` set, a known key and no identifier
/// yet. The catalog persists the change, which sends a second `PostSave`
/// with `created == false` that this receiver ignores.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifierAssigner;

impl Receiver<Student> for IdentifierAssigner {
    fn name(&self) -> &'static str {
        "identifier_assigner"
    }

    fn receive(&self, signal: &mut Signal<'_, Student>) -> Result<Reaction> {
        let Signal::PostSave { instance, created: true } = signal else {
            return Ok(Reaction::Unchanged);
        };
        if instance.identifier.is_some() {
            return Ok(Reaction::Unchanged);
        }
        let Some(key) = instance.id else {
            return Ok(Reaction::Unchanged);
        };

        let identifier = student_identifier(key);
        info!(student_id = key, identifier = %identifier, "Generated student identifier");
        instance.identifier = Some(identifier);
        Ok(Reaction::Modified)
    }
}
