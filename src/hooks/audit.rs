//! Structured trail of every lifecycle and migration signal.

use tracing::{debug, info};

use crate::error::Result;
use crate::signals::{MigrationReceiver, MigrationSignal, Reaction, Receiver, Signal};
use crate::state::data::Model;

/// Emits one tracing event per signal. Never changes or rejects anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditLog;

impl<M: Model> Receiver<M> for AuditLog {
    fn name(&self) -> &'static str {
        "audit_log"
    }

    fn receive(&self, signal: &mut Signal<'_, M>) -> Result<Reaction> {
        let kind = signal.kind();
        match signal {
            Signal::PreInit => {
                debug!(model = M::NAME, signal = %kind, "Instance is being initialized");
            }
            Signal::PostInit { instance } => {
                debug!(model = M::NAME, signal = %kind, key = ?instance.key(), "Instance initialized");
            }
            Signal::PreSave { instance } => {
                debug!(model = M::NAME, signal = %kind, key = ?instance.key(), "Saving instance");
            }
            Signal::PostSave { instance, created } => {
                debug!(
                    model = M::NAME,
                    signal = %kind,
                    key = ?instance.key(),
                    created = *created,
                    "Instance saved"
                );
            }
            Signal::PreDelete { instance } => {
                debug!(model = M::NAME, signal = %kind, key = ?instance.key(), "Preparing to delete instance");
            }
            Signal::PostDelete { instance } => {
                debug!(model = M::NAME, signal = %kind, key = ?instance.key(), "Instance deleted");
            }
        }
        Ok(Reaction::Unchanged)
    }
}

impl MigrationReceiver for AuditLog {
    fn receive_migration(&self, signal: MigrationSignal<'_>) -> Result<()> {
        match signal {
            MigrationSignal::PreMigrate { app, verbosity } => {
                info!(app, verbosity, "Running migrations");
            }
            MigrationSignal::PostMigrate { app, verbosity } => {
                info!(app, verbosity, "Migrations applied");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{Gender, Student};

    #[test]
    fn test_audit_never_modifies() {
        let mut student = Student::new("Alice", Gender::Female);
        let before = student.clone();

        let reaction = Receiver::<Student>::receive(
            &AuditLog,
            &mut Signal::PostSave { instance: &mut student, created: true },
        )
        .unwrap();

        assert_eq!(reaction, Reaction::Unchanged);
        assert_eq!(student, before);
    }

    #[test]
    fn test_migration_signals_are_accepted() {
        AuditLog
            .receive_migration(MigrationSignal::PreMigrate { app: "catalog", verbosity: 1 })
            .unwrap();
        AuditLog
            .receive_migration(MigrationSignal::PostMigrate { app: "catalog", verbosity: 1 })
            .unwrap();
    }
}
