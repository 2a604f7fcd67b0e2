//! Typed lifecycle signals and the per-kind dispatch table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::state::data::Model;

/// A lifecycle transition of a single model instance.
///
/// Each variant carries only what is relevant to it: save signals carry the
/// instance and the `created` flag, delete signals carry the doomed instance.
#[derive(Debug)]
pub enum Signal<'a, M> {
    /// Before an instance is constructed
    PreInit,
    /// After an instance has been constructed
    PostInit { instance: &'a M },
    /// Before an instance is written. Receivers may reject it.
    PreSave { instance: &'a M },
    /// After an instance was written. Receivers may modify it.
    PostSave { instance: &'a mut M, created: bool },
    PreDelete { instance: &'a M },
    PostDelete { instance: &'a M },
}

impl<M> Signal<'_, M> {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::PreInit => SignalKind::PreInit,
            Signal::PostInit { .. } => SignalKind::PostInit,
            Signal::PreSave { .. } => SignalKind::PreSave,
            Signal::PostSave { .. } => SignalKind::PostSave,
            Signal::PreDelete { .. } => SignalKind::PreDelete,
            Signal::PostDelete { .. } => SignalKind::PostDelete,
        }
    }
}

/// Schema migration signals. These are not tied to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationSignal<'a> {
    PreMigrate { app: &'a str, verbosity: u8 },
    PostMigrate { app: &'a str, verbosity: u8 },
}

/// Routing key of a [`Signal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    PreInit,
    PostInit,
    PreSave,
    PostSave,
    PreDelete,
    PostDelete,
}

impl SignalKind {
    pub const ALL: [SignalKind; 6] = [
        SignalKind::PreInit,
        SignalKind::PostInit,
        SignalKind::PreSave,
        SignalKind::PostSave,
        SignalKind::PreDelete,
        SignalKind::PostDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::PreInit => "pre_init",
            SignalKind::PostInit => "post_init",
            SignalKind::PreSave => "pre_save",
            SignalKind::PostSave => "post_save",
            SignalKind::PreDelete => "pre_delete",
            SignalKind::PostDelete => "post_delete",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a receiver did to the instance it was handed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reaction {
    #[default]
    Unchanged,
    /// The instance was changed and must be persisted again
    Modified,
}

impl Reaction {
    pub fn merge(self, other: Reaction) -> Reaction {
        if self == Reaction::Modified || other == Reaction::Modified {
            Reaction::Modified
        } else {
            Reaction::Unchanged
        }
    }
}

/// Handles lifecycle signals for one model type
pub trait Receiver<M>: Send + Sync {
    /// Short name used in trace output
    fn name(&self) -> &'static str;

    fn receive(&self, signal: &mut Signal<'_, M>) -> Result<Reaction>;
}

/// Handles schema migration signals
pub trait MigrationReceiver: Send + Sync {
    fn receive_migration(&self, signal: MigrationSignal<'_>) -> Result<()>;
}

/// Routes each signal to the receivers connected for its kind, in connection order.
pub struct Dispatcher<M> {
    routes: HashMap<SignalKind, Vec<Arc<dyn Receiver<M>>>>,
}

impl<M: Model> Dispatcher<M> {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Connect a receiver to one signal kind
    pub fn connect(&mut self, kind: SignalKind, receiver: Arc<dyn Receiver<M>>) {
        self.routes.entry(kind).or_default().push(receiver);
    }

    /// Connect the same receiver to several signal kinds
    pub fn connect_all(&mut self, kinds: &[SignalKind], receiver: Arc<dyn Receiver<M>>) {
        for kind in kinds {
            self.connect(*kind, Arc::clone(&receiver));
        }
    }

    /// Number of receivers listening for `kind`
    pub fn receiver_count(&self, kind: SignalKind) -> usize {
        self.routes.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver a signal to every receiver connected for its kind.
    ///
    /// Stops at the first receiver error. Returns [`Reaction::Modified`] if any
    /// receiver changed the instance.
    pub fn send(&self, mut signal: Signal<'_, M>) -> Result<Reaction> {
        let kind = signal.kind();
        let Some(receivers) = self.routes.get(&kind) else {
            return Ok(Reaction::Unchanged);
        };

        let mut reaction = Reaction::Unchanged;
        for receiver in receivers {
            trace!(model = M::NAME, signal = %kind, receiver = receiver.name(), "dispatching");
            reaction = reaction.merge(receiver.receive(&mut signal)?);
        }
        Ok(reaction)
    }
}

impl<M: Model> Default for Dispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for Dispatcher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<(&'static str, usize)> = self
            .routes
            .iter()
            .map(|(kind, receivers)| (kind.as_str(), receivers.len()))
            .collect();
        routes.sort();
        f.debug_struct("Dispatcher").field("routes", &routes).finish()
    }
}
