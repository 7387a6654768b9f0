//! The active path: the owned root-to-leaf chain of state instances.
//!
//! Index 0 is the direct child of the machine, the last index the current
//! leaf. The path owns every instance exclusively; an entry's parent is
//! simply the entry before it, so no entry ever holds a reference of its
//! own. Entries are only pushed at the tail and popped from the tail, which
//! keeps every live index stable.

use std::any::{Any, TypeId};

use crate::core::reaction::ReactionTable;
use crate::core::state::{StateDescriptor, StateInstance, Statechart};

/// One active state: the instance plus the static data dispatch needs
/// without touching the instance itself.
pub(crate) struct PathEntry<M: Statechart> {
    instance: Box<dyn StateInstance<M>>,
    table: ReactionTable<M>,
    descriptor: StateDescriptor<M>,
    deferred: bool,
}

impl<M: Statechart> PathEntry<M> {
    /// Build an entry from its descriptor, constructing the instance
    /// unless a pre-built one (a transition destination with arguments)
    /// is supplied.
    pub(crate) fn build(
        descriptor: StateDescriptor<M>,
        instance: Option<Box<dyn StateInstance<M>>>,
    ) -> Self {
        let instance = instance.unwrap_or_else(|| descriptor.construct());
        let table = descriptor.build_table();
        Self {
            instance,
            table,
            descriptor,
            deferred: false,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.descriptor.name()
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.descriptor.type_id()
    }

    pub(crate) fn instance_any(&self) -> &dyn Any {
        self.instance.as_any()
    }

    pub(crate) fn instance_any_mut(&mut self) -> &mut dyn Any {
        self.instance.as_any_mut()
    }

    pub(crate) fn instance_mut(&mut self) -> &mut dyn StateInstance<M> {
        &mut *self.instance
    }

    pub(crate) fn has_deferral(&self) -> bool {
        self.deferred
    }

    /// Split the entry into the disjoint borrows one dispatch step needs:
    /// the instance for the handler, the table for the scan, and the
    /// deferral flag for the event context.
    pub(crate) fn dispatch_parts(
        &mut self,
    ) -> (&mut dyn StateInstance<M>, &ReactionTable<M>, &mut bool) {
        (&mut *self.instance, &self.table, &mut self.deferred)
    }
}

/// Root-to-leaf sequence of active state instances.
pub(crate) struct ActivePath<M: Statechart> {
    entries: Vec<PathEntry<M>>,
}

impl<M: Statechart> ActivePath<M> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, entry: PathEntry<M>) {
        self.entries.push(entry);
    }

    pub(crate) fn pop(&mut self) -> Option<PathEntry<M>> {
        self.entries.pop()
    }

    pub(crate) fn entries(&self) -> &[PathEntry<M>] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [PathEntry<M>] {
        &mut self.entries
    }

    pub(crate) fn type_at(&self, index: usize) -> Option<TypeId> {
        self.entries.get(index).map(|entry| entry.type_id())
    }

    pub(crate) fn name_at(&self, index: usize) -> Option<&'static str> {
        self.entries.get(index).map(|entry| entry.name())
    }

    pub(crate) fn contains_type(&self, id: TypeId) -> bool {
        self.entries.iter().any(|entry| entry.type_id() == id)
    }

    /// Name of the current leaf, the innermost active state.
    pub(crate) fn leaf_name(&self) -> Option<&'static str> {
        self.entries.last().map(|entry| entry.name())
    }

    /// The leaf instance for anchoring a transition action; `None` when
    /// the path is empty and the machine itself is the boundary.
    pub(crate) fn leaf_instance_any_mut(&mut self) -> Option<&mut dyn Any> {
        self.entries
            .last_mut()
            .map(|entry| entry.instance_any_mut())
    }
}
