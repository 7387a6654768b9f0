//! Per-state reaction tables.
//!
//! A table is an ordered list of matchers scanned against each incoming
//! event. Declaration order is precedence: the first entry whose event type
//! matches and whose outcome is not
//! [`NoReaction`](crate::Response::NoReaction) settles the event for this
//! state. Keeping at most one entry per event type is the author's
//! responsibility; [`validate`](crate::validate::validate) can check it.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::core::event::{short_type_name, Event, EventRecord};
use crate::core::response::{IntoResponse, Response};
use crate::core::state::{descriptor_of, ActionScope, DescriptorFn, EventCtx, State, Statechart};
use crate::machine::transition::TransitionAction;

type HandlerFn<M> = Box<dyn Fn(&mut dyn Any, &EventRecord, &mut EventCtx<'_, M>) -> Response>;

#[derive(Clone, Copy, PartialEq)]
enum EventMatcher {
    Type(TypeId),
    Any,
}

enum EntryKind<M: Statechart> {
    Invoke(HandlerFn<M>),
    Transit {
        dest: DescriptorFn<M>,
        action: Option<Arc<dyn Fn(&mut ActionScope<'_, M>)>>,
    },
    Defer,
}

/// One matcher in a reaction table.
pub struct ReactionEntry<M: Statechart> {
    matcher: EventMatcher,
    event_name: &'static str,
    kind: EntryKind<M>,
}

impl<M: Statechart> ReactionEntry<M> {
    pub(crate) fn matches(&self, record: &EventRecord) -> bool {
        match self.matcher {
            EventMatcher::Type(id) => record.event_type() == id,
            EventMatcher::Any => true,
        }
    }

    /// Identity tag this entry matches, or `None` for a match-all entry.
    pub(crate) fn matched_type(&self) -> Option<TypeId> {
        match self.matcher {
            EventMatcher::Type(id) => Some(id),
            EventMatcher::Any => None,
        }
    }

    pub(crate) fn event_name(&self) -> &'static str {
        self.event_name
    }

    pub(crate) fn fire(
        &self,
        instance: &mut dyn Any,
        record: &EventRecord,
        ctx: &mut EventCtx<'_, M>,
    ) -> Response {
        match &self.kind {
            EntryKind::Invoke(handler) => handler(instance, record, ctx),
            EntryKind::Transit { dest, action } => {
                let action = action.as_ref().map(|shared| {
                    let shared = Arc::clone(shared);
                    Box::new(move |scope: &mut ActionScope<'_, M>| shared(scope))
                        as TransitionAction<M>
                });
                ctx.schedule(dest(), None, action)
            }
            EntryKind::Defer => ctx.defer_event(),
        }
    }
}

/// Ordered reaction table of one state.
///
/// Built fluently inside [`State::reactions`]. The three entry kinds mirror
/// the three things a state can do with an event it claims: run a handler,
/// transition somewhere, or defer it.
pub struct ReactionTable<M: Statechart> {
    entries: Vec<ReactionEntry<M>>,
}

impl<M: Statechart> ReactionTable<M> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Match `Ev` and run `handler` on the reacting state.
    ///
    /// The handler is usually a method reference like `Self::on_shutter`.
    /// Its return value converts through [`IntoResponse`], so side-effect
    /// handlers returning `()` consume the event, and a handler returning
    /// [`NoReaction`](Response::NoReaction) lets the scan fall through to
    /// later entries.
    pub fn handle<S, Ev, R, F>(mut self, handler: F) -> Self
    where
        S: State<M>,
        Ev: Event,
        R: IntoResponse,
        F: Fn(&mut S, &Ev, &mut EventCtx<'_, M>) -> R + 'static,
    {
        let erased: HandlerFn<M> = Box::new(move |instance, record, ctx| {
            let (Some(state), Some(event)) =
                (instance.downcast_mut::<S>(), record.downcast_ref::<Ev>())
            else {
                return Response::NoReaction;
            };
            handler(state, event, ctx).into_response()
        });
        self.entries.push(ReactionEntry {
            matcher: EventMatcher::Type(TypeId::of::<Ev>()),
            event_name: static_event_name::<Ev>(),
            kind: EntryKind::Invoke(erased),
        });
        self
    }

    /// Match `Ev` and transition to `D` with no handler code.
    pub fn transition<Ev, D>(mut self) -> Self
    where
        Ev: Event,
        D: State<M>,
    {
        self.entries.push(ReactionEntry {
            matcher: EventMatcher::Type(TypeId::of::<Ev>()),
            event_name: static_event_name::<Ev>(),
            kind: EntryKind::Transit {
                dest: descriptor_of::<M, D>,
                action: None,
            },
        });
        self
    }

    /// Match `Ev` and transition to `D`, running `action` at the
    /// transition boundary each time the entry fires.
    pub fn transition_with<Ev, D, A>(mut self, action: A) -> Self
    where
        Ev: Event,
        D: State<M>,
        A: Fn(&mut ActionScope<'_, M>) + 'static,
    {
        self.entries.push(ReactionEntry {
            matcher: EventMatcher::Type(TypeId::of::<Ev>()),
            event_name: static_event_name::<Ev>(),
            kind: EntryKind::Transit {
                dest: descriptor_of::<M, D>,
                action: Some(Arc::new(action)),
            },
        });
        self
    }

    /// Match `Ev` and defer it until the declaring state exits.
    pub fn defer<Ev: Event>(mut self) -> Self {
        self.entries.push(ReactionEntry {
            matcher: EventMatcher::Type(TypeId::of::<Ev>()),
            event_name: static_event_name::<Ev>(),
            kind: EntryKind::Defer,
        });
        self
    }

    /// Defer every event not claimed by an earlier entry.
    pub fn defer_any(mut self) -> Self {
        self.entries.push(ReactionEntry {
            matcher: EventMatcher::Any,
            event_name: "<any>",
            kind: EntryKind::Defer,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[ReactionEntry<M>] {
        &self.entries
    }
}

impl<M: Statechart> Default for ReactionTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn static_event_name<Ev: Event>() -> &'static str {
    short_type_name(std::any::type_name::<Ev>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::StateDescriptor;

    struct Chart;

    impl Statechart for Chart {
        fn initial() -> StateDescriptor<Self> {
            descriptor_of::<Self, Lone>()
        }
    }

    #[derive(Default)]
    struct Lone;
    impl State<Chart> for Lone {}

    #[derive(Default)]
    struct Other;
    impl State<Chart> for Other {}

    #[derive(Clone, Debug)]
    struct EvA;
    impl Event for EvA {}

    #[derive(Clone, Debug)]
    struct EvB;
    impl Event for EvB {}

    fn noop(_state: &mut Lone, _event: &EvA, _ctx: &mut EventCtx<'_, Chart>) {}

    #[test]
    fn entries_keep_declaration_order() {
        let table = ReactionTable::<Chart>::new()
            .handle(noop)
            .transition::<EvB, Other>()
            .defer_any();
        let names: Vec<_> = table.entries().iter().map(|e| e.event_name()).collect();
        assert_eq!(names, vec!["EvA", "EvB", "<any>"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn typed_matchers_match_only_their_event() {
        let table = ReactionTable::<Chart>::new().defer::<EvA>();
        let entry = &table.entries()[0];
        assert!(entry.matches(&EventRecord::new(EvA)));
        assert!(!entry.matches(&EventRecord::new(EvB)));
        assert_eq!(entry.matched_type(), Some(TypeId::of::<EvA>()));
    }

    #[test]
    fn any_matcher_matches_everything() {
        let table = ReactionTable::<Chart>::new().defer_any();
        let entry = &table.entries()[0];
        assert!(entry.matches(&EventRecord::new(EvA)));
        assert!(entry.matches(&EventRecord::new(EvB)));
        assert_eq!(entry.matched_type(), None);
    }

    #[test]
    fn empty_table_is_empty() {
        let table = ReactionTable::<Chart>::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }
}
