//! The machine: owner of the active path, the two event queues, and the
//! run-to-completion event loop.

pub(crate) mod path;
pub(crate) mod transition;

use std::any::TypeId;
use std::collections::VecDeque;

use log::{debug, trace};

use crate::core::event::{Event, EventRecord};
use crate::core::response::Response;
use crate::core::state::{
    ActionScope, EventCtx, HookCtx, SlotInfo, State, StateDescriptor, StateInstance, Statechart,
};
use path::{ActivePath, PathEntry};
use transition::PendingTransition;

/// A running hierarchical state machine over the statechart `M`.
///
/// The machine owns the root-to-leaf chain of active state instances and
/// the deferred and posted event queues. All work happens inside
/// [`process_event`](Machine::process_event): the event is offered to the
/// leaf, climbs the active chain until some state claims it, any requested
/// transition runs, and every event queued along the way is drained before
/// the call returns.
///
/// A fresh machine is terminated; call [`initiate`](Machine::initiate)
/// before dispatching events.
pub struct Machine<M: Statechart> {
    context: M,
    path: ActivePath<M>,
    deferred: VecDeque<EventRecord>,
    posted: VecDeque<EventRecord>,
}

impl<M: Statechart> Machine<M> {
    /// Create a terminated machine around its outermost context value.
    pub fn new(context: M) -> Self {
        Self {
            context,
            path: ActivePath::new(),
            deferred: VecDeque::new(),
            posted: VecDeque::new(),
        }
    }

    /// The outermost context.
    pub fn context(&self) -> &M {
        &self.context
    }

    /// The outermost context, mutably.
    pub fn context_mut(&mut self) -> &mut M {
        &mut self.context
    }

    /// Tear down any current state hierarchy and enter the declared
    /// initial state, drilling into inner-initial substates down to a
    /// leaf.
    pub fn initiate(&mut self) {
        self.terminate();
        debug!("initiate");
        let mut next = Some(M::initial());
        while let Some(descriptor) = next {
            self.push_state(descriptor, None);
            next = descriptor.inner_initial();
        }
    }

    /// Exit every active state, innermost first, and drop all queued
    /// events. Idempotent.
    pub fn terminate(&mut self) {
        if !self.path.is_empty() {
            debug!("terminate");
        }
        self.unwind_to(0);
        self.deferred.clear();
        self.posted.clear();
    }

    /// Dispatch `event` to the current leaf and run to completion.
    ///
    /// Events posted while handling `event` are dispatched in FIFO order
    /// before this returns, as are deferred events released by states that
    /// exited. The returned response is the originally dispatched event's
    /// own outcome; a deferred event reports
    /// [`Consumed`](Response::Consumed). On a terminated machine the event
    /// falls through as [`Forward`](Response::Forward).
    pub fn process_event<E: Event>(&mut self, event: E) -> Response {
        let result = self.dispatch(EventRecord::new(event));
        while let Some(next) = self.posted.pop_front() {
            self.dispatch(next);
        }
        result
    }

    /// Clone `event` onto the posted queue without dispatching anything.
    /// The queue drains on the next [`process_event`](Machine::process_event).
    pub fn post_event<E: Event>(&mut self, event: E) {
        let record = EventRecord::new(event);
        trace!("post {}", record.name());
        self.posted.push_back(record);
    }

    /// Whether a state of type `T` is anywhere on the active path.
    pub fn is_in_state<T: State<M>>(&self) -> bool {
        self.path.contains_type(TypeId::of::<T>())
    }

    /// Borrow the active instance of type `T`, if one is on the path.
    pub fn state_ref<T: State<M>>(&self) -> Option<&T> {
        self.path
            .entries()
            .iter()
            .find_map(|entry| entry.instance_any().downcast_ref())
    }

    /// Name of the current leaf state, or `None` when terminated.
    pub fn current_state_name(&self) -> Option<&'static str> {
        self.path.leaf_name()
    }

    /// Names of every active state, root to leaf.
    pub fn active_state_names(&self) -> Vec<&'static str> {
        self.path.entries().iter().map(|entry| entry.name()).collect()
    }

    /// Number of events sitting in the posted and deferred queues.
    pub fn queued_event_count(&self) -> usize {
        self.posted.len() + self.deferred.len()
    }

    /// Offer one event to the active chain, leaf first, and settle the
    /// outcome: run a requested transition, queue a deferral, or report
    /// the fall-through.
    fn dispatch(&mut self, record: EventRecord) -> Response {
        trace!(
            "dispatch {} to {}",
            record.name(),
            self.path.leaf_name().unwrap_or("<terminated>")
        );
        let mut pending: Option<PendingTransition<M>> = None;
        let mut raw = Response::Forward;

        'climb: for index in (0..self.path.len()).rev() {
            let (outer, rest) = self.path.entries_mut().split_at_mut(index);
            let Some((entry, inner)) = rest.split_first_mut() else {
                break;
            };
            let inner: &[PathEntry<M>] = inner;
            let reacting = SlotInfo {
                index,
                type_id: entry.type_id(),
                name: entry.name(),
            };
            let (instance, table, deferral_flag) = entry.dispatch_parts();
            let mut ctx = EventCtx {
                machine: &mut self.context,
                outer,
                inner,
                reacting,
                deferral_flag,
                event: &record,
                posted: &mut self.posted,
                pending: &mut pending,
            };

            let mut scan = Response::NoReaction;
            for reaction in table.entries() {
                if !reaction.matches(&record) {
                    continue;
                }
                scan = reaction.fire(instance.as_any_mut(), &record, &mut ctx);
                if scan != Response::NoReaction {
                    break;
                }
            }

            match scan {
                // An exhausted table and an explicit Forward both hand the
                // event to the parent.
                Response::NoReaction | Response::Forward => continue 'climb,
                outcome => {
                    raw = outcome;
                    break 'climb;
                }
            }
        }

        if let Some(requested) = pending.take() {
            self.execute_transition(requested);
        }
        if raw == Response::Defer {
            debug!("deferred {}", record.name());
            self.deferred.push_back(record.clone());
        }
        if raw == Response::Forward {
            debug!("unhandled {}", record.name());
            self.context.on_unhandled_event(&record);
        }
        self.context
            .on_event_processed(self.path.leaf_name(), &record, raw);

        if raw == Response::Defer {
            Response::Consumed
        } else {
            raw
        }
    }

    /// Unwind to the boundary, run the action, rebuild down to the
    /// destination and through its inner-initial chain.
    fn execute_transition(&mut self, requested: PendingTransition<M>) {
        let PendingTransition {
            source_index,
            source_name,
            dest,
            dest_value,
            action,
        } = requested;
        let plan = transition::plan(&self.path, source_index, &dest);
        trace!(
            "transit {} -> {} across {}",
            source_name,
            dest.name(),
            plan.boundary_name.unwrap_or("<machine>")
        );

        self.unwind_to(plan.truncate_len);

        if let Some(action) = action {
            let mut scope = ActionScope {
                machine: &mut self.context,
                anchor: self.path.leaf_instance_any_mut(),
            };
            action(&mut scope);
        }

        let Some((last, shallow)) = plan.rebuild.split_last() else {
            return;
        };
        for descriptor in shallow {
            self.push_state(*descriptor, None);
        }
        self.push_state(*last, dest_value);
        let mut next = last.inner_initial();
        while let Some(descriptor) = next {
            self.push_state(descriptor, None);
            next = descriptor.inner_initial();
        }
    }

    /// Construct a state at the tail of the path and run its entry hook.
    fn push_state(
        &mut self,
        descriptor: StateDescriptor<M>,
        value: Option<Box<dyn StateInstance<M>>>,
    ) {
        self.path.push(PathEntry::build(descriptor, value));
        trace!("enter {}", descriptor.name());
        let index = self.path.len() - 1;
        let (outer, rest) = self.path.entries_mut().split_at_mut(index);
        let Some((entry, _)) = rest.split_first_mut() else {
            return;
        };
        let own = SlotInfo {
            index,
            type_id: entry.type_id(),
            name: entry.name(),
        };
        let mut ctx = HookCtx {
            machine: &mut self.context,
            outer,
            own,
            posted: &mut self.posted,
        };
        entry.instance_mut().enter(&mut ctx);
    }

    /// Pop states down to `len`, running exit hooks innermost first and
    /// releasing the deferred queue when a deferring state goes.
    fn unwind_to(&mut self, len: usize) {
        while self.path.len() > len {
            let Some(mut top) = self.path.pop() else {
                break;
            };
            let own = SlotInfo {
                index: self.path.len(),
                type_id: top.type_id(),
                name: top.name(),
            };
            let mut ctx = HookCtx {
                machine: &mut self.context,
                outer: self.path.entries_mut(),
                own,
                posted: &mut self.posted,
            };
            top.instance_mut().exit(&mut ctx);
            trace!("exit {}", own.name);
            if top.has_deferral() {
                self.release_deferred();
            }
        }
    }

    /// Move the deferred queue to the front of the posted queue so the
    /// released events are redelivered before anything posted later, in
    /// their original order.
    fn release_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        debug!("release {} deferred event(s)", self.deferred.len());
        for record in self.deferred.drain(..).rev() {
            self.posted.push_front(record);
        }
    }
}

impl<M: Statechart> Drop for Machine<M> {
    fn drop(&mut self) {
        self.terminate();
    }
}
