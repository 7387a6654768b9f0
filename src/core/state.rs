//! State behavior traits, static descriptors, and the capability contexts
//! handed to user code.
//!
//! A concrete state is a plain `Default`-constructible struct implementing
//! [`State`]. Its position in the hierarchy and its reaction table are
//! static data, exposed through a [`StateDescriptor`] so the engine can
//! walk ancestor chains and build instances at runtime without knowing the
//! concrete types involved.
//!
//! User code never touches the machine directly while it runs. Reaction
//! handlers receive an [`EventCtx`], entry/exit hooks a [`HookCtx`], and
//! transition actions an [`ActionScope`]. Each type exposes exactly the
//! operations that are legal at that point, so contract violations like
//! transitioning from inside an exit hook do not compile.

use std::any::{Any, TypeId};
use std::collections::VecDeque;

use crate::core::event::{short_type_name, Event, EventRecord};
use crate::core::reaction::ReactionTable;
use crate::core::response::Response;
use crate::machine::path::PathEntry;
use crate::machine::transition::{PendingTransition, TransitionAction};

/// The outermost context of a machine: the user type that declares the
/// root initial state and receives machine-level hooks.
///
/// The implementing type doubles as shared data reachable from every
/// handler via [`EventCtx::machine_mut`], the statechart equivalent of a
/// machine-wide blackboard.
pub trait Statechart: Sized + 'static {
    /// Descriptor of the root-level initial state entered by
    /// [`Machine::initiate`](crate::Machine::initiate).
    fn initial() -> StateDescriptor<Self>;

    /// Called when an event falls through every active state unhandled.
    fn on_unhandled_event(&mut self, _event: &EventRecord) {}

    /// Called after each event finishes dispatch with the leaf active at
    /// that point and the raw routing result, before any
    /// [`Defer`](Response::Defer) is normalized for the caller.
    fn on_event_processed(
        &mut self,
        _leaf: Option<&'static str>,
        _event: &EventRecord,
        _result: Response,
    ) {
    }
}

/// Link to another state's descriptor, used for parent and inner-initial
/// declarations. Stored as a function so descriptor graphs with mutual
/// references stay lazy.
pub type DescriptorFn<M> = fn() -> StateDescriptor<M>;

/// Behavior of one state type within the machine `M`.
///
/// The default implementations describe a root-level leaf state with no
/// reactions; override the structure methods to place the state in the
/// hierarchy and give it a table.
///
/// # Example
///
/// ```rust
/// use substate::{descriptor_of, Machine, ReactionTable, State, StateDescriptor, Statechart};
/// use substate::Event;
///
/// struct Player;
///
/// impl Statechart for Player {
///     fn initial() -> StateDescriptor<Self> {
///         descriptor_of::<Self, Stopped>()
///     }
/// }
///
/// #[derive(Clone, Debug)]
/// struct Play;
/// impl Event for Play {}
///
/// #[derive(Default)]
/// struct Stopped;
///
/// impl State<Player> for Stopped {
///     fn reactions() -> ReactionTable<Player> {
///         ReactionTable::new().transition::<Play, Playing>()
///     }
/// }
///
/// #[derive(Default)]
/// struct Playing;
/// impl State<Player> for Playing {}
///
/// let mut machine = Machine::new(Player);
/// machine.initiate();
/// assert!(machine.is_in_state::<Stopped>());
/// machine.process_event(Play);
/// assert!(machine.is_in_state::<Playing>());
/// ```
pub trait State<M: Statechart>: Default + Any {
    /// Display name used in logs and diagnostics.
    fn name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Declared parent state. `None` makes this a root-level state, a
    /// direct child of the machine.
    fn parent() -> Option<DescriptorFn<M>> {
        None
    }

    /// Substate entered automatically whenever this state is entered as a
    /// transition destination or initial state. `None` makes this a leaf.
    fn inner_initial() -> Option<DescriptorFn<M>> {
        None
    }

    /// Ordered reaction table scanned when an event reaches this state.
    fn reactions() -> ReactionTable<M> {
        ReactionTable::new()
    }

    /// Runs immediately after this state joins the active path, before any
    /// inner-initial substate is constructed.
    fn on_entry(&mut self, _ctx: &mut HookCtx<'_, M>) {}

    /// Runs immediately before this state leaves the active path. The
    /// state still answers active-path queries while the hook runs.
    fn on_exit(&mut self, _ctx: &mut HookCtx<'_, M>) {}
}

/// Build the descriptor for state `S` of machine `M`.
pub fn descriptor_of<M: Statechart, S: State<M>>() -> StateDescriptor<M> {
    StateDescriptor {
        name: S::name(),
        type_id: TypeId::of::<S>(),
        parent: S::parent(),
        inner_initial: S::inner_initial(),
        construct: construct_default::<M, S>,
        reactions: S::reactions,
    }
}

fn construct_default<M: Statechart, S: State<M>>() -> Box<dyn StateInstance<M>> {
    Box::new(S::default())
}

/// Static structure of one state type: identity, hierarchy links, and the
/// means to build instances and reaction tables.
///
/// Descriptors are cheap value types; the engine re-derives them freely
/// through [`DescriptorFn`] links instead of interning them anywhere.
pub struct StateDescriptor<M: Statechart> {
    name: &'static str,
    type_id: TypeId,
    parent: Option<DescriptorFn<M>>,
    inner_initial: Option<DescriptorFn<M>>,
    construct: fn() -> Box<dyn StateInstance<M>>,
    reactions: fn() -> ReactionTable<M>,
}

impl<M: Statechart> StateDescriptor<M> {
    /// Display name of the described state.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Identity tag of the described state type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Whether this descriptor describes `S`.
    pub fn is<S: State<M>>(&self) -> bool {
        self.type_id == TypeId::of::<S>()
    }

    /// Descriptor of the declared parent, if any.
    pub fn parent(&self) -> Option<StateDescriptor<M>> {
        self.parent.map(|link| link())
    }

    /// Descriptor of the declared inner-initial substate, if any.
    pub fn inner_initial(&self) -> Option<StateDescriptor<M>> {
        self.inner_initial.map(|link| link())
    }

    pub(crate) fn construct(&self) -> Box<dyn StateInstance<M>> {
        (self.construct)()
    }

    pub(crate) fn build_table(&self) -> ReactionTable<M> {
        (self.reactions)()
    }
}

impl<M: Statechart> Clone for StateDescriptor<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: Statechart> Copy for StateDescriptor<M> {}

impl<M: Statechart> PartialEq for StateDescriptor<M> {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl<M: Statechart> std::fmt::Debug for StateDescriptor<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StateDescriptor").field(&self.name).finish()
    }
}

/// Object-safe runtime face of an active state instance.
pub(crate) trait StateInstance<M: Statechart>: Any {
    fn enter(&mut self, ctx: &mut HookCtx<'_, M>);
    fn exit(&mut self, ctx: &mut HookCtx<'_, M>);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<M: Statechart, S: State<M>> StateInstance<M> for S {
    fn enter(&mut self, ctx: &mut HookCtx<'_, M>) {
        self.on_entry(ctx);
    }

    fn exit(&mut self, ctx: &mut HookCtx<'_, M>) {
        self.on_exit(ctx);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Position of the state a context is currently built around.
#[derive(Clone, Copy)]
pub(crate) struct SlotInfo {
    pub(crate) index: usize,
    pub(crate) type_id: TypeId,
    pub(crate) name: &'static str,
}

/// Capabilities available to a reaction handler while its event is being
/// dispatched.
///
/// The context borrows the machine for the duration of one handler call,
/// which is what makes deferral and transition requests legal exactly here
/// and nowhere else. The reacting state reaches its own fields through
/// `&mut self`; `context` lookups cover its proper ancestors.
pub struct EventCtx<'a, M: Statechart> {
    pub(crate) machine: &'a mut M,
    pub(crate) outer: &'a mut [PathEntry<M>],
    pub(crate) inner: &'a [PathEntry<M>],
    pub(crate) reacting: SlotInfo,
    pub(crate) deferral_flag: &'a mut bool,
    pub(crate) event: &'a EventRecord,
    pub(crate) posted: &'a mut VecDeque<EventRecord>,
    pub(crate) pending: &'a mut Option<PendingTransition<M>>,
}

impl<'a, M: Statechart> EventCtx<'a, M> {
    /// The outermost context.
    pub fn machine(&self) -> &M {
        self.machine
    }

    /// The outermost context, mutably.
    pub fn machine_mut(&mut self) -> &mut M {
        self.machine
    }

    /// Nearest proper ancestor of type `T` on the active path.
    pub fn context<T: State<M>>(&self) -> Option<&T> {
        self.outer
            .iter()
            .rev()
            .find_map(|entry| entry.instance_any().downcast_ref())
    }

    /// Nearest proper ancestor of type `T`, mutably.
    pub fn context_mut<T: State<M>>(&mut self) -> Option<&mut T> {
        self.outer
            .iter_mut()
            .rev()
            .find_map(|entry| entry.instance_any_mut().downcast_mut())
    }

    /// Whether `T` is anywhere on the active path, the reacting state
    /// included.
    pub fn is_in_state<T: State<M>>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.reacting.type_id == id
            || self.outer.iter().any(|entry| entry.type_id() == id)
            || self.inner.iter().any(|entry| entry.type_id() == id)
    }

    /// The event currently being dispatched, in queued form.
    pub fn event(&self) -> &EventRecord {
        self.event
    }

    /// Clone `event` onto the posted queue. It is dispatched after the
    /// current event completes, never synchronously.
    pub fn post_event<E: Event>(&mut self, event: E) {
        self.posted.push_back(EventRecord::new(event));
    }

    /// Defer the event currently being dispatched: it is redelivered once
    /// this state exits. Returns [`Response::Defer`] for the handler to
    /// propagate.
    pub fn defer_event(&mut self) -> Response {
        *self.deferral_flag = true;
        Response::Defer
    }

    /// Transition to `D`, default-constructing every newly entered state.
    ///
    /// The transition runs when the handler returns, and the handler
    /// should return the [`Response::Consumed`] produced here. A
    /// transition whose destination equals the reacting state fully exits
    /// and re-enters it.
    pub fn transit<D: State<M>>(&mut self) -> Response {
        self.schedule(descriptor_of::<M, D>(), None, None)
    }

    /// Transition to `D` built from `dest` instead of its `Default`
    /// value. States entered on the way to `D` still default-construct.
    pub fn transit_to<D: State<M>>(&mut self, dest: D) -> Response {
        self.schedule(descriptor_of::<M, D>(), Some(Box::new(dest)), None)
    }

    /// Transition to `D` running `action` against the transition boundary
    /// after the exited states are destroyed and before any new state is
    /// constructed.
    pub fn transit_with<D, A>(&mut self, action: A) -> Response
    where
        D: State<M>,
        A: FnOnce(&mut ActionScope<'_, M>) + 'static,
    {
        self.schedule(descriptor_of::<M, D>(), None, Some(Box::new(action)))
    }

    pub(crate) fn schedule(
        &mut self,
        dest: StateDescriptor<M>,
        dest_value: Option<Box<dyn StateInstance<M>>>,
        action: Option<TransitionAction<M>>,
    ) -> Response {
        debug_assert!(
            self.pending.is_none(),
            "only one transition may be scheduled per reaction"
        );
        *self.pending = Some(PendingTransition {
            source_index: self.reacting.index,
            source_name: self.reacting.name,
            dest,
            dest_value,
            action,
        });
        Response::Consumed
    }
}

/// Capabilities available to `on_entry` and `on_exit` hooks.
///
/// Hooks run while the active path is mid-mutation, so they can observe
/// and post but never steer: there is no transition or deferral surface
/// here.
pub struct HookCtx<'a, M: Statechart> {
    pub(crate) machine: &'a mut M,
    pub(crate) outer: &'a mut [PathEntry<M>],
    pub(crate) own: SlotInfo,
    pub(crate) posted: &'a mut VecDeque<EventRecord>,
}

impl<'a, M: Statechart> HookCtx<'a, M> {
    /// The outermost context.
    pub fn machine(&self) -> &M {
        self.machine
    }

    /// The outermost context, mutably.
    pub fn machine_mut(&mut self) -> &mut M {
        self.machine
    }

    /// Nearest proper ancestor of type `T` on the active path.
    pub fn context<T: State<M>>(&self) -> Option<&T> {
        self.outer
            .iter()
            .rev()
            .find_map(|entry| entry.instance_any().downcast_ref())
    }

    /// Nearest proper ancestor of type `T`, mutably.
    pub fn context_mut<T: State<M>>(&mut self) -> Option<&mut T> {
        self.outer
            .iter_mut()
            .rev()
            .find_map(|entry| entry.instance_any_mut().downcast_mut())
    }

    /// Whether `T` is the hooked state or one of its ancestors. An
    /// entering state already answers `true`; an exiting one still does.
    pub fn is_in_state<T: State<M>>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.own.type_id == id || self.outer.iter().any(|entry| entry.type_id() == id)
    }

    /// Clone `event` onto the posted queue.
    pub fn post_event<E: Event>(&mut self, event: E) {
        self.posted.push_back(EventRecord::new(event));
    }
}

/// Scope handed to a transition action while the active path is unwound to
/// the transition boundary.
pub struct ActionScope<'a, M: Statechart> {
    pub(crate) machine: &'a mut M,
    pub(crate) anchor: Option<&'a mut dyn Any>,
}

impl<'a, M: Statechart> ActionScope<'a, M> {
    /// The outermost context.
    pub fn machine(&self) -> &M {
        self.machine
    }

    /// The outermost context, mutably.
    pub fn machine_mut(&mut self) -> &mut M {
        self.machine
    }

    /// The boundary state instance as a `T`, if the boundary is a state of
    /// that type rather than the machine itself.
    pub fn boundary_mut<T: State<M>>(&mut self) -> Option<&mut T> {
        self.anchor.as_mut()?.downcast_mut()
    }
}
