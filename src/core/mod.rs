//! Core building blocks of the engine:
//! - Events and their queued form via the `Event` trait and `EventRecord`
//! - Routing outcomes via `Response`
//! - State behavior and structure via the `State` trait and `StateDescriptor`
//! - Per-state reaction tables via `ReactionTable`
//!
//! Everything here is declarative data and per-call capability surfaces;
//! the mutation of the active path lives in [`crate::machine`].

pub(crate) mod event;
pub(crate) mod reaction;
pub(crate) mod response;
pub(crate) mod state;

pub use event::{Event, EventRecord};
pub use reaction::{ReactionEntry, ReactionTable};
pub use response::{IntoResponse, Response};
pub use state::{
    descriptor_of, ActionScope, DescriptorFn, EventCtx, HookCtx, State, StateDescriptor, Statechart,
};
