//! Substate: a hierarchical state machine engine
//!
//! Substate runs statecharts in which states nest: the machine is always in
//! one root-to-leaf chain of states, events climb that chain until a state
//! claims them, and transitions exit and re-enter exactly the states below
//! the least common ancestor of source and destination. States are plain
//! structs owning their own data, constructed on entry and dropped on exit;
//! every event dispatched while one is being handled is queued and drained
//! before control returns to the caller.
//!
//! # Core Concepts
//!
//! - **Statechart**: the user context type declaring the root initial state
//!   and receiving machine-level hooks
//! - **State**: `Default`-constructible structs arranged in a tree via
//!   declared parents and inner-initial substates
//! - **Reactions**: ordered per-state tables matching events by type, with
//!   handlers, direct transitions, and deferrals
//! - **Deferral**: events parked until the deferring state exits, then
//!   redelivered ahead of anything posted later
//!
//! # Example
//!
//! ```rust
//! use substate::{
//!     descriptor_of, DescriptorFn, Event, Machine, ReactionTable, State, StateDescriptor,
//!     Statechart,
//! };
//!
//! struct CdPlayer;
//!
//! impl Statechart for CdPlayer {
//!     fn initial() -> StateDescriptor<Self> {
//!         descriptor_of::<Self, Stopped>()
//!     }
//! }
//!
//! #[derive(Clone, Debug)]
//! struct Play;
//! impl Event for Play {}
//!
//! #[derive(Clone, Debug)]
//! struct Stop;
//! impl Event for Stop {}
//!
//! #[derive(Default)]
//! struct Stopped;
//!
//! impl State<CdPlayer> for Stopped {
//!     fn reactions() -> ReactionTable<CdPlayer> {
//!         ReactionTable::new().transition::<Play, Playing>()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Playing;
//!
//! impl State<CdPlayer> for Playing {
//!     fn inner_initial() -> Option<DescriptorFn<CdPlayer>> {
//!         Some(descriptor_of::<CdPlayer, FirstTrack>)
//!     }
//!     fn reactions() -> ReactionTable<CdPlayer> {
//!         ReactionTable::new().transition::<Stop, Stopped>()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct FirstTrack;
//!
//! impl State<CdPlayer> for FirstTrack {
//!     fn parent() -> Option<DescriptorFn<CdPlayer>> {
//!         Some(descriptor_of::<CdPlayer, Playing>)
//!     }
//! }
//!
//! let mut machine = Machine::new(CdPlayer);
//! machine.initiate();
//! assert!(machine.is_in_state::<Stopped>());
//!
//! machine.process_event(Play);
//! assert_eq!(machine.active_state_names(), vec!["Playing", "FirstTrack"]);
//!
//! // Stop is claimed by Playing even though FirstTrack is the leaf.
//! machine.process_event(Stop);
//! assert!(machine.is_in_state::<Stopped>());
//! ```

pub mod core;
pub mod machine;
pub mod validate;

mod macros;

// Re-export commonly used types
pub use crate::core::{
    descriptor_of, ActionScope, DescriptorFn, Event, EventCtx, EventRecord, HookCtx, IntoResponse,
    ReactionTable, Response, State, StateDescriptor, Statechart,
};
pub use crate::machine::Machine;
pub use crate::validate::{validate, DefinitionError};
