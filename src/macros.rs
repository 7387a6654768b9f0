//! Macros for declaring events, states, and machines without trait
//! boilerplate.
//!
//! Everything here is sugar over the [`Event`](crate::Event),
//! [`State`](crate::State), and [`Statechart`](crate::Statechart) traits;
//! the engine never depends on it. States that override the entry or exit
//! hooks implement [`State`](crate::State) by hand instead.

/// Declare event types: plain structs implementing
/// [`Event`](crate::Event).
///
/// Accepts any number of unit or named-field struct declarations and
/// derives `Clone` and `Debug` on each, as the trait requires.
///
/// # Example
///
/// ```
/// use substate::events;
///
/// events! {
///     pub struct Play;
///     pub struct Seek {
///         pub position: u32,
///     }
/// }
///
/// let seek = Seek { position: 140 };
/// assert_eq!(seek.position, 140);
/// ```
#[macro_export]
macro_rules! events {
    () => {};
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name;

        impl $crate::Event for $name {}

        $crate::events! { $($rest)* }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($field_vis:vis $field:ident : $field_ty:ty),* $(,)?
        }
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name {
            $($field_vis $field : $field_ty),*
        }

        impl $crate::Event for $name {}

        $crate::events! { $($rest)* }
    };
}

/// Declare one state of a machine: the struct plus its
/// [`State`](crate::State) implementation.
///
/// The `machine:` section names the statechart type; `parent:`,
/// `initial:`, and `reactions:` are optional and fill in the matching
/// trait methods. A state declared without `parent:` sits at root level,
/// one without `initial:` is a leaf.
///
/// # Example
///
/// ```
/// use substate::{events, state, statechart, Machine, ReactionTable};
///
/// statechart! {
///     pub struct Lamp;
///     initial: [Dark]
/// }
///
/// events! {
///     pub struct Flip;
/// }
///
/// state! {
///     machine: [Lamp]
///     pub struct Dark;
///     reactions: [ReactionTable::new().transition::<Flip, Lit>()]
/// }
///
/// state! {
///     machine: [Lamp]
///     pub struct Lit;
///     reactions: [ReactionTable::new().transition::<Flip, Dark>()]
/// }
///
/// let mut machine = Machine::new(Lamp);
/// machine.initiate();
/// machine.process_event(Flip);
/// assert!(machine.is_in_state::<Lit>());
/// ```
#[macro_export]
macro_rules! state {
    (
        machine: [$machine:ty]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident;
        $(parent: [$parent:ty])?
        $(initial: [$inner:ty])?
        $(reactions: [$table:expr])?
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name;

        $crate::state! {
            @impl [$machine] $name
            $(parent: [$parent])?
            $(initial: [$inner])?
            $(reactions: [$table])?
        }
    };
    (
        machine: [$machine:ty]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($field_vis:vis $field:ident : $field_ty:ty),* $(,)?
        }
        $(parent: [$parent:ty])?
        $(initial: [$inner:ty])?
        $(reactions: [$table:expr])?
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name {
            $($field_vis $field : $field_ty),*
        }

        $crate::state! {
            @impl [$machine] $name
            $(parent: [$parent])?
            $(initial: [$inner])?
            $(reactions: [$table])?
        }
    };
    (
        @impl [$machine:ty] $name:ident
        $(parent: [$parent:ty])?
        $(initial: [$inner:ty])?
        $(reactions: [$table:expr])?
    ) => {
        impl $crate::State<$machine> for $name {
            $(
                fn parent() -> Option<$crate::DescriptorFn<$machine>> {
                    Some($crate::descriptor_of::<$machine, $parent>)
                }
            )?
            $(
                fn inner_initial() -> Option<$crate::DescriptorFn<$machine>> {
                    Some($crate::descriptor_of::<$machine, $inner>)
                }
            )?
            $(
                fn reactions() -> $crate::ReactionTable<$machine> {
                    $table
                }
            )?
        }
    };
}

/// Declare a statechart type: the context struct plus its
/// [`Statechart`](crate::Statechart) implementation naming the initial
/// state.
///
/// # Example
///
/// ```
/// use substate::{state, statechart, Machine};
///
/// statechart! {
///     pub struct Doorbell {
///         pub rings: u32,
///     }
///     initial: [Quiet]
/// }
///
/// state! {
///     machine: [Doorbell]
///     pub struct Quiet;
/// }
///
/// let mut machine = Machine::new(Doorbell { rings: 0 });
/// machine.initiate();
/// assert_eq!(machine.current_state_name(), Some("Quiet"));
/// ```
#[macro_export]
macro_rules! statechart {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident;
        initial: [$initial:ty]
    ) => {
        $(#[$meta])*
        $vis struct $name;

        impl $crate::Statechart for $name {
            fn initial() -> $crate::StateDescriptor<Self> {
                $crate::descriptor_of::<Self, $initial>()
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($field_vis:vis $field:ident : $field_ty:ty),* $(,)?
        }
        initial: [$initial:ty]
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($field_vis $field : $field_ty),*
        }

        impl $crate::Statechart for $name {
            fn initial() -> $crate::StateDescriptor<Self> {
                $crate::descriptor_of::<Self, $initial>()
            }
        }
    };
}
