//! Transition planning: given the reacting state and a destination type,
//! compute which part of the active path survives and which types get
//! built.
//!
//! The boundary between the two is the least common ancestor of the
//! reacting state's own chain (the state itself included) and the
//! destination's proper ancestors. Including the source in its own chain is
//! what makes a destination inside the reacting state's subtree resolve to
//! the reacting state itself, so a drill-down never destroys it. Excluding
//! the destination from its own chain is what makes a self-transition a
//! full exit and re-entry.
//!
//! Planning is read-only; [`crate::machine::Machine`] executes the plan.

use crate::core::state::{ActionScope, StateDescriptor, StateInstance, Statechart};
use crate::machine::path::ActivePath;

/// Action run at the transition boundary, between unwind and rebuild.
pub(crate) type TransitionAction<M> = Box<dyn FnOnce(&mut ActionScope<'_, M>)>;

/// A transition requested by a reaction, executed once the handler
/// returns.
pub(crate) struct PendingTransition<M: Statechart> {
    pub(crate) source_index: usize,
    pub(crate) source_name: &'static str,
    pub(crate) dest: StateDescriptor<M>,
    pub(crate) dest_value: Option<Box<dyn StateInstance<M>>>,
    pub(crate) action: Option<TransitionAction<M>>,
}

/// The computed shape of one transition.
pub(crate) struct TransitionPlan<M: Statechart> {
    /// Active path length after the unwind; everything beyond it exits,
    /// innermost first.
    pub(crate) truncate_len: usize,
    /// Types to construct outward-in after the unwind, the destination
    /// last. The destination's inner-initial chain follows separately.
    pub(crate) rebuild: Vec<StateDescriptor<M>>,
    /// Name of the boundary state, or `None` when the boundary is the
    /// machine itself.
    pub(crate) boundary_name: Option<&'static str>,
}

/// Compute the plan for a transition from the instance at `source_index`
/// to `dest`.
pub(crate) fn plan<M: Statechart>(
    path: &ActivePath<M>,
    source_index: usize,
    dest: &StateDescriptor<M>,
) -> TransitionPlan<M> {
    // Proper ancestors of the destination, nearest first.
    let mut dest_chain = Vec::new();
    let mut cursor = dest.parent();
    while let Some(ancestor) = cursor {
        cursor = ancestor.parent();
        dest_chain.push(ancestor.type_id());
    }

    // Walk the source's chain outward, the source itself first. The first
    // hit in the destination chain is the boundary; no hit means the
    // machine is.
    let mut boundary = None;
    for index in (0..=source_index).rev() {
        let Some(id) = path.type_at(index) else {
            continue;
        };
        if dest_chain.contains(&id) {
            boundary = Some(index);
            break;
        }
    }

    let truncate_len = boundary.map_or(0, |index| index + 1);
    let boundary_type = boundary.and_then(|index| path.type_at(index));

    // Destination-side rebuild list, collected inward-out then reversed.
    let mut rebuild = vec![*dest];
    let mut cursor = dest.parent();
    while let Some(ancestor) = cursor {
        if Some(ancestor.type_id()) == boundary_type {
            break;
        }
        cursor = ancestor.parent();
        rebuild.push(ancestor);
    }
    rebuild.reverse();

    TransitionPlan {
        truncate_len,
        rebuild,
        boundary_name: boundary.and_then(|index| path.name_at(index)),
    }
}
