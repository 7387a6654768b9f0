//! Opt-in structural checks for a statechart definition.
//!
//! Dispatch itself never validates anything; a malformed definition is a
//! bug in the statechart author's code, not a runtime condition. This
//! module exists for tests and startup assertions that want the mistakes
//! caught eagerly with a readable error instead of as misrouted events.

use std::any::TypeId;

use thiserror::Error;

use crate::core::state::{DescriptorFn, Statechart};

/// Definition mistakes reported by [`validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Following parent links from `state` revisits `via` instead of
    /// terminating at the machine root.
    #[error("Parent chain of '{state}' loops back through '{via}'")]
    UnrootedParentChain {
        state: &'static str,
        via: &'static str,
    },

    /// The declared inner-initial substate does not name the declaring
    /// state as its parent.
    #[error("Inner initial '{inner}' of '{state}' does not declare '{state}' as its parent")]
    MismatchedInnerInitial {
        state: &'static str,
        inner: &'static str,
    },

    /// Two reaction entries of one state match the same event type;
    /// tables are contracted to at most one entry per event.
    #[error("State '{state}' declares more than one reaction for '{event}'")]
    OverlappingReactions {
        state: &'static str,
        event: &'static str,
    },
}

/// Check every state in `states` for structural definition mistakes.
///
/// Pass one [`DescriptorFn`] per state of the machine; the first problem
/// found is returned. A clean result means parent chains are rooted,
/// inner-initial links point back at their composites, and no reaction
/// table shadows one of its own entries.
///
/// ```rust
/// use substate::{descriptor_of, validate, State, StateDescriptor, Statechart};
///
/// struct Chart;
///
/// impl Statechart for Chart {
///     fn initial() -> StateDescriptor<Self> {
///         descriptor_of::<Self, Idle>()
///     }
/// }
///
/// #[derive(Default)]
/// struct Idle;
/// impl State<Chart> for Idle {}
///
/// assert!(validate::<Chart>(&[descriptor_of::<Chart, Idle>]).is_ok());
/// ```
pub fn validate<M: Statechart>(states: &[DescriptorFn<M>]) -> Result<(), DefinitionError> {
    for link in states {
        let descriptor = link();

        // Parent chain must terminate at the machine.
        let mut seen = vec![descriptor.type_id()];
        let mut cursor = descriptor.parent();
        while let Some(ancestor) = cursor {
            if seen.contains(&ancestor.type_id()) {
                return Err(DefinitionError::UnrootedParentChain {
                    state: descriptor.name(),
                    via: ancestor.name(),
                });
            }
            seen.push(ancestor.type_id());
            cursor = ancestor.parent();
        }

        // Entering the composite must be able to drill into the declared
        // substate.
        if let Some(inner) = descriptor.inner_initial() {
            let points_back = inner
                .parent()
                .is_some_and(|parent| parent.type_id() == descriptor.type_id());
            if !points_back {
                return Err(DefinitionError::MismatchedInnerInitial {
                    state: descriptor.name(),
                    inner: inner.name(),
                });
            }
        }

        // At most one entry per event type, and at most one match-all.
        let table = descriptor.build_table();
        let mut matched: Vec<Option<TypeId>> = Vec::with_capacity(table.len());
        for entry in table.entries() {
            let key = entry.matched_type();
            if matched.contains(&key) {
                return Err(DefinitionError::OverlappingReactions {
                    state: descriptor.name(),
                    event: entry.event_name(),
                });
            }
            matched.push(key);
        }
    }
    Ok(())
}
