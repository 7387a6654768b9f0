//! Event values and their queued, type-erased form.
//!
//! Concrete events are plain structs implementing the `Event` marker trait.
//! The engine never stores a concrete event type directly: every event that
//! enters a queue is first cloned into an [`EventRecord`], which pairs the
//! owned value with its runtime identity tag so reaction tables can match
//! it without knowing the concrete type.

use std::any::{Any, TypeId};
use std::fmt;

/// Marker trait for types dispatched through a machine.
///
/// Events carry their own payload and are cloned whenever they are deferred
/// or posted, so the caller keeps ownership of the original value.
///
/// # Example
///
/// ```rust
/// use substate::{Event, EventRecord};
///
/// #[derive(Clone, Debug)]
/// struct ShutterPressed {
///     half_press: bool,
/// }
///
/// impl Event for ShutterPressed {}
///
/// let record = EventRecord::new(ShutterPressed { half_press: true });
/// assert_eq!(record.name(), "ShutterPressed");
/// assert!(record.is::<ShutterPressed>());
/// ```
pub trait Event: Any + Clone + fmt::Debug {
    /// Short display name used in logs and diagnostics.
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Strips the module path from a fully qualified type name.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

/// Object-safe face of a queued event.
trait ErasedEvent: Any {
    fn clone_record(&self) -> EventRecord;
    fn event_type(&self) -> TypeId;
    fn event_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

impl<E: Event> ErasedEvent for E {
    fn clone_record(&self) -> EventRecord {
        EventRecord::new(self.clone())
    }

    fn event_type(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn event_name(&self) -> &'static str {
        self.name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An owned, type-erased event as stored in the deferred and posted queues
/// and handed to machine hooks.
///
/// Records compare and match by identity tag (one unique tag per concrete
/// event type), never by value.
pub struct EventRecord {
    inner: Box<dyn ErasedEvent>,
}

impl EventRecord {
    /// Wrap a concrete event into its queued form.
    pub fn new<E: Event>(event: E) -> Self {
        Self {
            inner: Box::new(event),
        }
    }

    /// Identity tag of the wrapped concrete event type.
    pub fn event_type(&self) -> TypeId {
        self.inner.event_type()
    }

    /// Display name of the wrapped event.
    pub fn name(&self) -> &'static str {
        self.inner.event_name()
    }

    /// Whether the wrapped event is an `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.event_type() == TypeId::of::<E>()
    }

    /// Borrow the wrapped event as a concrete `E`, if it is one.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }
}

impl Clone for EventRecord {
    fn clone(&self) -> Self {
        self.inner.clone_record()
    }
}

impl fmt::Debug for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventRecord").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Ping;
    impl Event for Ping {}

    #[derive(Clone, Debug, PartialEq)]
    struct Measure {
        value: u32,
    }
    impl Event for Measure {}

    #[test]
    fn record_reports_name_and_identity() {
        let record = EventRecord::new(Ping);
        assert_eq!(record.name(), "Ping");
        assert_eq!(record.event_type(), TypeId::of::<Ping>());
        assert!(record.is::<Ping>());
        assert!(!record.is::<Measure>());
    }

    #[test]
    fn record_downcasts_to_concrete_event() {
        let record = EventRecord::new(Measure { value: 7 });
        assert_eq!(record.downcast_ref::<Measure>(), Some(&Measure { value: 7 }));
        assert!(record.downcast_ref::<Ping>().is_none());
    }

    #[test]
    fn clone_produces_independent_owned_copy() {
        let record = EventRecord::new(Measure { value: 3 });
        let copy = record.clone();
        drop(record);
        assert_eq!(copy.downcast_ref::<Measure>(), Some(&Measure { value: 3 }));
        assert_eq!(copy.name(), "Measure");
    }

    #[test]
    fn debug_output_names_the_event() {
        let record = EventRecord::new(Ping);
        assert_eq!(format!("{record:?}"), "EventRecord(\"Ping\")");
    }

    #[test]
    fn short_type_name_strips_path() {
        assert_eq!(short_type_name("a::b::Event"), "Event");
        assert_eq!(short_type_name("Bare"), "Bare");
    }
}
