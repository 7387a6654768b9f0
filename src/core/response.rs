//! Routing outcomes for dispatched events.

/// Outcome of offering one event to one state, and ultimately of a whole
/// dispatch.
///
/// Reaction handlers return a `Response` (or `()`, see [`IntoResponse`]) to
/// steer routing. The machine reports the final outcome of the originally
/// dispatched event from [`Machine::process_event`](crate::Machine::process_event).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// The scanned table entry did not claim the event; keep scanning the
    /// same table.
    NoReaction,

    /// Pass the event outward to the parent state. From the outermost
    /// state this is the final result of an unhandled event.
    Forward,

    /// Drop the event without handling it and stop climbing.
    Discard,

    /// Queue the event for redelivery once the deferring state exits.
    /// Reported to the caller as [`Consumed`](Response::Consumed).
    Defer,

    /// The event was fully handled.
    Consumed,
}

/// Conversion applied to reaction handler return values.
///
/// Handlers that only perform side effects can return `()`, which counts as
/// consuming the event. Handlers that steer routing return a [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        Response::Consumed
    }
}
