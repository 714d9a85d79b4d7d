//! Per-client context: pending/in-flight pipeline bookkeeping for one
//! logical connection, owned entirely by the reactor thread (`spec.md`
//! §4.7, C7).
//!
//! Message-id assignment is a client-handle concern (see
//! [`super::Context::submit`]) rather than living here: it only needs to be
//! monotonic per logical context, which an atomic counter on the handle
//! gives for free, without forcing every call to round-trip through the
//! reactor's event channel just to learn its own id.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::client::message::Message;
use crate::client::settings::HttpSettings;

pub type ContextId = u64;

/// Hook turning a per-context monotonic message counter into a wire id
/// (`spec.md` §4.7's `id_builder`). Lives alongside [`ContextId`] rather
/// than the reactor-owned [`Context`] below since it's a client-handle
/// concern; see [`super::Context::next_id`].
pub type IdBuilder = Arc<dyn Fn(u64) -> String + Send + Sync>;

pub struct Context {
    pub id: ContextId,
    settings: HttpSettings,
    pending: VecDeque<Message>,
    in_flight: usize,
}

impl Context {
    pub fn new(id: ContextId, settings: HttpSettings) -> Self {
        Context {
            id,
            settings,
            pending: VecDeque::new(),
            in_flight: 0,
        }
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    pub fn enqueue(&mut self, message: Message) {
        self.pending.push_back(message);
    }

    fn pipeline_length(&self) -> usize {
        self.settings.pipeline_length_or_default() as usize
    }

    pub fn has_capacity(&self) -> bool {
        self.in_flight < self.pipeline_length()
    }

    /// Pops the next pending message if a pipeline slot is free, marking it
    /// in-flight. First-free-slot assignment; back-pressure is just "stay in
    /// `pending`" (`spec.md` §4.7).
    pub fn try_dequeue(&mut self) -> Option<Message> {
        if self.has_capacity() {
            let message = self.pending.pop_front()?;
            self.in_flight += 1;
            Some(message)
        } else {
            None
        }
    }

    pub fn complete_one(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight
    }

    /// Drains every still-pending (not yet dispatched) message, for
    /// `DestroyContext` cancellation.
    pub fn cancel_pending(&mut self) -> Vec<Message> {
        self.pending.drain(..).collect()
    }

    /// Removes and returns every pending (not yet dispatched) message whose
    /// deadline has already passed, leaving the rest in place and in order
    /// (`spec.md` §4.7: "the reactor walks pending messages each iteration
    /// and completes with `InternalError` any whose deadline has passed").
    /// A message already sitting in a dispatched transport call is handled
    /// separately, in `spawn_transport_call`.
    pub fn take_expired_pending(&mut self) -> Vec<Message> {
        let mut expired = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.pending.len());
        for message in self.pending.drain(..) {
            match &message.deadline {
                Some(deadline) if deadline.has_passed() => expired.push(message),
                _ => remaining.push_back(message),
            }
        }
        self.pending = remaining;
        expired
    }
}
