//! Typed notifications for downstream consumers
//!
//! The engine hands off to collaborators (e.g. an assistant runtime that
//! ingests rule content) exclusively through these events. Subscribers are
//! registered on the notifier directly; there is no global event bus, and
//! the engine never assumes a consumer exists.

use std::fmt;
use std::sync::Arc;

/// Which of the two brains an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrainSide {
    Execution,
    Quality,
}

impl BrainSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrainSide::Execution => "execution",
            BrainSide::Quality => "quality",
        }
    }
}

impl fmt::Display for BrainSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification kinds emitted by the engine.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A brain's content changed and was applied; carries the raw content.
    ContextApplied { side: BrainSide, content: String },
    /// A full activation sequence completed successfully.
    Activated,
    /// Merge mode appended lines to a brain file.
    BrainUpdated { side: BrainSide, appended: usize },
}

/// Observer of engine notifications.
pub trait SyncSubscriber: Send + Sync {
    fn on_event(&self, event: &SyncEvent);
}

impl<F> SyncSubscriber for F
where
    F: Fn(&SyncEvent) + Send + Sync,
{
    fn on_event(&self, event: &SyncEvent) {
        self(event)
    }
}

/// Subscriber registry. Events are delivered synchronously, in
/// registration order, on the emitting task.
#[derive(Clone, Default)]
pub struct SyncNotifier {
    subscribers: Vec<Arc<dyn SyncSubscriber>>,
}

impl SyncNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<S: SyncSubscriber + 'static>(&mut self, subscriber: S) {
        self.subscribers.push(Arc::new(subscriber));
    }

    pub fn emit(&self, event: SyncEvent) {
        for subscriber in &self.subscribers {
            subscriber.on_event(&event);
        }
    }
}
