use uuid::Uuid;

/// Token returned by [`Notifier::subscribe`], used to revoke the handler later.
pub type SubscriptionId = Uuid;

type Handler<E> = Box<dyn FnMut(&E)>;

/// Synchronous publish/subscribe registry.
///
/// Handlers run in registration order on the caller's turn; nothing is buffered.
pub struct Notifier<E> {
    handlers: Vec<(SubscriptionId, Handler<E>)>,
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<E> Notifier<E> {
    /// Construct an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new handler that will receive subsequent events.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        let id = Uuid::new_v4();
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Revoke a handler, returning `false` when the token was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| *existing != id);
        self.handlers.len() != before
    }

    /// Deliver an event to all current subscribers.
    pub fn publish(&mut self, event: &E) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E> std::fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
