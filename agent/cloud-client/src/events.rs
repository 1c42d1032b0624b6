/*!

Agent lifecycle events. The fleet manager publishes them through an [`EventSource`]; the engine
subscribes an [`AgentListener`] to them explicitly and unsubscribes on shutdown.

!*/

use cloud_model::AgentDescription;
use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Identifies one subscription on an [`EventSource`].
pub type ListenerId = u64;

/// Receives agent lifecycle events.
#[async_trait::async_trait]
pub trait AgentListener: Send + Sync {
    /// The authorization or enabled state of `agent` changed. `agent` carries the new state, the
    /// flags carry the old one.
    async fn agent_authorized(
        &self,
        agent: &AgentDescription,
        was_enabled: bool,
        was_authorized: bool,
    );

    /// `agent` registered with the server, possibly while running the build `build_id`.
    async fn agent_registered(&self, _agent: &AgentDescription, _build_id: Option<u64>) {}
}

/// Something that agent listeners can subscribe to.
pub trait EventSource: Send + Sync {
    fn subscribe(&self, name: &str, listener: Arc<dyn AgentListener>) -> ListenerId;

    /// Returns false if `id` was not subscribed.
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

struct Subscription {
    id: ListenerId,
    name: String,
    listener: Arc<dyn AgentListener>,
}

/// An [`EventSource`] that delivers each event to every subscribed listener in subscription order.
#[derive(Default)]
pub struct EventDispatcher {
    next_id: AtomicU64,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub async fn agent_authorized(
        &self,
        agent: &AgentDescription,
        was_enabled: bool,
        was_authorized: bool,
    ) {
        for (name, listener) in self.listeners() {
            trace!("Sending authorization of agent {} to '{}'", agent.id, name);
            listener
                .agent_authorized(agent, was_enabled, was_authorized)
                .await;
        }
    }

    pub async fn agent_registered(&self, agent: &AgentDescription, build_id: Option<u64>) {
        for (name, listener) in self.listeners() {
            trace!("Sending registration of agent {} to '{}'", agent.id, name);
            listener.agent_registered(agent, build_id).await;
        }
    }

    /// Listeners are cloned out so that none of them runs under the lock.
    fn listeners(&self) -> Vec<(String, Arc<dyn AgentListener>)> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| (s.name.clone(), Arc::clone(&s.listener)))
            .collect()
    }
}

impl EventSource for EventDispatcher {
    fn subscribe(&self, name: &str, listener: Arc<dyn AgentListener>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                name: name.to_string(),
                listener,
            });
        debug!("Subscribed listener '{}' as {}", name, id);
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        before != subscriptions.len()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(u64, bool)>>,
    }

    #[async_trait::async_trait]
    impl AgentListener for Recorder {
        async fn agent_authorized(
            &self,
            agent: &AgentDescription,
            _was_enabled: bool,
            was_authorized: bool,
        ) {
            self.seen.lock().unwrap().push((agent.id, was_authorized));
        }
    }

    #[tokio::test]
    async fn delivers_until_unsubscribed() {
        let dispatcher = EventDispatcher::new();
        let recorder = Arc::new(Recorder::default());
        let id = dispatcher.subscribe("recorder", recorder.clone());
        assert_eq!(dispatcher.listener_count(), 1);

        let agent = AgentDescription {
            id: 3,
            ..Default::default()
        };
        dispatcher.agent_authorized(&agent, true, false).await;
        dispatcher.agent_registered(&agent, None).await;
        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));
        dispatcher.agent_authorized(&agent, true, true).await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec![(3, false)]);
    }
}
