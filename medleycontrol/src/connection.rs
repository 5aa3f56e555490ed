//! One-shot observable cell for an in-progress backend connection.

use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::controller::MediaController;

/// Lifecycle of a connection attempt.
///
/// The cell starts [`Pending`](ConnectionState::Pending) and transitions
/// exactly once, to either a live controller or a terminal failure. It
/// never transitions again.
#[derive(Debug, Clone)]
pub enum ConnectionState {
    Pending,
    Connected(Arc<dyn MediaController>),
    Failed,
}

/// Callback handed to [`PendingConnection::subscribe`], invoked exactly once
/// with the connected controller, or `None` when the attempt failed.
pub type ResolveCallback = Box<dyn FnOnce(Option<Arc<dyn MediaController>>) + Send>;

struct Inner {
    state: ConnectionState,
    waiters: Vec<ResolveCallback>,
}

/// Handle to a connection attempt started by a
/// [`MediaConnector`](crate::MediaConnector).
///
/// The connector that created the handle owns the transition; everyone else
/// only observes it. Subscribed callbacks fire exactly once, on resolution
/// (immediately, when subscribing to an already-resolved handle).
pub struct PendingConnection {
    inner: Mutex<Inner>,
}

impl PendingConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                state: ConnectionState::Pending,
                waiters: Vec::new(),
            }),
        })
    }

    /// A handle born resolved, for connectors that can hand out a live
    /// controller synchronously.
    pub fn connected(controller: Arc<dyn MediaController>) -> Arc<Self> {
        let handle = Self::new();
        handle.resolve(controller);
        handle
    }

    /// A handle born failed.
    pub fn failed() -> Arc<Self> {
        let handle = Self::new();
        handle.fail();
        handle
    }

    /// Resolves the cell to a live controller. Ignored if already resolved.
    pub fn resolve(&self, controller: Arc<dyn MediaController>) {
        self.transition(ConnectionState::Connected(controller));
    }

    /// Resolves the cell to the terminal failed state. Ignored if already
    /// resolved.
    pub fn fail(&self) {
        self.transition(ConnectionState::Failed);
    }

    fn transition(&self, next: ConnectionState) {
        let (value, waiters) = {
            let mut inner = self.inner.lock().unwrap();
            if !matches!(inner.state, ConnectionState::Pending) {
                warn!("ignoring second resolution of a pending connection");
                return;
            }
            let value = match &next {
                ConnectionState::Connected(controller) => Some(controller.clone()),
                _ => None,
            };
            inner.state = next;
            (value, std::mem::take(&mut inner.waiters))
        };
        // Callbacks run outside the lock; they may call back into this cell.
        for waiter in waiters {
            waiter(value.clone());
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.inner.lock().unwrap().state, ConnectionState::Pending)
    }

    /// The connected controller, if the cell resolved successfully.
    pub fn controller(&self) -> Option<Arc<dyn MediaController>> {
        match &self.inner.lock().unwrap().state {
            ConnectionState::Connected(controller) => Some(controller.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().unwrap().state.clone()
    }

    /// Registers a callback invoked exactly once when the cell resolves.
    pub fn subscribe(&self, callback: ResolveCallback) {
        let value = {
            let mut inner = self.inner.lock().unwrap();
            match &inner.state {
                ConnectionState::Pending => {
                    inner.waiters.push(callback);
                    return;
                }
                ConnectionState::Connected(controller) => Some(controller.clone()),
                ConnectionState::Failed => None,
            }
        };
        callback(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use async_trait::async_trait;
    use medleymodel::{CustomAction, MediaAction, PlaybackPosition, TrackMetadata};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct NullController;

    #[async_trait]
    impl MediaController for NullController {
        fn id(&self) -> &str {
            "null"
        }
        fn name(&self) -> &str {
            "Null"
        }
        async fn play(&self) -> Result<()> {
            Ok(())
        }
        async fn pause(&self) -> Result<()> {
            Ok(())
        }
        async fn skip_to_previous(&self) -> Result<()> {
            Ok(())
        }
        async fn skip_to_next(&self) -> Result<()> {
            Ok(())
        }
        async fn seek_to(&self, _position_ms: i64) -> Result<()> {
            Ok(())
        }
        async fn play_song(&self, _song: &TrackMetadata) -> Result<()> {
            Ok(())
        }
        async fn play_queue_item(&self, _song: &TrackMetadata) -> Result<()> {
            Ok(())
        }
        async fn play_from_search(&self, _query: &str) -> Result<()> {
            Ok(())
        }
        async fn custom_action(&self, _action: &CustomAction) -> Result<()> {
            Ok(())
        }
        async fn queue(&self) -> Result<Vec<TrackMetadata>> {
            Ok(Vec::new())
        }
        async fn metadata(&self) -> Result<Option<TrackMetadata>> {
            Ok(None)
        }
        async fn playback_position(&self) -> Result<PlaybackPosition> {
            Ok(PlaybackPosition::default())
        }
        async fn is_supported_action(&self, _action: MediaAction) -> Result<bool> {
            Ok(false)
        }
        async fn custom_actions(&self) -> Result<Vec<CustomAction>> {
            Ok(Vec::new())
        }
        async fn browse(&self, _directory: Option<&TrackMetadata>) -> Result<Vec<TrackMetadata>> {
            Ok(Vec::new())
        }
        async fn search(&self, _query: &str) -> Result<Option<Vec<TrackMetadata>>> {
            Ok(None)
        }
        fn subscribe(&self, _callback: crate::ControllerCallback) {}
        async fn disconnect(&self) {}
    }

    #[test]
    fn subscriber_fires_once_on_resolution() {
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = PendingConnection::new();
        assert!(handle.is_pending());

        let counter = fired.clone();
        handle.subscribe(Box::new(move |controller| {
            assert!(controller.is_some());
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        handle.resolve(Arc::new(NullController));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!handle.is_pending());
        assert!(handle.controller().is_some());
    }

    #[test]
    fn late_subscriber_fires_immediately() {
        let handle = PendingConnection::connected(Arc::new(NullController));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        handle.subscribe(Box::new(move |controller| {
            assert!(controller.is_some());
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn second_resolution_is_ignored() {
        let handle = PendingConnection::new();
        handle.fail();
        handle.resolve(Arc::new(NullController));
        assert!(handle.controller().is_none());
        assert!(matches!(handle.state(), ConnectionState::Failed));
    }

    #[test]
    fn failed_handle_notifies_with_absence() {
        let handle = PendingConnection::failed();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        handle.subscribe(Box::new(move |controller| {
            assert!(controller.is_none());
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!handle.is_pending());
    }
}
