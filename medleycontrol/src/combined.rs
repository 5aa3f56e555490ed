//! Combined controller aggregating several backend connection attempts.
//!
//! Given a list of connectors to try, `CombinedController` connects every
//! one of them to the same application and presents the whole set as a
//! single [`MediaController`]. Connectors are supplied with the most
//! suitable one at the end of the list — a plain session bridge before a
//! vendor SDK bridge that can provide richer metadata, for instance.
//!
//! Commands fall back across backends: a backend that reports the call as
//! unsupported, or that fails transiently, is skipped in favor of the next
//! candidate, and at most one backend ever executes a command. Browse and
//! search wait a bounded time for connections to settle, then pin the
//! backend that produced a result so follow-up drill-downs and play-song
//! calls keep talking to it.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use medleymodel::{AppIdentity, CustomAction, MediaAction, PlaybackPosition, TrackMetadata};
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::connection::PendingConnection;
use crate::controller::{ControllerCallback, MediaController, MediaConnector};
use crate::errors::{ControllerError, Result};

/// Total time browse/search wait for backends to finish connecting.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_millis(5000);
/// The wait is subdivided into this many polling sleeps.
const CONNECTION_POLLS: u32 = 10;

type CallbackSlot = Arc<Mutex<Option<ControllerCallback>>>;
type StickySlot = Arc<Mutex<Option<Arc<dyn MediaController>>>>;

/// Aggregates several independently-connecting backends behind one
/// [`MediaController`] surface.
pub struct CombinedController {
    app: AppIdentity,
    /// Handles in registration order, most preferred last. Immutable after
    /// construction; only each cell's content resolves over time.
    connections: Vec<Arc<PendingConnection>>,
    /// The backend that most recently produced a browse/search result.
    /// Never cleared, only reassigned.
    sticky: StickySlot,
    browse_task: Mutex<Option<AbortHandle>>,
    search_task: Mutex<Option<AbortHandle>>,
    /// Single external subscriber; every backend event funnels into it.
    callback: CallbackSlot,
}

impl CombinedController {
    /// Starts a connection attempt per connector and wires each resulting
    /// handle into the shared subscription slot.
    pub fn new(app: AppIdentity, connectors: &[Arc<dyn MediaConnector>]) -> Self {
        let callback: CallbackSlot = Arc::new(Mutex::new(None));
        let connections: Vec<Arc<PendingConnection>> = connectors
            .iter()
            .map(|connector| {
                let pending = connector.connect(&app);
                let slot = callback.clone();
                pending.subscribe(Box::new(move |resolved| {
                    // a backend finished connecting (or failed for good)
                    if let Some(controller) = resolved {
                        notify(&slot, controller.clone());
                        let forward = slot.clone();
                        controller.subscribe(Arc::new(move |fresh| notify(&forward, fresh)));
                    }
                }));
                pending
            })
            .collect();
        Self {
            app,
            connections,
            sticky: Arc::new(Mutex::new(None)),
            browse_task: Mutex::new(None),
            search_task: Mutex::new(None),
            callback,
        }
    }

    /// True while any backend is still establishing its connection.
    pub fn is_pending(&self) -> bool {
        self.connections.iter().any(|c| c.is_pending())
    }

    /// True once at least one backend connected.
    pub fn is_connected(&self) -> bool {
        self.connections.iter().any(|c| c.controller().is_some())
    }

    /// Waits until no handle is pending anymore, up to
    /// [`CONNECTION_TIMEOUT`]. Backends resolving later are still picked up
    /// by subsequent calls.
    pub async fn wait_for_connect(&self) {
        wait_for_connections(&self.connections).await;
    }

    /// Runs the command against the first working of the connected
    /// backends, most preferred first. Unsupported and transient failures
    /// both move on to the next candidate.
    async fn with_controller<'a, F>(&self, operation: &str, f: F)
    where
        F: Fn(Arc<dyn MediaController>) -> BoxFuture<'a, Result<()>>,
    {
        for pending in self.connections.iter().rev() {
            let Some(controller) = pending.controller() else {
                continue;
            };
            let backend = controller.name().to_string();
            match f(controller).await {
                Ok(()) => break,
                Err(err) if err.is_unsupported() => {
                    debug!(operation, backend = %backend, "backend does not support this call, trying next");
                }
                Err(err) => {
                    debug!(operation, backend = %backend, error = %err, "backend failed, trying next");
                }
            }
        }
    }

    /// Returns data from the first backend that answers without error,
    /// even when the answer is empty.
    async fn from_controller<'a, T, F>(&self, operation: &str, f: F) -> Option<T>
    where
        F: Fn(Arc<dyn MediaController>) -> BoxFuture<'a, Result<T>>,
    {
        for pending in self.connections.iter().rev() {
            let Some(controller) = pending.controller() else {
                continue;
            };
            let backend = controller.name().to_string();
            match f(controller).await {
                Ok(value) => return Some(value),
                Err(err) => {
                    debug!(operation, backend = %backend, error = %err, "backend failed, trying next");
                }
            }
        }
        None
    }

    fn sticky_controller(&self) -> Option<Arc<dyn MediaController>> {
        self.sticky.lock().unwrap().clone()
    }

    /// Aborts the previous task in the slot, spawns `discovery` and stores
    /// its abort handle, all before anyone can observe a second "current"
    /// task.
    fn supersede<T>(
        slot: &Mutex<Option<AbortHandle>>,
        discovery: impl Future<Output = T> + Send + 'static,
    ) -> tokio::task::JoinHandle<T>
    where
        T: Send + 'static,
    {
        let mut slot = slot.lock().unwrap();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        let task = tokio::spawn(discovery);
        *slot = Some(task.abort_handle());
        task
    }
}

fn notify(slot: &CallbackSlot, controller: Arc<dyn MediaController>) {
    // Clone the callback out of the lock so a re-entrant subscriber cannot
    // deadlock against us.
    let callback = slot.lock().unwrap().clone();
    if let Some(callback) = callback {
        callback(controller);
    }
}

async fn wait_for_connections(connections: &[Arc<PendingConnection>]) {
    let any_pending = |connections: &[Arc<PendingConnection>]| {
        connections.iter().any(|c| c.is_pending())
    };
    if !any_pending(connections) {
        return;
    }
    for _ in 0..CONNECTION_POLLS {
        tokio::time::sleep(CONNECTION_TIMEOUT / CONNECTION_POLLS).await;
        if !any_pending(connections) {
            break;
        }
    }
}

/// Browse discovery: first backend with a non-empty listing wins and
/// becomes the sticky backend. An empty listing means "nothing here, ask
/// the next backend" — unless no backend has anything, in which case empty
/// is the answer.
async fn browse_discovery(
    connections: Vec<Arc<PendingConnection>>,
    sticky: StickySlot,
    app: AppIdentity,
    directory: Option<TrackMetadata>,
) -> Vec<TrackMetadata> {
    wait_for_connections(&connections).await;
    info!(app = %app.package_name, "finished waiting for backend connections");
    for pending in &connections {
        let Some(controller) = pending.controller() else {
            continue;
        };
        let outcome = controller.browse(directory.as_ref()).await;
        match outcome {
            Ok(results) if results.is_empty() => continue,
            Ok(results) => {
                // make play-song and drill-down browses dig through these results
                *sticky.lock().unwrap() = Some(controller);
                return results;
            }
            Err(err) => {
                debug!(backend = controller.name(), error = %err, "browse failed, trying next backend");
            }
        }
    }
    Vec::new()
}

/// Search discovery. Unlike browse this keeps going through every backend,
/// so the last one that produced an answer ends up owning the result and
/// the sticky slot.
async fn search_discovery(
    connections: Vec<Arc<PendingConnection>>,
    sticky: StickySlot,
    app: AppIdentity,
    query: String,
) -> Option<Vec<TrackMetadata>> {
    wait_for_connections(&connections).await;
    info!(app = %app.package_name, "finished waiting for backend connections");
    let mut results = None;
    for pending in &connections {
        let Some(controller) = pending.controller() else {
            continue;
        };
        let outcome = controller.search(&query).await;
        match outcome {
            Ok(Some(found)) => {
                *sticky.lock().unwrap() = Some(controller);
                results = Some(found);
            }
            Ok(None) => {}
            Err(err) => {
                debug!(backend = controller.name(), error = %err, "search failed, trying next backend");
            }
        }
    }
    results
}

#[async_trait]
impl MediaController for CombinedController {
    fn id(&self) -> &str {
        &self.app.package_name
    }

    fn name(&self) -> &str {
        &self.app.display_name
    }

    async fn play(&self) -> Result<()> {
        self.with_controller("play", |c| {
            Box::pin(async move {
                if !c.is_supported_action(MediaAction::Play).await? {
                    return Err(ControllerError::unsupported("play", c.name()));
                }
                c.play().await
            })
        })
        .await;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.with_controller("pause", |c| {
            Box::pin(async move {
                if !c.is_supported_action(MediaAction::Pause).await? {
                    return Err(ControllerError::unsupported("pause", c.name()));
                }
                c.pause().await
            })
        })
        .await;
        Ok(())
    }

    async fn skip_to_previous(&self) -> Result<()> {
        self.with_controller("skip_to_previous", |c| {
            Box::pin(async move {
                if !c.is_supported_action(MediaAction::SkipToPrevious).await? {
                    return Err(ControllerError::unsupported("skip_to_previous", c.name()));
                }
                c.skip_to_previous().await
            })
        })
        .await;
        Ok(())
    }

    async fn skip_to_next(&self) -> Result<()> {
        self.with_controller("skip_to_next", |c| {
            Box::pin(async move {
                if !c.is_supported_action(MediaAction::SkipToNext).await? {
                    return Err(ControllerError::unsupported("skip_to_next", c.name()));
                }
                c.skip_to_next().await
            })
        })
        .await;
        Ok(())
    }

    async fn seek_to(&self, position_ms: i64) -> Result<()> {
        self.with_controller("seek_to", |c| {
            Box::pin(async move {
                if !c.is_supported_action(MediaAction::SeekTo).await? {
                    return Err(ControllerError::unsupported("seek_to", c.name()));
                }
                c.seek_to(position_ms).await
            })
        })
        .await;
        Ok(())
    }

    async fn play_song(&self, song: &TrackMetadata) -> Result<()> {
        // the song came out of a browse or search, so it belongs to the
        // backend pinned by that discovery
        match self.sticky_controller() {
            Some(controller) => controller.play_song(song).await,
            None => Ok(()),
        }
    }

    async fn play_queue_item(&self, song: &TrackMetadata) -> Result<()> {
        self.with_controller("play_queue_item", |c| {
            Box::pin(async move {
                if c.queue().await?.is_empty() {
                    return Err(ControllerError::unsupported("play_queue_item", c.name()));
                }
                c.play_queue_item(song).await
            })
        })
        .await;
        Ok(())
    }

    async fn play_from_search(&self, query: &str) -> Result<()> {
        self.with_controller("play_from_search", |c| {
            Box::pin(async move {
                if !c.is_supported_action(MediaAction::PlayFromSearch).await? {
                    return Err(ControllerError::unsupported("play_from_search", c.name()));
                }
                c.play_from_search(query).await
            })
        })
        .await;
        Ok(())
    }

    async fn custom_action(&self, action: &CustomAction) -> Result<()> {
        self.with_controller("custom_action", |c| {
            Box::pin(async move {
                // only the backend currently advertising the action may run it
                if !c.custom_actions().await?.contains(action) {
                    return Err(ControllerError::unsupported("custom_action", c.name()));
                }
                c.custom_action(action).await
            })
        })
        .await;
        Ok(())
    }

    async fn queue(&self) -> Result<Vec<TrackMetadata>> {
        Ok(self
            .from_controller("get_queue", |c| Box::pin(async move { c.queue().await }))
            .await
            .unwrap_or_default())
    }

    async fn metadata(&self) -> Result<Option<TrackMetadata>> {
        Ok(self
            .from_controller("get_metadata", |c| {
                Box::pin(async move { c.metadata().await })
            })
            .await
            .flatten())
    }

    async fn playback_position(&self) -> Result<PlaybackPosition> {
        Ok(self
            .from_controller("get_position", |c| {
                Box::pin(async move { c.playback_position().await })
            })
            .await
            .unwrap_or_default())
    }

    async fn is_supported_action(&self, action: MediaAction) -> Result<bool> {
        // support is an OR across every connected backend
        for pending in &self.connections {
            if let Some(controller) = pending.controller() {
                if controller.is_supported_action(action).await.unwrap_or(false) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn custom_actions(&self) -> Result<Vec<CustomAction>> {
        Ok(self
            .from_controller("get_custom_actions", |c| {
                Box::pin(async move { c.custom_actions().await })
            })
            .await
            .unwrap_or_default())
    }

    async fn browse(&self, directory: Option<&TrackMetadata>) -> Result<Vec<TrackMetadata>> {
        // always resume drilling down through the backend the caller
        // already started browsing
        if directory.is_some() {
            if let Some(controller) = self.sticky_controller() {
                return controller.browse(directory).await;
            }
        }
        let task = Self::supersede(
            &self.browse_task,
            browse_discovery(
                self.connections.clone(),
                self.sticky.clone(),
                self.app.clone(),
                directory.cloned(),
            ),
        );
        // a superseded (aborted) discovery reports the empty default; its
        // result is never delivered
        Ok(task.await.unwrap_or_default())
    }

    async fn search(&self, query: &str) -> Result<Option<Vec<TrackMetadata>>> {
        let task = Self::supersede(
            &self.search_task,
            search_discovery(
                self.connections.clone(),
                self.sticky.clone(),
                self.app.clone(),
                query.to_string(),
            ),
        );
        Ok(task.await.ok().flatten())
    }

    fn subscribe(&self, callback: ControllerCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }

    async fn disconnect(&self) {
        self.callback.lock().unwrap().take();
        // best effort: one misbehaving backend must not block the others
        for pending in &self.connections {
            if let Some(controller) = pending.controller() {
                controller.disconnect().await;
            }
        }
    }
}

impl fmt::Debug for CombinedController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedController")
            .field("app", &self.app)
            .field("backends", &self.connections.len())
            .field("connected", &self.is_connected())
            .finish()
    }
}
