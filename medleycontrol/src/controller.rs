//! The capability contract every media-control backend implements.
//!
//! A backend is one concrete control surface over a media application: a
//! platform media-session bridge, a vendor remote-control SDK, or the
//! combined controller itself, which re-implements this trait on top of a
//! set of other backends. Callers never know which variant they hold.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use medleymodel::{AppIdentity, CustomAction, MediaAction, PlaybackPosition, TrackMetadata};

use crate::connection::PendingConnection;
use crate::errors::Result;

/// Push callback delivering the controller whose state changed.
///
/// Each controller owns at most one subscriber at a time; subscribing again
/// replaces the previous callback.
pub type ControllerCallback = Arc<dyn Fn(Arc<dyn MediaController>) + Send + Sync>;

/// A connected media-control surface.
///
/// Every fallible method classifies failures via
/// [`ControllerError`](crate::ControllerError): `Unsupported` when this
/// backend cannot perform this exact call right now (support may depend on
/// the current playback state), anything else as a transient fault. The
/// caller reacts identically to both by trying another backend.
#[async_trait]
pub trait MediaController: Debug + Send + Sync {
    /// Stable identifier of this backend, also used to namespace the custom
    /// actions it advertises.
    fn id(&self) -> &str;

    /// Human-friendly backend name for logs.
    fn name(&self) -> &str;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn skip_to_previous(&self) -> Result<()>;

    async fn skip_to_next(&self) -> Result<()>;

    /// Seek to an absolute position within the current track.
    async fn seek_to(&self, position_ms: i64) -> Result<()>;

    /// Play an item previously returned by [`browse`](Self::browse) or
    /// [`search`](Self::search).
    async fn play_song(&self, song: &TrackMetadata) -> Result<()>;

    /// Jump to an item of the current queue, identified by its `queue_id`.
    async fn play_queue_item(&self, song: &TrackMetadata) -> Result<()>;

    async fn play_from_search(&self, query: &str) -> Result<()>;

    /// Trigger a backend-specific action previously advertised through
    /// [`custom_actions`](Self::custom_actions).
    async fn custom_action(&self, action: &CustomAction) -> Result<()>;

    /* Current state */

    async fn queue(&self) -> Result<Vec<TrackMetadata>>;

    async fn metadata(&self) -> Result<Option<TrackMetadata>>;

    async fn playback_position(&self) -> Result<PlaybackPosition>;

    async fn is_supported_action(&self, action: MediaAction) -> Result<bool>;

    async fn custom_actions(&self) -> Result<Vec<CustomAction>>;

    /// Enumerate a directory, or the backend's root when `directory` is
    /// `None`. An empty list means "nothing to show here".
    async fn browse(&self, directory: Option<&TrackMetadata>) -> Result<Vec<TrackMetadata>>;

    /// Search the backend's catalog. `None` means this backend produced no
    /// answer at all, as opposed to an empty result list.
    async fn search(&self, query: &str) -> Result<Option<Vec<TrackMetadata>>>;

    /// Subscribes to receive notice of new metadata or other status.
    ///
    /// Backends delivering pushes from their own threads must marshal the
    /// callback invocation back before touching any shared state.
    fn subscribe(&self, callback: ControllerCallback);

    /// Disconnects the backend and clears any subscribed callback.
    ///
    /// Must release resources without failing; a misbehaving backend is not
    /// allowed to block teardown of its siblings.
    async fn disconnect(&self);
}

/// Establishes connections to one kind of backend.
///
/// `connect` never blocks: it returns a [`PendingConnection`] immediately
/// and resolves it out-of-band once the handshake finishes or fails.
pub trait MediaConnector: Send + Sync {
    fn connect(&self, app: &AppIdentity) -> Arc<PendingConnection>;
}
