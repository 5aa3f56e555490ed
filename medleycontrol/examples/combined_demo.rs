// examples/combined_demo.rs
//
// End-to-end demo of the `CombinedController` façade:
//  - two scripted in-memory backends connecting with different delays
//  - command fallback (the session bridge cannot browse, the vendor SDK can)
//  - timeout-bounded connection waiting before discovery
//  - sticky-backend continuation for drill-down browsing and play-song
//
// Run (from the medleycontrol crate root):
//   cargo run --example combined_demo

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use medleycontrol::{
    CombinedController, ControllerCallback, MediaConnector, MediaController, PendingConnection,
    Result,
};
use medleymodel::{AppIdentity, CustomAction, MediaAction, PlaybackPosition, TrackMetadata};
use tracing::info;

/// In-memory backend scripted with a fixed capability set and library.
struct ScriptedBackend {
    id: &'static str,
    supported: Vec<MediaAction>,
    library: Vec<TrackMetadata>,
    callback: Mutex<Option<ControllerCallback>>,
}

impl ScriptedBackend {
    fn new(id: &'static str, supported: Vec<MediaAction>, library: Vec<TrackMetadata>) -> Arc<Self> {
        Arc::new(Self {
            id,
            supported,
            library,
            callback: Mutex::new(None),
        })
    }
}

impl fmt::Debug for ScriptedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedBackend").field("id", &self.id).finish()
    }
}

#[async_trait]
impl MediaController for ScriptedBackend {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        self.id
    }

    async fn play(&self) -> Result<()> {
        info!(backend = self.id, "play");
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        info!(backend = self.id, "pause");
        Ok(())
    }

    async fn skip_to_previous(&self) -> Result<()> {
        info!(backend = self.id, "skip_to_previous");
        Ok(())
    }

    async fn skip_to_next(&self) -> Result<()> {
        info!(backend = self.id, "skip_to_next");
        Ok(())
    }

    async fn seek_to(&self, position_ms: i64) -> Result<()> {
        info!(backend = self.id, position_ms, "seek_to");
        Ok(())
    }

    async fn play_song(&self, song: &TrackMetadata) -> Result<()> {
        info!(backend = self.id, title = song.title.as_deref(), "play_song");
        Ok(())
    }

    async fn play_queue_item(&self, song: &TrackMetadata) -> Result<()> {
        info!(backend = self.id, queue_id = song.queue_id, "play_queue_item");
        Ok(())
    }

    async fn play_from_search(&self, query: &str) -> Result<()> {
        info!(backend = self.id, query, "play_from_search");
        Ok(())
    }

    async fn custom_action(&self, action: &CustomAction) -> Result<()> {
        info!(backend = self.id, action = action.action.as_str(), "custom_action");
        Ok(())
    }

    async fn queue(&self) -> Result<Vec<TrackMetadata>> {
        Ok(Vec::new())
    }

    async fn metadata(&self) -> Result<Option<TrackMetadata>> {
        Ok(self.library.first().cloned())
    }

    async fn playback_position(&self) -> Result<PlaybackPosition> {
        Ok(PlaybackPosition::new(false, 1_700_000_000_000, 42_000, 215_000))
    }

    async fn is_supported_action(&self, action: MediaAction) -> Result<bool> {
        Ok(self.supported.contains(&action))
    }

    async fn custom_actions(&self) -> Result<Vec<CustomAction>> {
        Ok(vec![CustomAction::new(self.id, "SHUFFLE").with_name("Shuffle")])
    }

    async fn browse(&self, directory: Option<&TrackMetadata>) -> Result<Vec<TrackMetadata>> {
        match directory {
            None => Ok(self.library.clone()),
            Some(dir) => {
                let parent = dir.media_id.clone().unwrap_or_default();
                Ok((0..3)
                    .map(|i| TrackMetadata::song(format!("{parent}/track-{i}"), format!("Track {i}")))
                    .collect())
            }
        }
    }

    async fn search(&self, query: &str) -> Result<Option<Vec<TrackMetadata>>> {
        if self.library.is_empty() {
            return Ok(None);
        }
        let query = query.to_ascii_lowercase();
        Ok(Some(
            self.library
                .iter()
                .filter(|t| {
                    t.title
                        .as_deref()
                        .is_some_and(|title| title.to_ascii_lowercase().contains(&query))
                })
                .cloned()
                .collect(),
        ))
    }

    fn subscribe(&self, callback: ControllerCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }

    async fn disconnect(&self) {
        info!(backend = self.id, "disconnect");
        self.callback.lock().unwrap().take();
    }
}

/// Connector resolving its handle after a scripted delay.
struct DelayedConnector {
    delay: Duration,
    backend: Arc<ScriptedBackend>,
}

impl MediaConnector for DelayedConnector {
    fn connect(&self, app: &AppIdentity) -> Arc<PendingConnection> {
        let pending = PendingConnection::new();
        let handle = pending.clone();
        let backend = self.backend.clone();
        let delay = self.delay;
        info!(app = %app.package_name, backend = backend.id, ?delay, "connection attempt started");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handle.resolve(backend);
        });
        pending
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // The session bridge answers transport commands but has no catalog; the
    // vendor SDK connects slower but can browse and search. Most preferred
    // connector goes last.
    let session = ScriptedBackend::new(
        "session-bridge",
        vec![MediaAction::Play, MediaAction::Pause, MediaAction::SeekTo],
        Vec::new(),
    );
    let vendor = ScriptedBackend::new(
        "vendor-sdk",
        vec![MediaAction::Play, MediaAction::Browse, MediaAction::Search],
        vec![
            TrackMetadata::folder("albums", "Albums"),
            TrackMetadata::song("aurora", "Aurora"),
            TrackMetadata::song("meridian", "Meridian"),
        ],
    );

    let connectors: Vec<Arc<dyn MediaConnector>> = vec![
        Arc::new(DelayedConnector {
            delay: Duration::from_millis(300),
            backend: session,
        }),
        Arc::new(DelayedConnector {
            delay: Duration::from_millis(1200),
            backend: vendor,
        }),
    ];

    let controller = CombinedController::new(
        AppIdentity::new("app.demo.player", "Demo Player"),
        &connectors,
    );
    controller.subscribe(Arc::new(|c| {
        info!(backend = c.id(), "state change received");
    }));

    // Nothing is connected yet: this falls through every handle silently.
    controller.play().await.unwrap();

    // Browse waits for the connections to settle, then asks the session
    // bridge (empty) before pinning the vendor SDK.
    let listing = controller.browse(None).await.unwrap();
    info!(items = listing.len(), "top-level browse finished");
    for item in &listing {
        info!(
            title = item.title.as_deref(),
            browseable = item.browseable,
            "  entry"
        );
    }

    if let Some(folder) = listing.iter().find(|i| i.browseable) {
        let children = controller.browse(Some(folder)).await.unwrap();
        info!(items = children.len(), "drill-down browse finished");
        if let Some(song) = children.iter().find(|c| c.playable) {
            controller.play_song(song).await.unwrap();
        }
    }

    let found = controller.search("aurora").await.unwrap();
    info!(results = found.as_ref().map(|f| f.len()), "search finished");

    let position = controller.playback_position().await.unwrap();
    info!(
        paused = position.playback_paused,
        position_ms = position.last_position,
        "playback position snapshot"
    );

    controller.disconnect().await;
}
