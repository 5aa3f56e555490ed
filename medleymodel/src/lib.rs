//! # medleymodel - Shared media-control data model
//!
//! Value types exchanged between media-control backends and the combined
//! controller in `medleycontrol`: the capability set, track metadata,
//! playback position snapshots, backend-namespaced custom actions, and the
//! identity of the application being controlled.
//!
//! Everything in this crate is an immutable value; backends construct these
//! from their native state and the aggregation layer only passes them
//! through.

use serde::{Deserialize, Serialize};

/// The capability set: every operation a media-control backend may support.
///
/// Support is advertised per call and may be dynamic (a backend can support
/// [`MediaAction::PlayQueueItem`] only while it has a non-empty queue, for
/// instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaAction {
    Play,
    Pause,
    SkipToPrevious,
    SkipToNext,
    SeekTo,
    PlaySong,
    PlayQueueItem,
    PlayFromSearch,
    CustomAction,
    GetQueue,
    GetMetadata,
    GetPosition,
    QuerySupported,
    GetCustomActions,
    Browse,
    Search,
}

impl MediaAction {
    /// Returns a human-readable label for the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaAction::Play => "play",
            MediaAction::Pause => "pause",
            MediaAction::SkipToPrevious => "skip_to_previous",
            MediaAction::SkipToNext => "skip_to_next",
            MediaAction::SeekTo => "seek_to",
            MediaAction::PlaySong => "play_song",
            MediaAction::PlayQueueItem => "play_queue_item",
            MediaAction::PlayFromSearch => "play_from_search",
            MediaAction::CustomAction => "custom_action",
            MediaAction::GetQueue => "get_queue",
            MediaAction::GetMetadata => "get_metadata",
            MediaAction::GetPosition => "get_position",
            MediaAction::QuerySupported => "query_supported",
            MediaAction::GetCustomActions => "get_custom_actions",
            MediaAction::Browse => "browse",
            MediaAction::Search => "search",
        }
    }
}

/// Identity of the media application a connector should attach to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppIdentity {
    /// Stable identifier, e.g. a package or bundle name.
    pub package_name: String,
    /// Human-friendly name for logs and UI.
    pub display_name: String,
}

impl AppIdentity {
    pub fn new(package_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            display_name: display_name.into(),
        }
    }
}

/// Metadata describing a playable or browseable item.
///
/// `media_id` identifies the item for browse and play-song purposes;
/// `queue_id` identifies its slot in the currently playing queue. The two
/// identities are distinct and either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub media_id: Option<String>,
    pub queue_id: Option<i64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub playable: bool,
    pub browseable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_art_uri: Option<String>,
    /// Track duration in milliseconds, if the backend knows it.
    pub duration_ms: Option<i64>,
}

impl TrackMetadata {
    /// A playable leaf item.
    pub fn song(media_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            media_id: Some(media_id.into()),
            title: Some(title.into()),
            playable: true,
            ..Self::default()
        }
    }

    /// A browseable directory node.
    pub fn folder(media_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            media_id: Some(media_id.into()),
            title: Some(title.into()),
            browseable: true,
            ..Self::default()
        }
    }
}

/// Playback position snapshot reported by a backend.
///
/// This is a snapshot taken at `last_position_update_time`; consumers that
/// want a live position extrapolate it themselves. The aggregation layer
/// never interpolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackPosition {
    pub playback_paused: bool,
    /// Wall-clock time of the snapshot, in milliseconds.
    pub last_position_update_time: i64,
    /// Position within the track at the snapshot, in milliseconds.
    pub last_position: i64,
    /// Total track duration in milliseconds, -1 when unknown.
    pub maximum_position: i64,
}

impl PlaybackPosition {
    pub fn new(
        playback_paused: bool,
        last_position_update_time: i64,
        last_position: i64,
        maximum_position: i64,
    ) -> Self {
        Self {
            playback_paused,
            last_position_update_time,
            last_position,
            maximum_position,
        }
    }
}

/// The degraded value reported when no backend can answer.
impl Default for PlaybackPosition {
    fn default() -> Self {
        Self::new(true, 0, 0, 0)
    }
}

/// An opaque, backend-namespaced action.
///
/// `source_app` is the identity of the backend that advertised the action;
/// actions are never compared or forwarded across backends. Equality and
/// hashing use only (`source_app`, `action`) so that display fields do not
/// affect identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomAction {
    pub source_app: String,
    pub action: String,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_uri: Option<String>,
}

impl CustomAction {
    pub fn new(source_app: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            source_app: source_app.into(),
            action: action.into(),
            name: None,
            icon_uri: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl PartialEq for CustomAction {
    fn eq(&self, other: &Self) -> bool {
        self.source_app == other.source_app && self.action == other.action
    }
}

impl Eq for CustomAction {}

impl std::hash::Hash for CustomAction {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source_app.hash(state);
        self.action.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn custom_action_identity_ignores_display_fields() {
        let bare = CustomAction::new("app.vendor", "THUMBS_UP");
        let decorated = CustomAction::new("app.vendor", "THUMBS_UP").with_name("Thumbs up");
        assert_eq!(bare, decorated);

        let other_backend = CustomAction::new("app.other", "THUMBS_UP");
        assert_ne!(bare, other_backend);

        let mut set = HashSet::new();
        set.insert(bare);
        assert!(set.contains(&decorated));
        assert!(!set.contains(&other_backend));
    }

    #[test]
    fn default_position_is_degraded_snapshot() {
        let pos = PlaybackPosition::default();
        assert!(pos.playback_paused);
        assert_eq!(pos.last_position_update_time, 0);
        assert_eq!(pos.last_position, 0);
        assert_eq!(pos.maximum_position, 0);
    }

    #[test]
    fn metadata_constructors_set_flags() {
        let song = TrackMetadata::song("track-1", "Song One");
        assert!(song.playable);
        assert!(!song.browseable);
        assert_eq!(song.media_id.as_deref(), Some("track-1"));

        let folder = TrackMetadata::folder("albums", "Albums");
        assert!(folder.browseable);
        assert!(!folder.playable);
    }

    #[test]
    fn metadata_serde_round_trip() {
        let mut track = TrackMetadata::song("track-2", "Song Two");
        track.queue_id = Some(7);
        track.duration_ms = Some(215_000);

        let json = serde_json::to_string(&track).unwrap();
        let back: TrackMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(track, back);
    }

    #[test]
    fn action_labels() {
        assert_eq!(MediaAction::Play.as_str(), "play");
        assert_eq!(MediaAction::PlayQueueItem.as_str(), "play_queue_item");
        assert_eq!(MediaAction::Search.as_str(), "search");
    }
}
