//! Media metadata derived from a session

use chrono::{DateTime, Utc};
use plex_client::{MediaKind, Session};
use serde::{Deserialize, Serialize};

/// Content type reported for the media a player is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaContentType {
    Movie,
    TvShow,
    Music,
    Video,
}

impl MediaContentType {
    pub fn from_kind(kind: &MediaKind) -> Self {
        match kind {
            MediaKind::Movie => MediaContentType::Movie,
            MediaKind::Episode => MediaContentType::TvShow,
            MediaKind::Track => MediaContentType::Music,
            MediaKind::Other(_) => MediaContentType::Video,
        }
    }
}

/// Everything a player entity reports about its current media
///
/// All fields are `None` when the player has no session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub content_type: Option<MediaContentType>,
    pub title: Option<String>,
    pub series_title: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub artist: Option<String>,
    pub album_name: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
    /// Seconds
    pub position: Option<f64>,
    /// When the snapshot holding `position` was fetched, not when it was read
    pub position_updated_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

impl MediaInfo {
    /// Derive media fields from a session
    ///
    /// `fetched_at` is stamped as the position time only when `has_position`
    /// is set, i.e. the player is playing or paused.
    pub fn from_session(session: &Session, has_position: bool, fetched_at: DateTime<Utc>) -> Self {
        let episode = session.kind == MediaKind::Episode;
        let track = session.kind == MediaKind::Track;

        Self {
            content_type: Some(MediaContentType::from_kind(&session.kind)),
            title: Some(session.title.clone()),
            series_title: session.grandparent_title.clone().filter(|_| episode),
            season: session.parent_index.filter(|_| episode),
            episode: session.index.filter(|_| episode),
            artist: session.grandparent_title.clone().filter(|_| track),
            album_name: session.parent_title.clone().filter(|_| track),
            duration: millis_to_seconds(session.duration),
            position: millis_to_seconds(session.view_offset),
            position_updated_at: has_position.then_some(fetched_at),
            image_url: session.thumb_url.clone(),
        }
    }
}

/// Zero is treated like a missing value; Plex omits or zeroes the same fields.
fn millis_to_seconds(value: Option<u64>) -> Option<f64> {
    value.filter(|ms| *ms > 0).map(|ms| ms as f64 / 1000.0)
}
