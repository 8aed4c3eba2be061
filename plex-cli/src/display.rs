//! Text rendering of entities for the terminal

use plex_sdk::{MediaContentType, MediaInfo, PlayerState, PlexPlayer, SessionsSensor};

/// Render seconds as `m:ss` or `h:mm:ss`
pub fn format_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

pub fn state_label(state: PlayerState) -> &'static str {
    match state {
        PlayerState::Playing => "playing",
        PlayerState::Paused => "paused",
        PlayerState::Buffering => "buffering",
        PlayerState::Idle => "idle",
    }
}

/// One-line description of what is playing
pub fn describe_media(media: &MediaInfo) -> Option<String> {
    let title = media.title.as_deref()?;
    let mut line = match media.content_type {
        Some(MediaContentType::TvShow) => {
            let series = media.series_title.as_deref().unwrap_or("Unknown series");
            match (media.season, media.episode) {
                (Some(season), Some(episode)) => {
                    format!("{} S{:02}E{:02} \"{}\"", series, season, episode, title)
                }
                _ => format!("{} \"{}\"", series, title),
            }
        }
        Some(MediaContentType::Music) => match media.artist.as_deref() {
            Some(artist) => format!("{} - {}", artist, title),
            None => title.to_string(),
        },
        _ => title.to_string(),
    };

    match (media.position, media.duration) {
        (Some(position), Some(duration)) => line.push_str(&format!(
            " ({} / {})",
            format_seconds(position),
            format_seconds(duration)
        )),
        (None, Some(duration)) => line.push_str(&format!(" ({})", format_seconds(duration))),
        _ => {}
    }
    Some(line)
}

pub fn player_line(player: &PlexPlayer) -> String {
    let mut line = format!(
        "{} [{}] {}",
        player.name(),
        player.id(),
        state_label(player.state())
    );
    if !player.available() {
        line.push_str(" (unavailable)");
    }
    if let Some(media) = describe_media(&player.media()) {
        line.push_str(": ");
        line.push_str(&media);
    }
    line
}

pub fn sensor_lines(sensor: &SessionsSensor) -> Vec<String> {
    let attributes = sensor.attributes();
    let mut lines = vec![format!("{}: {} active", sensor.name(), sensor.native_value())];
    for (user, count) in &attributes.user_session_counts {
        lines.push(format!("  {} ({} sessions)", user, count));
    }
    for detail in &attributes.session_details {
        lines.push(format!(
            "  - {} on {} [{}] by {}",
            detail.title, detail.player, detail.state, detail.user
        ));
    }
    lines
}
