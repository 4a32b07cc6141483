//! Shared playback types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where an item's audio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local file path
    File,
    /// Remote stream URL
    Stream,
}

/// Per-item playback options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemOptions {
    /// Playback rate override (1.0 = normal speed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
}

/// One entry in the playback queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// File path or stream URL
    pub location: String,

    /// Source kind, drives how the pipeline opens the location
    pub kind: SourceKind,

    /// Position to start decoding from when the item is first loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_position: Option<Duration>,

    /// Extra per-item options
    #[serde(default)]
    pub options: ItemOptions,
}

impl QueueItem {
    /// Create an item backed by a local file
    pub fn file(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            kind: SourceKind::File,
            start_position: None,
            options: ItemOptions::default(),
        }
    }

    /// Create an item backed by a remote stream
    pub fn stream(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            kind: SourceKind::Stream,
            start_position: None,
            options: ItemOptions::default(),
        }
    }

    /// Start playback from the given position instead of the beginning
    #[must_use]
    pub fn with_start_position(mut self, position: Duration) -> Self {
        self.start_position = Some(position);
        self
    }

    /// Override the playback rate for this item
    #[must_use]
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.options.rate = Some(rate);
        self
    }
}

/// Repeat behavior when the current item finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop at the end of the queue
    #[default]
    Off,
    /// Wrap from the last item back to the first
    All,
    /// Replay the current item indefinitely
    One,
}

/// Player-level playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing loaded or playback explicitly stopped
    #[default]
    Stopped,
    /// An item is being opened or buffered
    Loading,
    /// Audio is running
    Playing,
    /// An item is loaded and paused
    Paused,
    /// The queue ran out with repeat off
    Ended,
}

/// Initial player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Repeat behavior
    pub repeat: RepeatMode,

    /// Crossfade length; zero disables crossfading entirely
    pub crossfade_duration: Duration,

    /// Sample rate the equalizer coefficients are computed for until the
    /// platform reports the real stream format
    pub sample_rate: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            repeat: RepeatMode::Off,
            crossfade_duration: Duration::ZERO,
            sample_rate: 44100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_builders() {
        let item = QueueItem::file("/music/one.flac")
            .with_start_position(Duration::from_secs(30))
            .with_rate(1.25);

        assert_eq!(item.kind, SourceKind::File);
        assert_eq!(item.start_position, Some(Duration::from_secs(30)));
        assert_eq!(item.options.rate, Some(1.25));

        let stream = QueueItem::stream("https://radio.example/live");
        assert_eq!(stream.kind, SourceKind::Stream);
        assert_eq!(stream.start_position, None);
    }

    #[test]
    fn queue_item_serde_round_trip() {
        let item = QueueItem::file("/music/two.mp3").with_start_position(Duration::from_secs(5));
        let json = serde_json::to_string(&item).unwrap();
        let back: QueueItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn config_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.repeat, RepeatMode::Off);
        assert!(config.crossfade_duration.is_zero());
        assert_eq!(config.sample_rate, 44100);
    }
}
