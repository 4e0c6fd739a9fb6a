use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TimeUs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeUs(pub i64);

impl TimeUs {
    pub const ZERO: Self = Self(0);

    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000_000.0) as i64)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        Self(self.0.clamp(lo.0, hi.0))
    }
}

impl Add for TimeUs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TimeUs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for TimeUs {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<i64> for TimeUs {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self(self.0 / rhs)
    }
}

impl fmt::Display for TimeUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_us = self.0.unsigned_abs();
        let total_ms = total_us / 1_000;
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if self.0 < 0 {
            write!(f, "-{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        }
    }
}

/// Shortest clip the engine will produce or keep: 0.1 s.
pub const MIN_CLIP_DURATION: TimeUs = TimeUs(100_000);

// ---------------------------------------------------------------------------
// MediaKind / MediaItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

/// A record in the external media catalog. The engine reads these by id and
/// never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: Uuid,
    pub name: String,
    pub kind: MediaKind,
    pub duration_us: TimeUs,
    pub uri: String,
}

// ---------------------------------------------------------------------------
// TrackKind / Track
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// A lane of one kind. Tracks do not hold their clips; ownership is by
/// reference via `Clip::track_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: Uuid,
    pub name: String,
    pub kind: TrackKind,
    pub muted: bool,
    pub locked: bool,
    pub height: u32,
}

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            muted: false,
            locked: false,
            height: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// Easing / KeyframeValue / Keyframe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    EaseIn,
    EaseOut,
    EaseInOut,
    // Unknown curve names fall back to linear on deserialization.
    #[default]
    #[serde(other)]
    Linear,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KeyframeValue {
    Number(f64),
    Point { x: f64, y: f64 },
    Text(String),
}

/// One sample of an animated property. `easing` shapes the segment from this
/// keyframe to the next one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    pub time_us: TimeUs,
    pub value: KeyframeValue,
    pub easing: Easing,
}

// ---------------------------------------------------------------------------
// Transition / Effect
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub kind: String,
    pub duration_us: TimeUs,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Effect {
    pub kind: String,
    pub params: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// A placed, time-bounded reference to a media item on a track.
///
/// `trim_start_us`/`trim_end_us` are offsets into the source media; the
/// clip's timeline footprint is `[start_us, start_us + duration_us)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: Uuid,
    pub media_id: Uuid,
    pub track_id: Uuid,
    pub start_us: TimeUs,
    pub duration_us: TimeUs,
    pub trim_start_us: TimeUs,
    pub trim_end_us: TimeUs,
    /// Percent, 0-200.
    pub volume: f64,
    /// Playback rate multiplier, 0.25-4.0.
    pub speed: f64,
    pub transition_in: Option<Transition>,
    pub transition_out: Option<Transition>,
    pub effects: Vec<Effect>,
    /// Property name -> time-ordered keyframes.
    pub keyframes: BTreeMap<String, Vec<Keyframe>>,
}

impl Clip {
    pub fn new(media_id: Uuid, track_id: Uuid, start_us: TimeUs, duration_us: TimeUs) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_id,
            track_id,
            start_us,
            duration_us,
            trim_start_us: TimeUs::ZERO,
            trim_end_us: TimeUs::ZERO,
            volume: 100.0,
            speed: 1.0,
            transition_in: None,
            transition_out: None,
            effects: vec![],
            keyframes: BTreeMap::new(),
        }
    }

    pub fn end_us(&self) -> TimeUs {
        self.start_us + self.duration_us
    }

    /// Half-open interval overlap test against another clip's footprint.
    pub fn overlaps(&self, other: &Clip) -> bool {
        self.start_us < other.end_us() && other.start_us < self.end_us()
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 200.0);
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(0.25, 4.0);
    }
}

// ---------------------------------------------------------------------------
// LinkPair
// ---------------------------------------------------------------------------

/// Association between one video clip and one audio clip, keeping them
/// positionally related without merging them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkPair {
    pub video_clip_id: Uuid,
    pub audio_clip_id: Uuid,
    /// `audio.start_us - video.start_us`, refreshed whenever a member moves.
    pub offset_us: TimeUs,
}

impl LinkPair {
    pub fn members(&self) -> (Uuid, Uuid) {
        (self.video_clip_id, self.audio_clip_id)
    }

    pub fn contains(&self, clip_id: Uuid) -> bool {
        self.video_clip_id == clip_id || self.audio_clip_id == clip_id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
