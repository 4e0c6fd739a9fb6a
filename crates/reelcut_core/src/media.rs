use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Images have no intrinsic duration; placed clips default to 5 s.
pub const DEFAULT_IMAGE_DURATION: TimeUs = TimeUs(5_000_000);

/// Read-only view of the imported media the timeline references. The engine
/// looks entries up by id and never mutates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaCatalog {
    items: BTreeMap<Uuid, MediaItem>,
}

impl MediaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: MediaItem) -> Uuid {
        let id = item.id;
        self.items.insert(id, item);
        id
    }

    pub fn get(&self, media_id: Uuid) -> Option<&MediaItem> {
        self.items.get(&media_id)
    }

    pub fn remove(&mut self, media_id: Uuid) -> Option<MediaItem> {
        self.items.remove(&media_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.values()
    }
}

impl Clip {
    /// Build a clip spanning the media item's full duration, ready to place
    /// on `track_id` at `start_us`.
    pub fn from_media(item: &MediaItem, track_id: Uuid, start_us: TimeUs) -> Self {
        let duration = match item.kind {
            MediaKind::Image => DEFAULT_IMAGE_DURATION,
            _ => item.duration_us,
        };
        Clip::new(item.id, track_id, start_us, duration)
    }
}
