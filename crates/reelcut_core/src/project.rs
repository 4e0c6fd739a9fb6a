use crate::error::{CoreError, Result};
use crate::media::MediaCatalog;
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// The persisted document: catalog plus timeline. Round-tripping through
/// JSON reproduces an identical timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub catalog: MediaCatalog,
    pub timeline: Timeline,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            catalog: MediaCatalog::new(),
            timeline: Timeline::new(),
        }
    }

    /// Save as pretty-printed JSON, appending the `.reelcut` extension when
    /// it is missing.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref()).map_err(CoreError::Io)?;
        let project: Project = serde_json::from_str(&data)?;
        Ok(project)
    }
}

fn ensure_extension(path: &Path) -> std::path::PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some("reelcut") {
        path.to_path_buf()
    } else {
        let mut p = path.to_path_buf();
        let mut name = p.file_name().unwrap_or_default().to_os_string();
        name.push(".reelcut");
        p.set_file_name(name);
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use tempfile::TempDir;

    fn populated_project() -> Project {
        let mut project = Project::new("Populated");
        let media_id = project.catalog.insert(MediaItem {
            id: Uuid::new_v4(),
            name: "clip.mp4".to_string(),
            kind: MediaKind::Video,
            duration_us: TimeUs(10_000_000),
            uri: "file:///media/clip.mp4".to_string(),
        });

        let track_id = project
            .timeline
            .add_track(Track::new("V1", TrackKind::Video));
        let mut clip = Clip::new(media_id, track_id, TimeUs(0), TimeUs(5_000_000));
        clip.set_keyframe(
            "opacity",
            TimeUs(0),
            KeyframeValue::Number(0.0),
            Easing::EaseOut,
        );
        clip.set_keyframe(
            "opacity",
            TimeUs(1_000_000),
            KeyframeValue::Number(1.0),
            Easing::Linear,
        );
        project.timeline.add_clip(track_id, clip).unwrap();
        project
    }

    #[test]
    fn create_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_project.reelcut");

        let project = Project::new("Test Project");
        project.save_to_file(&path).unwrap();

        let loaded = Project::load_from_file(&path).unwrap();
        assert_eq!(project, loaded);
    }

    #[test]
    fn roundtrip_preserves_clips_links_and_keyframes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("populated.reelcut");

        let mut project = populated_project();
        let video_id = project.timeline.clips[0].id;
        let a_track = project
            .timeline
            .add_track(Track::new("A1", TrackKind::Audio));
        project.timeline.detach_audio(video_id, a_track).unwrap();

        project.save_to_file(&path).unwrap();
        let loaded = Project::load_from_file(&path).unwrap();
        assert_eq!(project, loaded);
        assert_eq!(loaded.timeline.duration_us(), TimeUs(5_000_000));
    }

    #[test]
    fn load_nonexistent_file_returns_error() {
        let result = Project::load_from_file("/tmp/does_not_exist_reelcut_test.reelcut");
        assert!(result.is_err());
    }

    #[test]
    fn extension_appended_if_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no_ext");

        let project = Project::new("ExtTest");
        project.save_to_file(&path).unwrap();

        let expected_path = dir.path().join("no_ext.reelcut");
        assert!(expected_path.exists());

        let loaded = Project::load_from_file(&expected_path).unwrap();
        assert_eq!(project, loaded);
    }
}
