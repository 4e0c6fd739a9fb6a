use crate::editing::TrimEdge;
use crate::error::{CoreError, Result};
use crate::timeline::Timeline;
use crate::types::*;
use std::time::SystemTime;
use uuid::Uuid;

/// A reversible unit of timeline mutation, expressed as data.
///
/// Each variant closes over the before-values it needs to reverse itself,
/// captured from the timeline at construction time. One interpreter
/// (`apply`/`revert`) covers both directions, so no call site carries an
/// ad-hoc inverse.
#[derive(Debug, Clone)]
pub enum Command {
    AddClip {
        track_id: Uuid,
        clip: Clip,
    },
    RemoveClip {
        clip: Clip,
        /// Position in the clip list, so undo restores the exact ordering.
        index: usize,
        links: Vec<LinkPair>,
        was_selected: bool,
    },
    MoveClip {
        clip_id: Uuid,
        from: (Uuid, TimeUs),
        to: (Uuid, TimeUs),
    },
    TrimClip {
        clip_id: Uuid,
        edge: TrimEdge,
        delta: TimeUs,
        before: ClipWindow,
    },
    SplitClip {
        clip_id: Uuid,
        at: TimeUs,
        right_id: Uuid,
        original: Clip,
    },
    LinkClips {
        a: Uuid,
        b: Uuid,
    },
    UnlinkClip {
        clip_id: Uuid,
        pair: Option<LinkPair>,
    },
    DetachAudio {
        video_clip_id: Uuid,
        target_track_id: Uuid,
        audio_id: Uuid,
    },
    SetKeyframe {
        clip_id: Uuid,
        property: String,
        keyframe: Keyframe,
        previous: Option<Keyframe>,
    },
    RemoveKeyframe {
        clip_id: Uuid,
        property: String,
        removed: Option<Keyframe>,
    },
    /// One atomic multi-mutation gesture, e.g. moving both members of a link
    /// pair. Undone as a unit, members reversed in reverse order.
    Batch {
        description: &'static str,
        commands: Vec<Command>,
    },
}

/// Snapshot of a clip's placement and trim window, for trim reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    pub start_us: TimeUs,
    pub duration_us: TimeUs,
    pub trim_start_us: TimeUs,
    pub trim_end_us: TimeUs,
}

impl ClipWindow {
    fn of(clip: &Clip) -> Self {
        Self {
            start_us: clip.start_us,
            duration_us: clip.duration_us,
            trim_start_us: clip.trim_start_us,
            trim_end_us: clip.trim_end_us,
        }
    }
}

impl Command {
    // -----------------------------------------------------------------------
    // Constructors: capture before-state from the current timeline.
    // -----------------------------------------------------------------------

    pub fn add_clip(track_id: Uuid, clip: Clip) -> Self {
        Command::AddClip { track_id, clip }
    }

    pub fn remove_clip(timeline: &Timeline, clip_id: Uuid) -> Result<Self> {
        let clip = timeline.require_clip(clip_id)?.clone();
        let index = timeline
            .clips
            .iter()
            .position(|c| c.id == clip_id)
            .ok_or(CoreError::ClipNotFound(clip_id))?;
        let links = timeline
            .links
            .iter()
            .filter(|l| l.contains(clip_id))
            .cloned()
            .collect();
        Ok(Command::RemoveClip {
            clip,
            index,
            links,
            was_selected: timeline.is_selected(clip_id),
        })
    }

    pub fn move_clip(
        timeline: &Timeline,
        clip_id: Uuid,
        new_track_id: Uuid,
        new_start: TimeUs,
    ) -> Result<Self> {
        let clip = timeline.require_clip(clip_id)?;
        Ok(Command::MoveClip {
            clip_id,
            from: (clip.track_id, clip.start_us),
            to: (new_track_id, new_start),
        })
    }

    pub fn trim_clip(
        timeline: &Timeline,
        clip_id: Uuid,
        edge: TrimEdge,
        delta: TimeUs,
    ) -> Result<Self> {
        let clip = timeline.require_clip(clip_id)?;
        Ok(Command::TrimClip {
            clip_id,
            edge,
            delta,
            before: ClipWindow::of(clip),
        })
    }

    pub fn split_clip(timeline: &Timeline, clip_id: Uuid, at: TimeUs) -> Result<Self> {
        let original = timeline.require_clip(clip_id)?.clone();
        Ok(Command::SplitClip {
            clip_id,
            at,
            right_id: Uuid::new_v4(),
            original,
        })
    }

    pub fn link_clips(a: Uuid, b: Uuid) -> Self {
        Command::LinkClips { a, b }
    }

    pub fn unlink_clip(timeline: &Timeline, clip_id: Uuid) -> Self {
        Command::UnlinkClip {
            clip_id,
            pair: timeline.link_for(clip_id).cloned(),
        }
    }

    pub fn detach_audio(video_clip_id: Uuid, target_track_id: Uuid) -> Self {
        Command::DetachAudio {
            video_clip_id,
            target_track_id,
            audio_id: Uuid::new_v4(),
        }
    }

    pub fn set_keyframe(
        timeline: &Timeline,
        clip_id: Uuid,
        property: impl Into<String>,
        time_us: TimeUs,
        value: KeyframeValue,
        easing: Easing,
    ) -> Result<Self> {
        let property = property.into();
        let clip = timeline.require_clip(clip_id)?;
        let previous = clip
            .keyframes
            .get(&property)
            .and_then(|kfs| kfs.iter().find(|k| k.time_us == time_us))
            .cloned();
        Ok(Command::SetKeyframe {
            clip_id,
            property,
            keyframe: Keyframe {
                time_us,
                value,
                easing,
            },
            previous,
        })
    }

    pub fn remove_keyframe(
        timeline: &Timeline,
        clip_id: Uuid,
        property: impl Into<String>,
        time_us: TimeUs,
    ) -> Result<Self> {
        let property = property.into();
        let clip = timeline.require_clip(clip_id)?;
        let removed = clip
            .keyframes
            .get(&property)
            .and_then(|kfs| kfs.iter().find(|k| k.time_us == time_us))
            .cloned();
        Ok(Command::RemoveKeyframe {
            clip_id,
            property,
            removed,
        })
    }

    pub fn batch(description: &'static str, commands: Vec<Command>) -> Self {
        Command::Batch {
            description,
            commands,
        }
    }

    // -----------------------------------------------------------------------
    // Interpreter
    // -----------------------------------------------------------------------

    /// Apply the command's after-state (execute / redo direction).
    pub fn apply(&self, timeline: &mut Timeline) -> Result<()> {
        match self {
            Command::AddClip { track_id, clip } => {
                timeline.add_clip(*track_id, clip.clone()).map(|_| ())
            }
            Command::RemoveClip { clip, .. } => timeline.remove_clip(clip.id).map(|_| ()),
            Command::MoveClip { clip_id, to, .. } => timeline.move_clip(*clip_id, to.0, to.1),
            Command::TrimClip {
                clip_id,
                edge,
                delta,
                ..
            } => timeline.trim_clip(*clip_id, *edge, *delta),
            Command::SplitClip {
                clip_id,
                at,
                right_id,
                ..
            } => timeline.split_clip_as(*clip_id, *at, *right_id).map(|_| ()),
            Command::LinkClips { a, b } => timeline.link_clips(*a, *b),
            Command::UnlinkClip { clip_id, .. } => {
                timeline.unlink_clip(*clip_id);
                Ok(())
            }
            Command::DetachAudio {
                video_clip_id,
                target_track_id,
                audio_id,
            } => timeline
                .detach_audio_as(*video_clip_id, *target_track_id, *audio_id)
                .map(|_| ()),
            Command::SetKeyframe {
                clip_id,
                property,
                keyframe,
                ..
            } => {
                let clip = timeline
                    .clip_mut(*clip_id)
                    .ok_or(CoreError::ClipNotFound(*clip_id))?;
                clip.set_keyframe(
                    property,
                    keyframe.time_us,
                    keyframe.value.clone(),
                    keyframe.easing,
                );
                Ok(())
            }
            Command::RemoveKeyframe {
                clip_id,
                property,
                removed,
            } => {
                // No keyframe at that time: removal is a no-op, not an error.
                if let Some(kf) = removed {
                    let clip = timeline
                        .clip_mut(*clip_id)
                        .ok_or(CoreError::ClipNotFound(*clip_id))?;
                    clip.remove_keyframe(property, kf.time_us);
                }
                Ok(())
            }
            Command::Batch { commands, .. } => {
                // Keep the gesture atomic: roll back applied members on error.
                for (i, cmd) in commands.iter().enumerate() {
                    if let Err(err) = cmd.apply(timeline) {
                        for done in commands[..i].iter().rev() {
                            let _ = done.revert(timeline);
                        }
                        return Err(err);
                    }
                }
                Ok(())
            }
        }
    }

    /// Apply the command's before-state (undo direction).
    pub fn revert(&self, timeline: &mut Timeline) -> Result<()> {
        match self {
            Command::AddClip { clip, .. } => timeline.remove_clip(clip.id).map(|_| ()),
            Command::RemoveClip {
                clip,
                index,
                links,
                was_selected,
            } => {
                // Restoring a previously-valid state: insert at the captured
                // position rather than re-validating through add_clip.
                let index = (*index).min(timeline.clips.len());
                timeline.clips.insert(index, clip.clone());
                timeline.links.extend(links.iter().cloned());
                if *was_selected {
                    timeline.select(clip.id);
                }
                Ok(())
            }
            Command::MoveClip { clip_id, from, .. } => timeline.move_clip(*clip_id, from.0, from.1),
            Command::TrimClip {
                clip_id, before, ..
            } => {
                let clip = timeline
                    .clip_mut(*clip_id)
                    .ok_or(CoreError::ClipNotFound(*clip_id))?;
                clip.start_us = before.start_us;
                clip.duration_us = before.duration_us;
                clip.trim_start_us = before.trim_start_us;
                clip.trim_end_us = before.trim_end_us;
                timeline.update_link_offset(*clip_id);
                Ok(())
            }
            Command::SplitClip {
                clip_id,
                right_id,
                original,
                ..
            } => {
                timeline.remove_clip(*right_id)?;
                let clip = timeline
                    .clip_mut(*clip_id)
                    .ok_or(CoreError::ClipNotFound(*clip_id))?;
                *clip = original.clone();
                Ok(())
            }
            Command::LinkClips { a, .. } => {
                timeline.unlink_clip(*a);
                Ok(())
            }
            Command::UnlinkClip { pair, .. } => {
                if let Some(pair) = pair {
                    timeline.links.push(pair.clone());
                }
                Ok(())
            }
            Command::DetachAudio { audio_id, .. } => {
                // Removing the materialized clip also drops its link pair.
                timeline.remove_clip(*audio_id).map(|_| ())
            }
            Command::SetKeyframe {
                clip_id,
                property,
                keyframe,
                previous,
            } => {
                let clip = timeline
                    .clip_mut(*clip_id)
                    .ok_or(CoreError::ClipNotFound(*clip_id))?;
                match previous {
                    Some(prev) => clip.set_keyframe(
                        property,
                        prev.time_us,
                        prev.value.clone(),
                        prev.easing,
                    ),
                    None => clip.remove_keyframe(property, keyframe.time_us),
                }
                Ok(())
            }
            Command::RemoveKeyframe {
                clip_id,
                property,
                removed,
            } => {
                if let Some(kf) = removed {
                    let clip = timeline
                        .clip_mut(*clip_id)
                        .ok_or(CoreError::ClipNotFound(*clip_id))?;
                    clip.set_keyframe(property, kf.time_us, kf.value.clone(), kf.easing);
                }
                Ok(())
            }
            Command::Batch { commands, .. } => {
                for cmd in commands.iter().rev() {
                    cmd.revert(timeline)?;
                }
                Ok(())
            }
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Command::AddClip { .. } => "Add clip",
            Command::RemoveClip { .. } => "Remove clip",
            Command::MoveClip { .. } => "Move clip",
            Command::TrimClip { .. } => "Trim clip",
            Command::SplitClip { .. } => "Split clip",
            Command::LinkClips { .. } => "Link clips",
            Command::UnlinkClip { .. } => "Unlink clip",
            Command::DetachAudio { .. } => "Detach audio",
            Command::SetKeyframe { .. } => "Set keyframe",
            Command::RemoveKeyframe { .. } => "Remove keyframe",
            Command::Batch { description, .. } => description,
        }
    }
}

/// A committed command together with when it was first executed. The
/// timestamp rides along through undo/redo so the entry keeps recording
/// the moment the user performed the action.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub command: Command,
    pub created_at: SystemTime,
}

/// Bounded undo/redo history over data commands.
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Apply a command and push it onto the undo stack. A fresh action
    /// invalidates any previously-undone future, so the redo stack clears.
    pub fn execute(&mut self, cmd: Command, timeline: &mut Timeline) -> Result<()> {
        cmd.apply(timeline)?;
        tracing::debug!(command = cmd.description(), "executed");
        self.redo_stack.clear();
        self.undo_stack.push(HistoryEntry {
            command: cmd,
            created_at: SystemTime::now(),
        });
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        Ok(())
    }

    pub fn undo(&mut self, timeline: &mut Timeline) -> Result<()> {
        let entry = self.undo_stack.pop().ok_or(CoreError::NothingToUndo)?;
        // A failed revert (say, a track locked since execution) leaves the
        // timeline as-is; keep the entry so the history is not lost.
        if let Err(err) = entry.command.revert(timeline) {
            self.undo_stack.push(entry);
            return Err(err);
        }
        tracing::debug!(command = entry.command.description(), "undone");
        self.redo_stack.push(entry);
        Ok(())
    }

    pub fn redo(&mut self, timeline: &mut Timeline) -> Result<()> {
        let entry = self.redo_stack.pop().ok_or(CoreError::NothingToRedo)?;
        if let Err(err) = entry.command.apply(timeline) {
            self.redo_stack.push(entry);
            return Err(err);
        }
        tracing::debug!(command = entry.command.description(), "redone");
        self.undo_stack.push(entry);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.command.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.command.description())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}
