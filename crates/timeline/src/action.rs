use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blanks::{self, ConsolidationStep};
use crate::{
    CompositorFollowData, EditOp, EditorHost, Frame, MediaBackend, RefreshHints, Result,
    Sequence, TimelineError, TrackId,
};

/// Everything an edit operation may touch while it runs.
pub struct EditContext<'a> {
    pub seq: &'a mut Sequence,
    pub backend: &'a mut dyn MediaBackend,
    pub host: &'a mut dyn EditorHost,
}

impl<'a> EditContext<'a> {
    pub fn new(
        seq: &'a mut Sequence,
        backend: &'a mut dyn MediaBackend,
        host: &'a mut dyn EditorHost,
    ) -> Self {
        Self { seq, backend, host }
    }
}

/// Whether an action asks the host to redraw when it finishes. Members of a
/// consolidated group defer to the last one that runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Immediate,
    Deferred,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EditPolicy {
    pub exit_active_trim_mode: bool,
    pub stop_for_edit: bool,
    pub clear_editor_for_multitrack: bool,
    pub force_effects_editor_update: bool,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            exit_active_trim_mode: true,
            stop_for_edit: false,
            clear_editor_for_multitrack: false,
            force_effects_editor_update: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Constructed,
    Executed,
    Undone,
}

/// Normalization done after the op ran, kept so undo can reverse it.
#[derive(Debug, Clone, Default)]
struct BoundaryRecord {
    consolidation: Vec<ConsolidationStep>,
    trailing_blanks: Vec<(TrackId, Frame)>,
    compositor_follow: Option<CompositorFollowData>,
}

/// One reversible edit: a typed operation plus the normalization record of
/// its last execution.
#[derive(Debug)]
pub struct EditAction {
    op: EditOp,
    pub policy: EditPolicy,
    state: ActionState,
    boundary: BoundaryRecord,
}

impl EditAction {
    pub fn new(op: EditOp) -> Self {
        let policy = op.default_policy();
        Self {
            op,
            policy,
            state: ActionState::Constructed,
            boundary: BoundaryRecord::default(),
        }
    }

    pub fn with_policy(mut self, policy: EditPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn op(&self) -> &EditOp {
        &self.op
    }

    pub fn name(&self) -> &'static str {
        self.op.name()
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn redo(&mut self, cx: &mut EditContext<'_>, refresh: Refresh) -> Result<()> {
        if self.state == ActionState::Executed {
            return Err(TimelineError::InvalidOp(format!(
                "{} is already executed",
                self.name()
            )));
        }
        debug!(action = self.name(), "redo");
        cx.host.stop_playback();
        cx.host.clear_selection();
        let counts_before = cx.seq.tracks_clip_counts();

        self.op.redo(cx)?;

        self.boundary.consolidation = blanks::consolidate_all_blanks(cx.seq)?;
        self.boundary.trailing_blanks = blanks::remove_all_trailing_blanks(cx.seq)?;
        let follow = match self.boundary.compositor_follow.take() {
            Some(recorded) => Some(recorded),
            None if cx.seq.compositing_mode.follows_origin_clips() => {
                Some(CompositorFollowData::compute(cx.seq))
            }
            None => None,
        };
        if let Some(follow) = &follow {
            follow.apply(&mut cx.seq.compositors)?;
        }
        let compositors_followed = follow.as_ref().map_or(false, |f| !f.is_empty());
        self.boundary.compositor_follow = follow;

        cx.seq.compositors.restack();
        cx.seq.refresh_sync_states();
        self.state = ActionState::Executed;

        if refresh == Refresh::Immediate {
            cx.host.refresh(RefreshHints {
                tracks_changed: counts_before != cx.seq.tracks_clip_counts(),
                compositors_changed: compositors_followed || self.op.touches_compositors(),
                update_effects_editor: self.policy.force_effects_editor_update,
            });
        }
        Ok(())
    }

    pub fn undo(&mut self, cx: &mut EditContext<'_>, refresh: Refresh) -> Result<()> {
        if self.state != ActionState::Executed {
            return Err(TimelineError::InvalidOp(format!(
                "{} has not been executed",
                self.name()
            )));
        }
        debug!(action = self.name(), "undo");
        cx.host.stop_playback();
        cx.host.clear_selection();
        let counts_before = cx.seq.tracks_clip_counts();

        if let Some(follow) = &self.boundary.compositor_follow {
            follow.revert(&mut cx.seq.compositors)?;
        }
        blanks::restore_trailing_blanks(cx.seq, &self.boundary.trailing_blanks)?;
        blanks::undo_consolidation(cx.seq, &self.boundary.consolidation)?;

        self.op.undo(cx)?;

        blanks::remove_all_trailing_blanks(cx.seq)?;
        cx.seq.compositors.restack();
        cx.seq.refresh_sync_states();
        self.state = ActionState::Undone;

        if refresh == Refresh::Immediate {
            cx.host.refresh(RefreshHints {
                tracks_changed: counts_before != cx.seq.tracks_clip_counts(),
                compositors_changed: self.boundary.compositor_follow.is_some()
                    || self.op.touches_compositors(),
                update_effects_editor: self.policy.force_effects_editor_update,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{edits, Clip, CompositingMode, Compositor, InMemoryBackend, MediaSource, NullHost, TrackKind};

    fn clip(name: &str, length: Frame) -> Clip {
        Clip::new(
            name,
            MediaSource::File {
                path: format!("{}.mov", name),
                ttl: None,
            },
            Some(100),
        )
        .with_range(0, length - 1)
    }

    fn lengths(seq: &Sequence) -> Vec<(bool, Frame)> {
        seq.track(TrackId(0))
            .unwrap()
            .items()
            .iter()
            .map(|i| (i.is_blank(), i.length()))
            .collect()
    }

    /// V1: [a 10][blank 5][b 10][blank 5][c 10]
    fn sequence() -> Sequence {
        let mut seq = Sequence::new("s");
        let v1 = seq.add_track("V1", TrackKind::Video);
        seq.append(v1, clip("a", 10).into()).unwrap();
        seq.insert_blank(v1, 1, 5).unwrap();
        seq.append(v1, clip("b", 10).into()).unwrap();
        seq.insert_blank(v1, 3, 5).unwrap();
        seq.append(v1, clip("c", 10).into()).unwrap();
        seq
    }

    fn redo(seq: &mut Sequence, action: &mut EditAction) -> Result<()> {
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        action.redo(&mut EditContext::new(seq, &mut backend, &mut host), Refresh::Immediate)
    }

    fn undo(seq: &mut Sequence, action: &mut EditAction) -> Result<()> {
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        action.undo(&mut EditContext::new(seq, &mut backend, &mut host), Refresh::Immediate)
    }

    #[test]
    fn test_blank_runs_are_merged_and_split_back() {
        let mut seq = sequence();
        let before = seq.clone();
        let mut action = edits::lift_multiple(&seq, TrackId(0), 2, 2).unwrap();
        redo(&mut seq, &mut action).unwrap();
        assert_eq!(lengths(&seq), vec![(false, 10), (true, 20), (false, 10)]);
        assert_eq!(
            action.boundary.consolidation,
            vec![ConsolidationStep {
                track: TrackId(0),
                index: 1,
                removed_lengths: vec![5, 10, 5],
            }]
        );
        assert!(action.boundary.trailing_blanks.is_empty());

        undo(&mut seq, &mut action).unwrap();
        assert_eq!(seq.tracks(), before.tracks());
        assert_eq!(action.state(), ActionState::Undone);
    }

    #[test]
    fn test_trailing_blank_is_stripped_and_restored() {
        let mut seq = sequence();
        let before = seq.clone();
        let mut action = edits::lift_multiple(&seq, TrackId(0), 4, 4).unwrap();
        redo(&mut seq, &mut action).unwrap();
        assert_eq!(lengths(&seq), vec![(false, 10), (true, 5), (false, 10)]);
        assert_eq!(action.boundary.trailing_blanks, vec![(TrackId(0), 15)]);

        undo(&mut seq, &mut action).unwrap();
        assert_eq!(seq.tracks(), before.tracks());
        redo(&mut seq, &mut action).unwrap();
        assert_eq!(lengths(&seq), vec![(false, 10), (true, 5), (false, 10)]);
    }

    #[test]
    fn test_compositor_follows_origin_clip() {
        let mut seq = sequence();
        seq.compositing_mode = CompositingMode::TopDownAutoFollow;
        let b = seq.track(TrackId(0)).unwrap().clip(2).unwrap().id;
        let mut comp = Compositor::new("dissolve");
        comp.origin_clip_id = Some(b);
        comp.set_in_and_out(15, 24);
        let comp_id = comp.destroy_id;
        seq.compositors.add(comp);

        let span = |seq: &Sequence| {
            let c = seq.compositors.get(comp_id).unwrap();
            (c.clip_in, c.clip_out)
        };

        let mut action = edits::trim_end(&seq, TrackId(0), 0, 5).unwrap();
        redo(&mut seq, &mut action).unwrap();
        assert_eq!(span(&seq), (20, 29));
        let follow = action.boundary.compositor_follow.clone().unwrap();
        assert_eq!(follow.moves.len(), 1);
        assert_eq!((follow.moves[0].orig_in, follow.moves[0].orig_out), (15, 24));

        undo(&mut seq, &mut action).unwrap();
        assert_eq!(span(&seq), (15, 24));
        redo(&mut seq, &mut action).unwrap();
        assert_eq!(span(&seq), (20, 29));
        assert_eq!(action.boundary.compositor_follow, Some(follow));
    }

    #[test]
    fn test_orphaned_compositor_is_deleted_and_restored() {
        let mut seq = sequence();
        seq.compositing_mode = CompositingMode::StandardAutoFollow;
        let b = seq.track(TrackId(0)).unwrap().clip(2).unwrap().id;
        let mut comp = Compositor::new("dissolve");
        comp.origin_clip_id = Some(b);
        comp.set_in_and_out(15, 24);
        seq.compositors.add(comp);
        let before = seq.clone();

        let mut action = edits::remove_multiple(&seq, TrackId(0), 2, 2).unwrap();
        redo(&mut seq, &mut action).unwrap();
        assert!(seq.compositors.is_empty());
        undo(&mut seq, &mut action).unwrap();
        assert_eq!(seq.compositors.len(), 1);
        assert_eq!(seq.tracks(), before.tracks());
    }

    #[test]
    fn test_redo_twice_is_rejected() {
        let mut seq = sequence();
        let mut action = edits::cut(&seq, TrackId(0), 3).unwrap();
        assert!(undo(&mut seq, &mut action).is_err());
        redo(&mut seq, &mut action).unwrap();
        assert!(redo(&mut seq, &mut action).is_err());
    }
}
