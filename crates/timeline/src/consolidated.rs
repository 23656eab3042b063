use std::fmt;
use tracing::{debug, warn};

use crate::{
    ActionState, EditAction, EditContext, EditOp, EditPolicy, Refresh, Result, Sequence,
    TimelineError,
};

pub type ActionFactory = Box<dyn FnOnce(&Sequence) -> Result<EditAction>>;

/// A group member is either already built or built from the sequence state
/// left by the members before it.
pub enum GroupMember {
    Pending(ActionFactory),
    Ready(EditAction),
}

impl fmt::Debug for GroupMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupMember::Pending(_) => f.write_str("Pending(..)"),
            GroupMember::Ready(action) => f.debug_tuple("Ready").field(&action.name()).finish(),
        }
    }
}

impl GroupMember {
    fn resolve(&mut self, seq: &Sequence) -> Result<&mut EditAction> {
        if let GroupMember::Pending(_) = self {
            let placeholder = GroupMember::Ready(EditAction::new(EditOp::Noop));
            if let GroupMember::Pending(factory) = std::mem::replace(self, placeholder) {
                *self = GroupMember::Ready(factory(seq)?);
            }
        }
        match self {
            GroupMember::Ready(action) => Ok(action),
            GroupMember::Pending(_) => Err(TimelineError::InvalidOp(
                "group member could not be resolved".to_string(),
            )),
        }
    }
}

/// Several actions done and undone as one history entry.
#[derive(Debug)]
pub struct ConsolidatedEditAction {
    members: Vec<GroupMember>,
    state: ActionState,
}

impl ConsolidatedEditAction {
    pub fn new(members: Vec<GroupMember>) -> Self {
        Self {
            members,
            state: ActionState::Constructed,
        }
    }

    pub fn from_actions(actions: Vec<EditAction>) -> Self {
        Self::new(actions.into_iter().map(GroupMember::Ready).collect())
    }

    pub fn push(&mut self, action: EditAction) {
        self.members.push(GroupMember::Ready(action));
    }

    pub fn push_deferred<F>(&mut self, factory: F)
    where
        F: FnOnce(&Sequence) -> Result<EditAction> + 'static,
    {
        self.members.push(GroupMember::Pending(Box::new(factory)));
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Policy of the first built member.
    pub fn policy(&self) -> EditPolicy {
        self.members
            .iter()
            .find_map(|m| match m {
                GroupMember::Ready(action) => Some(action.policy),
                GroupMember::Pending(_) => None,
            })
            .unwrap_or_default()
    }

    pub fn redo(&mut self, cx: &mut EditContext<'_>, refresh: Refresh) -> Result<()> {
        let first_execution = self.state == ActionState::Constructed;
        let last = self.members.len().saturating_sub(1);
        for index in 0..self.members.len() {
            let member_refresh = if index == last { refresh } else { Refresh::Deferred };
            let result = self.members[index]
                .resolve(cx.seq)
                .and_then(|action| action.redo(cx, member_refresh));
            if let Err(e) = result {
                if first_execution {
                    warn!(member = index, error = %e, "group member failed, rolling back");
                    self.roll_back(cx, index);
                }
                return Err(e);
            }
        }
        debug!(members = self.members.len(), "group redo");
        self.state = ActionState::Executed;
        Ok(())
    }

    pub fn undo(&mut self, cx: &mut EditContext<'_>, refresh: Refresh) -> Result<()> {
        for index in (0..self.members.len()).rev() {
            let member_refresh = if index == 0 { refresh } else { Refresh::Deferred };
            if let GroupMember::Ready(action) = &mut self.members[index] {
                action.undo(cx, member_refresh)?;
            }
        }
        debug!(members = self.members.len(), "group undo");
        self.state = ActionState::Undone;
        Ok(())
    }

    fn roll_back(&mut self, cx: &mut EditContext<'_>, failed: usize) {
        for index in (0..failed).rev() {
            if let GroupMember::Ready(action) = &mut self.members[index] {
                if let Err(e) = action.undo(cx, Refresh::Deferred) {
                    warn!(member = index, error = %e, "group roll back failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{edits, Clip, Frame, InMemoryBackend, MediaSource, NullHost, TrackId, TrackKind};

    fn sequence() -> Sequence {
        let mut seq = Sequence::new("s");
        let v1 = seq.add_track("V1", TrackKind::Video);
        let clip = Clip::new(
            "a",
            MediaSource::File {
                path: "a.mov".to_string(),
                ttl: None,
            },
            Some(100),
        )
        .with_range(0, 59);
        seq.append(v1, clip.into()).unwrap();
        seq
    }

    fn lengths(seq: &Sequence) -> Vec<(bool, Frame)> {
        seq.track(TrackId(0))
            .unwrap()
            .items()
            .iter()
            .map(|i| (i.is_blank(), i.length()))
            .collect()
    }

    fn redo(seq: &mut Sequence, group: &mut ConsolidatedEditAction) -> Result<()> {
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        group.redo(&mut EditContext::new(seq, &mut backend, &mut host), Refresh::Immediate)
    }

    fn undo(seq: &mut Sequence, group: &mut ConsolidatedEditAction) -> Result<()> {
        let mut backend = InMemoryBackend::new();
        let mut host = NullHost;
        group.undo(&mut EditContext::new(seq, &mut backend, &mut host), Refresh::Immediate)
    }

    #[test]
    fn test_deferred_members_see_earlier_results() {
        let mut seq = sequence();
        let before = seq.clone();
        let mut group = ConsolidatedEditAction::new(Vec::new());
        group.push(edits::cut(&seq, TrackId(0), 20).unwrap());
        group.push_deferred(|seq| edits::cut(seq, TrackId(0), 40));
        group.push_deferred(|seq| edits::lift_multiple(seq, TrackId(0), 1, 1));
        assert_eq!(group.len(), 3);

        redo(&mut seq, &mut group).unwrap();
        assert_eq!(group.state(), ActionState::Executed);
        let after = lengths(&seq);
        assert_eq!(after, vec![(false, 20), (true, 20), (false, 20)]);

        undo(&mut seq, &mut group).unwrap();
        assert_eq!(group.state(), ActionState::Undone);
        assert_eq!(seq.tracks(), before.tracks());

        redo(&mut seq, &mut group).unwrap();
        assert_eq!(lengths(&seq), after);
    }

    #[test]
    fn test_failing_member_rolls_back_the_group() {
        let mut seq = sequence();
        let before = seq.clone();
        let mut group = ConsolidatedEditAction::new(Vec::new());
        group.push(edits::cut(&seq, TrackId(0), 20).unwrap());
        group.push_deferred(|seq| edits::trim_end(seq, TrackId(0), 0, -5));
        group.push_deferred(|seq| edits::lift_multiple(seq, TrackId(0), 7, 7));

        assert!(redo(&mut seq, &mut group).is_err());
        assert_eq!(group.state(), ActionState::Constructed);
        assert_eq!(seq.tracks(), before.tracks());
    }

    #[test]
    fn test_policy_comes_from_first_built_member() {
        let seq = sequence();
        let mut pending = ConsolidatedEditAction::new(Vec::new());
        pending.push_deferred(|seq| edits::cut(seq, TrackId(0), 10));
        assert_eq!(pending.policy(), EditPolicy::default());

        let group = ConsolidatedEditAction::from_actions(vec![
            edits::trim_end(&seq, TrackId(0), 0, -5).unwrap(),
            edits::cut(&seq, TrackId(0), 10).unwrap(),
        ]);
        assert!(!group.policy().exit_active_trim_mode);
        assert!(!group.is_empty());
    }

    #[test]
    fn test_undo_twice_is_rejected() {
        let mut seq = sequence();
        let mut group = ConsolidatedEditAction::from_actions(vec![edits::cut(&seq, TrackId(0), 30).unwrap()]);
        redo(&mut seq, &mut group).unwrap();
        undo(&mut seq, &mut group).unwrap();
        assert_eq!(lengths(&seq), vec![(false, 60)]);
        assert!(undo(&mut seq, &mut group).is_err());
    }
}
