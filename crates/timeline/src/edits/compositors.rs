use crate::{
    ClipId, Compositor, DestroyId, EditAction, EditContext, EditOp, Frame, Result, Sequence,
    TimelineError, TrackId,
};

use super::{stashed, Reversible};

/// Builds a new compositor incarnation carrying over the identity and
/// properties of `snapshot`.
fn recreate(cx: &mut EditContext<'_>, snapshot: &Compositor) -> Result<Compositor> {
    let mut compositor = cx.backend.create_compositor(&snapshot.type_id)?;
    compositor.set_tracks(snapshot.a_track, snapshot.b_track);
    compositor.set_in_and_out(snapshot.clip_in, snapshot.clip_out);
    compositor.clone_properties(snapshot);
    Ok(compositor)
}

fn check_compositor_tracks(seq: &Sequence, a_track: TrackId, b_track: TrackId) -> Result<()> {
    seq.track(a_track)?;
    seq.track(b_track)?;
    if a_track == b_track {
        return Err(TimelineError::InvalidOp(format!(
            "compositor needs two tracks, got {} twice",
            a_track
        )));
    }
    Ok(())
}

fn check_span(clip_in: Frame, clip_out: Frame) -> Result<()> {
    if clip_in < 0 || clip_out < clip_in {
        return Err(TimelineError::InvalidOp(format!(
            "compositor span {}..={}",
            clip_in, clip_out
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AddCompositor {
    pub type_id: String,
    pub a_track: TrackId,
    pub b_track: TrackId,
    pub clip_in: Frame,
    pub clip_out: Frame,
    pub origin_clip_id: Option<ClipId>,
    /// Identity given by the first redo.
    pub destroy_id: Option<DestroyId>,
    removed: Option<Compositor>,
}

impl Reversible for AddCompositor {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let compositor = match self.removed.take() {
            Some(snapshot) => recreate(cx, &snapshot)?,
            None => {
                let mut compositor = cx.backend.create_compositor(&self.type_id)?;
                compositor.set_tracks(self.a_track, self.b_track);
                compositor.set_in_and_out(self.clip_in, self.clip_out);
                compositor.origin_clip_id = self.origin_clip_id;
                compositor
            }
        };
        self.destroy_id = Some(compositor.destroy_id);
        cx.seq.compositors.add(compositor);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let id = self.destroy_id.ok_or_else(|| {
            TimelineError::InvalidOp("add compositor: undo before redo".to_string())
        })?;
        self.removed = Some(cx.seq.compositors.remove(id)?);
        Ok(())
    }
}

pub fn add_compositor(
    seq: &Sequence,
    type_id: impl Into<String>,
    a_track: TrackId,
    b_track: TrackId,
    clip_in: Frame,
    clip_out: Frame,
    origin_clip_id: Option<ClipId>,
) -> Result<EditAction> {
    check_compositor_tracks(seq, a_track, b_track)?;
    check_span(clip_in, clip_out)?;
    if let Some(origin) = origin_clip_id {
        seq.clip_by_id(origin)?;
    }
    Ok(EditAction::new(EditOp::AddCompositor(AddCompositor {
        type_id: type_id.into(),
        a_track,
        b_track,
        clip_in,
        clip_out,
        origin_clip_id,
        destroy_id: None,
        removed: None,
    })))
}

#[derive(Debug, Clone)]
pub struct DeleteCompositor {
    pub destroy_id: DestroyId,
    removed: Option<Compositor>,
}

impl Reversible for DeleteCompositor {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.removed = Some(cx.seq.compositors.remove(self.destroy_id)?);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let snapshot = stashed(&mut self.removed, "delete compositor")?;
        let compositor = recreate(cx, &snapshot)?;
        cx.seq.compositors.add(compositor);
        Ok(())
    }
}

pub fn delete_compositor(seq: &Sequence, destroy_id: DestroyId) -> Result<EditAction> {
    if seq.compositors.get(destroy_id).is_none() {
        return Err(TimelineError::CompositorNotFound(destroy_id));
    }
    Ok(EditAction::new(EditOp::DeleteCompositor(DeleteCompositor {
        destroy_id,
        removed: None,
    })))
}

/// Sets a compositor's span.
#[derive(Debug, Clone)]
pub struct MoveCompositor {
    pub destroy_id: DestroyId,
    pub clip_in: Frame,
    pub clip_out: Frame,
    orig: Option<(Frame, Frame)>,
}

impl Reversible for MoveCompositor {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let compositor = cx.seq.compositors.get_mut(self.destroy_id)?;
        self.orig = Some((compositor.clip_in, compositor.clip_out));
        compositor.set_in_and_out(self.clip_in, self.clip_out);
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        let (clip_in, clip_out) = stashed(&mut self.orig, "move compositor")?;
        cx.seq
            .compositors
            .get_mut(self.destroy_id)?
            .set_in_and_out(clip_in, clip_out);
        Ok(())
    }
}

pub fn move_compositor(
    seq: &Sequence,
    destroy_id: DestroyId,
    clip_in: Frame,
    clip_out: Frame,
) -> Result<EditAction> {
    if seq.compositors.get(destroy_id).is_none() {
        return Err(TimelineError::CompositorNotFound(destroy_id));
    }
    check_span(clip_in, clip_out)?;
    Ok(EditAction::new(EditOp::MoveCompositor(MoveCompositor {
        destroy_id,
        clip_in,
        clip_out,
        orig: None,
    })))
}
