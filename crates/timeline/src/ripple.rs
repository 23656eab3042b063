use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{DestroyId, Frame, Result, Sequence, TimelineError, Track, TrackId};

/// How one track absorbs a multi-track move.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MultiOp {
    /// Nothing after the move frame.
    Noop,
    /// Resize the blank before the moved content.
    Trim,
    /// No blank to shrink; a new blank is inserted before the moved content.
    AddTrim,
    /// The blank is exactly as long as the largest backwards move, and is
    /// removed when the move uses all of it.
    TrimRemove,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackMove {
    pub track: TrackId,
    pub affected: bool,
    pub op: MultiOp,
    pub blank_index: usize,
}

/// Per-track plan for moving everything at or after a frame by a delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiTrackData {
    pub first_moved_frame: Frame,
    /// Largest backwards move every affected track can absorb.
    pub max_backwards: Frame,
    pub tracks: Vec<TrackMove>,
    pub moved_compositors: Vec<DestroyId>,
}

struct Classified {
    affected: bool,
    add_trim: bool,
    blank_index: usize,
    available: Option<Frame>,
}

fn classify(track: &Track, frame: Frame) -> Classified {
    let boundary = (0..=track.count())
        .find(|i| track.clip_start(*i) >= frame)
        .unwrap_or(track.count());
    if boundary == track.count() {
        return Classified {
            affected: false,
            add_trim: false,
            blank_index: 0,
            available: None,
        };
    }
    if boundary > 0 && track.is_blank_at(boundary - 1) {
        return Classified {
            affected: true,
            add_trim: false,
            blank_index: boundary - 1,
            available: track.blank_length(boundary - 1).ok(),
        };
    }
    Classified {
        affected: true,
        add_trim: true,
        blank_index: boundary,
        available: None,
    }
}

impl MultiTrackData {
    fn build(seq: &Sequence, frame: Frame, skip: Option<TrackId>) -> Self {
        let classified: Vec<(TrackId, Classified)> = seq
            .tracks()
            .iter()
            .map(|t| {
                if Some(t.id) == skip {
                    (
                        t.id,
                        Classified {
                            affected: false,
                            add_trim: false,
                            blank_index: 0,
                            available: None,
                        },
                    )
                } else {
                    (t.id, classify(t, frame))
                }
            })
            .collect();

        let any_add_trim = classified.iter().any(|(_, c)| c.add_trim);
        let max_backwards = if any_add_trim {
            0
        } else {
            classified
                .iter()
                .filter_map(|(_, c)| c.available)
                .fold(frame, Frame::min)
        };

        let tracks: Vec<TrackMove> = classified
            .iter()
            .map(|(track, c)| {
                let op = if !c.affected {
                    MultiOp::Noop
                } else if c.add_trim {
                    MultiOp::AddTrim
                } else if c.available.map_or(false, |len| len > max_backwards) {
                    MultiOp::Trim
                } else {
                    MultiOp::TrimRemove
                };
                TrackMove {
                    track: *track,
                    affected: c.affected,
                    op,
                    blank_index: c.blank_index,
                }
            })
            .collect();

        let mut moved_tracks: Vec<TrackId> = tracks
            .iter()
            .filter(|m| m.affected)
            .map(|m| m.track)
            .collect();
        moved_tracks.extend(skip);
        let moved_compositors = seq.compositors.ids_on_tracks_from(&moved_tracks, frame);

        Self {
            first_moved_frame: frame,
            max_backwards,
            tracks,
            moved_compositors,
        }
    }

    /// Plan for moving every track's content at or after `frame`.
    pub fn for_multi_move(seq: &Sequence, frame: Frame) -> Self {
        Self::build(seq, frame, None)
    }

    /// Plan for the tracks other than `edit_track` when a ripple trim moves
    /// the content after `frame` on `edit_track`. Compositors on the edit
    /// track move with it.
    pub fn for_ripple(seq: &Sequence, edit_track: TrackId, frame: Frame) -> Self {
        Self::build(seq, frame, Some(edit_track))
    }

    pub fn check_delta(&self, delta: Frame) -> Result<()> {
        if delta == 0 {
            return Err(TimelineError::InvalidOp("zero length move".to_string()));
        }
        if delta < -self.max_backwards {
            return Err(TimelineError::InvalidOp(format!(
                "move of {} exceeds available backwards room of {}",
                delta, self.max_backwards
            )));
        }
        Ok(())
    }

    pub fn affected_tracks(&self) -> impl Iterator<Item = &TrackMove> {
        self.tracks.iter().filter(|m| m.affected)
    }

    /// Moves the content of every affected track by `delta`. Returns the
    /// original lengths of `TrimRemove` blanks for `revert`.
    pub fn apply(&self, seq: &mut Sequence, delta: Frame) -> Result<Vec<(TrackId, Frame)>> {
        let mut trim_removed = Vec::new();
        for m in self.affected_tracks() {
            match m.op {
                MultiOp::Noop => {}
                MultiOp::Trim => {
                    let length = seq.remove_item(m.track, m.blank_index)?.length();
                    seq.insert_blank(m.track, m.blank_index, length + delta)?;
                }
                MultiOp::AddTrim => seq.insert_blank(m.track, m.blank_index, delta)?,
                MultiOp::TrimRemove => {
                    let length = seq.remove_item(m.track, m.blank_index)?.length();
                    if delta != -self.max_backwards {
                        seq.insert_blank(m.track, m.blank_index, length + delta)?;
                    } else {
                        debug!(track = %m.track, "blank removed by full backwards move");
                    }
                    trim_removed.push((m.track, length));
                }
            }
        }
        Ok(trim_removed)
    }

    pub fn revert(
        &self,
        seq: &mut Sequence,
        delta: Frame,
        trim_removed: &[(TrackId, Frame)],
    ) -> Result<()> {
        for m in self.affected_tracks() {
            match m.op {
                MultiOp::Noop => {}
                MultiOp::Trim => {
                    let length = seq.remove_item(m.track, m.blank_index)?.length();
                    seq.insert_blank(m.track, m.blank_index, length - delta)?;
                }
                MultiOp::AddTrim => {
                    seq.remove_item(m.track, m.blank_index)?;
                }
                MultiOp::TrimRemove => {
                    let orig = trim_removed
                        .iter()
                        .find(|(t, _)| *t == m.track)
                        .map(|(_, len)| *len)
                        .ok_or_else(|| {
                            TimelineError::InvalidOp(format!(
                                "no recorded blank length for track {}",
                                m.track
                            ))
                        })?;
                    if delta != -self.max_backwards {
                        seq.remove_item(m.track, m.blank_index)?;
                    }
                    seq.insert_blank(m.track, m.blank_index, orig)?;
                }
            }
        }
        Ok(())
    }
}
