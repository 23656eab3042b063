//! Blank normalization run at every edit boundary, with undo records.

use tracing::debug;

use crate::{Frame, Result, Sequence, TrackId};

/// One merged run of adjacent blanks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationStep {
    pub track: TrackId,
    pub index: usize,
    pub removed_lengths: Vec<Frame>,
}

/// Merges the run of blanks starting at `index` into one blank.
/// Returns `None` when fewer than two blanks start there.
pub fn merge_blank_run(
    seq: &mut Sequence,
    track: TrackId,
    index: usize,
) -> Result<Option<ConsolidationStep>> {
    let run = {
        let t = seq.track(track)?;
        (index..t.count()).take_while(|i| t.is_blank_at(*i)).count()
    };
    if run < 2 {
        return Ok(None);
    }
    let mut removed_lengths = Vec::with_capacity(run);
    for _ in 0..run {
        removed_lengths.push(seq.remove_item(track, index)?.length());
    }
    seq.insert_blank(track, index, removed_lengths.iter().sum())?;
    Ok(Some(ConsolidationStep {
        track,
        index,
        removed_lengths,
    }))
}

pub fn consolidate_track_blanks(
    seq: &mut Sequence,
    track: TrackId,
) -> Result<Vec<ConsolidationStep>> {
    let mut steps = Vec::new();
    let mut index = 0;
    while index < seq.track(track)?.count() {
        if let Some(step) = merge_blank_run(seq, track, index)? {
            steps.push(step);
        }
        index += 1;
    }
    Ok(steps)
}

/// Merges every run of two or more adjacent blanks on every track.
pub fn consolidate_all_blanks(seq: &mut Sequence) -> Result<Vec<ConsolidationStep>> {
    let mut steps = Vec::new();
    for track in seq.track_ids() {
        steps.extend(consolidate_track_blanks(seq, track)?);
    }
    if !steps.is_empty() {
        debug!(runs = steps.len(), "consolidated blanks");
    }
    Ok(steps)
}

/// Splits merged blanks back apart, replaying `steps` in reverse.
pub fn undo_consolidation(seq: &mut Sequence, steps: &[ConsolidationStep]) -> Result<()> {
    for step in steps.iter().rev() {
        seq.remove_item(step.track, step.index)?;
        for (offset, length) in step.removed_lengths.iter().enumerate() {
            seq.insert_blank(step.track, step.index + offset, *length)?;
        }
    }
    Ok(())
}

/// Removes the trailing blank of every track. After consolidation a track has
/// at most one.
pub fn remove_all_trailing_blanks(seq: &mut Sequence) -> Result<Vec<(TrackId, Frame)>> {
    let mut removed = Vec::new();
    for track in seq.track_ids() {
        loop {
            let count = seq.track(track)?.count();
            if count == 0 || !seq.track(track)?.is_blank_at(count - 1) {
                break;
            }
            removed.push((track, seq.remove_item(track, count - 1)?.length()));
        }
    }
    Ok(removed)
}

pub fn restore_trailing_blanks(seq: &mut Sequence, removed: &[(TrackId, Frame)]) -> Result<()> {
    for (track, length) in removed.iter().rev() {
        let count = seq.track(*track)?.count();
        seq.insert_blank(*track, count, *length)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Clip, MediaSource, TrackItem, TrackKind};

    fn clip() -> Clip {
        Clip::new(
            "c",
            MediaSource::File {
                path: "c.mp4".to_string(),
                ttl: None,
            },
            Some(100),
        )
        .with_range(0, 9)
    }

    fn fragmented() -> (Sequence, TrackId) {
        let mut seq = Sequence::new("s");
        let t = seq.add_track("V1", TrackKind::Video);
        seq.append(t, TrackItem::blank(5)).unwrap();
        seq.append(t, TrackItem::blank(7)).unwrap();
        seq.append(t, clip().into()).unwrap();
        seq.append(t, TrackItem::blank(3)).unwrap();
        seq.append(t, clip().into()).unwrap();
        seq.append(t, TrackItem::blank(1)).unwrap();
        seq.append(t, TrackItem::blank(2)).unwrap();
        seq.append(t, TrackItem::blank(4)).unwrap();
        (seq, t)
    }

    fn lengths(seq: &Sequence, t: TrackId) -> Vec<Frame> {
        seq.track(t).unwrap().items().iter().map(TrackItem::length).collect()
    }

    #[test]
    fn test_consolidate_merges_runs_only() {
        let (mut seq, t) = fragmented();
        let steps = consolidate_all_blanks(&mut seq).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(lengths(&seq, t), vec![12, 10, 3, 10, 7]);
        assert_eq!(steps[1].removed_lengths, vec![1, 2, 4]);
    }

    #[test]
    fn test_consolidate_is_idempotent() {
        let (mut seq, t) = fragmented();
        consolidate_all_blanks(&mut seq).unwrap();
        let once = lengths(&seq, t);
        let steps = consolidate_all_blanks(&mut seq).unwrap();
        assert!(steps.is_empty());
        assert_eq!(lengths(&seq, t), once);
    }

    #[test]
    fn test_undo_consolidation_restores_fragments() {
        let (mut seq, t) = fragmented();
        let before = lengths(&seq, t);
        let steps = consolidate_all_blanks(&mut seq).unwrap();
        undo_consolidation(&mut seq, &steps).unwrap();
        assert_eq!(lengths(&seq, t), before);
    }

    #[test]
    fn test_trailing_blanks_strip_and_restore() {
        let (mut seq, t) = fragmented();
        let before = lengths(&seq, t);
        let removed = remove_all_trailing_blanks(&mut seq).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(lengths(&seq, t), vec![5, 7, 10, 3, 10]);
        restore_trailing_blanks(&mut seq, &removed).unwrap();
        assert_eq!(lengths(&seq, t), before);
    }
}
