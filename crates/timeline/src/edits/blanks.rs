use crate::blanks::{self as normalize, ConsolidationStep};
use crate::{EditAction, EditContext, EditOp, Result, Sequence, TimelineError, TrackId};

use super::{unlocked_track, Reversible};

/// Merges adjacent blanks, either one run or every run in the sequence.
#[derive(Debug, Clone)]
pub struct ConsolidateBlanks {
    /// `None` merges every run on every track.
    pub run: Option<(TrackId, usize)>,
    steps: Vec<ConsolidationStep>,
}

impl Reversible for ConsolidateBlanks {
    fn redo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        self.steps = match self.run {
            Some((track, index)) => normalize::merge_blank_run(cx.seq, track, index)?
                .into_iter()
                .collect(),
            None => normalize::consolidate_all_blanks(cx.seq)?,
        };
        Ok(())
    }

    fn undo(&mut self, cx: &mut EditContext<'_>) -> Result<()> {
        normalize::undo_consolidation(cx.seq, &std::mem::take(&mut self.steps))
    }
}

/// Merges the blanks starting at `index` into one.
pub fn consolidate_selected_blanks(seq: &Sequence, track: TrackId, index: usize) -> Result<EditAction> {
    let t = unlocked_track(seq, track)?;
    if !(t.is_blank_at(index) && t.is_blank_at(index + 1)) {
        return Err(TimelineError::InvalidOp(format!(
            "no run of blanks at index {} on track {}",
            index, track
        )));
    }
    Ok(EditAction::new(EditOp::ConsolidateSelectedBlanks(ConsolidateBlanks {
        run: Some((track, index)),
        steps: Vec::new(),
    })))
}

pub fn consolidate_all_blanks(_seq: &Sequence) -> Result<EditAction> {
    Ok(EditAction::new(EditOp::ConsolidateAllBlanks(ConsolidateBlanks {
        run: None,
        steps: Vec::new(),
    })))
}
