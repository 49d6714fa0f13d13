use crate::model::NoteKind;
use crate::play::judgement::Judgement;

/// The visual feedback surface for the scrolling track.
///
/// All methods are side-effecting triggers; the engine never consumes a
/// return value. Implementations: a GPU track renderer (production),
/// TrackRecorder (testing).
pub trait TrackSink {
    /// Show a transient beam on a lane with the given judgement.
    fn beam(&mut self, kind: NoteKind, lane: usize, judgement: Judgement);

    /// Remove a judged chip's visual representation.
    fn remove_chip(&mut self, kind: NoteKind, lane: usize, index: usize);

    /// A hold became current (`Some(index)`) or stopped being current
    /// (`None`) on a lane.
    fn set_current_hold(&mut self, kind: NoteKind, lane: usize, index: Option<usize>);

    /// The live held state of the current hold on a lane changed.
    fn set_current_hold_state(&mut self, kind: NoteKind, lane: usize, held: bool);

    /// Draw the track scrolled to the given position.
    fn draw(&mut self, tempo_index: usize, subbeat: f64, speed: f64);
}

/// Recorded track call for testing.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackCall {
    Beam {
        kind: NoteKind,
        lane: usize,
        judgement: Judgement,
    },
    RemoveChip {
        kind: NoteKind,
        lane: usize,
        index: usize,
    },
    SetCurrentHold {
        kind: NoteKind,
        lane: usize,
        index: Option<usize>,
    },
    SetCurrentHoldState {
        kind: NoteKind,
        lane: usize,
        held: bool,
    },
    Draw {
        tempo_index: usize,
        subbeat: f64,
        speed: f64,
    },
}

/// A mock TrackSink that records every call. Does not require a GPU.
#[derive(Debug, Default)]
pub struct TrackRecorder {
    pub calls: Vec<TrackCall>,
}

impl TrackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded beams, in order.
    pub fn beams(&self) -> Vec<(NoteKind, usize, Judgement)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                TrackCall::Beam {
                    kind,
                    lane,
                    judgement,
                } => Some((*kind, *lane, *judgement)),
                _ => None,
            })
            .collect()
    }

    /// The recorded chip removals, in order.
    pub fn removed_chips(&self) -> Vec<(NoteKind, usize, usize)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                TrackCall::RemoveChip { kind, lane, index } => Some((*kind, *lane, *index)),
                _ => None,
            })
            .collect()
    }

    /// The number of draw calls recorded.
    pub fn draws(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, TrackCall::Draw { .. }))
            .count()
    }
}

impl TrackSink for TrackRecorder {
    fn beam(&mut self, kind: NoteKind, lane: usize, judgement: Judgement) {
        self.calls.push(TrackCall::Beam {
            kind,
            lane,
            judgement,
        });
    }

    fn remove_chip(&mut self, kind: NoteKind, lane: usize, index: usize) {
        self.calls.push(TrackCall::RemoveChip { kind, lane, index });
    }

    fn set_current_hold(&mut self, kind: NoteKind, lane: usize, index: Option<usize>) {
        self.calls.push(TrackCall::SetCurrentHold { kind, lane, index });
    }

    fn set_current_hold_state(&mut self, kind: NoteKind, lane: usize, held: bool) {
        self.calls
            .push(TrackCall::SetCurrentHoldState { kind, lane, held });
    }

    fn draw(&mut self, tempo_index: usize, subbeat: f64, speed: f64) {
        self.calls.push(TrackCall::Draw {
            tempo_index,
            subbeat,
            speed,
        });
    }
}
