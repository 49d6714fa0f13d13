//! Fixture helpers shared by the unit tests.

use crate::model::{Chart, ChartBuilder, NoteKind, SUBBEATS_PER_BEAT};
use crate::play::judgement::JudgeWindows;

/// Windows at a 50hz refresh: a round 20ms frame, so critical/near/error
/// are 40/80/160ms.
pub fn windows_50hz() -> JudgeWindows {
    JudgeWindows::from_frames(50.0, 2.0, 4.0, 8.0)
}

/// A 120 bpm chart holding a single chip on the given lane.
pub fn single_chip_chart(kind: NoteKind, lane: usize, subbeat: u32) -> Chart {
    ChartBuilder::new()
        .tempo(120.0, 0)
        .chip(kind, lane, subbeat)
        .end_at(subbeat + SUBBEATS_PER_BEAT * 8)
        .build()
        .unwrap()
}

/// A 120 bpm chart holding a single hold on the given lane.
pub fn single_hold_chart(kind: NoteKind, lane: usize, start: u32, end: u32) -> Chart {
    ChartBuilder::new()
        .tempo(120.0, 0)
        .hold(kind, lane, start, end)
        .end_at(end + SUBBEATS_PER_BEAT * 8)
        .build()
        .unwrap()
}
