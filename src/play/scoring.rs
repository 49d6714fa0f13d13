use std::sync::Arc;

use tracing::trace;

use crate::model::{BT_LANES, Chart, FX_LANES, Note, NoteKind};
use crate::play::judgement::{JudgeWindows, Judgement};

/// Per-judgement tallies and combo tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JudgeCounts {
    pub criticals: u32,
    pub nears: u32,
    pub errors: u32,
    pub combo: u32,
    pub max_combo: u32,
}

impl JudgeCounts {
    fn record(&mut self, judgement: Judgement) {
        match judgement {
            Judgement::Critical => {
                self.criticals += 1;
                self.combo += 1;
            }
            Judgement::Near => {
                self.nears += 1;
                self.combo += 1;
            }
            Judgement::Error => {
                self.errors += 1;
                self.combo = 0;
            }
        }
        self.max_combo = self.max_combo.max(self.combo);
    }
}

/// Hold judgements produced by one tick, per lane of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickJudgements {
    pub bt: [Option<Judgement>; BT_LANES],
    pub fx: [Option<Judgement>; FX_LANES],
}

impl TickJudgements {
    /// The per-lane judgements for the given kind.
    pub fn lanes(&self, kind: NoteKind) -> &[Option<Judgement>] {
        match kind {
            NoteKind::Bt => &self.bt,
            NoteKind::Fx => &self.fx,
        }
    }
}

/// Per-lane judging state for one note kind.
#[derive(Debug)]
struct LaneGroup {
    /// Index of the note currently in its judgeable window, per lane.
    current: Vec<Option<usize>>,

    /// Whether each chip has been judged, per lane. A chip is judged at
    /// most once across its lifetime.
    chips_judged: Vec<Vec<bool>>,

    /// Whether the button is down while a hold is current, per lane.
    holds_held: Vec<bool>,
}

impl LaneGroup {
    fn new(notes: &[Vec<Note>]) -> Self {
        Self {
            current: vec![None; notes.len()],
            chips_judged: notes.iter().map(|lane| vec![false; lane.len()]).collect(),
            holds_held: vec![false; notes.len()],
        }
    }
}

/// The scoring state machine: tracks the current note per lane, judged
/// chips, and live hold state, and turns note transitions and input events
/// into judgements.
///
/// Indices passed in must reference notes of the chart this scoring was
/// created with; anything else is a caller bug and panics.
pub struct Scoring {
    chart: Arc<Chart>,
    windows: JudgeWindows,
    bt: LaneGroup,
    fx: LaneGroup,
    counts: JudgeCounts,
}

impl Scoring {
    pub fn new(chart: Arc<Chart>, windows: JudgeWindows) -> Self {
        let bt = LaneGroup::new(&chart.bt_notes);
        let fx = LaneGroup::new(&chart.fx_notes);
        Self {
            chart,
            windows,
            bt,
            fx,
            counts: JudgeCounts::default(),
        }
    }

    /// Judgement tallies so far.
    pub fn counts(&self) -> &JudgeCounts {
        &self.counts
    }

    /// The note currently active on the given lane, if any.
    pub fn current_note(&self, kind: NoteKind, lane: usize) -> Option<usize> {
        self.group(kind).current[lane]
    }

    /// Whether the button is held on a lane with a current hold.
    pub fn hold_held(&self, kind: NoteKind, lane: usize) -> bool {
        self.group(kind).holds_held[lane]
    }

    /// Whether the given chip has been judged.
    pub fn chip_judged(&self, kind: NoteKind, lane: usize, index: usize) -> bool {
        self.group(kind).chips_judged[lane][index]
    }

    /// A note entered its judgeable window and is now the lane's active
    /// note. Produces no judgement.
    pub fn note_current(&mut self, kind: NoteKind, lane: usize, index: usize) {
        assert!(
            index < self.chart.notes(kind)[lane].len(),
            "note index out of range"
        );
        self.group_mut(kind).current[lane] = Some(index);
    }

    /// A note left its judgeable window.
    ///
    /// A chip that was never judged is judged `Error` here, exactly once.
    /// Always clears the lane's active note and hold-held state.
    pub fn note_passed(&mut self, kind: NoteKind, lane: usize, index: usize) -> Option<Judgement> {
        let note = *self.chart.note(kind, lane, index);
        let group = self.group_mut(kind);

        let mut judgement = None;
        if !note.is_hold() && !group.chips_judged[lane][index] {
            group.chips_judged[lane][index] = true;
            judgement = Some(Judgement::Error);
        }

        group.current[lane] = None;
        group.holds_held[lane] = false;

        if let Some(j) = judgement {
            trace!(?kind, lane, index, "chip passed unjudged");
            self.counts.record(j);
        }
        judgement
    }

    /// A raw button transition on the given lane.
    ///
    /// For a current hold this records the live held state and produces no
    /// judgement (holds are judged by tick). For a current unjudged chip a
    /// press produces its one judgement.
    pub fn state_changed(
        &mut self,
        kind: NoteKind,
        lane: usize,
        pressed: bool,
        time_ms: f64,
    ) -> Option<Judgement> {
        let Some(index) = self.group(kind).current[lane] else {
            return None;
        };
        let note = *self.chart.note(kind, lane, index);

        if note.is_hold() {
            self.group_mut(kind).holds_held[lane] = pressed;
            return None;
        }

        if self.group(kind).chips_judged[lane][index] || !pressed {
            return None;
        }

        self.group_mut(kind).chips_judged[lane][index] = true;
        let judgement = self.windows.judge_chip(note.start_time_ms, time_ms);
        trace!(?kind, lane, index, ?judgement, "chip hit");
        self.counts.record(judgement);
        Some(judgement)
    }

    /// The playback tick advanced. Judges every current hold on every
    /// lane: `Critical` while held, `Error` while dropped.
    ///
    /// The first and last tick of a hold never judge, so the grace windows
    /// at either edge are not penalized twice.
    pub fn tick_changed(&mut self, tick: i64, subbeat: i64) -> TickJudgements {
        let mut judgements = TickJudgements::default();

        for kind in [NoteKind::Bt, NoteKind::Fx] {
            for lane in 0..kind.lane_count() {
                let Some(index) = self.group(kind).current[lane] else {
                    continue;
                };
                let note = *self.chart.note(kind, lane, index);
                let Some(end_subbeat) = note.end_subbeat else {
                    continue;
                };

                if subbeat <= i64::from(note.start_subbeat) || subbeat >= i64::from(end_subbeat) {
                    continue;
                }

                let judgement = if self.group(kind).holds_held[lane] {
                    Judgement::Critical
                } else {
                    Judgement::Error
                };
                trace!(?kind, lane, index, tick, ?judgement, "hold tick");
                self.counts.record(judgement);
                match kind {
                    NoteKind::Bt => judgements.bt[lane] = Some(judgement),
                    NoteKind::Fx => judgements.fx[lane] = Some(judgement),
                }
            }
        }

        judgements
    }

    fn group(&self, kind: NoteKind) -> &LaneGroup {
        match kind {
            NoteKind::Bt => &self.bt,
            NoteKind::Fx => &self.fx,
        }
    }

    fn group_mut(&mut self, kind: NoteKind) -> &mut LaneGroup {
        match kind {
            NoteKind::Bt => &mut self.bt,
            NoteKind::Fx => &mut self.fx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{single_chip_chart, single_hold_chart, windows_50hz};

    fn scoring(chart: Chart) -> Scoring {
        Scoring::new(Arc::new(chart), windows_50hz())
    }

    #[test]
    fn chip_press_is_judged_once() {
        let mut scoring = scoring(single_chip_chart(NoteKind::Bt, 1, 96));
        scoring.note_current(NoteKind::Bt, 1, 0);

        let start = scoring.chart.bt_notes[1][0].start_time_ms;
        let first = scoring.state_changed(NoteKind::Bt, 1, true, start);
        assert_eq!(first, Some(Judgement::Critical));

        // a second press on the same chip yields nothing
        let second = scoring.state_changed(NoteKind::Bt, 1, true, start + 5.0);
        assert_eq!(second, None);

        // and passing it afterwards yields nothing either
        let passed = scoring.note_passed(NoteKind::Bt, 1, 0);
        assert_eq!(passed, None);
        assert_eq!(scoring.counts().criticals, 1);
        assert_eq!(scoring.counts().errors, 0);
    }

    #[test]
    fn unjudged_chip_errors_exactly_once_on_pass() {
        let mut scoring = scoring(single_chip_chart(NoteKind::Fx, 0, 96));
        scoring.note_current(NoteKind::Fx, 0, 0);

        assert_eq!(scoring.note_passed(NoteKind::Fx, 0, 0), Some(Judgement::Error));
        assert_eq!(scoring.counts().errors, 1);
        assert_eq!(scoring.current_note(NoteKind::Fx, 0), None);
    }

    #[test]
    fn release_does_not_judge_a_chip() {
        let mut scoring = scoring(single_chip_chart(NoteKind::Bt, 0, 96));
        scoring.note_current(NoteKind::Bt, 0, 0);

        let start = scoring.chart.bt_notes[0][0].start_time_ms;
        assert_eq!(scoring.state_changed(NoteKind::Bt, 0, false, start), None);
        assert!(!scoring.chip_judged(NoteKind::Bt, 0, 0));
    }

    #[test]
    fn no_current_note_returns_no_judgement() {
        let mut scoring = scoring(single_chip_chart(NoteKind::Bt, 0, 96));
        assert_eq!(scoring.state_changed(NoteKind::Bt, 0, true, 0.0), None);
    }

    #[test]
    fn hold_press_and_release_track_held_state() {
        let mut scoring = scoring(single_hold_chart(NoteKind::Fx, 1, 96, 192));
        scoring.note_current(NoteKind::Fx, 1, 0);

        assert_eq!(scoring.state_changed(NoteKind::Fx, 1, true, 400.0), None);
        assert!(scoring.hold_held(NoteKind::Fx, 1));

        assert_eq!(scoring.state_changed(NoteKind::Fx, 1, false, 600.0), None);
        assert!(!scoring.hold_held(NoteKind::Fx, 1));
    }

    #[test]
    fn note_passed_clears_held_state() {
        let mut scoring = scoring(single_hold_chart(NoteKind::Bt, 3, 96, 192));
        scoring.note_current(NoteKind::Bt, 3, 0);
        scoring.state_changed(NoteKind::Bt, 3, true, 500.0);

        // holds produce no pass judgement
        assert_eq!(scoring.note_passed(NoteKind::Bt, 3, 0), None);
        assert!(!scoring.hold_held(NoteKind::Bt, 3));
    }

    #[test]
    fn hold_ticks_exclude_first_and_last() {
        // hold spanning subbeats [96, 192] with current tick state held
        let mut scoring = scoring(single_hold_chart(NoteKind::Fx, 0, 96, 192));
        scoring.note_current(NoteKind::Fx, 0, 0);
        scoring.state_changed(NoteKind::Fx, 0, true, 500.0);

        assert_eq!(scoring.tick_changed(8, 96).fx[0], None);
        assert_eq!(scoring.tick_changed(9, 108).fx[0], Some(Judgement::Critical));
        assert_eq!(scoring.tick_changed(10, 120).fx[0], Some(Judgement::Critical));
        assert_eq!(scoring.tick_changed(16, 192).fx[0], None);
    }

    #[test]
    fn dropped_hold_ticks_error() {
        let mut scoring = scoring(single_hold_chart(NoteKind::Bt, 2, 96, 192));
        scoring.note_current(NoteKind::Bt, 2, 0);

        assert_eq!(scoring.tick_changed(10, 120).bt[2], Some(Judgement::Error));
        assert_eq!(scoring.counts().errors, 1);
    }

    #[test]
    fn chips_never_tick() {
        let mut scoring = scoring(single_chip_chart(NoteKind::Bt, 0, 96));
        scoring.note_current(NoteKind::Bt, 0, 0);
        assert_eq!(scoring.tick_changed(10, 120), TickJudgements::default());
    }

    #[test]
    fn combo_grows_and_resets() {
        let mut scoring = scoring(single_hold_chart(NoteKind::Fx, 0, 0, 960));
        scoring.note_current(NoteKind::Fx, 0, 0);
        scoring.state_changed(NoteKind::Fx, 0, true, 0.0);

        scoring.tick_changed(1, 12);
        scoring.tick_changed(2, 24);
        assert_eq!(scoring.counts().combo, 2);

        scoring.state_changed(NoteKind::Fx, 0, false, 300.0);
        scoring.tick_changed(3, 36);
        assert_eq!(scoring.counts().combo, 0);
        assert_eq!(scoring.counts().max_combo, 2);
    }
}
