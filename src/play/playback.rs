use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::PlayConfig;
use crate::model::{ANALOG_LANES, BT_LANES, Chart, FX_LANES, Note, NoteKind};
use crate::play::judgement::{JudgeWindows, Judgement};
use crate::play::scoring::Scoring;
use crate::traits::audio::AudioTrack;
use crate::traits::input::InputSource;
use crate::traits::time::TimeProvider;
use crate::traits::track::TrackSink;

/// Session state of a playback.
///
/// `Finished` is terminal; `update` must not be called again once it has
/// been returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    NotStarted,
    Started,
    Finished,
}

/// The current analog segment on a lane: which analog, and which of its
/// points starts the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogCursor {
    pub analog: usize,
    pub segment: usize,
}

/// The per-frame playback driver for one play session.
///
/// Advances wall-clock time into musical position, keeps the per-lane
/// current notes and analog segments up to date, feeds transitions and
/// input events to [`Scoring`], drives the periodic hold ticks, and
/// delegates drawing and feedback to the track.
///
/// Single-threaded and cooperative: one `update` per render frame, with
/// input events delivered between frames from the same thread.
pub struct Playback<C: TimeProvider, A: AudioTrack, T: TrackSink> {
    chart: Arc<Chart>,
    clock: C,
    audio: A,
    track: T,
    scoring: Scoring,
    windows: JudgeWindows,
    config: PlayConfig,

    state: PlaybackState,
    start_time_ms: Option<f64>,
    speed: f64,

    /// Index of the tempo in effect. Only ever advances within a session.
    tempo_index: usize,

    /// The last hold-judgement tick processed.
    last_tick: Option<i64>,

    current_bt: [Option<usize>; BT_LANES],
    current_fx: [Option<usize>; FX_LANES],

    /// Per-lane scan cursors: the first note whose judgeable window has not
    /// ended yet. Time only moves forward, so notes before the cursor can
    /// never become current again.
    scan_bt: [usize; BT_LANES],
    scan_fx: [usize; FX_LANES],

    current_analogs: [Option<AnalogCursor>; ANALOG_LANES],
}

impl<C: TimeProvider, A: AudioTrack, T: TrackSink> Playback<C, A, T> {
    pub fn new(chart: Arc<Chart>, clock: C, audio: A, track: T, config: PlayConfig) -> Self {
        let windows = config.windows();
        let scoring = Scoring::new(Arc::clone(&chart), windows.clone());
        Self {
            chart,
            clock,
            audio,
            track,
            scoring,
            windows,
            speed: config.hispeed,
            config,
            state: PlaybackState::NotStarted,
            start_time_ms: None,
            tempo_index: 0,
            last_tick: None,
            current_bt: [None; BT_LANES],
            current_fx: [None; FX_LANES],
            scan_bt: [0; BT_LANES],
            scan_fx: [0; FX_LANES],
            current_analogs: [None; ANALOG_LANES],
        }
    }

    /// Schedule playback to begin `delay_ms` from now. The transition to
    /// `Started` (and the audio trigger) happens on the first `update`
    /// at or past that time.
    pub fn start(&mut self, delay_ms: f64) {
        assert!(self.start_time_ms.is_none(), "playback already started");
        self.start_time_ms = Some(self.clock.now_ms() + delay_ms);
        debug!(delay_ms, title = %self.chart.title, "playback scheduled");
    }

    /// Advance the session to the current time and draw the track.
    ///
    /// Must be called once per frame after `start`; returns the state the
    /// session is now in.
    pub fn update(&mut self) -> PlaybackState {
        let start_time = self
            .start_time_ms
            .expect("start() must be called before update()");
        assert!(
            self.state != PlaybackState::Finished,
            "update() called after playback finished"
        );

        let relative = self.clock.now_ms() - start_time;

        if self.state == PlaybackState::NotStarted && relative >= 0.0 {
            self.audio.play();
            self.state = PlaybackState::Started;
            debug!(title = %self.chart.title, "playback started");
        }

        if relative >= self.chart.end_time_ms {
            self.state = PlaybackState::Finished;
            debug!("playback finished");
            return self.state;
        }

        self.advance_tempo(relative);
        self.update_current(relative);
        self.update_current_analogs(relative);

        if self.state == PlaybackState::Started {
            self.update_ticks(relative);
        }

        // draw at the chart origin during the pre-roll so there is no
        // scroll-in before playback starts
        let subbeat = if self.state == PlaybackState::Started {
            self.chart
                .time_to_subbeat(self.tempo_index, relative)
                .max(0.0)
        } else {
            0.0
        };
        self.track.draw(self.tempo_index, subbeat, self.speed);

        self.state
    }

    /// A BT button changed state.
    pub fn bt_state_changed(&mut self, lane: usize, pressed: bool) {
        self.note_state_changed(NoteKind::Bt, lane, pressed);
    }

    /// An FX button changed state.
    pub fn fx_state_changed(&mut self, lane: usize, pressed: bool) {
        self.note_state_changed(NoteKind::Fx, lane, pressed);
    }

    /// Drain an input source and route each event through scoring.
    /// Intended to be called once per frame, between updates.
    pub fn poll_input<I: InputSource>(&mut self, input: &mut I) {
        for event in input.poll_events() {
            self.note_state_changed(event.kind, event.lane, event.pressed);
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn track(&self) -> &T {
        &self.track
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn tempo_index(&self) -> usize {
        self.tempo_index
    }

    /// The note currently in its judgeable window on a lane, if any.
    pub fn current_note(&self, kind: NoteKind, lane: usize) -> Option<usize> {
        match kind {
            NoteKind::Bt => self.current_bt[lane],
            NoteKind::Fx => self.current_fx[lane],
        }
    }

    /// The analog segment currently active on a lane, if any.
    pub fn current_analog(&self, lane: usize) -> Option<AnalogCursor> {
        self.current_analogs[lane]
    }

    /// Set the track scroll speed.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    fn advance_tempo(&mut self, relative: f64) {
        while self
            .chart
            .tempos
            .get(self.tempo_index + 1)
            .is_some_and(|tempo| tempo.time_ms <= relative)
        {
            self.tempo_index += 1;
            trace!(
                tempo_index = self.tempo_index,
                bpm = self.chart.tempos[self.tempo_index].bpm,
                "tempo change"
            );
        }
    }

    fn update_current(&mut self, relative: f64) {
        let chart = Arc::clone(&self.chart);
        for kind in [NoteKind::Bt, NoteKind::Fx] {
            for lane in 0..kind.lane_count() {
                let notes = &chart.notes(kind)[lane];
                let scan_from = match kind {
                    NoteKind::Bt => &mut self.scan_bt[lane],
                    NoteKind::Fx => &mut self.scan_fx[lane],
                };
                let current = scan_lane(notes, &self.windows, scan_from, relative);
                let last = match kind {
                    NoteKind::Bt => self.current_bt[lane],
                    NoteKind::Fx => self.current_fx[lane],
                };
                if current == last {
                    continue;
                }

                // outgoing before incoming, so the pass-side state clear
                // cannot clobber the note that just became current
                if let Some(index) = last {
                    let judgement = self.scoring.note_passed(kind, lane, index);
                    if judgement.is_some() {
                        trace!(?kind, lane, index, "missed chip");
                    }
                    if notes[index].is_hold() {
                        self.track.set_current_hold(kind, lane, None);
                    }
                }
                if let Some(index) = current {
                    self.scoring.note_current(kind, lane, index);
                    if notes[index].is_hold() {
                        self.track.set_current_hold(kind, lane, Some(index));
                    }
                }

                match kind {
                    NoteKind::Bt => self.current_bt[lane] = current,
                    NoteKind::Fx => self.current_fx[lane] = current,
                }
            }
        }
    }

    fn update_current_analogs(&mut self, time_ms: f64) {
        let chart = Arc::clone(&self.chart);
        for lane in 0..ANALOG_LANES {
            self.current_analogs[lane] = None;

            'analogs: for (analog_index, analog) in chart.analogs[lane].iter().enumerate() {
                for segment in 0..analog.points.len().saturating_sub(1) {
                    let start = &analog.points[segment];
                    let end = &analog.points[segment + 1];

                    // slam segments stay current inside the slam window on
                    // either side
                    let in_range = if end.slam {
                        time_ms >= start.time_ms - self.windows.analog_slam
                            && time_ms <= end.time_ms + self.windows.analog_slam
                    } else {
                        time_ms >= start.time_ms && time_ms <= end.time_ms
                    };

                    if in_range {
                        self.current_analogs[lane] = Some(AnalogCursor {
                            analog: analog_index,
                            segment,
                        });
                        break 'analogs;
                    } else if start.time_ms > time_ms {
                        break 'analogs;
                    }
                }
            }
        }
    }

    fn update_ticks(&mut self, relative: f64) {
        let subbeat = self.chart.time_to_subbeat(self.tempo_index, relative);
        let bpm = self.chart.tempos[self.tempo_index].bpm;

        // double the tick size at high bpm so the hold tick rate stays
        // perceptually constant across tempo changes
        let tick_subbeats = if bpm >= self.config.high_bpm_tick_threshold {
            self.config.tick_subbeats * 2
        } else {
            self.config.tick_subbeats
        };

        let tick = (subbeat / f64::from(tick_subbeats)).floor() as i64;
        if self.last_tick != Some(tick) {
            self.last_tick = Some(tick);
            self.scoring
                .tick_changed(tick, tick * i64::from(tick_subbeats));
        }
    }

    fn note_state_changed(&mut self, kind: NoteKind, lane: usize, pressed: bool) {
        assert!(lane < kind.lane_count(), "lane out of range");
        let start_time = self
            .start_time_ms
            .expect("start() must be called before input events");
        let relative = self.clock.now_ms() - start_time;

        let current = self.current_note(kind, lane);
        let judgement = self.scoring.state_changed(kind, lane, pressed, relative);

        if let Some(judgement) = judgement {
            // only chips judge here; holds judge on ticks
            self.track.beam(kind, lane, judgement);
            if let Some(index) = current {
                self.track.remove_chip(kind, lane, index);
            }
            return;
        }

        let current_hold =
            current.is_some_and(|index| self.chart.note(kind, lane, index).is_hold());
        if current_hold {
            self.track.set_current_hold_state(kind, lane, pressed);
            return;
        }

        // pressing with nothing judgeable still shows feedback, matching
        // the reference game's phantom-press beam
        if pressed {
            self.track.beam(kind, lane, Judgement::Error);
        }
    }
}

/// First note whose judgeable window contains `time_ms`.
///
/// Chips are judgeable within the error window around their start; holds
/// from the hold-start grace before their start until their end. Notes are
/// time-ordered, so the scan resumes at `scan_from` (notes whose window has
/// ended stay behind it) and exits at the first note whose window has not
/// opened.
fn scan_lane(
    notes: &[Note],
    windows: &JudgeWindows,
    scan_from: &mut usize,
    time_ms: f64,
) -> Option<usize> {
    while let Some(note) = notes.get(*scan_from) {
        if window_end(note, windows) < time_ms {
            *scan_from += 1;
        } else {
            break;
        }
    }

    for (index, note) in notes.iter().enumerate().skip(*scan_from) {
        if window_start(note, windows) > time_ms {
            break;
        }
        if time_ms <= window_end(note, windows) {
            return Some(index);
        }
    }
    None
}

fn window_start(note: &Note, windows: &JudgeWindows) -> f64 {
    if note.is_hold() {
        note.start_time_ms - windows.hold_start
    } else {
        note.start_time_ms - windows.error
    }
}

fn window_end(note: &Note, windows: &JudgeWindows) -> f64 {
    match note.end_time_ms {
        Some(end) => end,
        None => note.start_time_ms + windows.error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::windows_50hz;

    fn chip(subbeat_ms: f64) -> Note {
        Note {
            start_subbeat: 0,
            start_time_ms: subbeat_ms,
            end_subbeat: None,
            end_time_ms: None,
        }
    }

    fn hold(start_ms: f64, end_ms: f64) -> Note {
        Note {
            start_subbeat: 0,
            start_time_ms: start_ms,
            end_subbeat: Some(1),
            end_time_ms: Some(end_ms),
        }
    }

    #[test]
    fn scan_finds_chip_inside_error_window() {
        let windows = windows_50hz();
        let notes = vec![chip(1000.0)];
        let mut from = 0;

        assert_eq!(scan_lane(&notes, &windows, &mut from, 840.0), Some(0));
        assert_eq!(scan_lane(&notes, &windows, &mut from, 1160.0), Some(0));
        assert_eq!(scan_lane(&notes, &windows, &mut from, 839.0), None);
    }

    #[test]
    fn scan_cursor_leaves_ended_windows_behind() {
        let windows = windows_50hz();
        let notes = vec![chip(1000.0), chip(2000.0)];
        let mut from = 0;

        assert_eq!(scan_lane(&notes, &windows, &mut from, 1000.0), Some(0));
        assert_eq!(scan_lane(&notes, &windows, &mut from, 1500.0), None);
        assert_eq!(from, 1);
        assert_eq!(scan_lane(&notes, &windows, &mut from, 2000.0), Some(1));
    }

    #[test]
    fn scan_hold_window_spans_grace_to_end() {
        let windows = windows_50hz();
        let notes = vec![hold(1000.0, 3000.0)];
        let mut from = 0;

        // hold-start grace equals the error window
        assert_eq!(scan_lane(&notes, &windows, &mut from, 840.0), Some(0));
        assert_eq!(scan_lane(&notes, &windows, &mut from, 3000.0), Some(0));
        assert_eq!(scan_lane(&notes, &windows, &mut from, 3000.1), None);
    }

    #[test]
    fn scan_skips_ended_chip_overlapped_by_hold() {
        let windows = windows_50hz();
        // the hold stays current long after the chip's window has closed
        let notes = vec![hold(500.0, 5000.0), chip(1000.0)];
        let mut from = 0;

        assert_eq!(scan_lane(&notes, &windows, &mut from, 4000.0), Some(0));
    }
}
