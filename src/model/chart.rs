use crate::model::error::ChartError;

/// Number of BT (button) lanes.
pub const BT_LANES: usize = 4;

/// Number of FX (effect) lanes.
pub const FX_LANES: usize = 2;

/// Number of analog (knob) lanes.
pub const ANALOG_LANES: usize = 2;

/// The number of subbeats per beat.
///
/// Subbeats are the fixed-resolution musical clock every chart event is
/// keyed by.
pub const SUBBEATS_PER_BEAT: u32 = 48;

/// The two note channels of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    Bt,
    Fx,
}

impl NoteKind {
    /// Number of lanes for this note kind.
    pub fn lane_count(self) -> usize {
        match self {
            NoteKind::Bt => BT_LANES,
            NoteKind::Fx => FX_LANES,
        }
    }
}

/// A time signature change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beat {
    /// The top and bottom values of the time signature.
    pub numerator: u8,
    pub denominator: u8,

    /// The measure this beat starts at.
    pub measure: u16,

    /// The subbeat this beat starts at, absolute (not relative to measure).
    pub subbeat: u32,
}

/// A tempo change.
///
/// `time_ms` is the chained wall-clock anchor: each tempo's time is the
/// previous tempo's time plus the duration of the subbeat delta at the
/// previous tempo's bpm. Time/subbeat conversion relies on these anchors
/// being chained in exactly that way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    /// The beats per minute of this tempo.
    pub bpm: f64,

    /// The time, in milliseconds, this tempo starts at.
    pub time_ms: f64,

    /// The subbeat this tempo starts at.
    pub subbeat: u32,
}

/// A single chip or hold note.
///
/// Both the subbeat and wall-clock forms are stored; times are derived from
/// subbeats once at chart load so judging never needs to walk the tempo
/// list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// The subbeat this note starts at.
    pub start_subbeat: u32,

    /// The time, in milliseconds, this note starts at.
    pub start_time_ms: f64,

    /// The subbeat the sustain ends at. `None` for chips.
    pub end_subbeat: Option<u32>,

    /// The time, in milliseconds, the sustain ends at. `None` for chips.
    pub end_time_ms: Option<f64>,
}

impl Note {
    /// Returns true if this note is a hold.
    pub fn is_hold(&self) -> bool {
        self.end_subbeat.is_some()
    }
}

/// A single point of an analog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogPoint {
    /// The subbeat this point is at.
    pub subbeat: u32,

    /// The time, in milliseconds, this point is at.
    pub time_ms: f64,

    /// The position of this point on the track, from 0 to 1.
    pub position: f64,

    /// The scale for the grid on which this point is placed.
    pub position_scale: f64,

    /// Whether this point and the previous point join to make a slam.
    pub slam: bool,
}

impl AnalogPoint {
    /// Create a point at the given subbeat and position. The wall-clock
    /// time is filled in when the chart is built.
    pub fn new(subbeat: u32, position: f64, slam: bool) -> Self {
        Self {
            subbeat,
            time_ms: 0.0,
            position,
            position_scale: 1.0,
            slam,
        }
    }

    /// Set the position scale.
    pub fn with_scale(mut self, position_scale: f64) -> Self {
        self.position_scale = position_scale;
        self
    }
}

/// A continuously-steered analog segment: an ordered list of points.
#[derive(Debug, Clone, PartialEq)]
pub struct Analog {
    pub points: Vec<AnalogPoint>,
}

/// An immutable chart: metadata, timing events, and per-lane notes.
///
/// Built once by a chart parser through [`ChartBuilder`], read-only for the
/// remainder of the session. May be shared across playbacks.
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub artist: String,
    pub effector: String,
    pub illustrator: String,

    /// The difficulty rating of this chart (1-20).
    pub rating: u8,

    /// The offset, in milliseconds, for the audio of this chart.
    pub offset_ms: f64,

    /// Time signature changes, sorted ascending by subbeat. Never empty.
    pub beats: Vec<Beat>,

    /// Tempo changes, sorted ascending by subbeat. Never empty.
    pub tempos: Vec<Tempo>,

    /// The BT notes of this chart, per lane, sorted by start subbeat.
    pub bt_notes: [Vec<Note>; BT_LANES],

    /// The FX notes of this chart, per lane, sorted by start subbeat.
    pub fx_notes: [Vec<Note>; FX_LANES],

    /// The analogs of this chart, per lane.
    pub analogs: [Vec<Analog>; ANALOG_LANES],

    /// The subbeat this chart ends at.
    pub end_subbeat: u32,

    /// The time, in milliseconds, this chart ends at.
    pub end_time_ms: f64,
}

impl Chart {
    /// The per-lane notes for the given kind.
    pub fn notes(&self, kind: NoteKind) -> &[Vec<Note>] {
        match kind {
            NoteKind::Bt => &self.bt_notes,
            NoteKind::Fx => &self.fx_notes,
        }
    }

    /// The note at the given lane and index for the given kind.
    ///
    /// Panics if the lane or index is out of range; callers are expected to
    /// only pass indices obtained from this chart.
    pub fn note(&self, kind: NoteKind, lane: usize, index: usize) -> &Note {
        &self.notes(kind)[lane][index]
    }
}

/// Builder for [`Chart`].
///
/// Events may be added in any order within a lane as long as the finished
/// lane is sorted; [`ChartBuilder::build`] validates ordering, chains the
/// tempo anchors, and timestamps every note and analog point.
#[derive(Debug, Clone, Default)]
pub struct ChartBuilder {
    title: String,
    artist: String,
    effector: String,
    illustrator: String,
    rating: u8,
    offset_ms: f64,
    beats: Vec<Beat>,
    tempos: Vec<(f64, u32)>,
    bt_notes: [Vec<Note>; BT_LANES],
    fx_notes: [Vec<Note>; FX_LANES],
    analogs: [Vec<Analog>; ANALOG_LANES],
    end_subbeat: u32,
}

impl ChartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn artist(mut self, artist: &str) -> Self {
        self.artist = artist.to_owned();
        self
    }

    pub fn effector(mut self, effector: &str) -> Self {
        self.effector = effector.to_owned();
        self
    }

    pub fn illustrator(mut self, illustrator: &str) -> Self {
        self.illustrator = illustrator.to_owned();
        self
    }

    pub fn rating(mut self, rating: u8) -> Self {
        self.rating = rating;
        self
    }

    pub fn offset_ms(mut self, offset_ms: f64) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    /// Add a time signature change starting at the given measure.
    ///
    /// The absolute subbeat is derived from the previous beat record, so
    /// beats must be added in measure order.
    pub fn beat(mut self, numerator: u8, denominator: u8, measure: u16) -> Self {
        let subbeat = match self.beats.last() {
            Some(prev) => beat_position_subbeat(prev, measure, 0, 0),
            None => 0,
        };
        self.beats.push(Beat {
            numerator,
            denominator,
            measure,
            subbeat,
        });
        self
    }

    /// Add a tempo change at the given subbeat.
    pub fn tempo(mut self, bpm: f64, subbeat: u32) -> Self {
        self.tempos.push((bpm, subbeat));
        self
    }

    /// Add a chip note.
    pub fn chip(mut self, kind: NoteKind, lane: usize, subbeat: u32) -> Self {
        self.lane_notes(kind, lane).push(Note {
            start_subbeat: subbeat,
            start_time_ms: 0.0,
            end_subbeat: None,
            end_time_ms: None,
        });
        self
    }

    /// Add a hold note.
    pub fn hold(mut self, kind: NoteKind, lane: usize, start: u32, end: u32) -> Self {
        self.lane_notes(kind, lane).push(Note {
            start_subbeat: start,
            start_time_ms: 0.0,
            end_subbeat: Some(end),
            end_time_ms: None,
        });
        self
    }

    /// Add an analog to the given lane.
    pub fn analog(mut self, lane: usize, points: Vec<AnalogPoint>) -> Self {
        self.analogs[lane].push(Analog { points });
        self
    }

    /// Set the subbeat the chart ends at.
    pub fn end_at(mut self, subbeat: u32) -> Self {
        self.end_subbeat = subbeat;
        self
    }

    fn lane_notes(&mut self, kind: NoteKind, lane: usize) -> &mut Vec<Note> {
        match kind {
            NoteKind::Bt => &mut self.bt_notes[lane],
            NoteKind::Fx => &mut self.fx_notes[lane],
        }
    }

    /// Validate the chart data, chain the tempo anchors, timestamp every
    /// note and analog point, and produce the finished [`Chart`].
    pub fn build(self) -> Result<Chart, ChartError> {
        if self.tempos.is_empty() {
            return Err(ChartError::NoTempos);
        }

        let beats = if self.beats.is_empty() {
            // charts without an explicit signature default to 4/4
            vec![Beat {
                numerator: 4,
                denominator: 4,
                measure: 0,
                subbeat: 0,
            }]
        } else {
            self.beats
        };

        if self.tempos[0].1 != 0 {
            return Err(ChartError::MissingInitialTempo {
                subbeat: self.tempos[0].1,
            });
        }

        // chain each tempo's wall-clock anchor off the previous one,
        // at the bpm in effect up to that point
        let mut tempos: Vec<Tempo> = Vec::with_capacity(self.tempos.len());
        for &(bpm, subbeat) in &self.tempos {
            if bpm <= 0.0 {
                return Err(ChartError::InvalidTempo { bpm, subbeat });
            }
            let time_ms = match tempos.last() {
                Some(prev) => {
                    if subbeat <= prev.subbeat {
                        return Err(ChartError::UnsortedTempos);
                    }
                    prev.time_ms + prev.subbeats_to_duration(f64::from(subbeat - prev.subbeat))
                }
                None => 0.0,
            };
            tempos.push(Tempo {
                bpm,
                time_ms,
                subbeat,
            });
        }

        let mut chart = Chart {
            title: self.title,
            artist: self.artist,
            effector: self.effector,
            illustrator: self.illustrator,
            rating: self.rating,
            offset_ms: self.offset_ms,
            beats,
            tempos,
            bt_notes: self.bt_notes,
            fx_notes: self.fx_notes,
            analogs: self.analogs,
            end_subbeat: self.end_subbeat,
            end_time_ms: 0.0,
        };

        for kind in [NoteKind::Bt, NoteKind::Fx] {
            for lane in 0..kind.lane_count() {
                validate_lane(&chart.notes(kind)[lane], kind, lane)?;
            }
        }

        // the chart must not end before its last event
        let last_subbeat = chart
            .bt_notes
            .iter()
            .chain(chart.fx_notes.iter())
            .flatten()
            .map(|n| n.end_subbeat.unwrap_or(n.start_subbeat))
            .chain(
                chart
                    .analogs
                    .iter()
                    .flatten()
                    .flat_map(|a| a.points.iter().map(|p| p.subbeat)),
            )
            .max()
            .unwrap_or(0);
        chart.end_subbeat = chart.end_subbeat.max(last_subbeat);

        // derive the wall-clock form of every subbeat-keyed event
        chart.end_time_ms = chart.subbeat_to_time(f64::from(chart.end_subbeat));

        let tempos = chart.tempos.clone();
        let timestamp = |subbeat: u32| subbeat_time(&tempos, f64::from(subbeat));

        for notes in chart.bt_notes.iter_mut().chain(chart.fx_notes.iter_mut()) {
            for note in notes.iter_mut() {
                note.start_time_ms = timestamp(note.start_subbeat);
                note.end_time_ms = note.end_subbeat.map(&timestamp);
            }
        }

        for analog in chart.analogs.iter_mut().flatten() {
            for point in analog.points.iter_mut() {
                point.time_ms = timestamp(point.subbeat);
            }
        }

        Ok(chart)
    }
}

/// Absolute subbeat of a (measure, beat, subbeat-in-beat) chart position,
/// relative to the time signature in effect at `beat_record`.
pub(crate) fn beat_position_subbeat(
    beat_record: &Beat,
    measure: u16,
    beat: u8,
    subbeat: u8,
) -> u32 {
    let measures = u32::from(measure - beat_record.measure);
    let beat_subbeats = SUBBEATS_PER_BEAT * 4 / u32::from(beat_record.denominator);
    let difference =
        (measures * u32::from(beat_record.numerator) + u32::from(beat)) * beat_subbeats
            + u32::from(subbeat);
    beat_record.subbeat + difference
}

/// Wall-clock time of a subbeat given chained tempo anchors.
pub(crate) fn subbeat_time(tempos: &[Tempo], subbeat: f64) -> f64 {
    let tempo = tempos
        .iter()
        .rev()
        .find(|t| f64::from(t.subbeat) <= subbeat)
        .unwrap_or(&tempos[0]);
    tempo.time_ms + tempo.subbeats_to_duration(subbeat - f64::from(tempo.subbeat))
}

fn validate_lane(notes: &[Note], kind: NoteKind, lane: usize) -> Result<(), ChartError> {
    for note in notes {
        if let Some(end) = note.end_subbeat {
            if end <= note.start_subbeat {
                return Err(ChartError::InvalidHold {
                    start: note.start_subbeat,
                    end,
                });
            }
        }
    }
    for pair in notes.windows(2) {
        if pair[1].start_subbeat <= pair[0].start_subbeat {
            return Err(ChartError::UnsortedNotes { kind, lane });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_a_tempo() {
        let result = ChartBuilder::new().end_at(192).build();
        assert!(matches!(result, Err(ChartError::NoTempos)));
    }

    #[test]
    fn build_rejects_zero_bpm() {
        let result = ChartBuilder::new().tempo(0.0, 0).end_at(192).build();
        assert!(matches!(
            result,
            Err(ChartError::InvalidTempo { subbeat: 0, .. })
        ));
    }

    #[test]
    fn build_rejects_unsorted_lane() {
        let result = ChartBuilder::new()
            .tempo(120.0, 0)
            .chip(NoteKind::Bt, 0, 96)
            .chip(NoteKind::Bt, 0, 48)
            .end_at(192)
            .build();
        assert!(matches!(
            result,
            Err(ChartError::UnsortedNotes {
                kind: NoteKind::Bt,
                lane: 0
            })
        ));
    }

    #[test]
    fn build_rejects_inverted_hold() {
        let result = ChartBuilder::new()
            .tempo(120.0, 0)
            .hold(NoteKind::Fx, 1, 96, 96)
            .end_at(192)
            .build();
        assert!(matches!(
            result,
            Err(ChartError::InvalidHold { start: 96, end: 96 })
        ));
    }

    #[test]
    fn build_chains_tempo_anchors() {
        // 120 bpm for one beat (500ms), then 240 bpm
        let chart = ChartBuilder::new()
            .tempo(120.0, 0)
            .tempo(240.0, 48)
            .end_at(192)
            .build()
            .unwrap();

        assert_eq!(chart.tempos[0].time_ms, 0.0);
        assert!((chart.tempos[1].time_ms - 500.0).abs() < 1e-9);
    }

    #[test]
    fn build_timestamps_notes_across_tempo_changes() {
        let chart = ChartBuilder::new()
            .tempo(120.0, 0)
            .tempo(240.0, 48)
            .chip(NoteKind::Bt, 0, 48)
            .hold(NoteKind::Fx, 0, 48, 96)
            .end_at(192)
            .build()
            .unwrap();

        let chip = &chart.bt_notes[0][0];
        assert!((chip.start_time_ms - 500.0).abs() < 1e-9);

        // one beat at 240 bpm is 250ms
        let hold = &chart.fx_notes[0][0];
        assert!((hold.start_time_ms - 500.0).abs() < 1e-9);
        assert!((hold.end_time_ms.unwrap() - 750.0).abs() < 1e-9);
    }

    #[test]
    fn build_extends_end_past_last_note() {
        let chart = ChartBuilder::new()
            .tempo(120.0, 0)
            .hold(NoteKind::Bt, 2, 0, 240)
            .end_at(96)
            .build()
            .unwrap();
        assert_eq!(chart.end_subbeat, 240);
    }

    #[test]
    fn beat_position_subbeats_honor_signature() {
        let four_four = Beat {
            numerator: 4,
            denominator: 4,
            measure: 0,
            subbeat: 0,
        };
        // measure 1 beat 2 in 4/4: (1 * 4 + 2) * 48
        assert_eq!(beat_position_subbeat(&four_four, 1, 2, 0), 288);

        let three_eight = Beat {
            numerator: 3,
            denominator: 8,
            measure: 4,
            subbeat: 768,
        };
        // an eighth is 24 subbeats
        assert_eq!(beat_position_subbeat(&three_eight, 5, 1, 6), 768 + 3 * 24 + 24 + 6);
    }
}
