//! Conversion between wall-clock milliseconds and subbeats.
//!
//! The hot path only ever converts through the tempo active at a known
//! index; chart load is the one place that walks the tempo list, when it
//! timestamps notes and analog points.

use crate::model::chart::{Beat, Chart, SUBBEATS_PER_BEAT, Tempo, beat_position_subbeat, subbeat_time};

impl Tempo {
    /// Duration, in milliseconds, of the given number of subbeats at this
    /// tempo.
    pub fn subbeats_to_duration(&self, subbeats: f64) -> f64 {
        assert!(self.bpm > 0.0, "tempo bpm must be positive");
        (subbeats / f64::from(SUBBEATS_PER_BEAT)) * (60_000.0 / self.bpm)
    }
}

impl Chart {
    /// The fractional subbeat at `time_ms`, given the tempo active at
    /// `tempo_index`.
    ///
    /// Interpolates between this tempo's anchor and the next tempo's (or the
    /// chart's end if this is the last tempo). Continuous across tempo
    /// boundaries as long as the anchors were chained at load.
    ///
    /// Panics if `tempo_index` does not index a tempo of this chart.
    pub fn time_to_subbeat(&self, tempo_index: usize, time_ms: f64) -> f64 {
        assert!(tempo_index < self.tempos.len(), "tempo index out of range");
        let tempo = &self.tempos[tempo_index];

        let (end_time, end_subbeat) = match self.tempos.get(tempo_index + 1) {
            Some(next) => (next.time_ms, f64::from(next.subbeat)),
            None => {
                let remaining = f64::from(self.end_subbeat - tempo.subbeat);
                (
                    tempo.time_ms + tempo.subbeats_to_duration(remaining),
                    f64::from(self.end_subbeat),
                )
            }
        };

        let start_time = tempo.time_ms;
        let start_subbeat = f64::from(tempo.subbeat);
        let progress = (time_ms - start_time) / (end_time - start_time);
        start_subbeat + (end_subbeat - start_subbeat) * progress
    }

    /// The wall-clock time of the given subbeat.
    ///
    /// Walks the tempo list; used at chart load to timestamp events, not
    /// per frame.
    pub fn subbeat_to_time(&self, subbeat: f64) -> f64 {
        subbeat_time(&self.tempos, subbeat)
    }

    /// Absolute subbeat of a (measure, beat, subbeat-in-beat) chart
    /// position, using the time signature in effect at that measure.
    pub fn position_to_subbeat(&self, measure: u16, beat: u8, subbeat: u8) -> u32 {
        let record = self
            .beats
            .iter()
            .take_while(|b| b.measure <= measure)
            .last()
            .unwrap_or(&self.beats[0]);
        beat_position_subbeat(record, measure, beat, subbeat)
    }

    /// The time signature in effect at the given subbeat.
    pub fn beat_at(&self, subbeat: u32) -> &Beat {
        self.beats
            .iter()
            .take_while(|b| b.subbeat <= subbeat)
            .last()
            .unwrap_or(&self.beats[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::chart::{ChartBuilder, NoteKind};

    fn single_tempo_chart() -> Chart {
        ChartBuilder::new()
            .tempo(120.0, 0)
            .end_at(SUBBEATS_PER_BEAT * 8)
            .build()
            .unwrap()
    }

    #[test]
    fn one_beat_round_trips() {
        let chart = single_tempo_chart();
        let tempo = &chart.tempos[0];

        let duration = tempo.subbeats_to_duration(f64::from(SUBBEATS_PER_BEAT));
        let subbeat = chart.time_to_subbeat(0, duration);

        assert!((subbeat - f64::from(SUBBEATS_PER_BEAT)).abs() < 1e-6);
    }

    #[test]
    fn beat_duration_at_120_bpm_is_500ms() {
        let chart = single_tempo_chart();
        let duration = chart.tempos[0].subbeats_to_duration(f64::from(SUBBEATS_PER_BEAT));
        assert!((duration - 500.0).abs() < 1e-9);
    }

    #[test]
    fn subbeat_is_continuous_across_tempo_boundary() {
        // 120 bpm for two beats, then 60 bpm
        let chart = ChartBuilder::new()
            .tempo(120.0, 0)
            .tempo(60.0, 96)
            .end_at(192)
            .build()
            .unwrap();

        let boundary = chart.tempos[1].time_ms;
        let before = chart.time_to_subbeat(0, boundary - 1e-9);
        let after = chart.time_to_subbeat(1, boundary + 1e-9);

        assert!((before - 96.0).abs() < 1e-6);
        assert!((after - 96.0).abs() < 1e-6);
    }

    #[test]
    fn last_tempo_interpolates_to_chart_end() {
        let chart = single_tempo_chart();

        // the chart ends at subbeat 384, 4000ms at 120 bpm
        let subbeat = chart.time_to_subbeat(0, 4000.0);
        assert!((subbeat - 384.0).abs() < 1e-6);
        assert!((chart.end_time_ms - 4000.0).abs() < 1e-9);
    }

    #[test]
    fn subbeat_to_time_uses_the_tempo_in_effect() {
        let chart = ChartBuilder::new()
            .tempo(120.0, 0)
            .tempo(240.0, 48)
            .end_at(192)
            .build()
            .unwrap();

        // one beat at 120 (500ms) plus one at 240 (250ms)
        assert!((chart.subbeat_to_time(96.0) - 750.0).abs() < 1e-9);
    }

    #[test]
    fn position_to_subbeat_follows_signature_changes() {
        let chart = ChartBuilder::new()
            .tempo(120.0, 0)
            .beat(4, 4, 0)
            .beat(3, 4, 2)
            .end_at(960)
            .build()
            .unwrap();

        // two 4/4 measures
        assert_eq!(chart.position_to_subbeat(2, 0, 0), 384);
        // one 3/4 measure past that
        assert_eq!(chart.position_to_subbeat(3, 0, 0), 384 + 144);
        assert_eq!(chart.beat_at(400).numerator, 3);
    }

    #[test]
    fn notes_and_ticks_share_the_same_clock() {
        // a chip timestamped at load lands exactly where time_to_subbeat
        // puts the playhead at its start time
        let chart = ChartBuilder::new()
            .tempo(150.0, 0)
            .tempo(75.0, 144)
            .chip(NoteKind::Bt, 1, 192)
            .end_at(384)
            .build()
            .unwrap();

        let note = &chart.bt_notes[1][0];
        let subbeat = chart.time_to_subbeat(1, note.start_time_ms);
        assert!((subbeat - 192.0).abs() < 1e-6);
    }
}
