use serde::{Deserialize, Serialize};

/// The timing-accuracy verdict for a hit.
///
/// Operations that may produce no verdict return `Option<Judgement>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgement {
    Critical,
    Near,
    Error,
}

/// Timing windows, in milliseconds.
///
/// Each window extends both before and after a note's start time. Windows
/// are derived from the display refresh interval, tying timing generosity
/// to presentation rate the way the reference arcade game judges by frame.
/// The frame multiples are not verified against the original game, so they
/// stay configurable (see [`crate::config::PlayConfig`]).
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeWindows {
    /// Critical window (+-), in milliseconds.
    pub critical: f64,

    /// Near window (+-), in milliseconds.
    pub near: f64,

    /// Error window (+-), the judgeable envelope of a chip.
    pub error: f64,

    /// Window around a slam's endpoints within which its segment stays
    /// current.
    pub analog_slam: f64,

    /// How early a hold may be grabbed before its start. Only applies
    /// before (-).
    pub hold_start: f64,
}

impl JudgeWindows {
    /// Windows at the standard frame multiples (2/4/8) for the given
    /// refresh rate.
    pub fn from_refresh_rate(refresh_rate: f64) -> Self {
        Self::from_frames(refresh_rate, 2.0, 4.0, 8.0)
    }

    /// Windows at explicit frame multiples for the given refresh rate.
    pub fn from_frames(refresh_rate: f64, critical: f64, near: f64, error: f64) -> Self {
        assert!(refresh_rate > 0.0, "refresh rate must be positive");
        let frame = 1000.0 / refresh_rate;
        Self {
            critical: critical * frame,
            near: near * frame,
            error: error * frame,
            analog_slam: (critical + near) * frame,
            hold_start: error * frame,
        }
    }

    /// The judgement for a chip starting at `note_start_ms` hit at
    /// `time_ms`.
    ///
    /// Callers must already have verified the event lies inside the chip's
    /// judgeable envelope; anything past the near window is an error by
    /// construction.
    pub fn judge_chip(&self, note_start_ms: f64, time_ms: f64) -> Judgement {
        let diff = (time_ms - note_start_ms).abs();
        if diff <= self.critical {
            Judgement::Critical
        } else if diff <= self.near {
            Judgement::Near
        } else {
            Judgement::Error
        }
    }
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self::from_refresh_rate(60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 50hz frames are a round 20ms
    fn windows() -> JudgeWindows {
        JudgeWindows::from_frames(50.0, 2.0, 4.0, 8.0)
    }

    #[test]
    fn windows_scale_with_refresh_interval() {
        let w = windows();
        assert!((w.critical - 40.0).abs() < 1e-9);
        assert!((w.near - 80.0).abs() < 1e-9);
        assert!((w.error - 160.0).abs() < 1e-9);
        assert!((w.analog_slam - 120.0).abs() < 1e-9);
        assert!((w.hold_start - 160.0).abs() < 1e-9);
    }

    #[test]
    fn chip_judgement_boundaries() {
        let w = windows();

        assert_eq!(w.judge_chip(1000.0, 1000.0), Judgement::Critical);
        assert_eq!(w.judge_chip(1000.0, 960.0), Judgement::Critical);
        assert_eq!(w.judge_chip(1000.0, 1040.0), Judgement::Critical);

        assert_eq!(w.judge_chip(1000.0, 959.0), Judgement::Near);
        assert_eq!(w.judge_chip(1000.0, 1041.0), Judgement::Near);
        assert_eq!(w.judge_chip(1000.0, 1080.0), Judgement::Near);

        assert_eq!(w.judge_chip(1000.0, 1081.0), Judgement::Error);
        assert_eq!(w.judge_chip(1000.0, 840.0), Judgement::Error);
    }
}
