use serde::{Deserialize, Serialize};

use crate::play::judgement::JudgeWindows;

/// Play-specific configuration.
///
/// The window frame multiples mirror the reference game's frame-based
/// judging but are not verified against it, so they are settings rather
/// than constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayConfig {
    /// Hi-speed multiplier (scroll speed).
    #[serde(default = "default_hispeed")]
    pub hispeed: f64,

    /// Display refresh rate, in hz, that judgement windows are derived
    /// from.
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: f64,

    /// Critical window width, in frames.
    #[serde(default = "default_critical_frames")]
    pub critical_frames: f64,

    /// Near window width, in frames.
    #[serde(default = "default_near_frames")]
    pub near_frames: f64,

    /// Error window width, in frames.
    #[serde(default = "default_error_frames")]
    pub error_frames: f64,

    /// Subbeats per hold-judgement tick.
    #[serde(default = "default_tick_subbeats")]
    pub tick_subbeats: u32,

    /// Bpm at or above which the tick size doubles, keeping the hold tick
    /// rate perceptually constant across tempo changes.
    #[serde(default = "default_high_bpm_tick_threshold")]
    pub high_bpm_tick_threshold: f64,
}

fn default_hispeed() -> f64 {
    1.0
}

fn default_refresh_rate() -> f64 {
    60.0
}

fn default_critical_frames() -> f64 {
    2.0
}

fn default_near_frames() -> f64 {
    4.0
}

fn default_error_frames() -> f64 {
    8.0
}

fn default_tick_subbeats() -> u32 {
    12
}

fn default_high_bpm_tick_threshold() -> f64 {
    255.0
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            hispeed: default_hispeed(),
            refresh_rate: default_refresh_rate(),
            critical_frames: default_critical_frames(),
            near_frames: default_near_frames(),
            error_frames: default_error_frames(),
            tick_subbeats: default_tick_subbeats(),
            high_bpm_tick_threshold: default_high_bpm_tick_threshold(),
        }
    }
}

impl PlayConfig {
    /// The judgement windows this configuration derives.
    pub fn windows(&self) -> JudgeWindows {
        JudgeWindows::from_frames(
            self.refresh_rate,
            self.critical_frames,
            self.near_frames,
            self.error_frames,
        )
    }
}
