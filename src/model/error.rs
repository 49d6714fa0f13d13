use thiserror::Error;

use crate::model::chart::NoteKind;

/// Malformed chart data, detected at the chart-load boundary.
///
/// None of these are recoverable at play time; a chart that fails to build
/// never reaches the playback engine.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart has no tempos")]
    NoTempos,

    #[error("first tempo must start at subbeat 0, got {subbeat}")]
    MissingInitialTempo { subbeat: u32 },

    #[error("invalid tempo at subbeat {subbeat}: bpm must be positive, got {bpm}")]
    InvalidTempo { bpm: f64, subbeat: u32 },

    #[error("tempos must be sorted ascending by subbeat")]
    UnsortedTempos,

    #[error("{kind:?} lane {lane} notes must be sorted ascending by start subbeat")]
    UnsortedNotes { kind: NoteKind, lane: usize },

    #[error("hold starting at subbeat {start} must end after it starts, got {end}")]
    InvalidHold { start: u32, end: u32 },
}
