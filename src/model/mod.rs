pub mod chart;
pub mod error;
pub mod timing;

pub use chart::{
    ANALOG_LANES, Analog, AnalogPoint, BT_LANES, Beat, Chart, ChartBuilder, FX_LANES, Note,
    NoteKind, SUBBEATS_PER_BEAT, Tempo,
};
pub use error::ChartError;
