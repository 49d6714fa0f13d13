pub mod judgement;
pub mod playback;
pub mod scoring;

pub use judgement::{JudgeWindows, Judgement};
pub use playback::{AnalogCursor, Playback, PlaybackState};
pub use scoring::{JudgeCounts, Scoring, TickJudgements};
